//! Species size allocation via fitness sharing.
//!
//! Target sizes are proportional to species mean fitness, discretized with
//! stochastic rounding; rounding drift is corrected by ±1 passes over the
//! species in random order until the sizes sum exactly to the population
//! target size. The species holding the population-best genome is
//! guaranteed a non-zero target. Each species' target is then split into
//! elite, selection and asexual/recombination offspring counts.

use crate::evolution::settings::EvolutionSettings;
use crate::population::Population;
use crate::scalar::Scalar;
use crate::speciation::Species;
use crate::stochastic::{shuffled_indices, stochastic_round};
use rand::RngCore;

/// Calculate and store per-species target sizes and the derived elite,
/// selection and offspring counts for the next generation.
///
/// # Panics
///
/// Panics if speciation has not run, or if the champion species cannot be
/// guaranteed a member because every other species already has a zero
/// target size.
pub fn update_species_allocation<W: Scalar>(
    population: &mut Population<W>,
    settings: &EvolutionSettings,
    rng: &mut dyn RngCore,
) {
    let target_size = population.target_size();
    let total_mean_fitness = population.stats().sum_species_mean_fitness;
    let best_species_index = population.stats().best_genome_species_index;

    let species = population
        .species_mut()
        .expect("allocation requires an initialised species partition");

    update_target_sizes(species, target_size, total_mean_fitness, rng);
    accommodate_best_genome_species(species, best_species_index, rng);
    debug_assert_eq!(
        species.iter().map(|sp| sp.stats.target_size).sum::<usize>(),
        target_size
    );

    for (i, sp) in species.iter_mut().enumerate() {
        allocate_elite_selection_offspring(sp, settings, i == best_species_index, rng);
    }
}

/// Assign fitness-sharing target sizes and correct the rounding drift so
/// they sum exactly to `target_size`.
fn update_target_sizes<W: Scalar>(
    species: &mut [Species<W>],
    target_size: usize,
    total_mean_fitness: f64,
    rng: &mut dyn RngCore,
) {
    // Population and species counts stay well within f64's exact integer range
    #[allow(clippy::cast_precision_loss)]
    let population_size = target_size as f64;

    let mut allocated = 0usize;
    if total_mean_fitness <= 0.0 {
        // Every genome scored zero; assign all species an equal share.
        #[allow(clippy::cast_precision_loss)]
        let share = population_size / species.len() as f64;
        for sp in &mut *species {
            sp.stats.target_size_real = share;
            sp.stats.target_size = stochastic_round(share, rng);
            allocated += sp.stats.target_size;
        }
    } else {
        for sp in &mut *species {
            let real = (sp.stats.mean_fitness / total_mean_fitness) * population_size;
            sp.stats.target_size_real = real;
            sp.stats.target_size = stochastic_round(real, rng);
            allocated += sp.stats.target_size;
        }
    }

    // Independent rounding rarely sums exactly; add or remove single units,
    // one per species per pass, visiting species in random order, until the
    // total matches. Spreading the correction avoids concentrating it in
    // one species.
    while allocated < target_size {
        for &i in &shuffled_indices(species.len(), rng) {
            species[i].stats.target_size += 1;
            allocated += 1;
            if allocated == target_size {
                break;
            }
        }
    }
    while allocated > target_size {
        for &i in &shuffled_indices(species.len(), rng) {
            if species[i].stats.target_size > 0 {
                species[i].stats.target_size -= 1;
                allocated -= 1;
                if allocated == target_size {
                    break;
                }
            }
        }
    }
}

/// Guarantee the species holding the population-best genome a non-zero
/// target size, decrementing one other non-zero species to compensate.
fn accommodate_best_genome_species<W: Scalar>(
    species: &mut [Species<W>],
    best_species_index: usize,
    rng: &mut dyn RngCore,
) {
    if species[best_species_index].stats.target_size > 0 {
        return;
    }
    species[best_species_index].stats.target_size += 1;

    // Pick a donor uniformly at random among the other species. Reducing a
    // donor to zero is fine; zero allocations are handled downstream.
    for &i in &shuffled_indices(species.len(), rng) {
        if i == best_species_index {
            continue;
        }
        if species[i].stats.target_size > 0 {
            species[i].stats.target_size -= 1;
            return;
        }
    }
    panic!("all species have a zero target size");
}

/// Split a species' target size into elite, selection and offspring
/// counts.
fn allocate_elite_selection_offspring<W: Scalar>(
    sp: &mut Species<W>,
    settings: &EvolutionSettings,
    is_best_genome_species: bool,
    rng: &mut dyn RngCore,
) {
    // Genome counts stay well within f64's exact integer range
    #[allow(clippy::cast_precision_loss)]
    let current_size = sp.genomes.len() as f64;
    let stats = &mut sp.stats;

    if stats.target_size == 0 {
        debug_assert!(
            !is_best_genome_species,
            "zero target size assigned to the species holding the best genome"
        );
        stats.elite_size = 0;
        stats.selection_size = 0;
        stats.offspring_count = 0;
        stats.offspring_asexual_count = 0;
        stats.offspring_recombination_count = 0;
        return;
    }

    // Elite count is a proportion of the *current* size, so it is clamped
    // to the new target size.
    let elite = stochastic_round(current_size * settings.elitism_proportion, rng);
    stats.elite_size = elite.min(stats.target_size);

    // The champion species always preserves its best genome, even when its
    // target size is one and it therefore produces no offspring.
    if is_best_genome_species && stats.elite_size == 0 {
        stats.elite_size = 1;
    }

    stats.offspring_count = stats.target_size - stats.elite_size;

    // Offspring counts stay well within f64's exact integer range
    #[allow(clippy::cast_precision_loss)]
    let asexual_real = stats.offspring_count as f64 * settings.offspring_asexual_proportion;
    let asexual = stochastic_round(asexual_real, rng);
    stats.offspring_asexual_count = asexual;
    stats.offspring_recombination_count = stats.offspring_count - asexual;

    // At least one genome is always selectable; for a zero target size it
    // is irrelevant, but cross-species mating may still sample this
    // species.
    stats.selection_size =
        stochastic_round(current_size * settings.selection_proportion, rng).max(1);
}
