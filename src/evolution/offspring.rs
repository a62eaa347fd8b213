//! Offspring creation from the species' allocated counts.

use crate::evaluation::FitnessEvaluator;
use crate::genome::Genome;
use crate::reproduction::{AsexualReproduction, SexualReproduction};
use crate::scalar::Scalar;
use crate::speciation::Species;
use crate::stochastic::{DiscreteDistribution, stochastic_round};
use rand::RngCore;
use std::cmp::Ordering;
use std::sync::Arc;

/// The offspring of one generation, with counts by reproduction kind.
#[derive(Debug)]
pub struct Offspring<W: Scalar> {
    /// The newly created genomes.
    pub genomes: Vec<Arc<Genome<W>>>,
    /// How many were created by asexual reproduction.
    pub asexual_count: usize,
    /// How many were created by recombination (intra- plus inter-species).
    pub recombination_count: usize,
    /// How many recombinations paired parents from different species.
    pub interspecies_count: usize,
}

/// Builds offspring genomes from species whose allocation counts have been
/// computed.
///
/// Two kinds of selection distribution are built up front: one over the
/// species (weighted by selection size) for choosing an inter-species
/// mate's species, and one per species over its selection-size prefix of
/// genomes (weighted by primary fitness) for choosing parents. The builder
/// has no side effects beyond producing the new genome list.
#[derive(Debug, Clone, Copy)]
pub struct OffspringBuilder {
    interspecies_mating_proportion: f64,
}

impl OffspringBuilder {
    /// Create a builder redirecting the given proportion of each species'
    /// recombination budget to inter-species mating.
    ///
    /// # Panics
    ///
    /// Panics if the proportion is outside `[0, 1]`.
    #[must_use]
    pub fn new(interspecies_mating_proportion: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&interspecies_mating_proportion),
            "interspecies_mating_proportion must be in [0, 1]"
        );
        Self {
            interspecies_mating_proportion,
        }
    }

    /// Create offspring for every species, according to each species'
    /// allocated asexual and recombination counts.
    ///
    /// Species with a selection size of zero produce nothing. A species
    /// with a single selectable genome cannot recombine within itself, so
    /// its recombination allocation is folded into its asexual allocation.
    /// Inter-species mating is disabled outright when fewer than two
    /// species have selectable genomes.
    ///
    /// # Panics
    ///
    /// Panics if the species' statistics are inconsistent, e.g. a positive
    /// selection size on a species with no genomes.
    pub fn create_offspring<W: Scalar>(
        &self,
        species: &[Species<W>],
        asexual: &dyn AsexualReproduction<W>,
        sexual: &dyn SexualReproduction<W>,
        evaluator: &dyn FitnessEvaluator<W>,
        rng: &mut dyn RngCore,
    ) -> Offspring<W> {
        let (species_dist, genome_dists, populated_species_count) =
            create_selection_distributions(species);

        let interspecies_proportion = if populated_species_count <= 1 {
            0.0
        } else {
            self.interspecies_mating_proportion
        };

        let total_offspring: usize = species.iter().map(|sp| sp.stats.offspring_count).sum();
        let mut offspring = Offspring {
            genomes: Vec::with_capacity(total_offspring),
            asexual_count: 0,
            recombination_count: 0,
            interspecies_count: 0,
        };

        for (species_idx, sp) in species.iter().enumerate() {
            if sp.stats.selection_size == 0 {
                continue;
            }
            let genome_dist = genome_dists[species_idx]
                .as_ref()
                .expect("species with non-zero selection size has a genome distribution");

            let mut asexual_budget = sp.stats.offspring_asexual_count;
            let mut recombination_budget = sp.stats.offspring_recombination_count;
            if sp.stats.selection_size == 1 {
                // A single selectable genome cannot recombine with itself.
                asexual_budget += recombination_budget;
                recombination_budget = 0;
            }

            // Species distribution with the current species removed (and
            // the remaining probabilities renormalized), for sampling an
            // inter-species partner.
            let partner_species_dist = species_dist.remove(species_idx);

            for _ in 0..asexual_budget {
                let parent = &sp.genomes[genome_dist.sample(rng)];
                offspring
                    .genomes
                    .push(Arc::new(asexual.create_child(parent, rng)));
            }

            // Recombination budgets stay well within f64's exact integer range
            #[allow(clippy::cast_precision_loss)]
            let interspecies_real = interspecies_proportion * recombination_budget as f64;
            let interspecies_budget = if interspecies_proportion <= 0.0 {
                0
            } else {
                stochastic_round(interspecies_real, rng)
            };
            let intraspecies_budget = recombination_budget - interspecies_budget;

            for _ in 0..intraspecies_budget {
                let primary_idx = genome_dist.sample(rng);
                // Parent B is drawn with parent A removed from the
                // possibilities.
                let secondary_dist = genome_dist.remove(primary_idx);
                let secondary_idx = secondary_dist.sample(rng);
                offspring.genomes.push(Arc::new(sexual.create_child(
                    &sp.genomes[primary_idx],
                    &sp.genomes[secondary_idx],
                    rng,
                )));
            }

            for _ in 0..interspecies_budget {
                let mut parent_a = &sp.genomes[genome_dist.sample(rng)];

                let partner_species_idx = partner_species_dist.sample(rng);
                let partner_dist = genome_dists[partner_species_idx]
                    .as_ref()
                    .expect("sampled species has selectable genomes");
                let mut parent_b =
                    &species[partner_species_idx].genomes[partner_dist.sample(rng)];

                // The fitter parent is primary.
                if evaluator.compare_fitness(parent_a.fitness(), parent_b.fitness())
                    == Ordering::Less
                {
                    std::mem::swap(&mut parent_a, &mut parent_b);
                }
                offspring
                    .genomes
                    .push(Arc::new(sexual.create_child(parent_a, parent_b, rng)));
            }

            offspring.asexual_count += asexual_budget;
            offspring.recombination_count += recombination_budget;
            offspring.interspecies_count += interspecies_budget;
        }

        offspring
    }
}

/// Build the species selection distribution (weighted by selection size)
/// and the per-species genome distributions (weighted by primary fitness
/// over the selection prefix). Also counts the species with at least one
/// selectable genome.
#[allow(clippy::cast_precision_loss)] // selection sizes fit f64 exactly
fn create_selection_distributions<W: Scalar>(
    species: &[Species<W>],
) -> (DiscreteDistribution, Vec<Option<DiscreteDistribution>>, usize) {
    let mut populated_species_count = 0;
    let species_weights: Vec<f64> = species
        .iter()
        .map(|sp| {
            if sp.stats.selection_size > 0 {
                populated_species_count += 1;
            }
            sp.stats.selection_size as f64
        })
        .collect();
    let species_dist = DiscreteDistribution::new(&species_weights);

    let genome_dists = species
        .iter()
        .map(|sp| match sp.stats.selection_size {
            0 => None,
            1 => Some(DiscreteDistribution::single()),
            n => {
                let weights: Vec<f64> = sp.genomes[..n].iter().map(|g| g.fitness()).collect();
                Some(DiscreteDistribution::new(&weights))
            }
        })
        .collect();

    (species_dist, genome_dists, populated_species_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::SerialFunctionEvaluator;
    use crate::genome::{
        Activation, ConnectionSet, CyclicGenomeBuilder, GenomeBuilder, GenomeMetadata,
    };
    use crate::innovation::IdSequence;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    /// Reproduction stubs that clone the (primary) parent's connection
    /// genes into a fresh genome.
    #[derive(Debug)]
    struct CloneReproduction {
        builder: Arc<CyclicGenomeBuilder>,
        id_seq: Arc<IdSequence>,
    }

    impl CloneReproduction {
        fn spawn(&self, parent: &Genome<f64>) -> Genome<f64> {
            let connections = parent.connections().clone();
            self.builder.create(self.id_seq.next_id(), 1, connections)
        }
    }

    impl AsexualReproduction<f64> for CloneReproduction {
        fn create_child(&self, parent: &Genome<f64>, _rng: &mut dyn RngCore) -> Genome<f64> {
            self.spawn(parent)
        }
    }

    impl SexualReproduction<f64> for CloneReproduction {
        fn create_child(
            &self,
            primary: &Genome<f64>,
            _secondary: &Genome<f64>,
            _rng: &mut dyn RngCore,
        ) -> Genome<f64> {
            self.spawn(primary)
        }
    }

    fn species_with_counts(
        builder: &Arc<CyclicGenomeBuilder>,
        id: u32,
        fitnesses: &[f64],
        selection_size: usize,
        asexual: usize,
        recombination: usize,
    ) -> Species<f64> {
        let genomes = fitnesses
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let connections = ConnectionSet::from_arrays(vec![0], vec![1], vec![0.5]);
                let genome = builder.create(
                    id * 100 + u32::try_from(i).expect("small count"),
                    0,
                    connections,
                );
                genome.set_fitness(f);
                Arc::new(genome)
            })
            .collect();
        let mut sp = Species::new(id, genomes);
        sp.stats.selection_size = selection_size;
        sp.stats.offspring_count = asexual + recombination;
        sp.stats.offspring_asexual_count = asexual;
        sp.stats.offspring_recombination_count = recombination;
        sp
    }

    fn harness() -> (Arc<CyclicGenomeBuilder>, CloneReproduction) {
        let metadata = Arc::new(GenomeMetadata::cyclic(1, 1, Activation::Tanh, 5.0, 1));
        let builder = Arc::new(CyclicGenomeBuilder::new(metadata));
        let reproduction = CloneReproduction {
            builder: Arc::clone(&builder),
            id_seq: Arc::new(IdSequence::new(10_000)),
        };
        (builder, reproduction)
    }

    #[test]
    fn test_offspring_counts_match_allocation() {
        let (builder, reproduction) = harness();
        let species = vec![
            species_with_counts(&builder, 0, &[3.0, 2.0, 1.0], 2, 4, 3),
            species_with_counts(&builder, 1, &[2.0, 1.5], 2, 2, 2),
            species_with_counts(&builder, 2, &[1.0], 1, 1, 2),
        ];
        let evaluator = SerialFunctionEvaluator::new(|_: &Genome<f64>| 0.0, true);
        let mut rng = SmallRng::seed_from_u64(3);

        let offspring = OffspringBuilder::new(0.1).create_offspring(
            &species,
            &reproduction,
            &reproduction,
            &evaluator,
            &mut rng,
        );

        // Total offspring equals the species' allocated counts; species 2's
        // recombination budget folds into asexual (selection size 1).
        assert_eq!(offspring.genomes.len(), 14);
        assert_eq!(offspring.asexual_count + offspring.recombination_count, 14);
        assert_eq!(offspring.asexual_count, 4 + 2 + 3);
        assert_eq!(offspring.recombination_count, 3 + 2);
        assert!(offspring.interspecies_count <= offspring.recombination_count);
    }

    #[test]
    fn test_zero_selection_species_is_skipped() {
        let (builder, reproduction) = harness();
        let species = vec![
            species_with_counts(&builder, 0, &[3.0, 2.0], 2, 3, 0),
            // Extinct species: no selection, no offspring.
            species_with_counts(&builder, 1, &[0.5], 0, 0, 0),
        ];
        let evaluator = SerialFunctionEvaluator::new(|_: &Genome<f64>| 0.0, true);
        let mut rng = SmallRng::seed_from_u64(5);

        let offspring = OffspringBuilder::new(0.5).create_offspring(
            &species,
            &reproduction,
            &reproduction,
            &evaluator,
            &mut rng,
        );

        assert_eq!(offspring.genomes.len(), 3);
        assert_eq!(offspring.asexual_count, 3);
        assert_eq!(offspring.recombination_count, 0);
        // Only one populated species, so inter-species mating is forced off.
        assert_eq!(offspring.interspecies_count, 0);
    }

    #[test]
    fn test_interspecies_full_proportion() {
        let (builder, reproduction) = harness();
        let species = vec![
            species_with_counts(&builder, 0, &[3.0, 2.0], 2, 0, 5),
            species_with_counts(&builder, 1, &[2.0, 1.0], 2, 0, 5),
        ];
        let evaluator = SerialFunctionEvaluator::new(|_: &Genome<f64>| 0.0, true);
        let mut rng = SmallRng::seed_from_u64(7);

        let offspring = OffspringBuilder::new(1.0).create_offspring(
            &species,
            &reproduction,
            &reproduction,
            &evaluator,
            &mut rng,
        );

        assert_eq!(offspring.genomes.len(), 10);
        assert_eq!(offspring.interspecies_count, 10);
    }
}
