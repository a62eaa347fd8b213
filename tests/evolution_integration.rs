//! Integration tests for the generational evolution engine.
//!
//! These run the whole engine end to end against small synthetic
//! evaluators, checking the bookkeeping invariants that must hold across
//! generations.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use nevo::complexity::NullComplexityRegulation;
use nevo::evaluation::SerialFunctionEvaluator;
use nevo::evolution::{EvolutionEngine, EvolutionSettings};
use nevo::genome::{AcyclicGenomeBuilder, Activation, Genome, GenomeBuilder, GenomeMetadata};
use nevo::population::create_seed_population;
use nevo::reproduction::{UniformWeightCrossover, WeightPerturbReproduction};
use nevo::speciation::KMeansSpeciation;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// Assemble an engine over a fresh acyclic seed population.
fn build_engine<F>(
    inputs: usize,
    outputs: usize,
    population_size: usize,
    species_count: usize,
    connectivity: f64,
    fitness: F,
    seed: u64,
) -> EvolutionEngine<f64>
where
    F: Fn(&Genome<f64>) -> f64 + Send + Sync + 'static,
{
    let metadata = Arc::new(GenomeMetadata::acyclic(
        inputs,
        outputs,
        Activation::LeakyReLU,
        5.0,
    ));
    let builder: Arc<dyn GenomeBuilder<f64>> =
        Arc::new(AcyclicGenomeBuilder::new(Arc::clone(&metadata), true));
    let mut rng = SmallRng::seed_from_u64(seed);
    let population = create_seed_population(
        metadata,
        Arc::clone(&builder),
        population_size,
        connectivity,
        &mut rng,
    );

    let asexual = WeightPerturbReproduction::new(
        Arc::clone(&builder),
        Arc::clone(population.genome_id_seq()),
        Arc::clone(population.generation_seq()),
        0.5,
        0.4,
    );
    let sexual = UniformWeightCrossover::new(
        Arc::clone(&builder),
        Arc::clone(population.genome_id_seq()),
        Arc::clone(population.generation_seq()),
    );

    let settings = EvolutionSettings {
        species_count,
        ..EvolutionSettings::default()
    };

    EvolutionEngine::new(
        settings,
        Box::new(SerialFunctionEvaluator::new(fitness, true)),
        Box::new(KMeansSpeciation::default()),
        Box::new(NullComplexityRegulation),
        Box::new(asexual),
        Box::new(sexual),
        population,
        SmallRng::seed_from_u64(seed.wrapping_add(1)),
    )
}

/// A 2-input 1-output acyclic run with one species and a constant-fitness
/// evaluator: the population size must hold at exactly 10, and with a
/// deterministic evaluator the evaluation count must advance by exactly
/// the offspring count each generation.
#[test]
fn constant_fitness_run_conserves_population_and_evaluation_counts() {
    // Two possible input->output connections and 50% connectivity gives
    // every seed genome exactly one connection.
    let mut engine = build_engine(2, 1, 10, 1, 0.5, |_| 1.0, 101);
    engine.initialise().unwrap();

    assert_eq!(engine.population().genomes().len(), 10);
    assert_eq!(engine.stats().total_evaluation_count, 10);

    for _ in 0..5 {
        let evaluations_before = engine.stats().total_evaluation_count;
        let offspring_before = engine.stats().total_offspring_count;

        engine.perform_one_generation().unwrap();

        assert_eq!(engine.population().genomes().len(), 10);
        let offspring_delta =
            engine.stats().total_offspring_count - offspring_before;
        assert_eq!(
            engine.stats().total_evaluation_count - evaluations_before,
            offspring_delta,
            "deterministic evaluator must evaluate offspring only"
        );
        assert!(offspring_delta > 0);
    }
    assert_eq!(engine.stats().generation, 5);
}

/// No species may ever be left empty after offspring integration.
#[test]
fn no_empty_species_after_any_generation() {
    let mut engine = build_engine(
        3,
        2,
        40,
        5,
        0.5,
        |g| g.connections().weights().iter().map(|w| w.abs()).sum(),
        202,
    );
    engine.initialise().unwrap();

    for _ in 0..20 {
        engine.perform_one_generation().unwrap();
        assert!(!engine.population().contains_empty_species());
        let species = engine.population().species().unwrap();
        let partitioned: usize = species.iter().map(|sp| sp.genomes.len()).sum();
        assert_eq!(partitioned, engine.population().genomes().len());
    }
}

/// Target sizes allocated for the next generation always sum to the
/// population target size, and the champion species always survives.
#[test]
fn allocation_invariants_hold_across_generations() {
    let mut engine = build_engine(
        2,
        2,
        30,
        4,
        0.75,
        |g| g.connections().weights().iter().map(|w| w.abs()).sum(),
        303,
    );
    engine.initialise().unwrap();

    for _ in 0..15 {
        engine.perform_one_generation().unwrap();

        let population = engine.population();
        let species = population.species().unwrap();
        let total_target: usize = species.iter().map(|sp| sp.stats.target_size).sum();
        assert_eq!(total_target, population.target_size());

        let champion = population.stats().best_genome_species_index;
        assert!(species[champion].stats.target_size >= 1);
        assert!(species[champion].stats.elite_size >= 1);
        for sp in species {
            assert_eq!(
                sp.stats.offspring_count,
                sp.stats.offspring_asexual_count + sp.stats.offspring_recombination_count
            );
        }
    }
}

/// Genome birth generations advance with the generation counter.
#[test]
fn offspring_record_their_birth_generation() {
    let mut engine = build_engine(2, 1, 12, 2, 0.5, |_| 1.0, 404);
    engine.initialise().unwrap();
    engine.perform_one_generation().unwrap();

    let newest_birth = engine
        .population()
        .genomes()
        .iter()
        .map(|g| g.birth_generation())
        .max()
        .unwrap();
    assert_eq!(newest_birth, 1);

    engine.perform_one_generation().unwrap();
    let newest_birth = engine
        .population()
        .genomes()
        .iter()
        .map(|g| g.birth_generation())
        .max()
        .unwrap();
    assert_eq!(newest_birth, 2);
}
