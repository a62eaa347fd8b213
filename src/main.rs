//! Nevo CLI - run demo evolution against a built-in synthetic fitness
//! function.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use nevo::complexity::RelativeComplexityRegulation;
use nevo::evaluation::ParallelFunctionEvaluator;
use nevo::evolution::{EvolutionEngine, EvolutionSettings};
use nevo::genome::{AcyclicGenomeBuilder, Activation, Genome, GenomeBuilder, GenomeMetadata};
use nevo::persistence::{load_checkpoint, save_checkpoint};
use nevo::population::{Population, create_seed_population};
use nevo::reproduction::{UniformWeightCrossover, WeightPerturbReproduction};
use nevo::scalar::Scalar;
use nevo::speciation::KMeansSpeciation;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Nevo - evolving-topology neuroevolution
#[derive(Parser, Debug)]
#[command(name = "nevo")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an evolution demo with a synthetic fitness function
    Evolve {
        /// Population size
        #[arg(short, long, default_value = "150")]
        population: usize,

        /// Number of generations to run
        #[arg(short, long, default_value = "200")]
        generations: u32,

        /// Number of species
        #[arg(long, default_value = "10")]
        species: usize,

        /// Input node count
        #[arg(long, default_value = "3")]
        inputs: usize,

        /// Output node count
        #[arg(long, default_value = "2")]
        outputs: usize,

        /// Random seed (default: derived from the system clock)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Save a checkpoint here when the run ends
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        /// Resume from a previously saved checkpoint
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Print per-generation statistics
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Evolve {
            population,
            generations,
            species,
            inputs,
            outputs,
            seed,
            checkpoint,
            resume,
            verbose,
        } => evolve(
            population,
            generations,
            species,
            inputs,
            outputs,
            seed,
            checkpoint,
            resume,
            verbose,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// The demo fitness function: rewards genomes whose mean connection weight
/// approaches half the weight magnitude limit. Entirely synthetic, but it
/// is deterministic, non-negative, and gives selection a smooth gradient
/// to climb without requiring network execution.
fn demo_fitness<W: Scalar>(genome: &Genome<W>) -> f64 {
    let connections = genome.connections();
    if connections.is_empty() {
        return 0.0;
    }
    let target = genome.metadata().max_weight_magnitude() / 2.0;
    // Connection counts stay well within f64's exact integer range
    #[allow(clippy::cast_precision_loss)]
    let mean = connections.weights().iter().map(|w| w.to_f64()).sum::<f64>()
        / connections.len() as f64;
    1.0 / (1.0 + (mean - target).abs())
}

#[allow(clippy::too_many_arguments)]
fn evolve(
    population_size: usize,
    generations: u32,
    species_count: usize,
    inputs: usize,
    outputs: usize,
    seed: Option<u64>,
    checkpoint: Option<PathBuf>,
    resume: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let seed = seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(42)
    });

    let metadata = Arc::new(GenomeMetadata::acyclic(
        inputs,
        outputs,
        Activation::LeakyReLU,
        5.0,
    ));
    let builder: Arc<dyn GenomeBuilder<f64>> =
        Arc::new(AcyclicGenomeBuilder::new(Arc::clone(&metadata), false));

    let mut rng = SmallRng::seed_from_u64(seed);
    let population: Population<f64> = match &resume {
        Some(path) => {
            println!("Resuming from checkpoint: {}", path.display());
            load_checkpoint(path, Arc::clone(&builder))?
        }
        None => create_seed_population(
            Arc::clone(&metadata),
            Arc::clone(&builder),
            population_size,
            0.5,
            &mut rng,
        ),
    };

    println!("Starting evolution:");
    println!("  Population: {}", population.genomes().len());
    println!("  Species: {species_count}");
    println!("  Network: {inputs} inputs, {outputs} outputs");
    println!("  Seed: {seed}");
    println!();

    let evaluator = ParallelFunctionEvaluator::new(demo_fitness::<f64>, true)
        .with_stop_threshold(0.999);
    let asexual = WeightPerturbReproduction::new(
        Arc::clone(&builder),
        Arc::clone(population.genome_id_seq()),
        Arc::clone(population.generation_seq()),
        0.3,
        0.5,
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

    let mut engine = EvolutionEngine::new(
        settings,
        Box::new(evaluator),
        Box::new(KMeansSpeciation::default()),
        Box::new(RelativeComplexityRegulation::new(30.0, 10)),
        Box::new(asexual),
        Box::new(sexual),
        population,
        SmallRng::seed_from_u64(seed.wrapping_add(1)),
    );

    engine.initialise()?;

    let progress = if verbose {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(u64::from(generations));
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} gens  best={msg}")
                .expect("valid progress template"),
        );
        bar
    };

    for _ in 0..generations {
        engine.perform_one_generation()?;

        let stats = engine.population().stats();
        progress.set_message(format!("{:.4}", stats.best_fitness));
        progress.inc(1);
        if verbose {
            eprintln!(
                "Gen {:>5}: best={:.4} mean={:.4} complexity={:.1} species_best={}",
                engine.stats().generation,
                stats.best_fitness,
                stats.mean_fitness,
                stats.mean_complexity,
                stats.best_genome_species_index,
            );
        }
        if engine.stats().stop_condition_satisfied {
            break;
        }
    }
    progress.finish_and_clear();

    let stats = engine.population().stats();
    println!("Evolution complete!");
    println!("  Generations: {}", engine.stats().generation);
    println!("  Best fitness: {:.4}", stats.best_fitness);
    println!("  Mean fitness: {:.4}", stats.mean_fitness);
    println!("  Mean complexity: {:.1}", stats.mean_complexity);
    println!(
        "  Evaluations: {}",
        engine.stats().total_evaluation_count
    );

    if let Some(path) = checkpoint {
        save_checkpoint(engine.population(), &path)?;
        println!("  Checkpoint saved to: {}", path.display());
    }

    Ok(())
}
