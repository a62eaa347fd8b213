// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Nevo: a NEAT engine for evolving neural network topologies.
//!
//! This crate maintains a population of variable-structure network
//! genomes, partitions them into species, and advances them generation by
//! generation through selection, mutation and crossover, guided by
//! externally supplied fitness scores.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              EvolutionEngine                │
//! ├─────────────────────────────────────────────┤
//! │  Offspring │ Allocation │ Complexity mode   │
//! ├─────────────────────────────────────────────┤
//! │   Speciation │ Evaluation │ Reproduction    │
//! ├─────────────────────────────────────────────┤
//! │      Population / Species / Innovation      │
//! ├─────────────────────────────────────────────┤
//! │        Genome / Graph / ConnectionSet       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Data flows strictly upward: connection genes are reified into genomes
//! (with depth-based re-layering for feed-forward networks), genomes are
//! grouped into species, fitness sharing allocates per-species offspring
//! budgets, and the engine turns budgets into the next generation.

pub mod complexity;
pub mod evaluation;
pub mod evolution;
pub mod genome;
pub mod graph;
pub mod innovation;
pub mod persistence;
pub mod population;
pub mod reproduction;
pub mod scalar;
pub mod speciation;
pub mod stochastic;

// Re-export key types at crate root for convenience
pub use evolution::{EvolutionEngine, EvolutionSettings, EvolutionStats};
pub use genome::{ConnectionSet, Genome, GenomeBuilder, GenomeMetadata};
pub use population::{Population, create_seed_population};
pub use scalar::Scalar;
pub use speciation::{SpeciationStrategy, Species};
