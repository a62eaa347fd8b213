//! The generational evolution algorithm.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              EvolutionEngine                │
//! ├─────────────────────────────────────────────┤
//! │  Offspring │ Allocation │ Complexity mode   │
//! ├─────────────────────────────────────────────┤
//! │   Speciation │ Evaluation │ Reproduction    │
//! ├─────────────────────────────────────────────┤
//! │          Population / Species               │
//! └─────────────────────────────────────────────┘
//! ```

mod allocation;
mod engine;
mod offspring;
mod settings;
mod stats;

pub use allocation::update_species_allocation;
pub use engine::EvolutionEngine;
pub use offspring::{Offspring, OffspringBuilder};
pub use settings::EvolutionSettings;
pub use stats::EvolutionStats;
