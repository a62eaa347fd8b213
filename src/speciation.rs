//! Species, per-species statistics, and the speciation contract.

mod kmeans;
mod species;

pub use kmeans::KMeansSpeciation;
pub use species::{Species, SpeciesStats};

use crate::genome::Genome;
use crate::scalar::Scalar;
use rand::RngCore;
use std::fmt::Debug;
use std::sync::Arc;

/// Partitions genomes into species of structurally similar genomes.
///
/// The engine only relies on this contract; the clustering algorithm
/// behind it is interchangeable.
pub trait SpeciationStrategy<W: Scalar>: Debug + Send + Sync {
    /// Partition `genomes` exhaustively into exactly `species_count`
    /// species. Every returned species must be non-empty.
    fn speciate_all(
        &self,
        genomes: &[Arc<Genome<W>>],
        species_count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Species<W>>;

    /// Assign `offspring` into the existing species, mutating the species
    /// genome lists in place. Existing memberships are not revisited.
    fn speciate_add(
        &self,
        offspring: &[Arc<Genome<W>>],
        species: &mut [Species<W>],
        rng: &mut dyn RngCore,
    );
}
