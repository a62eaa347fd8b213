//! Species and per-species statistics.

use crate::genome::Genome;
use crate::scalar::Scalar;
use std::sync::Arc;

/// Derived per-generation statistics for one species.
///
/// Recomputed every generation by the population statistics update and the
/// allocation calculator; sizes refer to the next generation being built.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeciesStats {
    /// Mean primary fitness over the species' genomes.
    pub mean_fitness: f64,
    /// Fitness-sharing target size before discretization.
    pub target_size_real: f64,
    /// Discretized target size; across all species these sum to the
    /// population target size.
    pub target_size: usize,
    /// Number of fittest genomes preserved unchanged into the next
    /// generation.
    pub elite_size: usize,
    /// Number of fittest genomes eligible for selection as parents.
    pub selection_size: usize,
    /// Number of offspring to create (`target_size - elite_size`).
    pub offspring_count: usize,
    /// Portion of `offspring_count` produced by asexual reproduction.
    pub offspring_asexual_count: usize,
    /// Portion of `offspring_count` produced by recombination.
    pub offspring_recombination_count: usize,
}

/// A cluster of structurally similar genomes.
///
/// Species objects are recreated wholesale whenever full re-speciation
/// runs; between re-speciations the genome list is trimmed, extended and
/// re-sorted in place. The genome list is kept ordered best to worst by
/// fitness, so elite and selection counts address prefixes of it.
#[derive(Debug)]
pub struct Species<W: Scalar> {
    /// Species id, unique within one speciation pass.
    pub id: u32,
    /// Member genomes, ordered best to worst by fitness.
    pub genomes: Vec<Arc<Genome<W>>>,
    /// Derived statistics.
    pub stats: SpeciesStats,
}

impl<W: Scalar> Species<W> {
    /// Create a species over the given members.
    #[must_use]
    pub fn new(id: u32, genomes: Vec<Arc<Genome<W>>>) -> Self {
        Self {
            id,
            genomes,
            stats: SpeciesStats::default(),
        }
    }

    /// Sum of member genome complexities.
    #[must_use]
    pub fn total_complexity(&self) -> f64 {
        self.genomes.iter().map(|g| g.complexity()).sum()
    }

    /// Arithmetic mean of member genome complexities.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // genome counts fit f64 exactly
    pub fn mean_complexity(&self) -> f64 {
        self.total_complexity() / self.genomes.len() as f64
    }
}
