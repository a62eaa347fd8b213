//! Genome representation.
//!
//! A genome is the heritable description of a network: its connection genes
//! plus cached structures derived from them (hidden node ids, a node id to
//! index map, a directed graph view, and — for acyclic genomes — the
//! permutation relating genome connection order to depth-major graph
//! order). Genomes are structurally immutable once built; mutation
//! operators always construct new genomes through a [`GenomeBuilder`].

mod builder;
mod connections;
mod metadata;
mod node_map;
#[cfg(debug_assertions)]
mod validate;

pub use builder::{AcyclicGenomeBuilder, CyclicGenomeBuilder, GenomeBuilder};
pub use connections::ConnectionSet;
pub use metadata::{Activation, GenomeMetadata};
pub use node_map::NodeIdMap;

use crate::graph::{AcyclicGraph, DirectedGraph};
use crate::scalar::Scalar;
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The directed-graph view of a genome.
///
/// Acyclic genomes carry the layered subtype; cyclic genomes carry the
/// plain graph. Graphs are shared: a child genome produced by weight-only
/// mutation reuses its parent's graph unchanged.
#[derive(Debug, Clone)]
pub enum GenomeGraph {
    /// Plain directed graph (cyclic genomes).
    Cyclic(Arc<DirectedGraph>),
    /// Depth-layered graph (acyclic genomes).
    Acyclic(Arc<AcyclicGraph>),
}

impl GenomeGraph {
    /// The underlying directed graph, whichever the subtype.
    #[must_use]
    pub fn digraph(&self) -> &DirectedGraph {
        match self {
            Self::Cyclic(g) => g,
            Self::Acyclic(g) => g.digraph(),
        }
    }

    /// The layered view, if this is an acyclic graph.
    #[must_use]
    pub fn acyclic(&self) -> Option<&AcyclicGraph> {
        match self {
            Self::Cyclic(_) => None,
            Self::Acyclic(g) => Some(g),
        }
    }
}

/// A NEAT genome.
#[derive(Debug)]
pub struct Genome<W: Scalar> {
    id: u32,
    birth_generation: u32,
    metadata: Arc<GenomeMetadata>,
    connections: ConnectionSet<W>,
    hidden_node_ids: Arc<[u32]>,
    node_map: Arc<NodeIdMap>,
    graph: GenomeGraph,
    reorder_map: Option<Arc<[u32]>>,
    /// Primary fitness as f64 bits. Atomic so an internally-parallel
    /// evaluator can score genomes behind shared references; the genome is
    /// otherwise read-only during evaluation.
    fitness_bits: AtomicU64,
}

impl<W: Scalar> Genome<W> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        metadata: Arc<GenomeMetadata>,
        id: u32,
        birth_generation: u32,
        connections: ConnectionSet<W>,
        hidden_node_ids: Arc<[u32]>,
        node_map: Arc<NodeIdMap>,
        graph: GenomeGraph,
        reorder_map: Option<Arc<[u32]>>,
    ) -> Self {
        let genome = Self {
            id,
            birth_generation,
            metadata,
            connections,
            hidden_node_ids,
            node_map,
            graph,
            reorder_map,
            fitness_bits: AtomicU64::new(0f64.to_bits()),
        };

        #[cfg(debug_assertions)]
        validate::assert_valid(&genome);

        genome
    }

    /// Genome id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The generation this genome was created in.
    #[must_use]
    pub fn birth_generation(&self) -> u32 {
        self.birth_generation
    }

    /// The run-wide metadata this genome was built against.
    #[must_use]
    pub fn metadata(&self) -> &Arc<GenomeMetadata> {
        &self.metadata
    }

    /// The genome's connection genes, sorted by (source, target) id.
    #[must_use]
    pub fn connections(&self) -> &ConnectionSet<W> {
        &self.connections
    }

    /// Sorted hidden node ids referenced by the connections.
    #[must_use]
    pub fn hidden_node_ids(&self) -> &Arc<[u32]> {
        &self.hidden_node_ids
    }

    /// Mapping from node id to dense node index.
    #[must_use]
    pub fn node_map(&self) -> &Arc<NodeIdMap> {
        &self.node_map
    }

    /// The genome's directed-graph view.
    #[must_use]
    pub fn graph(&self) -> &GenomeGraph {
        &self.graph
    }

    /// For acyclic genomes, the mapping from graph connection position to
    /// genome connection index.
    #[must_use]
    pub fn reorder_map(&self) -> Option<&Arc<[u32]>> {
        self.reorder_map.as_ref()
    }

    /// A measure of structural complexity: the connection count.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // connection counts fit f64 exactly
    pub fn complexity(&self) -> f64 {
        self.connections.len() as f64
    }

    /// The most recently assigned primary fitness (0.0 until evaluated).
    #[must_use]
    pub fn fitness(&self) -> f64 {
        f64::from_bits(self.fitness_bits.load(Ordering::Relaxed))
    }

    /// Assign the genome's primary fitness.
    pub fn set_fitness(&self, fitness: f64) {
        self.fitness_bits.store(fitness.to_bits(), Ordering::Relaxed);
    }

    /// Test if the genome references the given hidden node id.
    #[must_use]
    pub fn contains_hidden_node(&self, id: u32) -> bool {
        self.hidden_node_ids.binary_search(&id).is_ok()
    }

    /// Connection weights ordered to match the graph's connections.
    ///
    /// For cyclic genomes the genome and graph share one connection order,
    /// so the genome's own weight slice is returned. For acyclic genomes
    /// the graph is depth-reordered, so a new array is allocated with
    /// `result[i] = weights[reorder_map[i]]`; the genome's own array is
    /// never modified.
    #[must_use]
    pub fn digraph_weights(&self) -> Cow<'_, [W]> {
        match &self.reorder_map {
            None => Cow::Borrowed(self.connections.weights()),
            Some(reorder) => {
                let weights = self.connections.weights();
                Cow::Owned(
                    reorder
                        .iter()
                        .map(|&genome_idx| weights[genome_idx as usize])
                        .collect(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acyclic_genome() -> Genome<f64> {
        let metadata = Arc::new(GenomeMetadata::acyclic(2, 1, Activation::ReLU, 5.0));
        let builder = AcyclicGenomeBuilder::new(metadata, true);
        // 0->2, 0->3, 1->3, 3->2 with distinct weights; hidden node id 3.
        let connections = ConnectionSet::from_arrays(
            vec![0, 0, 1, 3],
            vec![2, 3, 3, 2],
            vec![0.1, 0.2, 0.3, 0.4],
        );
        builder.create(1, 0, connections)
    }

    #[test]
    fn test_digraph_weights_follow_reorder_map() {
        let genome = acyclic_genome();
        let reorder = genome.reorder_map().expect("acyclic genome").clone();
        let graph_weights = genome.digraph_weights();
        let genome_weights = genome.connections().weights();
        assert_eq!(graph_weights.len(), genome_weights.len());
        for (i, &w) in graph_weights.iter().enumerate() {
            assert!((w - genome_weights[reorder[i] as usize]).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_inverse_permutation_recovers_genome_order() {
        let genome = acyclic_genome();
        let reorder = genome.reorder_map().expect("acyclic genome").clone();
        let graph_weights = genome.digraph_weights();

        let mut recovered = vec![0.0f64; graph_weights.len()];
        for (graph_pos, &genome_pos) in reorder.iter().enumerate() {
            recovered[genome_pos as usize] = graph_weights[graph_pos];
        }
        for (a, b) in recovered.iter().zip(genome.connections().weights()) {
            assert!((a - b).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_fitness_defaults_to_zero_and_updates() {
        let genome = acyclic_genome();
        assert!(genome.fitness().abs() < f64::EPSILON);
        genome.set_fitness(2.5);
        assert!((genome.fitness() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_contains_hidden_node() {
        let genome = acyclic_genome();
        assert!(genome.contains_hidden_node(3));
        assert!(!genome.contains_hidden_node(4));
    }
}
