//! Genome builders for the acyclic and cyclic genome forms.

use crate::genome::{ConnectionSet, Genome, GenomeGraph, GenomeMetadata, NodeIdMap};
use crate::graph::{DirectedGraph, build_acyclic_graph, compute_node_depths};
use crate::scalar::Scalar;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Reifies connection genes into complete genomes.
///
/// One builder implementation is selected when the population is
/// constructed — acyclic or cyclic, matching the metadata — and is used for
/// every genome of the run. The trait's provided methods derive omitted
/// structures; the `create_from_parts` overload accepts precomputed ones so
/// that a weight-only mutation can reuse the parent's topology instead of
/// recomputing it.
pub trait GenomeBuilder<W: Scalar>: Debug + Send + Sync {
    /// The metadata genomes are built against.
    fn metadata(&self) -> &Arc<GenomeMetadata>;

    /// Build a genome from connection genes and their (pre-derived, sorted)
    /// hidden node id array.
    fn create_with_hidden_ids(
        &self,
        id: u32,
        birth_generation: u32,
        connections: ConnectionSet<W>,
        hidden_node_ids: Arc<[u32]>,
    ) -> Genome<W>;

    /// Build a genome from connection genes alone, deriving the hidden node
    /// id array.
    ///
    /// # Panics
    ///
    /// Panics if the connections violate the builder's structural contract
    /// (e.g. a cycle handed to a validating acyclic builder).
    fn create(&self, id: u32, birth_generation: u32, connections: ConnectionSet<W>) -> Genome<W> {
        let io_count =
            u32::try_from(self.metadata().io_count()).expect("node count exceeds u32 range");
        let hidden = connections.derive_hidden_node_ids(io_count);
        self.create_with_hidden_ids(id, birth_generation, connections, Arc::from(hidden))
    }

    /// Build a genome from connection genes plus fully precomputed
    /// structures, typically taken unchanged from a parent genome whose
    /// topology the new connections share (only weights differ).
    #[allow(clippy::too_many_arguments)]
    fn create_from_parts(
        &self,
        id: u32,
        birth_generation: u32,
        connections: ConnectionSet<W>,
        hidden_node_ids: Arc<[u32]>,
        node_map: Arc<NodeIdMap>,
        graph: GenomeGraph,
        reorder_map: Option<Arc<[u32]>>,
    ) -> Genome<W> {
        Genome::new(
            Arc::clone(self.metadata()),
            id,
            birth_generation,
            connections,
            hidden_node_ids,
            node_map,
            graph,
            reorder_map,
        )
    }
}

/// Map genome connection endpoints into dense index space and build the
/// directed graph view.
///
/// Hidden node ids are remapped in ascending id order, so the mapping is
/// monotonic and the mapped endpoint arrays stay sorted.
fn build_digraph<W: Scalar>(
    metadata: &GenomeMetadata,
    connections: &ConnectionSet<W>,
    node_map: &NodeIdMap,
) -> DirectedGraph {
    let source_ids = connections
        .source_ids()
        .iter()
        .map(|&id| node_map.map(id))
        .collect();
    let target_ids = connections
        .target_ids()
        .iter()
        .map(|&id| node_map.map(id))
        .collect();
    DirectedGraph::new(
        metadata.input_count(),
        metadata.output_count(),
        node_map.len(),
        source_ids,
        target_ids,
    )
}

/// Builder for cyclic (recurrent) genomes.
///
/// Dense indexes place output nodes immediately after inputs and hidden
/// nodes after outputs; no reordering is performed and genomes carry no
/// reorder map.
#[derive(Debug)]
pub struct CyclicGenomeBuilder {
    metadata: Arc<GenomeMetadata>,
}

impl CyclicGenomeBuilder {
    /// Construct for the given metadata.
    ///
    /// # Panics
    ///
    /// Panics if the metadata is for acyclic genomes.
    #[must_use]
    pub fn new(metadata: Arc<GenomeMetadata>) -> Self {
        assert!(
            !metadata.is_acyclic(),
            "cyclic builder requires cyclic metadata"
        );
        Self { metadata }
    }
}

impl<W: Scalar> GenomeBuilder<W> for CyclicGenomeBuilder {
    fn metadata(&self) -> &Arc<GenomeMetadata> {
        &self.metadata
    }

    fn create_with_hidden_ids(
        &self,
        id: u32,
        birth_generation: u32,
        connections: ConnectionSet<W>,
        hidden_node_ids: Arc<[u32]>,
    ) -> Genome<W> {
        let io_count = self.metadata.io_count();

        // Identity map when the hidden ids are already dense and contiguous,
        // a table otherwise.
        let contiguous = hidden_node_ids
            .iter()
            .enumerate()
            .all(|(i, &hid)| hid as usize == io_count + i);
        let node_map = if contiguous {
            NodeIdMap::identity(io_count + hidden_node_ids.len())
        } else {
            let entries = hidden_node_ids
                .iter()
                .enumerate()
                .map(|(i, &hid)| {
                    (
                        hid,
                        u32::try_from(io_count + i).expect("node count exceeds u32 range"),
                    )
                })
                .collect();
            NodeIdMap::table(io_count, entries)
        };

        let digraph = build_digraph(&self.metadata, &connections, &node_map);

        Genome::new(
            Arc::clone(&self.metadata),
            id,
            birth_generation,
            connections,
            hidden_node_ids,
            Arc::new(node_map),
            GenomeGraph::Cyclic(Arc::new(digraph)),
            None,
        )
    }
}

/// Builder for acyclic (feed-forward) genomes.
///
/// Builds the plain directed graph, computes per-node depths, reassigns
/// node indexes dense within each depth layer, and reorders connections
/// depth-major, recording the permutation back to genome order.
#[derive(Debug)]
pub struct AcyclicGenomeBuilder {
    metadata: Arc<GenomeMetadata>,
    validate_acyclic: bool,
}

impl AcyclicGenomeBuilder {
    /// Construct for the given metadata.
    ///
    /// When `validate_acyclic` is true every build runs a cyclic-graph
    /// check first and panics on a cycle; callers that disable validation
    /// must guarantee acyclicity themselves (the check is relatively
    /// expensive).
    ///
    /// # Panics
    ///
    /// Panics if the metadata is for cyclic genomes.
    #[must_use]
    pub fn new(metadata: Arc<GenomeMetadata>, validate_acyclic: bool) -> Self {
        assert!(
            metadata.is_acyclic(),
            "acyclic builder requires acyclic metadata"
        );
        Self {
            metadata,
            validate_acyclic,
        }
    }
}

impl<W: Scalar> GenomeBuilder<W> for AcyclicGenomeBuilder {
    fn metadata(&self) -> &Arc<GenomeMetadata> {
        &self.metadata
    }

    fn create_with_hidden_ids(
        &self,
        id: u32,
        birth_generation: u32,
        connections: ConnectionSet<W>,
        hidden_node_ids: Arc<[u32]>,
    ) -> Genome<W> {
        let input_count = self.metadata.input_count();
        let io_count = self.metadata.io_count();

        // Pre-layering map: io nodes keep their ids, hidden ids are packed
        // directly after the outputs.
        let pre_entries: HashMap<u32, u32> = hidden_node_ids
            .iter()
            .enumerate()
            .map(|(i, &hid)| {
                (
                    hid,
                    u32::try_from(io_count + i).expect("node count exceeds u32 range"),
                )
            })
            .collect();
        let pre_map = NodeIdMap::table(io_count, pre_entries);

        let digraph = build_digraph(&self.metadata, &connections, &pre_map);
        let depths = compute_node_depths(&digraph, self.validate_acyclic);
        let build = build_acyclic_graph(&digraph, &depths);

        // The depth-based reindexing relocates output and hidden nodes;
        // reflect the new indexes back into the id map. Input nodes are all
        // at depth zero and keep their fixed indexes.
        let mut entries =
            HashMap::with_capacity(self.metadata.output_count() + hidden_node_ids.len());
        for io_idx in input_count..io_count {
            entries.insert(
                u32::try_from(io_idx).expect("node count exceeds u32 range"),
                build.new_index_by_old[io_idx],
            );
        }
        for (i, &hid) in hidden_node_ids.iter().enumerate() {
            entries.insert(hid, build.new_index_by_old[io_count + i]);
        }
        let node_map = NodeIdMap::table(input_count, entries);

        Genome::new(
            Arc::clone(&self.metadata),
            id,
            birth_generation,
            connections,
            hidden_node_ids,
            Arc::new(node_map),
            GenomeGraph::Acyclic(Arc::new(build.graph)),
            Some(Arc::from(build.reorder_map)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Activation;

    fn acyclic_builder() -> AcyclicGenomeBuilder {
        let metadata = Arc::new(GenomeMetadata::acyclic(2, 1, Activation::ReLU, 5.0));
        AcyclicGenomeBuilder::new(metadata, true)
    }

    #[test]
    fn test_acyclic_create_remaps_output_past_hidden() {
        let builder = acyclic_builder();
        // Hidden node id 9 (sparse) between inputs and the output.
        let connections = ConnectionSet::from_arrays(
            vec![0, 1, 9],
            vec![9, 9, 2],
            vec![0.1f64, 0.2, 0.3],
        );
        let genome = builder.create(1, 0, connections);

        assert_eq!(genome.hidden_node_ids().as_ref(), &[9]);
        // Hidden node (depth 1) takes index 2; output (depth 2) takes 3.
        assert_eq!(genome.node_map().map(9), 2);
        assert_eq!(genome.node_map().map(2), 3);
        let acyclic = genome.graph().acyclic().expect("acyclic graph");
        assert_eq!(acyclic.output_node_indexes(), &[3]);
        assert_eq!(acyclic.layers().len(), 3);
    }

    #[test]
    fn test_cyclic_create_uses_identity_map_for_dense_ids() {
        let metadata = Arc::new(GenomeMetadata::cyclic(1, 1, Activation::Tanh, 5.0, 2));
        let builder = CyclicGenomeBuilder::new(metadata);
        // Hidden id 2 is contiguous after io ids {0, 1}; includes a cycle.
        let connections =
            ConnectionSet::from_arrays(vec![0, 1, 2], vec![2, 2, 1], vec![0.1f64, 0.2, 0.3]);
        let genome = builder.create(7, 3, connections);

        assert!(matches!(genome.node_map().as_ref(), NodeIdMap::Identity { .. }));
        assert!(genome.reorder_map().is_none());
        assert_eq!(genome.graph().digraph().node_count(), 3);
    }

    #[test]
    fn test_create_from_parts_shares_parent_topology() {
        let builder = acyclic_builder();
        let connections =
            ConnectionSet::from_arrays(vec![0, 1], vec![2, 2], vec![0.5f64, -0.5]);
        let parent = builder.create(1, 0, connections);

        // Same topology, new weights.
        let child_connections = ConnectionSet::from_arrays(
            parent.connections().source_ids().to_vec(),
            parent.connections().target_ids().to_vec(),
            vec![0.25f64, -0.25],
        );
        let child = builder.create_from_parts(
            2,
            1,
            child_connections,
            Arc::clone(parent.hidden_node_ids()),
            Arc::clone(parent.node_map()),
            parent.graph().clone(),
            parent.reorder_map().cloned(),
        );

        let (GenomeGraph::Acyclic(parent_graph), GenomeGraph::Acyclic(child_graph)) =
            (parent.graph(), child.graph())
        else {
            panic!("expected acyclic graphs");
        };
        assert!(Arc::ptr_eq(parent_graph, child_graph));
        assert!(Arc::ptr_eq(parent.node_map(), child.node_map()));
        assert_eq!(child.id(), 2);
        assert_eq!(child.birth_generation(), 1);
    }

    #[test]
    #[should_panic(expected = "acyclic")]
    fn test_validating_builder_rejects_cycle() {
        let metadata = Arc::new(GenomeMetadata::acyclic(1, 1, Activation::ReLU, 5.0));
        let builder = AcyclicGenomeBuilder::new(metadata, true);
        // 2 -> 3 -> 2 cycle between hidden nodes.
        let connections = ConnectionSet::from_arrays(
            vec![0, 2, 3],
            vec![1, 3, 2],
            vec![0.1f64, 0.2, 0.3],
        );
        let _ = builder.create(1, 0, connections);
    }
}
