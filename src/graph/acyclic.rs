//! Depth-layered acyclic graph construction.

use crate::graph::{DirectedGraph, GraphDepths};

/// Cumulative end indexes for one depth layer of an [`AcyclicGraph`].
///
/// Holds the index + 1 of both the last node and the last connection whose
/// source node sits in this layer. Layers run from depth zero (input nodes)
/// upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerInfo {
    /// Index + 1 of the last node in this layer.
    pub end_node_index: usize,
    /// Index + 1 of the last connection with a source node in this layer.
    pub end_connection_index: usize,
}

/// An acyclic directed graph with nodes and connections arranged into
/// depth-major layers.
///
/// Node indexes are reassigned so they are dense within each depth layer,
/// and connections are ordered by the depth of their source node; a decoder
/// can therefore process the network one contiguous layer at a time.
#[derive(Debug)]
pub struct AcyclicGraph {
    digraph: DirectedGraph,
    layers: Vec<LayerInfo>,
    output_node_indexes: Vec<u32>,
}

impl AcyclicGraph {
    /// The underlying directed graph, in depth-reassigned index space.
    #[must_use]
    pub fn digraph(&self) -> &DirectedGraph {
        &self.digraph
    }

    /// Per-layer node and connection end indexes, ordered by depth.
    #[must_use]
    pub fn layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    /// The depth-reassigned indexes of the output nodes, in output order.
    ///
    /// Output nodes are relocated by the depth-based reindexing, so their
    /// positions must be recorded to remain addressable.
    #[must_use]
    pub fn output_node_indexes(&self) -> &[u32] {
        &self.output_node_indexes
    }
}

/// Result of building an [`AcyclicGraph`] from a plain directed graph.
#[derive(Debug)]
pub struct AcyclicBuild {
    /// The layered graph.
    pub graph: AcyclicGraph,
    /// Mapping from pre-build node index to depth-reassigned node index.
    pub new_index_by_old: Vec<u32>,
    /// For each connection position in the layered graph, the index of the
    /// same connection in the original (genome-ordered) connection array.
    pub reorder_map: Vec<u32>,
}

/// Rebuild `digraph` with nodes reindexed by depth and connections ordered
/// depth-major.
///
/// Node reindexing keeps the input nodes at their fixed indexes (they are
/// all at depth zero) and stably sorts the remaining nodes by depth, so
/// nodes already in depth order keep their relative positions. The returned
/// [`AcyclicBuild::reorder_map`] records, for each connection position in
/// the rebuilt graph, where that connection lived in the input graph.
///
/// # Panics
///
/// Panics if any input node is not at depth zero, i.e. if an input node is
/// the target of a connection.
#[must_use]
pub fn build_acyclic_graph(digraph: &DirectedGraph, depths: &GraphDepths) -> AcyclicBuild {
    let input_count = digraph.input_count();
    let output_count = digraph.output_count();
    let node_count = digraph.node_count();

    assert!(
        depths.node_depths[..input_count].iter().all(|&d| d == 0),
        "input nodes must be at depth zero"
    );

    // Reassign node indexes by depth. Input nodes keep their positions; the
    // rest are stably sorted by depth so that equal-depth nodes are not
    // shuffled.
    let mut order: Vec<usize> = (input_count..node_count).collect();
    order.sort_by_key(|&idx| depths.node_depths[idx]);

    let mut new_index_by_old = vec![0u32; node_count];
    for (idx, slot) in new_index_by_old.iter_mut().enumerate().take(input_count) {
        *slot = u32::try_from(idx).expect("node count exceeds u32 range");
    }
    for (pos, &old) in order.iter().enumerate() {
        new_index_by_old[old] =
            u32::try_from(input_count + pos).expect("node count exceeds u32 range");
    }

    // Map connection endpoints into the new index space.
    let conn_count = digraph.connection_count();
    let mut source_ids: Vec<u32> = digraph
        .source_ids()
        .iter()
        .map(|&id| new_index_by_old[id as usize])
        .collect();
    let mut target_ids: Vec<u32> = digraph
        .target_ids()
        .iter()
        .map(|&id| new_index_by_old[id as usize])
        .collect();

    // Sort connections by (source, target); because node indexes now encode
    // depth, this arranges connections into contiguous depth layers. The
    // permutation applied is recorded as the reorder map.
    let mut perm: Vec<usize> = (0..conn_count).collect();
    perm.sort_unstable_by_key(|&i| (source_ids[i], target_ids[i]));
    source_ids = perm.iter().map(|&i| source_ids[i]).collect();
    target_ids = perm.iter().map(|&i| target_ids[i]).collect();
    let reorder_map: Vec<u32> = perm
        .iter()
        .map(|&i| u32::try_from(i).expect("connection count exceeds u32 range"))
        .collect();

    // Node depths in the new index space: inputs, then the sorted suffix.
    let mut node_depths = vec![0usize; node_count];
    for &old in &order {
        node_depths[new_index_by_old[old] as usize] = depths.node_depths[old];
    }

    // Record where the output nodes ended up.
    let output_node_indexes: Vec<u32> =
        new_index_by_old[input_count..input_count + output_count].to_vec();

    // Compile per-layer end indexes. There is at least one connection
    // sourced at every depth below the deepest, since depth N exists only by
    // virtue of a connection from depth N-1.
    let mut layers = Vec::with_capacity(depths.layer_count);
    let mut node_idx = input_count;
    let mut conn_idx = 0;
    for depth in 0..depths.layer_count {
        while node_idx < node_count && node_depths[node_idx] == depth {
            node_idx += 1;
        }
        while conn_idx < conn_count && node_depths[source_ids[conn_idx] as usize] == depth {
            conn_idx += 1;
        }
        layers.push(LayerInfo {
            end_node_index: node_idx,
            end_connection_index: conn_idx,
        });
    }

    let graph = AcyclicGraph {
        digraph: DirectedGraph::new(
            input_count,
            output_count,
            node_count,
            source_ids,
            target_ids,
        ),
        layers,
        output_node_indexes,
    };

    AcyclicBuild {
        graph,
        new_index_by_old,
        reorder_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::compute_node_depths;

    /// 2 inputs (0, 1), 1 output (2), 1 hidden (3): 0->2, 0->3, 1->3, 3->2.
    /// The hidden node is at depth 1 and the output at depth 2, so the
    /// rebuilt graph must place the hidden node before the output.
    fn layered_build() -> AcyclicBuild {
        let g = DirectedGraph::new(2, 1, 4, vec![0, 0, 1, 3], vec![2, 3, 3, 2]);
        let depths = compute_node_depths(&g, true);
        build_acyclic_graph(&g, &depths)
    }

    #[test]
    fn test_output_node_relocated_past_hidden() {
        let build = layered_build();
        // New order: inputs 0,1 then hidden (depth 1) then output (depth 2).
        assert_eq!(build.new_index_by_old, vec![0, 1, 3, 2]);
        assert_eq!(build.graph.output_node_indexes(), &[3]);
    }

    #[test]
    fn test_connections_grouped_by_source_depth() {
        let build = layered_build();
        let g = build.graph.digraph();
        // Depth-0 sources (inputs) first, then the hidden node's connection.
        assert_eq!(g.source_ids(), &[0, 0, 1, 2]);
        assert_eq!(g.target_ids(), &[2, 3, 2, 3]);
    }

    #[test]
    fn test_reorder_map_points_at_original_positions() {
        let build = layered_build();
        let original_pairs = [(0u32, 2u32), (0, 3), (1, 3), (3, 2)];
        let g = build.graph.digraph();
        for (new_pos, &old_pos) in build.reorder_map.iter().enumerate() {
            let (old_src, old_tgt) = original_pairs[old_pos as usize];
            assert_eq!(
                g.source_ids()[new_pos],
                build.new_index_by_old[old_src as usize]
            );
            assert_eq!(
                g.target_ids()[new_pos],
                build.new_index_by_old[old_tgt as usize]
            );
        }
    }

    #[test]
    fn test_layer_end_indexes() {
        let build = layered_build();
        let layers = build.graph.layers();
        assert_eq!(layers.len(), 3);
        // Layer 0: both inputs, three connections sourced from them.
        assert_eq!(
            layers[0],
            LayerInfo {
                end_node_index: 2,
                end_connection_index: 3
            }
        );
        // Layer 1: the hidden node and its single connection.
        assert_eq!(
            layers[1],
            LayerInfo {
                end_node_index: 3,
                end_connection_index: 4
            }
        );
        // Layer 2: the output node; no further connections.
        assert_eq!(
            layers[2],
            LayerInfo {
                end_node_index: 4,
                end_connection_index: 4
            }
        );
    }
}
