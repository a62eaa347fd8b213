//! Deep structural audit of genomes, for debug builds only.
//!
//! Runs on every genome construction in debug builds and aborts on
//! detected corruption; release builds skip it entirely, so it never
//! affects behavior.

use crate::genome::Genome;
use crate::graph::LayerInfo;
use crate::scalar::Scalar;

/// Assert every structural invariant of a freshly built genome.
///
/// # Panics
///
/// Panics on any violated invariant.
pub(crate) fn assert_valid<W: Scalar>(genome: &Genome<W>) {
    let metadata = genome.metadata();
    let connections = genome.connections();
    let io_count = u32::try_from(metadata.io_count()).expect("node count exceeds u32 range");

    // Connection genes sorted by (source, target) id.
    assert!(connections.is_sorted(), "connection genes are not sorted");

    // Hidden node id array must be exactly the derived set.
    assert!(
        connections.validate_hidden_node_ids(genome.hidden_node_ids(), io_count),
        "hidden node id array does not match connection endpoints"
    );

    // Node counts must agree across the map and the graph view.
    let total_nodes = metadata.io_count() + genome.hidden_node_ids().len();
    let digraph = genome.graph().digraph();
    assert_eq!(genome.node_map().len(), total_nodes);
    assert_eq!(digraph.node_count(), total_nodes);
    assert_eq!(digraph.input_count(), metadata.input_count());
    assert_eq!(digraph.output_count(), metadata.output_count());
    assert_eq!(digraph.connection_count(), connections.len());

    if metadata.is_acyclic() {
        assert_acyclic_form(genome);
    } else {
        assert_cyclic_form(genome);
    }
}

/// Cyclic genomes: no reorder map; graph connections mirror the genome's
/// position for position.
fn assert_cyclic_form<W: Scalar>(genome: &Genome<W>) {
    assert!(
        genome.reorder_map().is_none(),
        "cyclic genome carries a reorder map"
    );

    let digraph = genome.graph().digraph();
    let node_map = genome.node_map();
    for i in 0..genome.connections().len() {
        let (src_id, tgt_id, _) = genome.connections().get(i);
        assert_eq!(node_map.map(src_id), digraph.source_ids()[i]);
        assert_eq!(node_map.map(tgt_id), digraph.target_ids()[i]);
    }
}

/// Acyclic genomes: reorder map is a permutation relating graph positions
/// to genome positions, and node depths are consistent with connection
/// direction.
fn assert_acyclic_form<W: Scalar>(genome: &Genome<W>) {
    let acyclic = genome
        .graph()
        .acyclic()
        .expect("acyclic genome must carry the acyclic graph subtype");
    let reorder = genome
        .reorder_map()
        .expect("acyclic genome must carry a reorder map");
    let connections = genome.connections();
    let digraph = acyclic.digraph();

    // The reorder map is a permutation of the genome connection indexes.
    assert_eq!(reorder.len(), connections.len());
    let mut seen = vec![false; reorder.len()];
    for &genome_idx in reorder.as_ref() {
        let idx = genome_idx as usize;
        assert!(idx < seen.len(), "reorder map index out of range");
        assert!(!seen[idx], "reorder map repeats an index");
        seen[idx] = true;
    }

    // Layer end indexes are monotonic; the last layer sources no
    // connections.
    let layers = acyclic.layers();
    assert!(!layers.is_empty());
    for pair in layers.windows(2) {
        assert!(pair[0].end_node_index < pair[1].end_node_index);
        assert!(pair[0].end_connection_index <= pair[1].end_connection_index);
    }
    assert_eq!(
        layers[layers.len() - 1].end_connection_index,
        digraph.connection_count()
    );

    // Per-connection consistency: endpoints map through the node id map and
    // the reorder map; depth increases along every connection, except that
    // non-input layer-zero nodes (unreachable from any input) may source
    // connections to any deeper-or-equal-unreachable node.
    let node_depths = depths_from_layers(layers, digraph.node_count());
    let node_map = genome.node_map();
    let input_count = u32::try_from(digraph.input_count()).expect("node count exceeds u32 range");

    for graph_pos in 0..digraph.connection_count() {
        let genome_idx = reorder[graph_pos] as usize;
        let (src_id, tgt_id, _) = connections.get(genome_idx);
        let src = digraph.source_ids()[graph_pos];
        let tgt = digraph.target_ids()[graph_pos];
        assert_eq!(node_map.map(src_id), src);
        assert_eq!(node_map.map(tgt_id), tgt);

        let src_depth = node_depths[src as usize];
        let tgt_depth = node_depths[tgt as usize];
        if src_depth > 0 {
            assert!(tgt_depth > src_depth, "node depth does not increase along connection");
        } else {
            assert!(
                src >= input_count || tgt_depth > 0,
                "input node sources a connection into layer zero"
            );
        }
    }
}

/// Reconstruct per-node depths from cumulative layer end indexes.
fn depths_from_layers(layers: &[LayerInfo], node_count: usize) -> Vec<usize> {
    let mut depths = vec![0usize; node_count];
    let mut node = 0;
    for (layer_idx, info) in layers.iter().enumerate() {
        while node < info.end_node_index {
            depths[node] = layer_idx;
            node += 1;
        }
    }
    depths
}
