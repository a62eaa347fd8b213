//! Dense-index directed graph.

use std::fmt;

/// Sentinel meaning a node has no outgoing connections.
const NO_CONNECTION: usize = usize::MAX;

/// A directed graph over dense node indexes.
///
/// Node indexes run from `0` to `node_count - 1`: input nodes occupy
/// `[0, input_count)`, output nodes follow, and hidden nodes fill the
/// remainder. The graph is described by two parallel arrays of connection
/// source and target indexes, sorted ascending by (source, target); all
/// connections leaving a node therefore form a contiguous segment, the start
/// of which is precomputed per node.
pub struct DirectedGraph {
    input_count: usize,
    output_count: usize,
    node_count: usize,
    source_ids: Vec<u32>,
    target_ids: Vec<u32>,
    first_conn_by_node: Vec<usize>,
}

impl DirectedGraph {
    /// Construct a graph from sorted connection endpoint arrays.
    ///
    /// # Panics
    ///
    /// Panics if the endpoint arrays differ in length, refer to a node index
    /// `>= node_count`, or are not sorted ascending by (source, target).
    #[must_use]
    pub fn new(
        input_count: usize,
        output_count: usize,
        node_count: usize,
        source_ids: Vec<u32>,
        target_ids: Vec<u32>,
    ) -> Self {
        assert_eq!(
            source_ids.len(),
            target_ids.len(),
            "connection endpoint arrays must have equal length"
        );
        assert!(input_count + output_count <= node_count);
        assert!(
            source_ids
                .iter()
                .chain(target_ids.iter())
                .all(|&id| (id as usize) < node_count),
            "connection endpoint refers to a node index out of range"
        );
        assert!(
            source_ids
                .iter()
                .zip(target_ids.iter())
                .zip(source_ids.iter().zip(target_ids.iter()).skip(1))
                .all(|(a, b)| a <= b),
            "connections must be sorted by (source, target)"
        );

        let first_conn_by_node = compile_first_connection_indexes(node_count, &source_ids);

        Self {
            input_count,
            output_count,
            node_count,
            source_ids,
            target_ids,
            first_conn_by_node,
        }
    }

    /// The number of input nodes.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// The number of output nodes.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// The total number of nodes, including hidden nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// The number of connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.source_ids.len()
    }

    /// Connection source node indexes, sorted ascending.
    #[must_use]
    pub fn source_ids(&self) -> &[u32] {
        &self.source_ids
    }

    /// Connection target node indexes, aligned with [`Self::source_ids`].
    #[must_use]
    pub fn target_ids(&self) -> &[u32] {
        &self.target_ids
    }

    /// The index of the first connection leaving `node_idx`, if any.
    #[must_use]
    pub fn first_connection(&self, node_idx: usize) -> Option<usize> {
        match self.first_conn_by_node[node_idx] {
            NO_CONNECTION => None,
            idx => Some(idx),
        }
    }

    /// The target node indexes of all connections leaving `node_idx`.
    #[must_use]
    pub fn targets_of(&self, node_idx: usize) -> &[u32] {
        let Some(start) = self.first_connection(node_idx) else {
            return &[];
        };
        let node = self.source_ids[start];
        let mut end = start + 1;
        while end < self.source_ids.len() && self.source_ids[end] == node {
            end += 1;
        }
        &self.target_ids[start..end]
    }
}

impl fmt::Debug for DirectedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectedGraph")
            .field("input_count", &self.input_count)
            .field("output_count", &self.output_count)
            .field("node_count", &self.node_count)
            .field("connection_count", &self.source_ids.len())
            .finish_non_exhaustive()
    }
}

/// For each node, find the index of the first connection that has the node
/// as its source, relying on the (source, target) sort order.
fn compile_first_connection_indexes(node_count: usize, source_ids: &[u32]) -> Vec<usize> {
    let mut first = vec![NO_CONNECTION; node_count];
    for (conn_idx, &src) in source_ids.iter().enumerate() {
        if first[src as usize] == NO_CONNECTION {
            first[src as usize] = conn_idx;
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> DirectedGraph {
        // 2 inputs (0, 1), 1 output (2), 1 hidden (3)
        // 0->3, 1->2, 1->3, 3->2
        DirectedGraph::new(2, 1, 4, vec![0, 1, 1, 3], vec![3, 2, 3, 2])
    }

    #[test]
    fn test_first_connection_indexes() {
        let g = sample_graph();
        assert_eq!(g.first_connection(0), Some(0));
        assert_eq!(g.first_connection(1), Some(1));
        assert_eq!(g.first_connection(2), None);
        assert_eq!(g.first_connection(3), Some(3));
    }

    #[test]
    fn test_targets_of() {
        let g = sample_graph();
        assert_eq!(g.targets_of(1), &[2, 3]);
        assert_eq!(g.targets_of(2), &[] as &[u32]);
        assert_eq!(g.targets_of(3), &[2]);
    }

    #[test]
    #[should_panic(expected = "equal length")]
    fn test_mismatched_arrays_rejected() {
        let _ = DirectedGraph::new(1, 1, 2, vec![0], vec![]);
    }

    #[test]
    #[should_panic(expected = "sorted")]
    fn test_unsorted_connections_rejected() {
        let _ = DirectedGraph::new(1, 1, 3, vec![1, 0], vec![2, 2]);
    }
}
