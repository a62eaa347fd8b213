//! Cycle detection for directed graphs.

use crate::graph::DirectedGraph;

const WHITE: u8 = 0; // not yet visited
const GREY: u8 = 1; // on the current traversal path
const BLACK: u8 = 2; // fully explored

/// Test if the graph contains a cycle.
///
/// Iterative depth-first traversal with an explicit stack; recursion depth
/// would otherwise be bounded only by the node count.
#[must_use]
pub fn is_cyclic(digraph: &DirectedGraph) -> bool {
    let mut state = vec![WHITE; digraph.node_count()];
    // (node index, index of the next connection to traverse from it)
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(16);

    for root in 0..digraph.node_count() {
        if state[root] != WHITE {
            continue;
        }
        state[root] = GREY;
        stack.push((root, digraph.first_connection(root).unwrap_or(usize::MAX)));

        while let Some(top) = stack.last_mut() {
            let (node, conn) = *top;
            // Find the next connection leaving `node`; the connection array is
            // sorted by source, so its segment is contiguous.
            if conn >= digraph.connection_count() || digraph.source_ids()[conn] as usize != node {
                state[node] = BLACK;
                stack.pop();
                continue;
            }
            top.1 = conn + 1;

            let target = digraph.target_ids()[conn] as usize;
            match state[target] {
                GREY => return true,
                WHITE => {
                    state[target] = GREY;
                    stack.push((
                        target,
                        digraph.first_connection(target).unwrap_or(usize::MAX),
                    ));
                }
                _ => {}
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acyclic_graph_passes() {
        // 0->2, 0->3, 3->2
        let g = DirectedGraph::new(2, 1, 4, vec![0, 0, 3], vec![2, 3, 2]);
        assert!(!is_cyclic(&g));
    }

    #[test]
    fn test_two_node_cycle_detected() {
        // 2->3, 3->2
        let g = DirectedGraph::new(1, 1, 4, vec![2, 3], vec![3, 2]);
        assert!(is_cyclic(&g));
    }

    #[test]
    fn test_self_loop_detected() {
        let g = DirectedGraph::new(1, 1, 3, vec![2], vec![2]);
        assert!(is_cyclic(&g));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        // 0->1, 0->2, 1->3, 2->3: two paths converge without forming a cycle
        let g = DirectedGraph::new(1, 1, 4, vec![0, 0, 1, 2], vec![1, 2, 3, 3]);
        assert!(!is_cyclic(&g));
    }

    #[test]
    fn test_empty_graph_passes() {
        let g = DirectedGraph::new(1, 1, 2, vec![], vec![]);
        assert!(!is_cyclic(&g));
    }
}
