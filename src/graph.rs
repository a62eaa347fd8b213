//! Directed graph representations of genome connectivity.
//!
//! A genome's connection genes are reified into a [`DirectedGraph`] over
//! dense node indexes. For feed-forward (acyclic) evolution the graph is
//! further analyzed into depth layers and rebuilt as an [`AcyclicGraph`]
//! whose connections are ordered depth-major, ready for layer-by-layer
//! decoding.

mod acyclic;
mod cycle;
mod depth;
mod digraph;

pub use acyclic::{AcyclicBuild, AcyclicGraph, LayerInfo, build_acyclic_graph};
pub use cycle::is_cyclic;
pub use depth::{GraphDepths, compute_node_depths};
pub use digraph::DirectedGraph;
