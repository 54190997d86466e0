use petgraph::{algo::tarjan_scc, graph::NodeIndex, stable_graph::StableGraph, EdgeType};
use std::collections::HashSet;

pub fn induced_subgraph<N: Clone, E: Clone, Ty: EdgeType, S: std::hash::BuildHasher>(
    graph: &StableGraph<N, E, Ty>,
    nodes: &HashSet<NodeIndex, S>,
) -> StableGraph<N, E, Ty> {
    graph.filter_map(
        |i, n| {
            if nodes.contains(&i) {
                Some(n.clone())
            } else {
                None
            }
        },
        |_, e| Some(e.clone()),
    )
}

/// True iff every node can reach every other node. The empty graph counts as connected.
pub fn is_strongly_connected<N, E, Ty: EdgeType>(graph: &StableGraph<N, E, Ty>) -> bool {
    tarjan_scc(graph).len() <= 1
}
