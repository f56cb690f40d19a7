//! The undirected interaction graph built from an edge list, and
//! connected component extraction shared with the model graphs.

use crate::edgelist::{EdgeList, Identifier, LoadError};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use thiserror::Error;

/// Error type for building a graph.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("{0}")]
    Load(#[from] LoadError),
    #[error("The edge list contains no usable edges.")]
    EmptyGraph,
}

/// A graph produced by one of the random models. Nodes are
/// labelled `0..n`.
pub type ModelGraph = UnGraph<usize, ()>;

/// An undirected, unweighted, simple graph of associations
/// between two kinds of identifiers (e.g. drugs and genes).
#[derive(Debug, Clone)]
pub struct InteractionGraph(pub UnGraph<Identifier, ()>);

/// Basic counts on an `InteractionGraph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// Nodes whose identifier carries the namespace prefix.
    pub prefixed_nodes: usize,
    /// Everything else.
    pub other_nodes: usize,
    pub components: usize,
    pub lcc_nodes: usize,
    pub lcc_edges: usize,
    /// Edges joining two nodes of the same namespace.
    pub same_namespace_edges: usize,
}

impl InteractionGraph {
    /// Read an edge list from disk and fold it into a graph.
    pub fn from_dsv<P: AsRef<Path>>(input: P, delimiter: u8) -> Result<Self, GraphError> {
        let edge_list = EdgeList::from_dsv(input, delimiter)?;
        Self::from_edge_list(&edge_list)
    }

    pub fn from_edge_list(edge_list: &EdgeList) -> Result<Self, GraphError> {
        Self::from_pairs(&edge_list.pairs)
    }

    /// Insert each pair as an undirected edge. Repeats (in either
    /// orientation) collapse to a single edge and self-pairs add
    /// their node but no edge.
    pub fn from_pairs(pairs: &[(Identifier, Identifier)]) -> Result<Self, GraphError> {
        // collect into nodes, sort, dedup so node order
        // doesn't depend on row order.
        let mut nodes: Vec<&Identifier> = pairs.iter().flat_map(|(a, b)| [a, b]).collect();
        nodes.sort();
        nodes.dedup();

        let mut graph = UnGraph::with_capacity(nodes.len(), pairs.len());
        let mut node_index_map = HashMap::with_capacity(nodes.len());

        for node in nodes {
            let node_index = graph.add_node(node.clone());
            node_index_map.insert(node, node_index);
        }

        let mut self_loops = 0;
        for (a, b) in pairs {
            if a == b {
                self_loops += 1;
                continue;
            }
            // both were inserted above.
            let (Some(&ia), Some(&ib)) = (node_index_map.get(a), node_index_map.get(b)) else {
                continue;
            };
            graph.update_edge(ia, ib, ());
        }

        if self_loops > 0 {
            log::warn!("Ignored {} self-associations in the edge list", self_loops);
        }
        if graph.edge_count() == 0 {
            return Err(GraphError::EmptyGraph);
        }

        log::info!(
            "Built graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(InteractionGraph(graph))
    }

    pub fn node_count(&self) -> usize {
        self.0.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.0.edge_count()
    }

    /// The largest connected component as its own graph.
    pub fn largest_component(&self) -> InteractionGraph {
        InteractionGraph(largest_component(&self.0))
    }

    /// Degree of every node, highest first, then by identifier.
    pub fn degree_distribution(&self) -> Vec<(&Identifier, usize)> {
        let graph = &self.0;
        let mut dist: Vec<(&Identifier, usize)> = graph
            .node_indices()
            .map(|n| (&graph[n], graph.neighbors(n).count()))
            .collect();
        dist.sort_by(|(a, da), (b, db)| db.cmp(da).then_with(|| a.cmp(b)));
        dist
    }

    /// Summarise the graph, splitting the nodes into two namespaces
    /// on `prefix`.
    pub fn stats(&self, prefix: &str) -> GraphStats {
        let graph = &self.0;
        let in_namespace = |n: NodeIndex| graph[n].starts_with(prefix);

        let prefixed_nodes = graph.node_indices().filter(|n| in_namespace(*n)).count();
        let same_namespace_edges = graph
            .edge_references()
            .filter(|e| in_namespace(e.source()) == in_namespace(e.target()))
            .count();

        if same_namespace_edges > 0 {
            log::warn!(
                "The input graph is not (fully) bipartite: {} edges join nodes of the same namespace.",
                same_namespace_edges
            );
        }

        let lcc = largest_component(graph);

        GraphStats {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            prefixed_nodes,
            other_nodes: graph.node_count() - prefixed_nodes,
            components: components(graph).len(),
            lcc_nodes: lcc.node_count(),
            lcc_edges: lcc.edge_count(),
            same_namespace_edges,
        }
    }
}

/// Partition the nodes into connected components by breadth first
/// search. Components come out in order of their lowest node index,
/// and the nodes of each component are sorted.
pub fn components<N, E>(graph: &UnGraph<N, E>) -> Vec<Vec<NodeIndex>> {
    let mut visited = vec![false; graph.node_count()];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for start in graph.node_indices() {
        if visited[start.index()] {
            continue;
        }
        visited[start.index()] = true;
        queue.push_back(start);

        let mut component = Vec::new();
        while let Some(node) = queue.pop_front() {
            component.push(node);
            for next in graph.neighbors(node) {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    queue.push_back(next);
                }
            }
        }
        component.sort();
        components.push(component);
    }
    components
}

/// Return a copy of the largest connected component, as an induced
/// subgraph.
///
/// When several components share the largest size, the one holding
/// the smallest node weight wins, so the choice never depends on
/// insertion order.
pub fn largest_component<N, E>(graph: &UnGraph<N, E>) -> UnGraph<N, E>
where
    N: Ord + Clone,
    E: Clone,
{
    let best = components(graph).into_iter().max_by(|a, b| {
        let smallest = |c: &[NodeIndex]| c.iter().map(|n| &graph[*n]).min();
        // reversed so the smaller identifier compares greater.
        a.len()
            .cmp(&b.len())
            .then_with(|| smallest(b).cmp(&smallest(a)))
    });

    let mut keep = vec![false; graph.node_count()];
    for node in best.unwrap_or_default() {
        keep[node.index()] = true;
    }

    // edges touching a dropped node are dropped with it.
    graph.filter_map(
        |n, w| keep[n.index()].then(|| w.clone()),
        |_, e| Some(e.clone()),
    )
}

/// `true` if every node can reach every other node. The empty graph
/// counts as connected.
pub fn is_connected<N, E>(graph: &UnGraph<N, E>) -> bool {
    components(graph).len() <= 1
}
