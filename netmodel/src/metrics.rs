//! Descriptive metrics on undirected graphs: degree, clustering and
//! path length.
//!
//! Everything here is generic over the node and edge weights, so the
//! same code measures the empirical graph and the model graphs.

use crate::graph::largest_component;
use petgraph::graph::{NodeIndex, UnGraph};
use rayon::prelude::*;
use serde_derive::Serialize;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// Error type for metrics which are undefined on a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("The metric is undefined on a graph with no nodes.")]
    EmptyGraph,
    #[error("Average shortest path length is only defined on a connected graph.")]
    Disconnected,
}

/// The descriptors of one graph. Degree and clustering are computed
/// on the whole graph, path length on its largest connected component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsResult {
    pub node_count: usize,
    pub edge_count: usize,
    pub average_degree: f64,
    pub average_clustering: f64,
    pub average_shortest_path_length: f64,
    pub lcc_node_count: usize,
    pub lcc_edge_count: usize,
}

impl MetricsResult {
    /// Measure a graph.
    pub fn measure<N, E>(graph: &UnGraph<N, E>) -> Result<Self, MetricError>
    where
        N: Ord + Clone + Sync,
        E: Clone + Sync,
    {
        let lcc = largest_component(graph);

        Ok(MetricsResult {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            average_degree: average_degree(graph)?,
            average_clustering: average_clustering(graph)?,
            average_shortest_path_length: average_shortest_path_length(&lcc)?,
            lcc_node_count: lcc.node_count(),
            lcc_edge_count: lcc.edge_count(),
        })
    }
}

/// The degree of each node, in node index order.
pub fn degree_sequence<N, E>(graph: &UnGraph<N, E>) -> Vec<usize> {
    graph
        .node_indices()
        .map(|n| graph.neighbors(n).count())
        .collect()
}

/// Sum of the degrees over the number of nodes.
pub fn average_degree<N, E>(graph: &UnGraph<N, E>) -> Result<f64, MetricError> {
    if graph.node_count() == 0 {
        return Err(MetricError::EmptyGraph);
    }
    let total: usize = degree_sequence(graph).iter().sum();
    Ok(total as f64 / graph.node_count() as f64)
}

/// Fraction of the pairs of neighbours of `node` which are themselves
/// connected. Zero for nodes with fewer than two neighbours.
pub fn local_clustering<N, E>(graph: &UnGraph<N, E>, node: NodeIndex) -> f64 {
    let neighbours: HashSet<NodeIndex> = graph.neighbors(node).filter(|n| *n != node).collect();
    let degree = neighbours.len();
    if degree < 2 {
        return 0.0;
    }

    // every triangle through `node` is seen once from each end.
    let links: usize = neighbours
        .iter()
        .map(|u| {
            graph
                .neighbors(*u)
                .filter(|w| neighbours.contains(w))
                .count()
        })
        .sum();
    let triangles = links / 2;

    (2 * triangles) as f64 / (degree * (degree - 1)) as f64
}

/// Mean local clustering coefficient over all nodes.
pub fn average_clustering<N, E>(graph: &UnGraph<N, E>) -> Result<f64, MetricError>
where
    N: Sync,
    E: Sync,
{
    if graph.node_count() == 0 {
        return Err(MetricError::EmptyGraph);
    }
    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    let coefficients: Vec<f64> = nodes
        .par_iter()
        .map(|n| local_clustering(graph, *n))
        .collect();
    // summed in node order so the result is the same on every run.
    let total: f64 = coefficients.iter().sum();
    Ok(total / graph.node_count() as f64)
}

/// Mean shortest path length over all ordered pairs of distinct nodes.
///
/// Only defined when the graph is connected, so callers pass the
/// largest connected component. A disconnected graph is an error, a
/// single node gives zero.
pub fn average_shortest_path_length<N, E>(graph: &UnGraph<N, E>) -> Result<f64, MetricError>
where
    N: Sync,
    E: Sync,
{
    let n = graph.node_count();
    match n {
        0 => return Err(MetricError::EmptyGraph),
        1 => return Ok(0.0),
        _ => (),
    }

    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    let total = nodes
        .par_iter()
        .map(|source| {
            let (sum, reached) = bfs_distances(graph, *source);
            if reached == n {
                Ok(sum)
            } else {
                Err(MetricError::Disconnected)
            }
        })
        .try_reduce(|| 0, |a, b| Ok(a + b))?;

    Ok(total as f64 / (n * (n - 1)) as f64)
}

/// Breadth first search from `source`: returns the sum of the
/// distances to every reachable node and the number of nodes reached
/// (including `source`).
fn bfs_distances<N, E>(graph: &UnGraph<N, E>, source: NodeIndex) -> (u64, usize) {
    let mut dist: Vec<Option<u64>> = vec![None; graph.node_count()];
    let mut queue = VecDeque::new();
    dist[source.index()] = Some(0);
    queue.push_back(source);

    let mut sum = 0;
    let mut reached = 0;
    while let Some(node) = queue.pop_front() {
        let d = dist[node.index()].unwrap_or_default();
        sum += d;
        reached += 1;
        for next in graph.neighbors(node) {
            if dist[next.index()].is_none() {
                dist[next.index()] = Some(d + 1);
                queue.push_back(next);
            }
        }
    }
    (sum, reached)
}
