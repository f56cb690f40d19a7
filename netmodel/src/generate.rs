//! Random graph generators for the four model families.
//!
//! Every generator takes its randomness as an argument, so a seeded
//! `StdRng` gives the same graph every time. Model graphs have nodes
//! labelled `0..n`, and node `i` sits at node index `i`.

use crate::graph::ModelGraph;
use crate::models::{ModelError, ModelFamily, ModelParameters};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Geometric};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// How many times the pairing model may restart before giving up.
pub const REGULAR_MAX_ATTEMPTS: usize = 1000;

/// Generate a model graph from its parameters.
pub fn generate<R: Rng>(
    params: &ModelParameters,
    rng: &mut R,
) -> Result<ModelGraph, ModelError> {
    params.check()?;

    let graph = match *params {
        ModelParameters::ErdosRenyi { n, p } => erdos_renyi(n, p, rng)?,
        ModelParameters::BarabasiAlbert { n, m } => barabasi_albert(n, m, rng),
        ModelParameters::WattsStrogatz { n, k, rewire_prob } => {
            watts_strogatz(n, k, rewire_prob, rng)
        }
        ModelParameters::Regular { n, k } => random_regular(n, k, rng)?,
    };

    log::debug!(
        "Generated {} graph with {} nodes and {} edges",
        params.family(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// A graph on `n` isolated nodes.
fn empty_graph(n: usize, edges: usize) -> ModelGraph {
    let mut graph = UnGraph::with_capacity(n, edges);
    for i in 0..n {
        graph.add_node(i);
    }
    graph
}

fn complete_graph(n: usize) -> ModelGraph {
    let mut graph = empty_graph(n, n * n.saturating_sub(1) / 2);
    for u in 0..n {
        for v in (u + 1)..n {
            graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }
    }
    graph
}

/// `G(n, p)`: every unordered pair of nodes is joined independently
/// with probability `p`.
///
/// Instead of drawing once per pair, the gap to the next success is
/// drawn from a geometric distribution and the pairs in between are
/// skipped.
pub fn erdos_renyi<R: Rng>(n: usize, p: f64, rng: &mut R) -> Result<ModelGraph, ModelError> {
    // below f64 resolution 1 - p == 1 and no pair is ever joined.
    if p <= 0.0 || 1.0 - p == 1.0 {
        return Ok(empty_graph(n, 0));
    }
    if p >= 1.0 {
        return Ok(complete_graph(n));
    }

    let distr = Geometric::new(p).map_err(|e| ModelError::GenerationFailed {
        family: ModelFamily::ErdosRenyi,
        reason: format!("p = {p}: {e}"),
    })?;

    let expected = (p * (n * n.saturating_sub(1)) as f64 / 2.0) as usize;
    let mut graph = empty_graph(n, expected);

    // walk the lower triangle in row order, (v, w) is the next
    // candidate pair with w < v.
    let n = n as u64;
    let (mut v, mut w): (u64, u64) = (1, 0);
    loop {
        let mut skip = distr.sample(rng);
        while v < n && skip >= v - w {
            skip -= v - w;
            w = 0;
            v += 1;
        }
        if v >= n {
            break;
        }
        w += skip;
        graph.add_edge(NodeIndex::new(v as usize), NodeIndex::new(w as usize), ());
        w += 1;
    }
    Ok(graph)
}

/// Preferential attachment. Starts from a star on `m + 1` nodes, then
/// each new node joins `m` distinct existing nodes picked with
/// probability proportional to their degree.
pub fn barabasi_albert<R: Rng>(n: usize, m: usize, rng: &mut R) -> ModelGraph {
    let mut graph = empty_graph(n, m * n);
    let seed_size = (m + 1).min(n);

    // every node appears once per edge end, so a uniform pick
    // from here is a degree-proportional pick.
    let mut repeated_nodes: Vec<usize> = Vec::with_capacity(2 * m * n);
    for leaf in 1..seed_size {
        graph.add_edge(NodeIndex::new(0), NodeIndex::new(leaf), ());
        repeated_nodes.push(0);
        repeated_nodes.push(leaf);
    }

    let mut targets: Vec<usize> = Vec::with_capacity(m);
    for source in seed_size..n {
        targets.clear();
        while targets.len() < m {
            let x = repeated_nodes[rng.random_range(0..repeated_nodes.len())];
            if !targets.contains(&x) {
                targets.push(x);
            }
        }
        for &target in &targets {
            graph.add_edge(NodeIndex::new(source), NodeIndex::new(target), ());
            repeated_nodes.push(target);
            repeated_nodes.push(source);
        }
    }
    graph
}

/// Small world graph: a ring lattice where each node is joined to its
/// `k / 2` nearest neighbours on either side, after which each lattice
/// edge `(u, v)` is, with probability `rewire_prob`, replaced by
/// `(u, w)` for a uniformly chosen `w` that is neither `u` nor
/// already adjacent to `u`.
pub fn watts_strogatz<R: Rng>(
    n: usize,
    k: usize,
    rewire_prob: f64,
    rng: &mut R,
) -> ModelGraph {
    if k >= n {
        return complete_graph(n);
    }

    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let half = k / 2;
    for j in 1..=half {
        for u in 0..n {
            let v = (u + j) % n;
            adjacency[u].insert(v);
            adjacency[v].insert(u);
        }
    }

    for j in 1..=half {
        for u in 0..n {
            let v = (u + j) % n;
            if rng.random::<f64>() >= rewire_prob {
                continue;
            }
            // the lattice edge may already have been rewired away from
            // the other end; nothing left to move then.
            if !adjacency[u].contains(&v) {
                continue;
            }
            // u is joined to everyone, there is nowhere to go.
            if adjacency[u].len() >= n - 1 {
                continue;
            }
            let w = loop {
                let w = rng.random_range(0..n);
                if w != u && !adjacency[u].contains(&w) {
                    break w;
                }
            };
            adjacency[u].remove(&v);
            adjacency[v].remove(&u);
            adjacency[u].insert(w);
            adjacency[w].insert(u);
        }
    }

    from_adjacency(&adjacency)
}

fn from_adjacency(adjacency: &[BTreeSet<usize>]) -> ModelGraph {
    let edges: usize = adjacency.iter().map(|a| a.len()).sum::<usize>() / 2;
    let mut graph = empty_graph(adjacency.len(), edges);
    for (u, neighbours) in adjacency.iter().enumerate() {
        for &v in neighbours.range((u + 1)..) {
            graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }
    }
    graph
}

/// A random `k`-regular graph on `n` nodes, by the pairing model.
///
/// Each node gets `k` stubs, which are shuffled and paired off.
/// Pairs which would make a self-loop or a repeated edge are put back
/// and paired again among themselves; if no legal pair is left among
/// them, the whole attempt starts over.
pub fn random_regular<R: Rng>(
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<ModelGraph, ModelError> {
    ModelParameters::Regular { n, k }.check()?;
    if k == 0 {
        return Ok(empty_graph(n, 0));
    }

    for attempt in 1..=REGULAR_MAX_ATTEMPTS {
        if let Some(mut edges) = try_pairing(n, k, rng) {
            log::debug!("Paired a {}-regular graph on attempt {}", k, attempt);
            let mut graph = empty_graph(n, edges.len());
            edges.sort_unstable();
            for (u, v) in edges {
                graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
            }
            return Ok(graph);
        }
    }

    Err(ModelError::GenerationFailed {
        family: ModelFamily::Regular,
        reason: format!("no simple pairing found in {REGULAR_MAX_ATTEMPTS} attempts"),
    })
}

fn try_pairing<R: Rng>(n: usize, k: usize, rng: &mut R) -> Option<Vec<(usize, usize)>> {
    let mut edges: HashSet<(usize, usize)> = HashSet::with_capacity(n * k / 2);
    let mut stubs: Vec<usize> = (0..n).flat_map(|node| std::iter::repeat(node).take(k)).collect();

    while !stubs.is_empty() {
        // stubs that failed to pair, per node
        let mut leftover: BTreeMap<usize, usize> = BTreeMap::new();
        stubs.shuffle(rng);

        for pair in stubs.chunks_exact(2) {
            let (s1, s2) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
            if s1 != s2 && edges.insert((s1, s2)) {
                continue;
            }
            *leftover.entry(s1).or_default() += 1;
            *leftover.entry(s2).or_default() += 1;
        }

        if !can_still_pair(&edges, &leftover) {
            return None;
        }
        stubs = leftover
            .iter()
            .flat_map(|(&node, &count)| std::iter::repeat(node).take(count))
            .collect();
    }

    Some(edges.into_iter().collect())
}

/// `true` if some two distinct nodes with leftover stubs are not yet
/// joined.
fn can_still_pair(edges: &HashSet<(usize, usize)>, leftover: &BTreeMap<usize, usize>) -> bool {
    if leftover.is_empty() {
        return true;
    }
    let nodes: Vec<usize> = leftover.keys().copied().collect();
    for (i, &s2) in nodes.iter().enumerate() {
        for &s1 in &nodes[..i] {
            // keys are sorted, so s1 < s2
            if !edges.contains(&(s1, s2)) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::is_connected;
    use crate::metrics::{average_clustering, degree_sequence};
    use petgraph::visit::EdgeRef;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// No self-loops, no repeated edges and node `i` labelled `i`.
    fn assert_simple(graph: &ModelGraph, n: usize) {
        assert_eq!(graph.node_count(), n);
        for node in graph.node_indices() {
            assert_eq!(graph[node], node.index());
        }
        let mut seen = HashSet::new();
        for e in graph.edge_references() {
            let (a, b) = (e.source().index(), e.target().index());
            assert_ne!(a, b, "self-loop on {a}");
            assert!(seen.insert((a.min(b), a.max(b))), "repeated edge {a}-{b}");
        }
    }

    fn edge_list(graph: &ModelGraph) -> Vec<(usize, usize)> {
        graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .collect()
    }

    #[test]
    fn test_erdos_renyi_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        let none = erdos_renyi(30, 0.0, &mut rng).unwrap();
        assert_simple(&none, 30);
        assert_eq!(none.edge_count(), 0);

        let all = erdos_renyi(30, 1.0, &mut rng).unwrap();
        assert_simple(&all, 30);
        assert_eq!(all.edge_count(), 30 * 29 / 2);
    }

    #[test]
    fn test_erdos_renyi_below_float_resolution_is_edgeless() {
        let params = ModelParameters::ErdosRenyi { n: 10, p: 1e-18 };
        assert!(params.check().is_ok());
        let graph = generate(&params, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_simple(&graph, 10);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_erdos_renyi_tiny_p_stays_in_bounds() {
        // large geometric jumps run off the end of the triangle
        let mut rng = StdRng::seed_from_u64(9);
        for p in [1e-12, 1e-6] {
            let graph = erdos_renyi(200, p, &mut rng).unwrap();
            assert_simple(&graph, 200);
        }
    }

    #[test]
    fn test_erdos_renyi_edge_frequency_matches_p() {
        let mut rng = StdRng::seed_from_u64(42);
        let (n, p, trials) = (100, 0.1, 30);
        let pairs = (n * (n - 1) / 2) as f64;

        let mut total = 0;
        for _ in 0..trials {
            let graph = erdos_renyi(n, p, &mut rng).unwrap();
            assert_simple(&graph, n);
            total += graph.edge_count();
        }
        let observed = total as f64 / (trials as f64 * pairs);
        assert!(
            (observed - p).abs() < 0.01,
            "observed edge frequency {observed} too far from {p}"
        );
    }

    #[test]
    fn test_erdos_renyi_uses_calibrated_p() {
        // calibrated p is e / n(n-1): a complete graph calibrates to 0.5
        let params = ModelFamily::ErdosRenyi.calibrate(40, 780).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut total = 0;
        for _ in 0..20 {
            total += generate(&params, &mut rng).unwrap().edge_count();
        }
        let mean = total as f64 / 20.0;
        // expect about half of the 780 possible edges
        assert!((mean - 390.0).abs() < 20.0, "mean edge count {mean}");
    }

    #[test]
    fn test_barabasi_albert() {
        let mut rng = StdRng::seed_from_u64(3);
        for (n, m) in [(50, 1), (50, 3), (4, 3)] {
            let graph = barabasi_albert(n, m, &mut rng);
            assert_simple(&graph, n);
            // star of m edges, then m per added node
            assert_eq!(graph.edge_count(), m + m * (n - m - 1));
            assert!(is_connected(&graph));
            assert!(degree_sequence(&graph).iter().all(|d| *d >= 1));
        }
    }

    #[test]
    fn test_watts_strogatz_lattice_without_rewiring() {
        let mut rng = StdRng::seed_from_u64(5);
        let graph = watts_strogatz(20, 4, 0.0, &mut rng);
        assert_simple(&graph, 20);
        assert!(degree_sequence(&graph).iter().all(|d| *d == 4));
        // a ring lattice has clustering 3(k - 2) / 4(k - 1) = 0.5 for k = 4
        assert_eq!(average_clustering(&graph).unwrap(), 0.5);
    }

    #[test]
    fn test_watts_strogatz_rewiring_keeps_edge_count() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            let graph = watts_strogatz(60, 6, 0.1, &mut rng);
            assert_simple(&graph, 60);
            assert_eq!(graph.edge_count(), 60 * 6 / 2);
        }
        // everything rewired, still simple
        let graph = watts_strogatz(30, 2, 1.0, &mut rng);
        assert_simple(&graph, 30);
        assert_eq!(graph.edge_count(), 30);
    }

    #[test]
    fn test_watts_strogatz_odd_calibration_uses_even_k() {
        // raw 2e / n = 5 on ten nodes, used as 6
        let params = ModelFamily::WattsStrogatz.calibrate(10, 25).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let graph = generate(&params, &mut rng).unwrap();
        assert_eq!(graph.edge_count(), 10 * 6 / 2);
    }

    #[test]
    fn test_watts_strogatz_k_equal_n_is_complete() {
        let mut rng = StdRng::seed_from_u64(0);
        let graph = watts_strogatz(6, 6, 0.1, &mut rng);
        assert_eq!(graph.edge_count(), 15);
    }

    #[test]
    fn test_random_regular() {
        let mut rng = StdRng::seed_from_u64(9);
        for (n, k) in [(10, 2), (20, 4), (8, 3), (12, 3), (30, 5)] {
            let graph = random_regular(n, k, &mut rng).unwrap();
            assert_simple(&graph, n);
            assert!(
                degree_sequence(&graph).iter().all(|d| *d == k),
                "not {k}-regular on {n} nodes"
            );
        }
    }

    #[test]
    fn test_random_regular_infeasible() {
        let mut rng = StdRng::seed_from_u64(9);
        let err = random_regular(5, 3, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Infeasible {
                family: ModelFamily::Regular,
                ..
            }
        ));
        let err = random_regular(4, 4, &mut rng).unwrap_err();
        assert!(matches!(err, ModelError::Infeasible { .. }));

        let err = generate(&ModelParameters::Regular { n: 5, k: 3 }, &mut rng).unwrap_err();
        assert!(matches!(err, ModelError::Infeasible { .. }));
    }

    #[test]
    fn test_same_seed_same_graph() {
        for params in [
            ModelParameters::ErdosRenyi { n: 50, p: 0.1 },
            ModelParameters::BarabasiAlbert { n: 50, m: 2 },
            ModelParameters::WattsStrogatz {
                n: 50,
                k: 4,
                rewire_prob: 0.1,
            },
            ModelParameters::Regular { n: 50, k: 4 },
        ] {
            let a = generate(&params, &mut StdRng::seed_from_u64(123)).unwrap();
            let b = generate(&params, &mut StdRng::seed_from_u64(123)).unwrap();
            assert_eq!(edge_list(&a), edge_list(&b), "{} differs", params.family());
        }
    }
}
