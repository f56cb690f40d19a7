//! The four random graph families an empirical graph is compared to,
//! and how their construction parameters are derived from the
//! empirical node and edge counts.

use serde_derive::Serialize;
use std::fmt;
use thiserror::Error;

use crate::metrics::MetricError;

/// Fraction of ring edges rewired in the Watts-Strogatz model.
pub const WS_REWIRE_PROB: f64 = 0.1;

/// Error type for building a model graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Infeasible {family} parameters: {reason}")]
    Infeasible { family: ModelFamily, reason: String },
    #[error("Could not generate a {family} graph: {reason}")]
    GenerationFailed { family: ModelFamily, reason: String },
    #[error("Could not measure the {family} graph: {source}")]
    Metric {
        family: ModelFamily,
        source: MetricError,
    },
}

/// The random graph families, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ModelFamily {
    ErdosRenyi,
    BarabasiAlbert,
    WattsStrogatz,
    Regular,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::ErdosRenyi,
        ModelFamily::BarabasiAlbert,
        ModelFamily::WattsStrogatz,
        ModelFamily::Regular,
    ];

    /// The label the family is reported under.
    pub fn label(&self) -> &'static str {
        match self {
            ModelFamily::ErdosRenyi => "Erdős-Rényi",
            ModelFamily::BarabasiAlbert => "Barabási-Albert",
            ModelFamily::WattsStrogatz => "Watts-Strogatz",
            ModelFamily::Regular => "Regular",
        }
    }

    /// Derive this family's parameters from the empirical graph.
    pub fn calibrate(&self, nodes: usize, edges: usize) -> Result<ModelParameters, ModelError> {
        let params = match self {
            ModelFamily::ErdosRenyi => {
                let p = if nodes < 2 {
                    f64::NAN
                } else {
                    // over n(n - 1) rather than the n(n - 1)/2 undirected
                    // pairs, so p is half the empirical density.
                    edges as f64 / (nodes * (nodes - 1)) as f64
                };
                ModelParameters::ErdosRenyi { n: nodes, p }
            }
            ModelFamily::BarabasiAlbert => {
                let m = round_half_even(edges as f64 / nodes as f64).max(1);
                ModelParameters::BarabasiAlbert { n: nodes, m }
            }
            ModelFamily::WattsStrogatz => ModelParameters::WattsStrogatz {
                n: nodes,
                k: even_degree(nodes, edges),
                rewire_prob: WS_REWIRE_PROB,
            },
            ModelFamily::Regular => ModelParameters::Regular {
                n: nodes,
                k: even_degree(nodes, edges),
            },
        };
        params.check()?;
        log::debug!("Calibrated {}: {}", self, params);
        Ok(params)
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The construction parameters of one model graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family")]
pub enum ModelParameters {
    /// Each pair of nodes joined with probability `p`.
    ErdosRenyi { n: usize, p: f64 },
    /// Each new node attaches to `m` existing nodes.
    BarabasiAlbert { n: usize, m: usize },
    /// Ring lattice of degree `k`, rewired with `rewire_prob`.
    WattsStrogatz { n: usize, k: usize, rewire_prob: f64 },
    /// Every node has degree `k`.
    Regular { n: usize, k: usize },
}

impl ModelParameters {
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelParameters::ErdosRenyi { .. } => ModelFamily::ErdosRenyi,
            ModelParameters::BarabasiAlbert { .. } => ModelFamily::BarabasiAlbert,
            ModelParameters::WattsStrogatz { .. } => ModelFamily::WattsStrogatz,
            ModelParameters::Regular { .. } => ModelFamily::Regular,
        }
    }

    /// Number of nodes the model graph will have.
    pub fn nodes(&self) -> usize {
        match *self {
            ModelParameters::ErdosRenyi { n, .. }
            | ModelParameters::BarabasiAlbert { n, .. }
            | ModelParameters::WattsStrogatz { n, .. }
            | ModelParameters::Regular { n, .. } => n,
        }
    }

    /// Make sure a graph with these parameters can exist.
    pub fn check(&self) -> Result<(), ModelError> {
        let infeasible = |reason: String| {
            Err(ModelError::Infeasible {
                family: self.family(),
                reason,
            })
        };

        match *self {
            ModelParameters::ErdosRenyi { n, p } => {
                if n < 2 {
                    return infeasible(format!("n = {n}, at least two nodes are needed"));
                }
                if !(0.0..=1.0).contains(&p) {
                    return infeasible(format!("p = {p} is not a probability"));
                }
            }
            ModelParameters::BarabasiAlbert { n, m } => {
                if m < 1 || m >= n {
                    return infeasible(format!("m = {m} must satisfy 1 <= m < n = {n}"));
                }
            }
            ModelParameters::WattsStrogatz { n, k, rewire_prob } => {
                if k > n {
                    return infeasible(format!("k = {k} is larger than n = {n}"));
                }
                if k % 2 == 1 {
                    return infeasible(format!("k = {k} is odd, a ring lattice needs even k"));
                }
                if !(0.0..=1.0).contains(&rewire_prob) {
                    return infeasible(format!("rewire probability {rewire_prob} is not a probability"));
                }
            }
            ModelParameters::Regular { n, k } => {
                if k >= n {
                    return infeasible(format!("k = {k} must be smaller than n = {n}"));
                }
                if (k * n) % 2 == 1 {
                    return infeasible(format!(
                        "k * n = {} is odd, no {k}-regular graph on {n} nodes exists",
                        k * n
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ModelParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelParameters::ErdosRenyi { n, p } => write!(f, "n={n}, p={p:.6}"),
            ModelParameters::BarabasiAlbert { n, m } => write!(f, "n={n}, m={m}"),
            ModelParameters::WattsStrogatz { n, k, rewire_prob } => {
                write!(f, "n={n}, k={k}, p={rewire_prob}")
            }
            ModelParameters::Regular { n, k } => write!(f, "n={n}, k={k}"),
        }
    }
}

/// `max(2, round(2e / n))`, bumped up to the next even number.
fn even_degree(nodes: usize, edges: usize) -> usize {
    let k = round_half_even(2.0 * edges as f64 / nodes as f64).max(2);
    if k % 2 == 1 {
        k + 1
    } else {
        k
    }
}

/// Round to the nearest integer, ties to even (so 2.5 -> 2, 3.5 -> 4).
/// Non-finite or negative input gives zero.
fn round_half_even(x: f64) -> usize {
    let r = x.round_ties_even();
    if r.is_finite() && r > 0.0 {
        r as usize
    } else {
        0
    }
}
