//! `netmodel` measures an interaction graph (e.g. drugs and the genes
//! they target) and asks which random graph family reproduces it best.
//!
//! The pipeline is: read an edge list, fold it into a simple undirected
//! graph, measure degree, clustering and path length (the latter on the
//! largest connected component), then build and measure an Erdős-Rényi,
//! a Barabási-Albert, a Watts-Strogatz and a random regular graph of
//! the same size.

/// Reading the two column edge list.
pub mod edgelist;
pub use edgelist::EdgeList;

/// The interaction graph and connected components.
pub mod graph;
pub use graph::{InteractionGraph, ModelGraph};

/// Degree, clustering and shortest path metrics.
pub mod metrics;
pub use metrics::MetricsResult;

/// Model families and their calibration.
pub mod models;
pub use models::{ModelFamily, ModelParameters};

/// Random graph generators, one per family.
pub mod generate;

/// The side by side comparison, and its renderings.
pub mod compare;
pub use compare::{compare, ComparisonReport};
