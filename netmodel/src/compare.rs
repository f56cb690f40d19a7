//! Measure an interaction graph, build one graph from each model
//! family with matching size, measure those, and put it all side by
//! side.

use crate::generate::generate;
use crate::graph::InteractionGraph;
use crate::metrics::{MetricError, MetricsResult};
use crate::models::{ModelError, ModelFamily, ModelParameters};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_derive::Serialize;
use std::fmt;

/// Label of the empirical graph in a report.
pub const ORIGINAL_LABEL: &str = "Original";

/// What happened to one model family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    Measured {
        parameters: ModelParameters,
        metrics: MetricsResult,
    },
    /// The model could not be built or measured. The other families
    /// are unaffected.
    Failed { reason: String },
}

/// One model family's block of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReport {
    pub family: ModelFamily,
    pub outcome: ModelOutcome,
}

impl ModelReport {
    pub fn metrics(&self) -> Option<&MetricsResult> {
        match &self.outcome {
            ModelOutcome::Measured { metrics, .. } => Some(metrics),
            ModelOutcome::Failed { .. } => None,
        }
    }
}

/// The metrics of the original graph next to those of each model, in
/// the fixed order Original, Erdős-Rényi, Barabási-Albert,
/// Watts-Strogatz, Regular.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    /// The seed the model graphs were generated from.
    pub seed: u64,
    pub original: MetricsResult,
    pub models: Vec<ModelReport>,
}

/// Run the full comparison on a graph.
///
/// Each model family is calibrated, generated and measured on its own
/// thread with its own random number generator, derived from `seed`.
pub fn compare(graph: &InteractionGraph, seed: u64) -> Result<ComparisonReport, MetricError> {
    log::info!("Measuring the original graph");
    let original = MetricsResult::measure(&graph.0)?;
    let (nodes, edges) = (original.node_count, original.edge_count);

    let models = ModelFamily::ALL
        .par_iter()
        .map(|&family| {
            let outcome = match run_model(family, nodes, edges, seed) {
                Ok((parameters, metrics)) => ModelOutcome::Measured {
                    parameters,
                    metrics,
                },
                Err(e) => {
                    log::warn!("{}", e);
                    ModelOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            ModelReport { family, outcome }
        })
        .collect();

    Ok(ComparisonReport {
        seed,
        original,
        models,
    })
}

/// Calibrate, generate and measure a single model family.
pub fn run_model(
    family: ModelFamily,
    nodes: usize,
    edges: usize,
    seed: u64,
) -> Result<(ModelParameters, MetricsResult), ModelError> {
    let parameters = family.calibrate(nodes, edges)?;
    log::info!(
        "Generating {} graph on {} nodes ({})",
        family,
        parameters.nodes(),
        parameters
    );

    let mut rng = model_rng(seed, family);
    let graph = generate(&parameters, &mut rng)?;
    let metrics =
        MetricsResult::measure(&graph).map_err(|source| ModelError::Metric { family, source })?;

    Ok((parameters, metrics))
}

/// A generator per family, so the families don't share a stream and
/// the result doesn't depend on thread scheduling.
fn model_rng(seed: u64, family: ModelFamily) -> StdRng {
    let stream = family as u64 + 1;
    StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

impl ComparisonReport {
    /// Look up a block by its label.
    pub fn get(&self, label: &str) -> Option<ReportEntry<'_>> {
        if label == ORIGINAL_LABEL {
            return Some(ReportEntry::Original(&self.original));
        }
        self.models
            .iter()
            .find(|m| m.family.label() == label)
            .map(ReportEntry::Model)
    }

    /// All labels, in report order.
    pub fn labels(&self) -> Vec<&'static str> {
        std::iter::once(ORIGINAL_LABEL)
            .chain(self.models.iter().map(|m| m.family.label()))
            .collect()
    }

    /// The measured family whose clustering and path length sit closest
    /// to the original graph. Clustering differences are taken as is,
    /// path length differences relative to the original's.
    pub fn closest_model(&self) -> Option<ModelFamily> {
        let orig = &self.original;
        self.models
            .iter()
            .filter_map(|m| m.metrics().map(|metrics| (m.family, metrics)))
            .min_by_key(|(_, metrics)| {
                let mut score = (metrics.average_clustering - orig.average_clustering).abs();
                if orig.average_shortest_path_length > 0.0 {
                    score += (metrics.average_shortest_path_length
                        - orig.average_shortest_path_length)
                        .abs()
                        / orig.average_shortest_path_length;
                }
                OrderedFloat(score)
            })
            .map(|(family, _)| family)
    }

    /// Render as a table, one row per label.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        out += &[
            "model",
            "parameters",
            "nodes",
            "edges",
            "average_degree",
            "clustering",
            "avg_shortest_path_lcc",
            "lcc_nodes",
            "lcc_edges",
            "status",
        ]
        .iter()
        .join("\t");
        out.push('\n');

        out += &tsv_row(ORIGINAL_LABEL, "", Some(&self.original), "measured");
        for model in &self.models {
            let row = match &model.outcome {
                ModelOutcome::Measured {
                    parameters,
                    metrics,
                } => tsv_row(
                    model.family.label(),
                    &parameters.to_string(),
                    Some(metrics),
                    "measured",
                ),
                ModelOutcome::Failed { reason } => {
                    tsv_row(model.family.label(), "", None, &format!("failed: {reason}"))
                }
            };
            out += &row;
        }
        out
    }

    /// Render as a JSON object keyed by label.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn tsv_row(label: &str, parameters: &str, metrics: Option<&MetricsResult>, status: &str) -> String {
    let values: Vec<String> = match metrics {
        Some(m) => vec![
            m.node_count.to_string(),
            m.edge_count.to_string(),
            m.average_degree.to_string(),
            m.average_clustering.to_string(),
            m.average_shortest_path_length.to_string(),
            m.lcc_node_count.to_string(),
            m.lcc_edge_count.to_string(),
        ],
        None => vec!["NA".to_string(); 7],
    };
    let mut row = [label, parameters]
        .into_iter()
        .chain(values.iter().map(String::as_str))
        .chain([status])
        .join("\t");
    row.push('\n');
    row
}

/// A borrowed block of a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportEntry<'a> {
    Original(&'a MetricsResult),
    Model(&'a ModelReport),
}

/// Metric names and values, in display order.
fn metric_lines(m: &MetricsResult) -> [(&'static str, String); 7] {
    [
        ("Total Nodes", m.node_count.to_string()),
        ("Total Edges", m.edge_count.to_string()),
        ("Average Degree", m.average_degree.to_string()),
        ("Clustering Coefficient", m.average_clustering.to_string()),
        (
            "Average Shortest Path (LCC)",
            m.average_shortest_path_length.to_string(),
        ),
        ("LCC Nodes", m.lcc_node_count.to_string()),
        ("LCC Edges", m.lcc_edge_count.to_string()),
    ]
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Network Statistics:", ORIGINAL_LABEL)?;
        for (name, value) in metric_lines(&self.original) {
            writeln!(f, "  {}: {}", name, value)?;
        }

        for model in &self.models {
            writeln!(f)?;
            writeln!(f, "{} Network Statistics:", model.family.label())?;
            match &model.outcome {
                ModelOutcome::Measured {
                    parameters,
                    metrics,
                } => {
                    writeln!(f, "  Parameters: {}", parameters)?;
                    for (name, value) in metric_lines(metrics) {
                        writeln!(f, "  {}: {}", name, value)?;
                    }
                }
                ModelOutcome::Failed { reason } => {
                    writeln!(f, "  Status: failed ({})", reason)?;
                }
            }
        }
        Ok(())
    }
}

impl Serialize for ComparisonReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.models.len()))?;
        map.serialize_entry(ORIGINAL_LABEL, &self.original)?;
        for model in &self.models {
            map.serialize_entry(model.family.label(), &model.outcome)?;
        }
        map.end()
    }
}
