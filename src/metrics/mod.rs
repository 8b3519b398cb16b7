//! Per-project metrics over a dependency graph.
//!
//! Every calculator reads the same immutable [`DependencyGraph`] and produces
//! its own [`MetricSet`], so the four of them run concurrently (see
//! [`calculate_all`]) without synchronization.

pub mod complexity;
pub mod coupling;
pub mod exposure;
pub mod tech_debt;

pub use complexity::ComplexityCalculator;
pub use coupling::CouplingCalculator;
pub use exposure::ExposureCalculator;
pub use tech_debt::TechDebtCalculator;

use crate::core::{CancellationToken, ProjectDescriptor};
use crate::errors::{Error, Result};
use crate::graph::DependencyGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, info_span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    Coupling,
    Complexity,
    TechDebt,
    ExternalExposure,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Coupling,
        MetricKind::Complexity,
        MetricKind::TechDebt,
        MetricKind::ExternalExposure,
    ];
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Coupling => "Coupling",
            MetricKind::Complexity => "Complexity",
            MetricKind::TechDebt => "TechDebt",
            MetricKind::ExternalExposure => "ExternalExposure",
        };
        f.write_str(name)
    }
}

/// One project's score for one metric kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub project_name: String,
    pub raw_score: f64,
    /// Always within `0.0..=100.0`
    pub normalized_score: f64,
}

/// All metrics one calculator produced in a single invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSet {
    pub kind: MetricKind,
    pub metrics: Vec<Metric>,
    pub max_raw: f64,
}

impl MetricSet {
    /// Normalize raw scores against the largest one.
    ///
    /// With a zero maximum every project gets 0; otherwise the maximum maps
    /// to exactly 100.
    pub fn from_raw(kind: MetricKind, raw: Vec<(String, f64)>) -> Self {
        let max_raw = raw
            .iter()
            .map(|(_, score)| *score)
            .fold(0.0_f64, f64::max);

        let metrics = raw
            .into_iter()
            .map(|(project_name, raw_score)| {
                let normalized_score = normalize(raw_score, max_raw);
                debug!(
                    metric = %kind,
                    project = %project_name,
                    raw = raw_score,
                    normalized = normalized_score,
                    "Scored project"
                );
                Metric {
                    project_name,
                    raw_score,
                    normalized_score,
                }
            })
            .collect();

        Self {
            kind,
            metrics,
            max_raw,
        }
    }

    pub fn get(&self, project: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.project_name == project)
    }

    pub fn by_project(&self) -> HashMap<&str, &Metric> {
        self.metrics
            .iter()
            .map(|m| (m.project_name.as_str(), m))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

pub fn normalize(raw: f64, max_raw: f64) -> f64 {
    if max_raw <= 0.0 || !raw.is_finite() {
        return 0.0;
    }
    if raw == max_raw {
        return 100.0;
    }
    (raw / max_raw * 100.0).clamp(0.0, 100.0)
}

/// A metric over project vertices.
///
/// Implementors only supply raw scores; normalization and progress logging
/// are shared.
pub trait MetricCalculator: Send + Sync {
    fn kind(&self) -> MetricKind;

    /// Raw score per project vertex. Must check `cancel` once per project.
    fn raw_scores(
        &self,
        graph: &DependencyGraph,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, f64)>>;

    fn calculate(&self, graph: &DependencyGraph, cancel: &CancellationToken) -> Result<MetricSet> {
        let kind = self.kind();
        let _span = info_span!("metric", kind = %kind).entered();
        info!("calculating {} for {} projects", kind, graph.project_count());

        let raw = self.raw_scores(graph, cancel)?;
        if cancel.is_cancelled() {
            return Err(Error::cancelled("metric calculation"));
        }
        if let Some((project, score)) = raw.iter().find(|(_, s)| !s.is_finite() || *s < 0.0) {
            return Err(Error::Metric {
                kind,
                message: format!("raw score {score} for {project} is not a non-negative number"),
            });
        }

        let set = MetricSet::from_raw(kind, raw);
        info!("max raw score = {}", set.max_raw);
        Ok(set)
    }
}

/// Apply `score` to every project vertex, stopping at the first cancellation.
pub(crate) fn score_projects<F>(
    graph: &DependencyGraph,
    cancel: &CancellationToken,
    mut score: F,
) -> Result<Vec<(String, f64)>>
where
    F: FnMut(&ProjectDescriptor) -> f64,
{
    graph
        .projects()
        .map(|project| {
            if cancel.is_cancelled() {
                return Err(Error::cancelled("metric calculation"));
            }
            Ok((project.name.clone(), score(project)))
        })
        .collect()
}

/// The four metric sets an aggregation needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSets {
    pub coupling: MetricSet,
    pub complexity: MetricSet,
    pub tech_debt: MetricSet,
    pub external_exposure: MetricSet,
}

impl MetricSets {
    pub fn get(&self, kind: MetricKind) -> &MetricSet {
        match kind {
            MetricKind::Coupling => &self.coupling,
            MetricKind::Complexity => &self.complexity,
            MetricKind::TechDebt => &self.tech_debt,
            MetricKind::ExternalExposure => &self.external_exposure,
        }
    }
}

/// Calculators used by a default analysis run.
pub struct Calculators {
    pub coupling: Box<dyn MetricCalculator>,
    pub complexity: Box<dyn MetricCalculator>,
    pub tech_debt: Box<dyn MetricCalculator>,
    pub external_exposure: Box<dyn MetricCalculator>,
}

impl Default for Calculators {
    fn default() -> Self {
        Self {
            coupling: Box::new(CouplingCalculator),
            complexity: Box::new(ComplexityCalculator::default()),
            tech_debt: Box::new(TechDebtCalculator::default()),
            external_exposure: Box::new(ExposureCalculator::default()),
        }
    }
}

/// Run all four calculators concurrently and wait for every one of them.
pub fn calculate_all(
    calculators: &Calculators,
    graph: &DependencyGraph,
    cancel: &CancellationToken,
) -> Result<MetricSets> {
    let ((coupling, complexity), (tech_debt, external_exposure)) = rayon::join(
        || {
            rayon::join(
                || calculators.coupling.calculate(graph, cancel),
                || calculators.complexity.calculate(graph, cancel),
            )
        },
        || {
            rayon::join(
                || calculators.tech_debt.calculate(graph, cancel),
                || calculators.external_exposure.calculate(graph, cancel),
            )
        },
    );

    Ok(MetricSets {
        coupling: coupling?,
        complexity: complexity?,
        tech_debt: tech_debt?,
        external_exposure: external_exposure?,
    })
}
