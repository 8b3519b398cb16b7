//! Weighted combination of the four metric sets into a ranking of
//! extraction candidates.

use crate::config::ValidatedWeights;
use crate::errors::DataIntegrityError;
use crate::metrics::{MetricKind, MetricSets};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

/// Normalized score per metric kind for one project.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub coupling: f64,
    pub complexity: f64,
    pub tech_debt: f64,
    pub external_exposure: f64,
}

impl ScoreBreakdown {
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Coupling => self.coupling,
            MetricKind::Complexity => self.complexity,
            MetricKind::TechDebt => self.tech_debt,
            MetricKind::ExternalExposure => self.external_exposure,
        }
    }

    fn set(&mut self, kind: MetricKind, value: f64) {
        match kind {
            MetricKind::Coupling => self.coupling = value,
            MetricKind::Complexity => self.complexity = value,
            MetricKind::TechDebt => self.tech_debt = value,
            MetricKind::ExternalExposure => self.external_exposure = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateScore {
    pub project_name: String,
    /// Weighted sum of the breakdown, within `0.0..=100.0`
    pub combined: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationOutcome {
    /// Highest `combined` first; ties ordered by project name
    pub ranked: Vec<AggregateScore>,
    /// Projects left out because a metric set did not score them
    pub integrity_errors: Vec<DataIntegrityError>,
}

#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    weights: ValidatedWeights,
}

impl ScoreAggregator {
    /// Only validated weights are accepted, so a bad weight configuration
    /// can never reach aggregation.
    pub fn new(weights: ValidatedWeights) -> Self {
        Self { weights }
    }

    pub fn aggregate(&self, sets: &MetricSets) -> AggregationOutcome {
        let lookups: Vec<(MetricKind, HashMap<&str, f64>)> = MetricKind::ALL
            .iter()
            .map(|kind| {
                let scores = sets
                    .get(*kind)
                    .metrics
                    .iter()
                    .map(|m| (m.project_name.as_str(), m.normalized_score))
                    .collect();
                (*kind, scores)
            })
            .collect();

        let projects: BTreeSet<&str> = lookups
            .iter()
            .flat_map(|(_, scores)| scores.keys().copied())
            .collect();

        let mut outcome = AggregationOutcome::default();
        for project in projects {
            let mut breakdown = ScoreBreakdown::default();
            let mut missing = Vec::new();
            for (kind, scores) in &lookups {
                match scores.get(project) {
                    Some(score) => breakdown.set(*kind, *score),
                    None => missing.push(*kind),
                }
            }

            if !missing.is_empty() {
                let error = DataIntegrityError {
                    project: project.to_string(),
                    missing,
                };
                warn!("{}", error);
                outcome.integrity_errors.push(error);
                continue;
            }

            outcome.ranked.push(AggregateScore {
                project_name: project.to_string(),
                combined: self.combine(&breakdown),
                breakdown,
            });
        }

        rank(&mut outcome.ranked);
        info!(
            ranked = outcome.ranked.len(),
            excluded = outcome.integrity_errors.len(),
            "Aggregated scores"
        );
        outcome
    }

    fn combine(&self, breakdown: &ScoreBreakdown) -> f64 {
        MetricKind::ALL
            .iter()
            .map(|kind| self.weights.weight(*kind) * breakdown.get(*kind))
            .sum::<f64>()
            .clamp(0.0, 100.0)
    }
}

/// Descending by combined score, then ascending by name.
pub fn rank(scores: &mut [AggregateScore]) {
    scores.sort_by(|a, b| {
        b.combined
            .partial_cmp(&a.combined)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.project_name.cmp(&b.project_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringWeights;
    use crate::metrics::{MetricSet, MetricSets};
    use pretty_assertions::assert_eq;

    fn set(kind: MetricKind, normalized: &[(&str, f64)]) -> MetricSet {
        MetricSet {
            kind,
            metrics: normalized
                .iter()
                .map(|(name, score)| crate::metrics::Metric {
                    project_name: name.to_string(),
                    raw_score: *score,
                    normalized_score: *score,
                })
                .collect(),
            max_raw: 100.0,
        }
    }

    fn aggregator() -> ScoreAggregator {
        ScoreAggregator::new(ScoringWeights::default().validate().unwrap())
    }

    #[test]
    fn coupling_alone_scores_its_weight() {
        let sets = MetricSets {
            coupling: set(MetricKind::Coupling, &[("Hub", 100.0), ("Leaf", 50.0)]),
            complexity: set(MetricKind::Complexity, &[("Hub", 0.0), ("Leaf", 0.0)]),
            tech_debt: set(MetricKind::TechDebt, &[("Hub", 0.0), ("Leaf", 0.0)]),
            external_exposure: set(MetricKind::ExternalExposure, &[("Hub", 0.0), ("Leaf", 0.0)]),
        };

        let outcome = aggregator().aggregate(&sets);

        assert_eq!(outcome.ranked[0].project_name, "Hub");
        assert!((outcome.ranked[0].combined - 40.0).abs() < 1e-9);
        assert!(outcome.ranked[0].combined > outcome.ranked[1].combined);
        assert!(outcome.integrity_errors.is_empty());
    }

    #[test]
    fn ties_break_by_name() {
        let all = |kind| set(kind, &[("Zeta", 10.0), ("Alpha", 10.0), ("Mid", 20.0)]);
        let sets = MetricSets {
            coupling: all(MetricKind::Coupling),
            complexity: all(MetricKind::Complexity),
            tech_debt: all(MetricKind::TechDebt),
            external_exposure: all(MetricKind::ExternalExposure),
        };

        let names: Vec<String> = aggregator()
            .aggregate(&sets)
            .ranked
            .into_iter()
            .map(|s| s.project_name)
            .collect();
        assert_eq!(names, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn missing_metric_excludes_project() {
        let sets = MetricSets {
            coupling: set(MetricKind::Coupling, &[("A", 10.0), ("B", 90.0)]),
            complexity: set(MetricKind::Complexity, &[("A", 10.0)]),
            tech_debt: set(MetricKind::TechDebt, &[("A", 10.0)]),
            external_exposure: set(MetricKind::ExternalExposure, &[("A", 10.0), ("B", 5.0)]),
        };

        let outcome = aggregator().aggregate(&sets);

        assert_eq!(outcome.ranked.len(), 1);
        assert_eq!(
            outcome.integrity_errors,
            vec![DataIntegrityError {
                project: "B".into(),
                missing: vec![MetricKind::Complexity, MetricKind::TechDebt],
            }]
        );
    }
}
