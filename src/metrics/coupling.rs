use super::{score_projects, MetricCalculator, MetricKind};
use crate::core::CancellationToken;
use crate::errors::Result;
use crate::graph::DependencyGraph;

/// Weight applied to incoming edges; every dependent has to move with an
/// extracted project.
pub const INCOMING_WEIGHT: usize = 2;

/// `incoming * 2 + outgoing` per project vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouplingCalculator;

impl CouplingCalculator {
    pub fn raw_score(graph: &DependencyGraph, project: &str) -> usize {
        graph.in_degree(project) * INCOMING_WEIGHT + graph.out_degree(project)
    }
}

impl MetricCalculator for CouplingCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::Coupling
    }

    fn raw_scores(
        &self,
        graph: &DependencyGraph,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, f64)>> {
        score_projects(graph, cancel, |project| {
            Self::raw_score(graph, &project.name) as f64
        })
    }
}
