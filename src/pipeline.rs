//! End-to-end analysis: load, build, filter, measure, rank.

use crate::config::ValidatedConfig;
use crate::core::{CancellationToken, StrategyKind, WorkspaceAnalysis};
use crate::errors::{DataIntegrityError, Error, PartialParseWarning, Result};
use crate::graph::{BuildStats, DependencyFilter, DependencyGraph, FilterStats, GraphBuilder};
use crate::loader::WorkspaceLoader;
use crate::metrics::{calculate_all, Calculators, MetricSets};
use crate::scoring::{AggregateScore, ScoreAggregator};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span, warn};

/// How one workspace was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceSummary {
    pub name: String,
    pub path: PathBuf,
    pub strategy: StrategyKind,
    pub projects: usize,
    pub skipped_projects: usize,
}

impl From<&WorkspaceAnalysis> for WorkspaceSummary {
    fn from(analysis: &WorkspaceAnalysis) -> Self {
        Self {
            name: analysis.workspace_name.clone(),
            path: analysis.workspace_path.clone(),
            strategy: analysis.strategy_used,
            projects: analysis.projects.len(),
            skipped_projects: analysis.partial_failures.len(),
        }
    }
}

/// Everything a run produced, including the warnings a successful run
/// must still report.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub workspaces: Vec<WorkspaceSummary>,
    /// Graph as loaded; consumers such as cycle detection read this one
    pub graph: DependencyGraph,
    /// Graph the metrics were computed on
    pub filtered_graph: DependencyGraph,
    pub build_stats: BuildStats,
    pub filter_stats: FilterStats,
    pub metrics: MetricSets,
    pub ranking: Vec<AggregateScore>,
    pub partial_failures: Vec<PartialParseWarning>,
    pub integrity_errors: Vec<DataIntegrityError>,
}

impl AnalysisReport {
    pub fn strategies(&self) -> Vec<StrategyKind> {
        self.workspaces.iter().map(|w| w.strategy).collect()
    }

    pub fn has_warnings(&self) -> bool {
        !self.partial_failures.is_empty()
            || !self.integrity_errors.is_empty()
            || self.build_stats.unresolved_project_refs > 0
    }
}

pub struct Analyzer {
    config: ValidatedConfig,
    loader: WorkspaceLoader,
    calculators: Calculators,
}

impl Analyzer {
    pub fn new(config: &ValidatedConfig) -> Self {
        Self {
            loader: WorkspaceLoader::new(&config.loader),
            config: config.clone(),
            calculators: Calculators::default(),
        }
    }

    pub fn with_loader(mut self, loader: WorkspaceLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_calculators(mut self, calculators: Calculators) -> Self {
        self.calculators = calculators;
        self
    }

    pub fn run(&self, workspaces: &[PathBuf], cancel: &CancellationToken) -> Result<AnalysisReport> {
        let span = info_span!("analyze", workspaces = workspaces.len());
        let _guard = span.enter();
        let start = Instant::now();

        let analyses = workspaces
            .iter()
            .map(|path| self.loader.load(path, cancel))
            .collect::<Result<Vec<_>>>()?;

        let (graph, build_stats) = GraphBuilder::new().build_with_stats(&analyses);
        check(cancel, "graph building")?;

        let (filtered_graph, filter_stats) =
            DependencyFilter::new(&self.config.filter).apply_with_stats(&graph);
        check(cancel, "dependency filtering")?;

        let metrics = calculate_all(&self.calculators, &filtered_graph, cancel)?;
        check(cancel, "metric calculation")?;

        let outcome = ScoreAggregator::new(self.config.weights).aggregate(&metrics);

        let partial_failures: Vec<PartialParseWarning> = analyses
            .iter()
            .flat_map(|a| a.partial_failures.iter().cloned())
            .collect();
        if !partial_failures.is_empty() {
            warn!(
                skipped = partial_failures.len(),
                "Some project manifests could not be parsed and were left out"
            );
        }

        info!(
            ranked = outcome.ranked.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            workspaces: analyses.iter().map(WorkspaceSummary::from).collect(),
            graph,
            filtered_graph,
            build_stats,
            filter_stats,
            metrics,
            ranking: outcome.ranked,
            partial_failures,
            integrity_errors: outcome.integrity_errors,
        })
    }
}

fn check(cancel: &CancellationToken, stage: &'static str) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::cancelled(stage))
    } else {
        Ok(())
    }
}

/// Run the full analysis over one or more workspace descriptors.
pub fn analyze(
    workspaces: &[PathBuf],
    config: &ValidatedConfig,
    cancel: &CancellationToken,
) -> Result<AnalysisReport> {
    Analyzer::new(config).run(workspaces, cancel)
}
