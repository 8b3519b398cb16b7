//! Error taxonomy for workspace analysis.
//!
//! Errors local to one unit of work (a loading strategy, a project manifest,
//! a project missing from a metric set) are recoverable and are recorded as
//! values. Only [`LoadExhaustedError`], [`ConfigValidationError`] and
//! cancellation terminate an analysis run.

use crate::core::StrategyKind;
use crate::metrics::MetricKind;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for an analysis run
#[derive(Debug, Error)]
pub enum Error {
    /// Every loading strategy failed for a workspace
    #[error(transparent)]
    Load(#[from] LoadExhaustedError),

    /// Configuration rejected before any analysis ran
    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    /// The run was cancelled; partial results were discarded
    #[error("analysis cancelled during {stage}")]
    Cancelled { stage: &'static str },

    /// A metric calculator could not complete
    #[error("{kind} calculation failed: {message}")]
    Metric { kind: MetricKind, message: String },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn cancelled(stage: &'static str) -> Self {
        Self::Cancelled { stage }
    }

    /// Name of the pipeline stage that failed, for user-facing reports.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Load(_) => "workspace loading",
            Self::Config(_) => "configuration",
            Self::Cancelled { stage } => stage,
            Self::Metric { .. } => "metric calculation",
            Self::Io(_) => "io",
        }
    }
}

/// A single loading strategy could not produce a workspace.
///
/// Recoverable: the loader logs it and moves to the next strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{strategy} strategy failed: {reason}")]
pub struct StrategyFailure {
    pub strategy: StrategyKind,
    pub reason: String,
}

impl StrategyFailure {
    pub fn new(strategy: StrategyKind, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }

    /// Build a failure from an `anyhow` chain, keeping every context layer.
    pub fn from_anyhow(strategy: StrategyKind, error: &anyhow::Error) -> Self {
        Self::new(strategy, format!("{error:#}"))
    }
}

/// Every strategy in the fallback chain failed.
#[derive(Debug, Clone, Error)]
#[error("could not load workspace {}: all {} strategies failed", workspace.display(), attempts.len())]
pub struct LoadExhaustedError {
    pub workspace: PathBuf,
    /// Failures in the order the strategies ran.
    pub attempts: Vec<StrategyFailure>,
    /// The failure of the strategy that ran last.
    #[source]
    pub last: StrategyFailure,
}

impl LoadExhaustedError {
    pub fn new(workspace: impl Into<PathBuf>, attempts: Vec<StrategyFailure>) -> Option<Self> {
        let last = attempts.last()?.clone();
        Some(Self {
            workspace: workspace.into(),
            attempts,
            last,
        })
    }
}

/// One project manifest failed to parse inside the raw-manifest strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialParseWarning {
    pub project: String,
    pub manifest_path: PathBuf,
    pub reason: String,
}

impl fmt::Display for PartialParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipped project {} ({}): {}",
            self.project,
            self.manifest_path.display(),
            self.reason
        )
    }
}

/// Invalid configuration, detected before analysis starts
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("{name} weight must be a finite, non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("scoring weights must sum to 1.0 (±{tolerance}), but sum to {sum:.3}")]
    WeightSum { sum: f64, tolerance: f64 },

    #[error("{list} pattern #{index} is empty")]
    EmptyPattern { list: &'static str, index: usize },

    #[error("{list} pattern '{pattern}' may only use '*' as its final character")]
    MisplacedWildcard { list: &'static str, pattern: String },

    #[error("loader strategy list is empty")]
    NoStrategies,

    #[error("failed to parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A project is missing from at least one metric set during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("project {project} has no {} score; excluded from ranking", format_kinds(missing))]
pub struct DataIntegrityError {
    pub project: String,
    pub missing: Vec<MetricKind>,
}

fn format_kinds(kinds: &[MetricKind]) -> String {
    kinds
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join("/")
}
