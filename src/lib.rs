// Export modules for library usage
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod graph;
pub mod loader;
pub mod metrics;
pub mod pipeline;
pub mod scoring;

// Re-export commonly used types
pub use crate::config::{load_config, FilterRule, ScoringWeights, SplitmapConfig, ValidatedConfig};
pub use crate::core::{
    CancellationToken, Language, ProjectDescriptor, ReferenceEdge, ReferenceKind, StrategyKind,
    WorkspaceAnalysis,
};
pub use crate::errors::{
    ConfigValidationError, DataIntegrityError, Error, LoadExhaustedError, PartialParseWarning,
    Result, StrategyFailure,
};
pub use crate::graph::{DependencyFilter, DependencyGraph, GraphBuilder};
pub use crate::loader::{LoadStrategy, StrategyOutcome, WorkspaceLoader};
pub use crate::metrics::{Metric, MetricCalculator, MetricKind, MetricSet, MetricSets};
pub use crate::pipeline::{analyze, AnalysisReport, Analyzer};
pub use crate::scoring::{AggregateScore, ScoreAggregator};
