//! Workspace loading through an ordered fallback chain of strategies.
//!
//! Strategies run strictly one after another, highest fidelity first. Each
//! attempt yields a [`StrategyOutcome`]; a failure is logged and the next
//! strategy runs. Only when the chain is exhausted does loading fail, with the
//! last strategy's failure attached.

pub mod build_metadata;
pub mod dotnet;
pub mod manifest;
pub mod paths;
pub mod platform;
pub mod raw_manifest;
pub mod semantic;
pub mod solution;

pub use build_metadata::BuildMetadataStrategy;
pub use raw_manifest::RawManifestStrategy;
pub use semantic::SemanticStrategy;

use crate::config::LoaderConfig;
use crate::core::{CancellationToken, StrategyKind, WorkspaceAnalysis};
use crate::errors::{ConfigValidationError, Error, LoadExhaustedError, Result, StrategyFailure};
use std::path::Path;
use tracing::{info, info_span, warn};

/// Tagged result of one strategy attempt.
#[derive(Debug)]
pub enum StrategyOutcome {
    Loaded(WorkspaceAnalysis),
    Failed(StrategyFailure),
    Cancelled,
}

/// One way of turning a workspace descriptor into a [`WorkspaceAnalysis`].
pub trait LoadStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn load(&self, workspace: &Path, cancel: &CancellationToken) -> StrategyOutcome;
}

/// Convert a strategy's internal result into its tagged outcome.
///
/// Errors raised after cancellation was requested are reported as
/// cancellation, not as a strategy failure.
pub fn outcome(
    kind: StrategyKind,
    result: anyhow::Result<WorkspaceAnalysis>,
    cancel: &CancellationToken,
) -> StrategyOutcome {
    match result {
        _ if cancel.is_cancelled() => StrategyOutcome::Cancelled,
        Ok(analysis) => StrategyOutcome::Loaded(analysis),
        Err(e) => StrategyOutcome::Failed(StrategyFailure::from_anyhow(kind, &e)),
    }
}

pub struct WorkspaceLoader {
    strategies: Vec<Box<dyn LoadStrategy>>,
}

impl WorkspaceLoader {
    /// Build the chain in the configured order.
    pub fn new(config: &LoaderConfig) -> Self {
        let timeout = config.dotnet_timeout();
        let strategies = config
            .strategies
            .iter()
            .map(|kind| -> Box<dyn LoadStrategy> {
                match kind {
                    StrategyKind::Semantic => Box::new(SemanticStrategy::new(timeout)),
                    StrategyKind::BuildMetadata => Box::new(BuildMetadataStrategy::new(timeout)),
                    StrategyKind::RawManifest => Box::new(RawManifestStrategy::new(config.parallel)),
                }
            })
            .collect();
        Self { strategies }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn LoadStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub fn load(&self, workspace: &Path, cancel: &CancellationToken) -> Result<WorkspaceAnalysis> {
        let span = info_span!("load_workspace", workspace = %workspace.display());
        let _guard = span.enter();

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            if cancel.is_cancelled() {
                return Err(Error::cancelled("workspace loading"));
            }

            let kind = strategy.kind();
            info!(strategy = %kind, "Trying load strategy");
            match strategy.load(workspace, cancel) {
                StrategyOutcome::Loaded(analysis) => {
                    info!(
                        strategy = %kind,
                        projects = analysis.projects.len(),
                        skipped = analysis.partial_failures.len(),
                        "Loaded workspace {}",
                        analysis.workspace_name
                    );
                    return Ok(analysis);
                }
                StrategyOutcome::Failed(failure) => {
                    warn!(strategy = %kind, reason = %failure.reason, "Load strategy failed, falling back");
                    attempts.push(failure);
                }
                StrategyOutcome::Cancelled => return Err(Error::cancelled("workspace loading")),
            }
        }

        match LoadExhaustedError::new(workspace, attempts) {
            Some(exhausted) => Err(exhausted.into()),
            None => Err(ConfigValidationError::NoStrategies.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProjectDescriptor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        kind: StrategyKind,
        succeed: bool,
        calls: Arc<AtomicUsize>,
    }

    impl LoadStrategy for Scripted {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        fn load(&self, workspace: &Path, _cancel: &CancellationToken) -> StrategyOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                StrategyOutcome::Loaded(WorkspaceAnalysis::new(
                    workspace,
                    "App",
                    vec![ProjectDescriptor::new("Core", "/ws/Core/Core.csproj")],
                    self.kind,
                ))
            } else {
                StrategyOutcome::Failed(StrategyFailure::new(self.kind, format!("{} broke", self.kind)))
            }
        }
    }

    fn scripted(kind: StrategyKind, succeed: bool, calls: &Arc<AtomicUsize>) -> Box<dyn LoadStrategy> {
        Box::new(Scripted {
            kind,
            succeed,
            calls: Arc::clone(calls),
        })
    }

    #[test]
    fn stops_at_first_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = WorkspaceLoader::with_strategies(vec![
            scripted(StrategyKind::Semantic, false, &calls),
            scripted(StrategyKind::BuildMetadata, true, &calls),
            scripted(StrategyKind::RawManifest, true, &calls),
        ]);

        let analysis = loader
            .load(Path::new("/ws/App.sln"), &CancellationToken::new())
            .unwrap();

        assert_eq!(analysis.strategy_used, StrategyKind::BuildMetadata);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn exhaustion_reports_last_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = WorkspaceLoader::with_strategies(vec![
            scripted(StrategyKind::Semantic, false, &calls),
            scripted(StrategyKind::BuildMetadata, false, &calls),
            scripted(StrategyKind::RawManifest, false, &calls),
        ]);

        let err = loader
            .load(Path::new("/ws/App.sln"), &CancellationToken::new())
            .unwrap_err();

        match err {
            Error::Load(exhausted) => {
                assert_eq!(exhausted.attempts.len(), 3);
                assert_eq!(exhausted.last.strategy, StrategyKind::RawManifest);
                assert_eq!(exhausted.last.reason, "raw-manifest broke");
            }
            other => panic!("expected load failure, got {other:?}"),
        }
    }

    #[test]
    fn cancelled_token_skips_every_strategy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = WorkspaceLoader::with_strategies(vec![scripted(
            StrategyKind::RawManifest,
            true,
            &calls,
        )]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = loader.load(Path::new("/ws/App.sln"), &cancel).unwrap_err();

        assert!(matches!(err, Error::Cancelled { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn outcome_prefers_cancellation_over_failure() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: anyhow::Result<WorkspaceAnalysis> = Err(anyhow::anyhow!("killed"));
        assert!(matches!(
            outcome(StrategyKind::Semantic, result, &cancel),
            StrategyOutcome::Cancelled
        ));
    }

    #[test]
    fn config_builds_chain_in_order() {
        let config = LoaderConfig {
            strategies: vec![StrategyKind::RawManifest, StrategyKind::Semantic],
            ..LoaderConfig::default()
        };
        assert_eq!(
            WorkspaceLoader::new(&config).strategy_kinds(),
            vec![StrategyKind::RawManifest, StrategyKind::Semantic]
        );
    }
}
