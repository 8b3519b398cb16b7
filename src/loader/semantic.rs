//! Highest-fidelity strategy: restore and resolve every project's references
//! through MSBuild, so outgoing edges and target platforms are what the
//! compiler would actually see.

use super::dotnet::{DotnetToolchain, EvaluationMode};
use super::solution::{parse_solution, SolutionEntry};
use super::{outcome, LoadStrategy, StrategyOutcome};
use crate::core::{CancellationToken, ProjectDescriptor, StrategyKind, WorkspaceAnalysis};
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SemanticStrategy {
    timeout: Duration,
}

impl SemanticStrategy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn try_load(&self, workspace: &Path, cancel: &CancellationToken) -> Result<WorkspaceAnalysis> {
        let toolchain = DotnetToolchain::locate(self.timeout)?;
        let solution = parse_solution(workspace)?;
        let mut projects = Vec::with_capacity(solution.entries.len());

        for entry in &solution.entries {
            if cancel.is_cancelled() {
                bail!("cancelled before resolving {}", entry.name);
            }
            let project = resolve_project(&toolchain, entry, cancel)
                .with_context(|| format!("Failed to resolve project {}", entry.name))?;
            debug!(project = %project.name, platform = %project.target_platform, "Resolved project");
            projects.push(project);
        }

        Ok(WorkspaceAnalysis::new(
            workspace,
            solution.name,
            projects,
            StrategyKind::Semantic,
        ))
    }
}

fn resolve_project(
    toolchain: &DotnetToolchain,
    entry: &SolutionEntry,
    cancel: &CancellationToken,
) -> Result<ProjectDescriptor> {
    let manifest = &entry.manifest_path;
    let evaluated = toolchain.evaluate(manifest, EvaluationMode::Metadata, &[], cancel)?;

    // Multi-targeting projects cannot resolve references until one framework is picked.
    let framework = evaluated.unselected_framework();
    let properties: Vec<(&str, &str)> = framework
        .as_deref()
        .map(|tf| vec![("TargetFramework", tf)])
        .unwrap_or_default();
    let resolved = toolchain.evaluate(manifest, EvaluationMode::Resolved, &properties, cancel)?;

    Ok(ProjectDescriptor::new(&entry.name, manifest)
        .with_language(entry.language())
        .with_platform(resolved.target_platform())
        .with_references(resolved.resolved_references(manifest))
        .with_source_files(resolved.compile_items(manifest)))
}

impl LoadStrategy for SemanticStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Semantic
    }

    fn load(&self, workspace: &Path, cancel: &CancellationToken) -> StrategyOutcome {
        outcome(self.kind(), self.try_load(workspace, cancel), cancel)
    }
}
