//! Middle-fidelity strategy: MSBuild evaluation without compilation.

use super::dotnet::{DotnetToolchain, EvaluationMode};
use super::solution::parse_solution;
use super::{outcome, LoadStrategy, StrategyOutcome};
use crate::core::{CancellationToken, ProjectDescriptor, StrategyKind, WorkspaceAnalysis};
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BuildMetadataStrategy {
    timeout: Duration,
}

impl BuildMetadataStrategy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn try_load(&self, workspace: &Path, cancel: &CancellationToken) -> Result<WorkspaceAnalysis> {
        let toolchain = DotnetToolchain::locate(self.timeout)?;
        let solution = parse_solution(workspace)?;
        let mut projects = Vec::with_capacity(solution.entries.len());

        for entry in &solution.entries {
            if cancel.is_cancelled() {
                bail!("cancelled before evaluating {}", entry.name);
            }
            let output = toolchain
                .evaluate(&entry.manifest_path, EvaluationMode::Metadata, &[], cancel)
                .with_context(|| format!("Failed to evaluate project {}", entry.name))?;

            let project = ProjectDescriptor::new(&entry.name, &entry.manifest_path)
                .with_language(entry.language())
                .with_platform(output.target_platform())
                .with_references(output.declared_references(&entry.manifest_path))
                .with_source_files(output.compile_items(&entry.manifest_path));
            debug!(project = %project.name, references = project.references.len(), "Evaluated project");
            projects.push(project);
        }

        Ok(WorkspaceAnalysis::new(
            workspace,
            solution.name,
            projects,
            StrategyKind::BuildMetadata,
        ))
    }
}

impl LoadStrategy for BuildMetadataStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BuildMetadata
    }

    fn load(&self, workspace: &Path, cancel: &CancellationToken) -> StrategyOutcome {
        outcome(self.kind(), self.try_load(workspace, cancel), cancel)
    }
}
