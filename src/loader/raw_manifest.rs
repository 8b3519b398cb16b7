//! Lowest-fidelity strategy: plain markup parsing, no build toolchain.
//!
//! Every project is parsed independently. Failures are collected rather than
//! aborting the run; the strategy only fails when nothing parsed.

use super::manifest::{collect_source_files, parse_manifest};
use super::solution::{parse_solution, SolutionEntry};
use super::{outcome, LoadStrategy, StrategyOutcome};
use crate::core::{CancellationToken, ProjectDescriptor, StrategyKind, WorkspaceAnalysis};
use crate::errors::PartialParseWarning;
use anyhow::{bail, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RawManifestStrategy {
    parallel: bool,
}

impl RawManifestStrategy {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    fn try_load(&self, workspace: &Path, cancel: &CancellationToken) -> Result<WorkspaceAnalysis> {
        let solution = parse_solution(workspace)?;
        let failures: Mutex<Vec<PartialParseWarning>> = Mutex::new(Vec::new());

        let parse_one = |entry: &SolutionEntry| -> Option<ProjectDescriptor> {
            if cancel.is_cancelled() {
                return None;
            }
            match parse_project(entry) {
                Ok(project) => {
                    debug!(project = %project.name, platform = %project.target_platform, "Parsed manifest");
                    Some(project)
                }
                Err(e) => {
                    failures.lock().push(PartialParseWarning {
                        project: entry.name.clone(),
                        manifest_path: entry.manifest_path.clone(),
                        reason: format!("{e:#}"),
                    });
                    None
                }
            }
        };

        // collect() keeps solution order in both modes
        let parsed: Vec<Option<ProjectDescriptor>> = if self.parallel {
            solution.entries.par_iter().map(parse_one).collect()
        } else {
            solution.entries.iter().map(parse_one).collect()
        };

        if cancel.is_cancelled() {
            bail!("cancelled while parsing manifests");
        }

        let projects: Vec<ProjectDescriptor> = parsed.into_iter().flatten().collect();
        let failures = failures.into_inner();

        if projects.is_empty() {
            let first = failures
                .first()
                .map(|f| f.reason.as_str())
                .unwrap_or("no project entries");
            bail!(
                "none of the {} listed projects could be parsed (first failure: {first})",
                solution.entries.len()
            );
        }

        if !failures.is_empty() {
            warn!(
                succeeded = projects.len(),
                failed = failures.len(),
                "Parsed {} of {} projects; skipping {} unreadable manifests",
                projects.len(),
                solution.entries.len(),
                failures.len()
            );
            for failure in &failures {
                warn!(project = %failure.project, "{failure}");
            }
        } else {
            info!(projects = projects.len(), "Parsed all manifests");
        }

        Ok(WorkspaceAnalysis::new(
            workspace,
            solution.name,
            projects,
            StrategyKind::RawManifest,
        )
        .with_partial_failures(failures))
    }
}

impl LoadStrategy for RawManifestStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RawManifest
    }

    fn load(&self, workspace: &Path, cancel: &CancellationToken) -> StrategyOutcome {
        outcome(self.kind(), self.try_load(workspace, cancel), cancel)
    }
}

/// Build a descriptor for one solution entry from its manifest alone.
pub fn parse_project(entry: &SolutionEntry) -> Result<ProjectDescriptor> {
    let info = parse_manifest(&entry.manifest_path)?;
    let language = entry.language();
    let sources = collect_source_files(&entry.manifest_path, &info, language);

    Ok(ProjectDescriptor::new(&entry.name, &entry.manifest_path)
        .with_language(language)
        .with_platform(info.target_platform)
        .with_references(info.references)
        .with_source_files(sources))
}
