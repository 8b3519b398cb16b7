//! `dotnet msbuild` integration shared by the semantic and build-metadata
//! strategies.
//!
//! Projects are evaluated with `-getProperty`/`-getItem`, which makes MSBuild
//! print a JSON document instead of a build log.

use super::paths::{manifest_stem, normalize, resolve_path};
use super::platform::{assembly_identity_name, is_platform_reference, resolve_target_platform};
use crate::core::{CancellationToken, ReferenceEdge};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Properties requested from every evaluation.
const PROPERTIES: &[&str] = &["TargetFramework", "TargetFrameworks", "TargetFrameworkVersion"];

/// How deep MSBuild should go for one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Static evaluation only, no targets run
    Metadata,
    /// Restore and run `ResolveReferences`, yielding resolved reference paths
    Resolved,
}

/// Located `dotnet` executable.
#[derive(Debug, Clone)]
pub struct DotnetToolchain {
    dotnet: PathBuf,
    timeout: Duration,
}

impl DotnetToolchain {
    pub fn locate(timeout: Duration) -> Result<Self> {
        let dotnet = which::which("dotnet").context("dotnet not found in PATH")?;
        Ok(Self::with_executable(dotnet, timeout))
    }

    pub(crate) fn with_executable(dotnet: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            dotnet: dotnet.into(),
            timeout,
        }
    }

    /// Evaluate one manifest and return MSBuild's JSON report.
    pub fn evaluate(
        &self,
        manifest: &Path,
        mode: EvaluationMode,
        extra_properties: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> Result<MsBuildOutput> {
        let mut args: Vec<OsString> = vec!["msbuild".into(), manifest.into(), "-nologo".into()];
        if mode == EvaluationMode::Resolved {
            args.push("-restore".into());
            args.push("-t:ResolveReferences".into());
        }
        for (name, value) in extra_properties {
            args.push(format!("-p:{name}={value}").into());
        }
        for property in PROPERTIES {
            args.push(format!("-getProperty:{property}").into());
        }
        let items: &[&str] = match mode {
            EvaluationMode::Metadata => {
                &["ProjectReference", "Reference", "PackageReference", "Compile"]
            }
            EvaluationMode::Resolved => &["ReferencePath", "ProjectReference", "Compile"],
        };
        for item in items {
            args.push(format!("-getItem:{item}").into());
        }

        let stdout = self.run(&args, cancel)?;
        serde_json::from_str(&stdout)
            .with_context(|| format!("Unexpected msbuild output for {}", manifest.display()))
    }

    fn run(&self, args: &[OsString], cancel: &CancellationToken) -> Result<String> {
        let mut child = Command::new(&self.dotnet)
            .args(args)
            .env("DOTNET_CLI_TELEMETRY_OPTOUT", "1")
            .env("DOTNET_NOLOGO", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to start dotnet")?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let started = Instant::now();

        let status = loop {
            if let Some(status) = child.try_wait().context("Failed to wait for dotnet")? {
                break status;
            }
            if cancel.is_cancelled() {
                kill(&mut child);
                bail!("dotnet msbuild cancelled");
            }
            if started.elapsed() > self.timeout {
                kill(&mut child);
                bail!("dotnet msbuild timed out after {}s", self.timeout.as_secs());
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        if !status.success() {
            // msbuild reports evaluation errors on stdout
            let detail = if stderr.trim().is_empty() { &stdout } else { &stderr };
            bail!("dotnet msbuild exited with {status}: {}", tail(detail, 20));
        }
        Ok(stdout)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buffer);
        }
        buffer
    })
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

/// JSON printed by `msbuild -getProperty/-getItem`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MsBuildOutput {
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub items: HashMap<String, Vec<MsBuildItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MsBuildItem {
    #[serde(rename = "Identity")]
    pub identity: String,
    #[serde(flatten)]
    pub metadata: HashMap<String, String>,
}

impl MsBuildItem {
    fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// `FullPath` metadata, or the identity resolved against `base_dir`.
    fn full_path(&self, base_dir: &Path) -> PathBuf {
        self.meta("FullPath")
            .map(|p| resolve_path(base_dir, p))
            .unwrap_or_else(|| resolve_path(base_dir, &self.identity))
    }
}

impl MsBuildOutput {
    fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    fn items(&self, name: &str) -> &[MsBuildItem] {
        self.items.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn target_platform(&self) -> String {
        resolve_target_platform(
            self.property("TargetFramework"),
            self.property("TargetFrameworks"),
            self.property("TargetFrameworkVersion"),
        )
    }

    /// Set when the project multi-targets and no single framework was selected.
    pub fn unselected_framework(&self) -> Option<String> {
        match self.property("TargetFramework") {
            Some(_) => None,
            None => self
                .property("TargetFrameworks")
                .and_then(super::platform::first_framework),
        }
    }

    /// References declared in the evaluated project.
    pub fn declared_references(&self, manifest: &Path) -> Vec<ReferenceEdge> {
        let base_dir = manifest.parent().unwrap_or_else(|| Path::new("."));
        let mut references = Vec::new();

        for item in self.items("ProjectReference") {
            let path = item.full_path(base_dir);
            if let Some(name) = manifest_stem(&path) {
                references.push(ReferenceEdge::project(name, path));
            }
        }
        for item in self
            .items("Reference")
            .iter()
            .chain(self.items("PackageReference"))
        {
            push_external(&mut references, assembly_identity_name(&item.identity));
        }
        dedupe(references)
    }

    /// References after MSBuild resolved them (`ReferencePath` items).
    pub fn resolved_references(&self, manifest: &Path) -> Vec<ReferenceEdge> {
        let base_dir = manifest.parent().unwrap_or_else(|| Path::new("."));
        let mut references = Vec::new();

        for item in self.items("ReferencePath") {
            let from_project = item
                .meta("ReferenceSourceTarget")
                .is_some_and(|t| t.eq_ignore_ascii_case("ProjectReference"));
            let source_project = item
                .meta("MSBuildSourceProjectFile")
                .map(|p| resolve_path(base_dir, p));

            match (from_project, source_project) {
                (true, Some(path)) => {
                    if let Some(name) = manifest_stem(&path) {
                        references.push(ReferenceEdge::project(name, normalize(&path)));
                    }
                }
                _ => {
                    let name = item
                        .meta("Filename")
                        .map(str::to_string)
                        .or_else(|| manifest_stem(Path::new(&item.identity)))
                        .unwrap_or_default();
                    push_external(&mut references, &name);
                }
            }
        }
        // Unbuilt project references still count as coupling.
        for item in self.items("ProjectReference") {
            let path = item.full_path(base_dir);
            if let Some(name) = manifest_stem(&path) {
                references.push(ReferenceEdge::project(name, path));
            }
        }
        dedupe(references)
    }

    pub fn compile_items(&self, manifest: &Path) -> Vec<PathBuf> {
        let base_dir = manifest.parent().unwrap_or_else(|| Path::new("."));
        self.items("Compile")
            .iter()
            .map(|item| item.full_path(base_dir))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn push_external(references: &mut Vec<ReferenceEdge>, name: &str) {
    let name = name.trim();
    if !name.is_empty() && !is_platform_reference(name) {
        references.push(ReferenceEdge::assembly(name));
    }
}

fn dedupe(references: Vec<ReferenceEdge>) -> Vec<ReferenceEdge> {
    let mut seen = std::collections::HashSet::new();
    references
        .into_iter()
        .filter(|r| seen.insert((r.kind, r.target_name.to_ascii_lowercase())))
        .collect()
}
