//! Shared data model for workspace analysis.
//!
//! Every value here is produced once by one pipeline stage and only read by
//! later stages.

pub mod cancellation;

pub use cancellation::CancellationToken;

use crate::errors::PartialParseWarning;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Target platform moniker used when a manifest declares none.
pub const UNKNOWN_PLATFORM: &str = "unknown";

/// Source language of a project, derived from its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    CSharp,
    VisualBasic,
    Unknown,
}

impl Language {
    /// Language implied by a manifest extension (`csproj`, `vbproj`).
    pub fn from_manifest_extension(ext: &str) -> Self {
        static EXTENSION_MAP: &[(&str, Language)] = &[
            ("csproj", Language::CSharp),
            ("vbproj", Language::VisualBasic),
        ];

        EXTENSION_MAP
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map(|(_, lang)| *lang)
            .unwrap_or(Language::Unknown)
    }

    pub fn from_manifest_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_manifest_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Extension of the language's source files, if it has one we analyze.
    pub fn source_extension(self) -> Option<&'static str> {
        match self {
            Language::CSharp => Some("cs"),
            Language::VisualBasic => Some("vb"),
            Language::Unknown => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::CSharp => "C#",
            Language::VisualBasic => "Visual Basic",
            Language::Unknown => "Unknown",
        };
        write!(f, "{name}")
    }
}

/// How a project declares an outgoing dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Reference to another workspace member's manifest
    ProjectReference,
    /// Reference to a compiled assembly or package
    AssemblyReference,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::ProjectReference => write!(f, "project"),
            ReferenceKind::AssemblyReference => write!(f, "assembly"),
        }
    }
}

/// One outgoing dependency, before graph assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub target_name: String,
    pub kind: ReferenceKind,
    pub target_path: Option<PathBuf>,
}

impl ReferenceEdge {
    pub fn project(target_name: impl Into<String>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            target_name: target_name.into(),
            kind: ReferenceKind::ProjectReference,
            target_path: Some(target_path.into()),
        }
    }

    pub fn assembly(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            kind: ReferenceKind::AssemblyReference,
            target_path: None,
        }
    }
}

/// Metadata for one workspace member, as extracted by a loading strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
    pub manifest_path: PathBuf,
    /// Platform moniker such as `net8.0` or `net472`; [`UNKNOWN_PLATFORM`] when undeterminable
    pub target_platform: String,
    pub language: Language,
    pub references: Vec<ReferenceEdge>,
    /// Source files compiled into the project
    #[serde(default)]
    pub source_files: Vec<PathBuf>,
}

impl ProjectDescriptor {
    pub fn new(name: impl Into<String>, manifest_path: impl Into<PathBuf>) -> Self {
        let manifest_path = manifest_path.into();
        Self {
            name: name.into(),
            language: Language::from_manifest_path(&manifest_path),
            manifest_path,
            target_platform: UNKNOWN_PLATFORM.to_string(),
            references: Vec::new(),
            source_files: Vec::new(),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.target_platform = platform.into();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_references(mut self, references: Vec<ReferenceEdge>) -> Self {
        self.references = references;
        self
    }

    pub fn with_source_files(mut self, files: Vec<PathBuf>) -> Self {
        self.source_files = files;
        self
    }

    pub fn project_dir(&self) -> &Path {
        self.manifest_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Loading strategies, highest fidelity first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Semantic,
    BuildMetadata,
    RawManifest,
}

impl StrategyKind {
    /// The full fallback chain in fidelity order.
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Semantic,
        StrategyKind::BuildMetadata,
        StrategyKind::RawManifest,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Semantic => write!(f, "semantic"),
            StrategyKind::BuildMetadata => write!(f, "build-metadata"),
            StrategyKind::RawManifest => write!(f, "raw-manifest"),
        }
    }
}

/// Result of loading one workspace descriptor.
#[derive(Debug, Clone)]
pub struct WorkspaceAnalysis {
    pub workspace_path: PathBuf,
    pub workspace_name: String,
    pub projects: im::Vector<ProjectDescriptor>,
    pub strategy_used: StrategyKind,
    /// Projects the strategy had to skip; only the raw-manifest strategy reports these
    pub partial_failures: Vec<PartialParseWarning>,
}

impl WorkspaceAnalysis {
    pub fn new(
        workspace_path: impl Into<PathBuf>,
        workspace_name: impl Into<String>,
        projects: impl IntoIterator<Item = ProjectDescriptor>,
        strategy_used: StrategyKind,
    ) -> Self {
        Self {
            workspace_path: workspace_path.into(),
            workspace_name: workspace_name.into(),
            projects: projects.into_iter().collect(),
            strategy_used,
            partial_failures: Vec::new(),
        }
    }

    pub fn with_partial_failures(mut self, failures: Vec<PartialParseWarning>) -> Self {
        self.partial_failures = failures;
        self
    }

    pub fn project(&self, name: &str) -> Option<&ProjectDescriptor> {
        self.projects.iter().find(|p| p.name == name)
    }
}
