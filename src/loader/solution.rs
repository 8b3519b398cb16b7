//! Workspace descriptor (`.sln`) parsing.
//!
//! Only `Project(...)` entry lines are recognized. Solution folders carry a
//! reserved type GUID and are skipped; every other line is ignored.

use super::paths::resolve_path;
use crate::core::Language;
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Type GUID of solution folder (grouping) entries.
pub const SOLUTION_FOLDER_TYPE: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

static PROJECT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^Project\("\{(?P<type>[0-9A-Fa-f-]+)\}"\)\s*=\s*"(?P<name>[^"]+)"\s*,\s*"(?P<path>[^"]+)"\s*,\s*"\{(?P<guid>[0-9A-Fa-f-]+)\}"\s*$"#,
    )
    .unwrap()
});

/// One project entry of a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionEntry {
    pub name: String,
    pub manifest_path: PathBuf,
    pub type_guid: String,
    pub project_guid: String,
}

/// A parsed workspace descriptor.
#[derive(Debug, Clone)]
pub struct SolutionFile {
    pub path: PathBuf,
    pub name: String,
    pub entries: Vec<SolutionEntry>,
}

/// Read and parse a solution file; fails when it lists no projects.
pub fn parse_solution(path: &Path) -> Result<SolutionFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read solution {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let entries = parse_solution_str(&content, base_dir);

    if entries.is_empty() {
        bail!("Solution {} lists no projects", path.display());
    }

    Ok(SolutionFile {
        path: path.to_path_buf(),
        name: workspace_name(path),
        entries,
    })
}

/// Extract project entries from solution text, resolving paths against `base_dir`.
pub fn parse_solution_str(content: &str, base_dir: &Path) -> Vec<SolutionEntry> {
    content
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .filter_map(|line| PROJECT_LINE.captures(line))
        .filter(|caps| !caps["type"].eq_ignore_ascii_case(SOLUTION_FOLDER_TYPE))
        .map(|caps| SolutionEntry {
            name: caps["name"].to_string(),
            manifest_path: resolve_path(base_dir, &caps["path"]),
            type_guid: caps["type"].to_ascii_uppercase(),
            project_guid: caps["guid"].to_ascii_uppercase(),
        })
        .collect()
}

impl SolutionEntry {
    /// Language from the manifest extension, falling back to the entry's type GUID.
    pub fn language(&self) -> Language {
        match Language::from_manifest_path(&self.manifest_path) {
            Language::Unknown => language_for_type_guid(&self.type_guid),
            known => known,
        }
    }
}

/// Project type GUIDs for the two supported languages, legacy and SDK-style.
pub fn language_for_type_guid(guid: &str) -> Language {
    static TYPE_GUIDS: &[(&str, Language)] = &[
        ("FAE04EC0-301F-11D3-BF4B-00C04F79EFBC", Language::CSharp),
        ("9A19103F-16F7-4668-BE54-9A1E7A4F7556", Language::CSharp),
        ("F184B08F-C81C-45F6-A57F-5ABD9991F28F", Language::VisualBasic),
        ("778DAE3C-4631-46EA-AA77-85C1314464D9", Language::VisualBasic),
    ];

    TYPE_GUIDS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(guid))
        .map(|(_, lang)| *lang)
        .unwrap_or(Language::Unknown)
}

pub fn workspace_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("workspace")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const SOLUTION: &str = indoc! {r#"
        Microsoft Visual Studio Solution File, Format Version 12.00
        # Visual Studio Version 17
        Project("{2150E333-8FDC-42A3-9474-1A3956D46DE8}") = "src", "src", "{11111111-1111-1111-1111-111111111111}"
        EndProject
        Project("{9A19103F-16F7-4668-BE54-9A1E7A4F7556}") = "Core", "src\Core\Core.csproj", "{22222222-2222-2222-2222-222222222222}"
        EndProject
        Project("{F184B08F-C81C-45F6-A57F-5ABD9991F28F}") = "Legacy", "legacy\Legacy.vbproj", "{33333333-3333-3333-3333-333333333333}"
        EndProject
        Project("{9A19103F-16F7-4668-BE54-9A1E7A4F7556}") = "Broken", "no closing quote
        Global
        EndGlobal
    "#};

    #[test]
    fn skips_folders_and_malformed_lines() {
        let entries = parse_solution_str(SOLUTION, Path::new("/ws"));
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Core", "Legacy"]);
    }

    #[test]
    fn resolves_entry_paths_against_descriptor_dir() {
        let entries = parse_solution_str(SOLUTION, Path::new("/ws"));
        assert_eq!(
            entries[0].manifest_path,
            PathBuf::from("/ws/src/Core/Core.csproj")
        );
        assert_eq!(entries[1].type_guid, "F184B08F-C81C-45F6-A57F-5ABD9991F28F");
    }

    #[test]
    fn empty_solution_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Empty.sln");
        fs::write(&path, "Global\nEndGlobal\n").unwrap();

        let err = parse_solution(&path).unwrap_err();
        assert!(err.to_string().contains("lists no projects"));
    }

    #[test]
    fn language_falls_back_to_type_guid() {
        let entry = SolutionEntry {
            name: "Web".into(),
            manifest_path: PathBuf::from("/ws/Web/Web.proj"),
            type_guid: "fae04ec0-301f-11d3-bf4b-00c04f79efbc".into(),
            project_guid: "44444444-4444-4444-4444-444444444444".into(),
        };
        assert_eq!(entry.language(), Language::CSharp);
    }

    #[test]
    fn workspace_name_is_file_stem() {
        assert_eq!(workspace_name(Path::new("/ws/Acme.Monolith.sln")), "Acme.Monolith");
    }
}
