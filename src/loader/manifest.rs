//! Project manifest (`.csproj` / `.vbproj`) parsing.
//!
//! Supports the modern SDK-style shape (implicit compile items, a handful of
//! properties) and the legacy verbose shape (explicit `Compile` and
//! `Reference` lists, `TargetFrameworkVersion`). The reader is a streaming
//! `quick-xml` loop; unknown elements are ignored.

use super::paths::{manifest_stem, resolve_path};
use super::platform::{assembly_identity_name, is_platform_reference, resolve_target_platform};
use crate::core::{Language, ReferenceEdge};
use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Properties read from `PropertyGroup` elements.
const PROPERTIES: &[&str] = &[
    "TargetFramework",
    "TargetFrameworks",
    "TargetFrameworkVersion",
    "EnableDefaultCompileItems",
];

/// Directories never scanned for implicit compile items.
const EXCLUDED_DIRS: &[&str] = &["bin", "obj"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestShape {
    /// SDK-driven project with implicit default items
    Modern,
    /// Verbose project with explicit reference and compile lists
    Legacy,
}

/// Everything extracted from a single manifest.
#[derive(Debug, Clone)]
pub struct ManifestInfo {
    pub shape: ManifestShape,
    pub target_platform: String,
    /// Project references first, then retained external references
    pub references: Vec<ReferenceEdge>,
    /// `Compile Include` items, resolved against the manifest directory
    pub explicit_compile: Vec<PathBuf>,
    pub default_compile_items: bool,
}

pub fn parse_manifest(path: &Path) -> Result<ManifestInfo> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    parse_manifest_str(&content, path)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))
}

/// Parse manifest markup. `manifest_path` anchors relative item paths.
pub fn parse_manifest_str(content: &str, manifest_path: &Path) -> Result<ManifestInfo> {
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut saw_project_root = false;
    let mut modern = false;
    let mut properties: HashMap<&'static str, String> = HashMap::new();
    let mut capturing: Option<&'static str> = None;
    let mut project_refs = Vec::new();
    let mut external_refs = Vec::new();
    let mut explicit_compile = Vec::new();

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed XML at byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = local_name(e);

                if stack.is_empty() {
                    if name != "Project" {
                        bail!("Root element is <{name}>, expected <Project>");
                    }
                    saw_project_root = true;
                    modern |= attribute(e, "Sdk")?.is_some();
                } else {
                    let parent = stack.last().map(String::as_str);
                    match (parent, name.as_str()) {
                        (Some("Project"), "Sdk") => modern = true,
                        (Some("Project"), "Import") => modern |= attribute(e, "Sdk")?.is_some(),
                        (Some("PropertyGroup"), prop) => {
                            capturing = PROPERTIES.iter().copied().find(|p| *p == prop);
                        }
                        (Some("ItemGroup"), item) => {
                            if let Some(include) = attribute(e, "Include")? {
                                collect_item(
                                    item,
                                    &include,
                                    base_dir,
                                    &mut project_refs,
                                    &mut external_refs,
                                    &mut explicit_compile,
                                );
                            }
                        }
                        _ => {}
                    }
                }

                if is_empty {
                    capturing = None;
                } else {
                    stack.push(name);
                }
            }
            Event::Text(text) => {
                if let Some(prop) = capturing {
                    let value = text.unescape()?.trim().to_string();
                    if !value.is_empty() {
                        properties.entry(prop).or_insert(value);
                    }
                }
            }
            Event::End(_) => {
                stack.pop();
                capturing = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_project_root {
        bail!("Document has no <Project> element");
    }
    if !stack.is_empty() {
        bail!("Unexpected end of document inside <{}>", stack.join("/"));
    }

    let target_platform = resolve_target_platform(
        properties.get("TargetFramework").map(String::as_str),
        properties.get("TargetFrameworks").map(String::as_str),
        properties.get("TargetFrameworkVersion").map(String::as_str),
    );
    let default_compile_items = modern
        && !properties
            .get("EnableDefaultCompileItems")
            .is_some_and(|v| v.eq_ignore_ascii_case("false"));

    let mut references = project_refs;
    references.extend(external_refs);

    Ok(ManifestInfo {
        shape: if modern {
            ManifestShape::Modern
        } else {
            ManifestShape::Legacy
        },
        target_platform,
        references,
        explicit_compile,
        default_compile_items,
    })
}

fn collect_item(
    item: &str,
    include: &str,
    base_dir: &Path,
    project_refs: &mut Vec<ReferenceEdge>,
    external_refs: &mut Vec<ReferenceEdge>,
    explicit_compile: &mut Vec<PathBuf>,
) {
    match item {
        "ProjectReference" => {
            let path = resolve_path(base_dir, include);
            if let Some(name) = manifest_stem(&path) {
                project_refs.push(ReferenceEdge::project(name, path));
            }
        }
        "Reference" | "PackageReference" => {
            let name = assembly_identity_name(include);
            if !name.is_empty() && !is_platform_reference(name) {
                external_refs.push(ReferenceEdge::assembly(name));
            }
        }
        "Compile" => {
            for entry in include.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                explicit_compile.push(resolve_path(base_dir, entry));
            }
        }
        _ => {}
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Source files compiled into a project.
///
/// Modern manifests include every source file of the project language below
/// the project directory (minus `bin/` and `obj/`); legacy manifests list
/// them explicitly. Explicit wildcard items expand to the files below the
/// wildcard's directory.
pub fn collect_source_files(
    manifest_path: &Path,
    info: &ManifestInfo,
    language: Language,
) -> Vec<PathBuf> {
    let Some(ext) = language.source_extension() else {
        return Vec::new();
    };
    let project_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut files = BTreeSet::new();
    if info.default_compile_items {
        files.extend(walk_sources(project_dir, ext));
    }
    for item in &info.explicit_compile {
        let text = item.to_string_lossy();
        match text.find('*') {
            Some(star) => {
                let dir = Path::new(&text[..star]);
                let dir = if text[..star].ends_with('/') {
                    dir.to_path_buf()
                } else {
                    dir.parent().map(Path::to_path_buf).unwrap_or_default()
                };
                files.extend(walk_sources(&dir, ext));
            }
            None => {
                files.insert(item.clone());
            }
        }
    }
    files.into_iter().collect()
}

fn walk_sources(dir: &Path, ext: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || entry.file_name().to_str().is_some_and(|name| {
                    !name.starts_with('.')
                        && !EXCLUDED_DIRS.iter().any(|d| d.eq_ignore_ascii_case(name))
                })
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        })
        .map(|entry| entry.into_path())
        .collect()
}
