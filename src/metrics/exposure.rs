//! Public API surface of a project.

use super::complexity::{
    csharp_parser, has_extension, metric_error, read_source, sum_over_sources, vb_code_portion,
};
use super::{MetricCalculator, MetricKind};
use crate::core::{CancellationToken, ProjectDescriptor};
use crate::errors::{Error, Result};
use crate::graph::DependencyGraph;
use std::path::Path;
use tree_sitter::{Node, Parser};

// Record structs parse as record_declaration too
const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "record_declaration",
    "enum_declaration",
    "delegate_declaration",
];

const MEMBER_KINDS: &[&str] = &[
    "method_declaration",
    "constructor_declaration",
    "property_declaration",
    "indexer_declaration",
    "field_declaration",
    "event_declaration",
    "event_field_declaration",
    "operator_declaration",
    "conversion_operator_declaration",
];

/// Counts public types reachable from outside the assembly plus their
/// public members.
#[derive(Debug, Clone, Copy)]
pub struct ExposureCalculator {
    /// Parse a project's files on the rayon pool
    pub parallel: bool,
}

impl Default for ExposureCalculator {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ExposureCalculator {
    pub fn project_exposure(&self, project: &ProjectDescriptor) -> anyhow::Result<u64> {
        sum_over_sources(&project.source_files, self.parallel, file_exposure)
    }
}

impl MetricCalculator for ExposureCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::ExternalExposure
    }

    fn raw_scores(
        &self,
        graph: &DependencyGraph,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, f64)>> {
        csharp_parser().map_err(|e| metric_error(self.kind(), e))?;

        let mut scores = Vec::with_capacity(graph.project_count());
        for project in graph.projects() {
            if cancel.is_cancelled() {
                return Err(Error::cancelled("metric calculation"));
            }
            let raw = self
                .project_exposure(project)
                .map_err(|e| metric_error(self.kind(), e))?;
            scores.push((project.name.clone(), raw as f64));
        }
        Ok(scores)
    }
}

fn file_exposure(parser: &mut Parser, path: &Path) -> u64 {
    if has_extension(path, "cs") {
        read_source(path).map_or(0, |source| csharp_exposure(parser, &source))
    } else if has_extension(path, "vb") {
        read_source(path).map_or(0, |source| vb_exposure(&source))
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    /// Compilation unit or namespace body
    Namespace,
    PublicType { interface: bool },
    /// Inside a type that is not visible outside the assembly
    Hidden,
}

pub fn csharp_exposure(parser: &mut Parser, source: &str) -> u64 {
    let Some(tree) = parser.parse(source, None) else {
        return 0;
    };
    let source = source.as_bytes();

    let mut total = 0;
    let mut stack = vec![(tree.root_node(), Scope::Namespace)];
    while let Some((node, scope)) = stack.pop() {
        for child in node.children(&mut node.walk()) {
            let kind = child.kind();
            if TYPE_KINDS.contains(&kind) {
                let visible = match scope {
                    Scope::Hidden => false,
                    Scope::PublicType { interface: true } => true,
                    _ => has_public_modifier(&child, source),
                };
                let inner = if visible {
                    total += 1;
                    Scope::PublicType {
                        interface: kind == "interface_declaration",
                    }
                } else {
                    Scope::Hidden
                };
                stack.push((child, inner));
            } else if MEMBER_KINDS.contains(&kind) {
                if let Scope::PublicType { interface } = scope {
                    if interface || has_public_modifier(&child, source) {
                        total += 1;
                    }
                }
            } else {
                stack.push((child, scope));
            }
        }
    }
    total
}

fn has_public_modifier(node: &Node, source: &[u8]) -> bool {
    node.children(&mut node.walk()).any(|child| {
        child.kind() == "modifier" && child.utf8_text(source).is_ok_and(|text| text == "public")
    })
}

/// Lines that declare a `Public` type or member.
pub fn vb_exposure(source: &str) -> u64 {
    source
        .lines()
        .filter(|line| {
            let code = vb_code_portion(line);
            code.split_whitespace()
                .next()
                .is_some_and(|word| word.eq_ignore_ascii_case("public"))
        })
        .count() as u64
}
