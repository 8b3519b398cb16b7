//! Cyclomatic complexity summed over a project's source files.
//!
//! C# sources are parsed with tree-sitter; every callable member starts at 1
//! and each decision point adds 1. Visual Basic sources use a keyword count
//! over comment-stripped lines.

use super::{MetricCalculator, MetricKind};
use crate::core::{CancellationToken, ProjectDescriptor};
use crate::errors::{Error, Result};
use crate::graph::DependencyGraph;
use anyhow::{anyhow, Context};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, Copy)]
pub struct ComplexityCalculator {
    /// Parse a project's files on the rayon pool
    pub parallel: bool,
}

impl Default for ComplexityCalculator {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ComplexityCalculator {
    pub fn project_complexity(&self, project: &ProjectDescriptor) -> anyhow::Result<u64> {
        sum_over_sources(&project.source_files, self.parallel, file_complexity)
    }
}

impl MetricCalculator for ComplexityCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::Complexity
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
                .project_complexity(project)
                .map_err(|e| metric_error(self.kind(), e))?;
            scores.push((project.name.clone(), raw as f64));
        }
        Ok(scores)
    }
}

pub fn csharp_parser() -> anyhow::Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .context("Failed to set C# language")?;
    Ok(parser)
}

pub(crate) fn metric_error(kind: MetricKind, error: anyhow::Error) -> Error {
    Error::Metric {
        kind,
        message: format!("{error:#}"),
    }
}

/// Sum `score` over source files, with one C# parser per worker.
pub(crate) fn sum_over_sources<F>(
    files: &[PathBuf],
    parallel: bool,
    score: F,
) -> anyhow::Result<u64>
where
    F: Fn(&mut Parser, &Path) -> u64 + Send + Sync,
{
    if parallel {
        files
            .par_iter()
            .map_init(csharp_parser, |parser, path| match parser {
                Ok(parser) => Ok(score(parser, path)),
                Err(e) => Err(anyhow!("{e:#}")),
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    } else {
        let mut parser = csharp_parser()?;
        Ok(files.iter().map(|path| score(&mut parser, path)).sum())
    }
}

/// Source text of a file, or `None` (logged) when it cannot be read.
pub(crate) fn read_source(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .map_err(|e| debug!(path = %path.display(), "Skipping unreadable source file: {e}"))
        .ok()
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn file_complexity(parser: &mut Parser, path: &Path) -> u64 {
    if has_extension(path, "cs") {
        read_source(path).map_or(0, |source| csharp_complexity(parser, &source))
    } else if has_extension(path, "vb") {
        read_source(path).map_or(0, |source| vb_complexity(&source))
    } else {
        0
    }
}

/// Complexity of one C# compilation unit.
pub fn csharp_complexity(parser: &mut Parser, source: &str) -> u64 {
    let Some(tree) = parser.parse(source, None) else {
        return 0;
    };

    // Explicit stack: else-if and operator chains nest as deep as they are long
    let mut total = 0;
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        total += decision_weight(&node);
        stack.extend(node.children(&mut node.walk()));
    }
    total
}

fn decision_weight(node: &Node) -> u64 {
    match node.kind() {
        "method_declaration"
        | "constructor_declaration"
        | "destructor_declaration"
        | "operator_declaration"
        | "conversion_operator_declaration"
        | "local_function_statement"
        | "lambda_expression"
        | "anonymous_method_expression" => 1,
        "accessor_declaration" if has_body(node) => 1,
        "if_statement" | "while_statement" | "for_statement" | "foreach_statement"
        | "do_statement" | "catch_clause" | "switch_section" | "switch_expression_arm"
        | "conditional_expression" => 1,
        "binary_expression" => node
            .children(&mut node.walk())
            .filter(|child| matches!(child.kind(), "&&" | "||" | "??"))
            .count() as u64,
        _ => 0,
    }
}

/// Auto-property accessors (`get;`) have no body and no logic.
fn has_body(node: &Node) -> bool {
    node.children(&mut node.walk())
        .any(|child| matches!(child.kind(), "block" | "arrow_expression_clause"))
}

/// Complexity of one Visual Basic source file.
pub fn vb_complexity(source: &str) -> u64 {
    source
        .lines()
        .map(|line| {
            let code = vb_code_portion(line).to_lowercase();
            let words: Vec<&str> = code
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .filter(|w| !w.is_empty())
                .collect();
            if words.first() == Some(&"rem") {
                return 0;
            }

            let mut count = 0;
            for (i, word) in words.iter().enumerate() {
                let previous = if i > 0 { words[i - 1] } else { "" };
                let closes = matches!(previous, "end" | "exit" | "continue");
                let counts = match *word {
                    "elseif" | "catch" | "andalso" | "orelse" | "case" => previous != "select",
                    "if" | "for" | "do" | "sub" | "function" => !closes,
                    "while" => !closes && !matches!(previous, "do" | "loop"),
                    _ => false,
                };
                if counts {
                    count += 1;
                }
            }
            count
        })
        .sum()
}

/// Text before a `'` comment, with string literal contents blanked.
pub(crate) fn vb_code_portion(line: &str) -> String {
    let mut code = String::with_capacity(line.len());
    let mut in_string = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_string = !in_string;
                code.push(' ');
            }
            '\'' if !in_string => break,
            _ if in_string => code.push(' '),
            _ => code.push(c),
        }
    }
    code
}
