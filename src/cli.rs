use crate::core::StrategyKind;
use crate::pipeline::{AnalysisReport, WorkspaceSummary};
use crate::scoring::AggregateScore;
use clap::{ArgAction, Parser};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "splitmap")]
#[command(
    about = "Rank the projects of a .NET solution by how hard they are to extract into services",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Solution files to analyze; several are merged into one graph
    #[arg(required = true, value_name = "SLN")]
    pub workspaces: Vec<PathBuf>,

    /// Configuration file (defaults to the nearest .splitmap.toml)
    #[arg(short, long, env = "SPLITMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show only the top N candidates
    #[arg(long = "top", visible_alias = "head")]
    pub top: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Add the System.*/Microsoft.* block list to the configured filter
    #[arg(long = "framework-defaults")]
    pub framework_defaults: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "splitmap=info",
            1 => "splitmap=debug",
            _ => "splitmap=trace",
        }
    }
}

fn top_n(ranking: &[AggregateScore], top: Option<usize>) -> &[AggregateScore] {
    match top {
        Some(n) => &ranking[..n.min(ranking.len())],
        None => ranking,
    }
}

pub fn render_table(report: &AnalysisReport, top: Option<usize>) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "#",
        "Project",
        "Score",
        "Coupling",
        "Complexity",
        "TechDebt",
        "Exposure",
    ]);

    for (rank, score) in top_n(&report.ranking, top).iter().enumerate() {
        let b = &score.breakdown;
        table.add_row(vec![
            (rank + 1).to_string(),
            score.project_name.clone(),
            format!("{:.1}", score.combined),
            format!("{:.1}", b.coupling),
            format!("{:.1}", b.complexity),
            format!("{:.1}", b.tech_debt),
            format!("{:.1}", b.external_exposure),
        ]);
    }

    let mut out = table.to_string();
    out.push('\n');
    out.push_str(&summary_line(report));
    out
}

fn summary_line(report: &AnalysisReport) -> String {
    let strategies: Vec<String> = report
        .workspaces
        .iter()
        .map(|w| format!("{} via {}", w.name, w.strategy))
        .collect();
    let mut line = format!(
        "{} projects ranked ({}); {} edges filtered",
        report.ranking.len(),
        strategies.join(", "),
        report.filter_stats.removed
    );
    if !report.partial_failures.is_empty() {
        line.push_str(&format!(
            "; {} projects skipped (unparseable manifests)",
            report.partial_failures.len()
        ));
    }
    if !report.integrity_errors.is_empty() {
        line.push_str(&format!(
            "; {} projects excluded (incomplete metrics)",
            report.integrity_errors.len()
        ));
    }
    if report.build_stats.unresolved_project_refs > 0 {
        line.push_str(&format!(
            "; {} unresolved project references",
            report.build_stats.unresolved_project_refs
        ));
    }
    line
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    workspaces: &'a [WorkspaceSummary],
    strategies: Vec<StrategyKind>,
    ranking: &'a [AggregateScore],
    vertices: usize,
    edges: usize,
    edges_filtered: usize,
    unresolved_project_refs: usize,
    partial_failures: Vec<String>,
    integrity_errors: Vec<String>,
}

pub fn render_json(report: &AnalysisReport, top: Option<usize>) -> serde_json::Result<String> {
    let json = JsonReport {
        workspaces: &report.workspaces,
        strategies: report.strategies(),
        ranking: top_n(&report.ranking, top),
        vertices: report.graph.node_count(),
        edges: report.graph.edge_count(),
        edges_filtered: report.filter_stats.removed,
        unresolved_project_refs: report.build_stats.unresolved_project_refs,
        partial_failures: report.partial_failures.iter().map(|w| w.to_string()).collect(),
        integrity_errors: report.integrity_errors.iter().map(|e| e.to_string()).collect(),
    };
    serde_json::to_string_pretty(&json)
}
