//! Edge filtering by target name.

use super::DependencyGraph;
use crate::config::FilterRule;
use std::fmt;
use tracing::{debug, info};

/// Outcome of matching one edge target against a [`FilterRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// An allow pattern matched; the edge stays whatever the block list says
    Allowed,
    Blocked,
    /// Neither list matched; the edge stays
    Unmatched,
}

impl FilterDecision {
    pub fn retains(self) -> bool {
        !matches!(self, FilterDecision::Blocked)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub removed: usize,
    pub retained: usize,
}

impl FilterStats {
    fn total(&self) -> usize {
        self.removed + self.retained
    }

    pub fn removed_percent(&self) -> f64 {
        percent(self.removed, self.total())
    }

    pub fn retained_percent(&self) -> f64 {
        percent(self.retained, self.total())
    }
}

impl fmt::Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "filtered {} framework refs ({:.1}%), retained {} custom refs ({:.1}%)",
            self.removed,
            self.removed_percent(),
            self.retained,
            self.retained_percent()
        )
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Prefix(String),
    Exact(String),
}

impl Pattern {
    fn compile(raw: &str) -> Self {
        let folded = raw.trim().to_lowercase();
        match folded.strip_suffix('*') {
            Some(prefix) => Pattern::Prefix(prefix.to_string()),
            None => Pattern::Exact(folded),
        }
    }

    fn matches(&self, folded_name: &str) -> bool {
        match self {
            Pattern::Prefix(prefix) => folded_name.starts_with(prefix.as_str()),
            Pattern::Exact(exact) => folded_name == exact,
        }
    }
}

/// Compiled form of a [`FilterRule`].
#[derive(Debug, Clone)]
pub struct DependencyFilter {
    block: Vec<Pattern>,
    allow: Vec<Pattern>,
}

impl DependencyFilter {
    pub fn new(rule: &FilterRule) -> Self {
        Self {
            block: rule.block_patterns.iter().map(|p| Pattern::compile(p)).collect(),
            allow: rule.allow_patterns.iter().map(|p| Pattern::compile(p)).collect(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.block.is_empty()
    }

    pub fn decide(&self, target_name: &str) -> FilterDecision {
        let folded = target_name.to_lowercase();
        if self.allow.iter().any(|p| p.matches(&folded)) {
            FilterDecision::Allowed
        } else if self.block.iter().any(|p| p.matches(&folded)) {
            FilterDecision::Blocked
        } else {
            FilterDecision::Unmatched
        }
    }

    pub fn apply(&self, graph: &DependencyGraph) -> DependencyGraph {
        self.apply_with_stats(graph).0
    }

    /// New graph keeping every vertex and only the edges whose target is not
    /// blocked. The input graph is left untouched.
    pub fn apply_with_stats(&self, graph: &DependencyGraph) -> (DependencyGraph, FilterStats) {
        let mut stats = FilterStats::default();
        if self.is_noop() {
            stats.retained = graph.edge_count();
            debug!("No block patterns configured, keeping all edges");
            info!("{stats}");
            return (graph.clone(), stats);
        }

        let source = graph.as_petgraph();
        let filtered = source.filter_map(
            |_, node| Some(node.clone()),
            |edge, weight| {
                let (_, target) = source.edge_endpoints(edge)?;
                if self.decide(source[target].name()).retains() {
                    stats.retained += 1;
                    Some(*weight)
                } else {
                    stats.removed += 1;
                    None
                }
            },
        );

        info!("{stats}");

        (graph.with_edges(filtered), stats)
    }
}

/// Convenience wrapper over [`DependencyFilter`].
pub fn filter(graph: &DependencyGraph, rule: &FilterRule) -> DependencyGraph {
    DependencyFilter::new(rule).apply(graph)
}
