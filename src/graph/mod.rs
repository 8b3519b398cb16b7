//! Immutable project dependency graph.
//!
//! A [`DependencyGraph`] is built once by the [`builder`] and never changes.
//! Transformations such as [`filter`] return a new graph, so the same value
//! can be read concurrently by metric calculators and downstream consumers
//! (rendering, cycle analysis) without locking.

pub mod builder;
pub mod filter;

pub use builder::{BuildStats, GraphBuilder};
pub use filter::{DependencyFilter, FilterDecision, FilterStats};

use crate::core::{ProjectDescriptor, ReferenceKind};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::sync::Arc;

/// A vertex: either a workspace project or a synthesized external reference target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphNode {
    Project(ProjectNode),
    External { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNode {
    pub descriptor: ProjectDescriptor,
    /// Name of the workspace the project was loaded from
    pub workspace: String,
}

impl GraphNode {
    pub fn name(&self) -> &str {
        match self {
            GraphNode::Project(project) => &project.descriptor.name,
            GraphNode::External { name } => name,
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(self, GraphNode::Project(_))
    }

    pub fn descriptor(&self) -> Option<&ProjectDescriptor> {
        match self {
            GraphNode::Project(project) => Some(&project.descriptor),
            GraphNode::External { .. } => None,
        }
    }
}

/// Edge payload stored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub kind: ReferenceKind,
    /// Source and target projects come from different workspaces
    pub cross_workspace: bool,
}

/// Borrowed view of one edge with its endpoint names resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub kind: ReferenceKind,
    pub cross_workspace: bool,
}

#[derive(Debug)]
struct GraphData {
    graph: DiGraph<GraphNode, DependencyEdge>,
}

/// Directed dependency graph with vertices unique by name.
///
/// Cloning is cheap and shares the underlying storage.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    data: Arc<GraphData>,
    /// Shared between a graph and every graph derived from it, since
    /// transformations never add or remove vertices.
    index: Arc<HashMap<String, NodeIndex>>,
}

impl DependencyGraph {
    pub(crate) fn from_parts(
        graph: DiGraph<GraphNode, DependencyEdge>,
        index: Arc<HashMap<String, NodeIndex>>,
    ) -> Self {
        debug_assert_eq!(graph.node_count(), index.len());
        Self {
            data: Arc::new(GraphData { graph }),
            index,
        }
    }

    /// Derive a graph with the same vertices and a different edge set.
    pub(crate) fn with_edges(&self, graph: DiGraph<GraphNode, DependencyEdge>) -> Self {
        Self::from_parts(graph, Arc::clone(&self.index))
    }

    pub fn empty() -> Self {
        Self::from_parts(DiGraph::new(), Arc::new(HashMap::new()))
    }

    /// Read-only access for consumers that run their own graph algorithms.
    pub fn as_petgraph(&self) -> &DiGraph<GraphNode, DependencyEdge> {
        &self.data.graph
    }

    pub fn node_count(&self) -> usize {
        self.data.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.data.graph.edge_count()
    }

    pub fn project_count(&self) -> usize {
        self.projects().count()
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.index
            .get(name)
            .and_then(|idx| self.data.graph.node_weight(*idx))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.data.graph.node_weights()
    }

    /// Project vertices in insertion order.
    pub fn projects(&self) -> impl Iterator<Item = &ProjectDescriptor> {
        self.nodes().filter_map(GraphNode::descriptor)
    }

    pub fn edges(&self) -> Vec<Edge<'_>> {
        self.data
            .graph
            .edge_references()
            .map(|e| self.edge_view(e.source(), e.target(), e.weight()))
            .collect()
    }

    pub fn incoming(&self, name: &str) -> Vec<Edge<'_>> {
        self.directed(name, Direction::Incoming)
    }

    pub fn outgoing(&self, name: &str) -> Vec<Edge<'_>> {
        self.directed(name, Direction::Outgoing)
    }

    pub fn in_degree(&self, name: &str) -> usize {
        self.degree(name, Direction::Incoming)
    }

    pub fn out_degree(&self, name: &str) -> usize {
        self.degree(name, Direction::Outgoing)
    }

    fn degree(&self, name: &str, direction: Direction) -> usize {
        self.index
            .get(name)
            .map(|idx| self.data.graph.edges_directed(*idx, direction).count())
            .unwrap_or(0)
    }

    fn directed(&self, name: &str, direction: Direction) -> Vec<Edge<'_>> {
        let Some(idx) = self.index.get(name) else {
            return Vec::new();
        };
        self.data
            .graph
            .edges_directed(*idx, direction)
            .map(|e| self.edge_view(e.source(), e.target(), e.weight()))
            .collect()
    }

    fn edge_view(&self, source: NodeIndex, target: NodeIndex, edge: &DependencyEdge) -> Edge<'_> {
        let graph = &self.data.graph;
        Edge {
            source: graph[source].name(),
            target: graph[target].name(),
            kind: edge.kind,
            cross_workspace: edge.cross_workspace,
        }
    }

    /// Edges sorted for order-independent comparison.
    pub fn sorted_edges(&self) -> Vec<Edge<'_>> {
        let mut edges = self.edges();
        edges.sort();
        edges
    }
}

impl PartialEq for DependencyGraph {
    fn eq(&self, other: &Self) -> bool {
        let mut ours: Vec<&GraphNode> = self.nodes().collect();
        let mut theirs: Vec<&GraphNode> = other.nodes().collect();
        ours.sort_by(|a, b| a.name().cmp(b.name()));
        theirs.sort_by(|a, b| a.name().cmp(b.name()));
        ours == theirs && self.sorted_edges() == other.sorted_edges()
    }
}

impl Eq for DependencyGraph {}
