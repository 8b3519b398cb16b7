//! Turns loaded workspaces into a [`DependencyGraph`].

use super::{DependencyEdge, DependencyGraph, GraphNode, ProjectNode};
use crate::core::{ReferenceEdge, ReferenceKind, WorkspaceAnalysis};
use crate::loader::paths::normalize;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts of references the builder could not turn into edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Project references whose target is not a member of any loaded workspace
    pub unresolved_project_refs: usize,
    /// Projects listed by more than one workspace (first occurrence kept)
    pub duplicate_projects: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder;

struct Assembly {
    graph: DiGraph<GraphNode, DependencyEdge>,
    by_name: HashMap<String, NodeIndex>,
    by_path: HashMap<PathBuf, NodeIndex>,
    /// Lower-cased name -> vertex, for case-insensitive lookups
    by_folded_name: HashMap<String, NodeIndex>,
    /// Which workspace (position in the input) owns each project vertex
    origin: HashMap<NodeIndex, usize>,
    seen_edges: HashSet<(NodeIndex, NodeIndex, ReferenceKind)>,
    stats: BuildStats,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Graph for a single workspace.
    pub fn build(&self, analysis: &WorkspaceAnalysis) -> DependencyGraph {
        self.build_merged(std::slice::from_ref(analysis))
    }

    /// One graph spanning several workspaces; edges between them are flagged
    /// `cross_workspace`.
    pub fn build_merged(&self, analyses: &[WorkspaceAnalysis]) -> DependencyGraph {
        self.build_with_stats(analyses).0
    }

    pub fn build_with_stats(&self, analyses: &[WorkspaceAnalysis]) -> (DependencyGraph, BuildStats) {
        let mut assembly = Assembly {
            graph: DiGraph::new(),
            by_name: HashMap::new(),
            by_path: HashMap::new(),
            by_folded_name: HashMap::new(),
            origin: HashMap::new(),
            seen_edges: HashSet::new(),
            stats: BuildStats::default(),
        };

        let owners: Vec<Vec<Option<NodeIndex>>> = analyses
            .iter()
            .enumerate()
            .map(|(origin, analysis)| assembly.add_projects(origin, analysis))
            .collect();
        for (analysis, owners) in analyses.iter().zip(&owners) {
            for (project, owner) in analysis.projects.iter().zip(owners) {
                // A same-named project from another manifest contributes nothing
                let Some(source) = *owner else { continue };
                for reference in &project.references {
                    assembly.add_reference(source, reference);
                }
            }
        }

        let stats = assembly.stats.clone();
        if stats.unresolved_project_refs > 0 {
            warn!(
                unresolved = stats.unresolved_project_refs,
                "Dropped project references that point outside the loaded workspaces"
            );
        }
        info!(
            workspaces = analyses.len(),
            vertices = assembly.graph.node_count(),
            edges = assembly.graph.edge_count(),
            "Built dependency graph"
        );

        let graph = DependencyGraph::from_parts(assembly.graph, Arc::new(assembly.by_name));
        (graph, stats)
    }
}

impl Assembly {
    /// Adds a vertex per new project and returns, for each project of the
    /// workspace, the vertex its references belong to.
    fn add_projects(
        &mut self,
        origin: usize,
        analysis: &WorkspaceAnalysis,
    ) -> Vec<Option<NodeIndex>> {
        let mut owners = Vec::with_capacity(analysis.projects.len());
        for project in &analysis.projects {
            let path = normalize(&project.manifest_path);
            if let Some(existing) = self.by_name.get(&project.name).copied() {
                self.stats.duplicate_projects += 1;
                if self.graph[existing].descriptor().map(|d| normalize(&d.manifest_path))
                    == Some(path)
                {
                    debug!(project = %project.name, "Project shared between workspaces");
                    owners.push(Some(existing));
                } else {
                    warn!(
                        project = %project.name,
                        workspace = %analysis.workspace_name,
                        "Project name already taken by a different manifest; keeping the first"
                    );
                    owners.push(None);
                }
                continue;
            }

            let idx = self.graph.add_node(GraphNode::Project(ProjectNode {
                descriptor: project.clone(),
                workspace: analysis.workspace_name.clone(),
            }));
            self.by_name.insert(project.name.clone(), idx);
            self.by_folded_name
                .entry(project.name.to_lowercase())
                .or_insert(idx);
            self.by_path.entry(path).or_insert(idx);
            self.origin.insert(idx, origin);
            owners.push(Some(idx));
        }
        owners
    }

    fn add_reference(&mut self, source: NodeIndex, reference: &ReferenceEdge) {
        let target = match reference.kind {
            ReferenceKind::ProjectReference => match self.resolve_project(reference) {
                Some(idx) => idx,
                None => {
                    self.stats.unresolved_project_refs += 1;
                    debug!(
                        source = %self.graph[source].name(),
                        target = %reference.target_name,
                        "Unresolved project reference"
                    );
                    return;
                }
            },
            ReferenceKind::AssemblyReference => self.external_or_project(&reference.target_name),
        };

        if source == target || !self.seen_edges.insert((source, target, reference.kind)) {
            return;
        }

        let cross_workspace = match (self.origin.get(&source), self.origin.get(&target)) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        };
        self.graph.add_edge(
            source,
            target,
            DependencyEdge {
                kind: reference.kind,
                cross_workspace,
            },
        );
    }

    /// By manifest path first, then by exact name, then case-insensitively.
    fn resolve_project(&self, reference: &ReferenceEdge) -> Option<NodeIndex> {
        reference
            .target_path
            .as_ref()
            .and_then(|path| self.by_path.get(&normalize(path)))
            .or_else(|| self.by_name.get(&reference.target_name))
            .or_else(|| {
                self.by_folded_name
                    .get(&reference.target_name.to_lowercase())
            })
            .copied()
            .filter(|idx| self.graph[*idx].is_project())
    }

    /// Assembly references to a workspace project's output attach to that
    /// project; anything else gets an external vertex, created on first use.
    fn external_or_project(&mut self, name: &str) -> NodeIndex {
        let folded = name.to_lowercase();
        if let Some(idx) = self.by_name.get(name).or_else(|| self.by_folded_name.get(&folded)) {
            return *idx;
        }

        let idx = self.graph.add_node(GraphNode::External {
            name: name.to_string(),
        });
        self.by_name.insert(name.to_string(), idx);
        self.by_folded_name.insert(folded, idx);
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProjectDescriptor, StrategyKind};
    use pretty_assertions::assert_eq;

    fn workspace(name: &str, projects: Vec<ProjectDescriptor>) -> WorkspaceAnalysis {
        WorkspaceAnalysis::new(
            format!("/repo/{name}.sln"),
            name,
            projects,
            StrategyKind::RawManifest,
        )
    }

    #[test]
    fn one_vertex_per_project_and_external_target() {
        let analysis = workspace(
            "App",
            vec![
                ProjectDescriptor::new("Core", "/repo/Core/Core.csproj")
                    .with_references(vec![ReferenceEdge::assembly("Dapper")]),
                ProjectDescriptor::new("Web", "/repo/Web/Web.csproj").with_references(vec![
                    ReferenceEdge::project("Core", "/repo/Web/../Core/Core.csproj"),
                    ReferenceEdge::assembly("dapper"),
                ]),
            ],
        );

        let graph = GraphBuilder::new().build(&analysis);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.in_degree("Dapper"), 2);
        assert_eq!(graph.in_degree("Core"), 1);
    }

    #[test]
    fn drops_unresolved_project_refs_and_self_loops() {
        let analysis = workspace(
            "App",
            vec![ProjectDescriptor::new("Core", "/repo/Core/Core.csproj").with_references(vec![
                ReferenceEdge::project("Ghost", "/repo/Ghost/Ghost.csproj"),
                ReferenceEdge::project("Core", "/repo/Core/Core.csproj"),
            ])],
        );

        let (graph, stats) = GraphBuilder::new().build_with_stats(std::slice::from_ref(&analysis));

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(stats.unresolved_project_refs, 1);
        assert!(!graph.contains("Ghost"));
    }

    #[test]
    fn duplicate_references_collapse() {
        let analysis = workspace(
            "App",
            vec![
                ProjectDescriptor::new("Core", "/repo/Core/Core.csproj"),
                ProjectDescriptor::new("Web", "/repo/Web/Web.csproj").with_references(vec![
                    ReferenceEdge::project("Core", "/repo/Core/Core.csproj"),
                    ReferenceEdge::project("Core", "/repo/Core/Core.csproj"),
                ]),
            ],
        );
        assert_eq!(GraphBuilder::new().build(&analysis).edge_count(), 1);
    }

    #[test]
    fn legacy_dll_reference_attaches_to_sibling_project() {
        let analysis = workspace(
            "App",
            vec![
                ProjectDescriptor::new("Acme.Core", "/repo/Core/Acme.Core.csproj"),
                ProjectDescriptor::new("Legacy", "/repo/Legacy/Legacy.csproj")
                    .with_references(vec![ReferenceEdge::assembly("Acme.Core")]),
            ],
        );

        let graph = GraphBuilder::new().build(&analysis);
        let edges = graph.outgoing("Legacy");

        assert_eq!(graph.node_count(), 2);
        assert_eq!(edges[0].target, "Acme.Core");
        assert_eq!(edges[0].kind, ReferenceKind::AssemblyReference);
    }

    #[test]
    fn merged_graph_flags_cross_workspace_edges() {
        let platform = workspace(
            "Platform",
            vec![ProjectDescriptor::new("Core", "/repo/platform/Core/Core.csproj")],
        );
        let shop = workspace(
            "Shop",
            vec![
                ProjectDescriptor::new("Core", "/repo/platform/Core/Core.csproj"),
                ProjectDescriptor::new("Cart", "/repo/shop/Cart/Cart.csproj").with_references(vec![
                    ReferenceEdge::project("Core", "/repo/platform/Core/Core.csproj"),
                    ReferenceEdge::project("Checkout", "/repo/shop/Checkout/Checkout.csproj"),
                ]),
                ProjectDescriptor::new("Checkout", "/repo/shop/Checkout/Checkout.csproj"),
            ],
        );

        let (graph, stats) = GraphBuilder::new().build_with_stats(&[platform, shop]);

        assert_eq!(stats.duplicate_projects, 1);
        assert_eq!(graph.project_count(), 3);
        let mut flags: Vec<(&str, bool)> = graph
            .outgoing("Cart")
            .iter()
            .map(|e| (e.target, e.cross_workspace))
            .collect();
        flags.sort();
        assert_eq!(flags, vec![("Checkout", false), ("Core", true)]);
    }

    #[test]
    fn same_name_from_another_manifest_keeps_its_references_out() {
        let first = workspace(
            "A",
            vec![ProjectDescriptor::new("Common", "/a/Common/Common.csproj")],
        );
        let second = workspace(
            "B",
            vec![ProjectDescriptor::new("Common", "/b/Common/Common.csproj")
                .with_references(vec![ReferenceEdge::assembly("Telerik.UI")])],
        );

        let (graph, stats) = GraphBuilder::new().build_with_stats(&[first, second]);

        assert_eq!(stats.duplicate_projects, 1);
        assert!(graph.outgoing("Common").is_empty());
        assert!(!graph.contains("Telerik.UI"));
    }

    #[test]
    fn shared_manifest_references_count_once() {
        let project = || {
            ProjectDescriptor::new("Common", "/repo/Common/Common.csproj")
                .with_references(vec![ReferenceEdge::assembly("Dapper")])
        };
        let first = workspace("A", vec![project()]);
        let second = workspace("B", vec![project()]);

        let graph = GraphBuilder::new().build_merged(&[first, second]);

        assert_eq!(graph.project_count(), 1);
        assert_eq!(graph.in_degree("Dapper"), 1);
    }
}
