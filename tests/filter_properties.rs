use proptest::prelude::*;
use splitmap::config::FilterRule;
use splitmap::core::{ProjectDescriptor, ReferenceEdge, StrategyKind, WorkspaceAnalysis};
use splitmap::graph::{DependencyFilter, DependencyGraph, GraphBuilder};

const NAME_PARTS: &[&str] = &["Acme", "System", "Microsoft", "Billing", "Core", "Data"];

fn name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(NAME_PARTS), 1..3).prop_map(|parts| parts.join("."))
}

fn pattern_strategy() -> impl Strategy<Value = String> {
    (name_strategy(), any::<bool>(), any::<bool>()).prop_map(|(name, wildcard, upper)| {
        let name = if upper { name.to_uppercase() } else { name };
        if wildcard {
            format!("{name}*")
        } else {
            name
        }
    })
}

/// Up to six projects, each referencing a random mix of projects and packages.
fn graph_strategy() -> impl Strategy<Value = DependencyGraph> {
    prop::collection::vec(
        (
            prop::collection::vec(0usize..6, 0..4),
            prop::collection::vec(name_strategy(), 0..4),
        ),
        1..6,
    )
    .prop_map(|specs| {
        let count = specs.len();
        let projects = specs.into_iter().enumerate().map(|(i, (deps, packages))| {
            let mut references: Vec<ReferenceEdge> = deps
                .into_iter()
                .filter(|d| *d < count)
                .map(|d| ReferenceEdge::project(format!("P{d}"), format!("/ws/P{d}/P{d}.csproj")))
                .collect();
            references.extend(packages.into_iter().map(ReferenceEdge::assembly));
            ProjectDescriptor::new(format!("P{i}"), format!("/ws/P{i}/P{i}.csproj"))
                .with_references(references)
        });
        let analysis = WorkspaceAnalysis::new("/ws/Gen.sln", "Gen", projects, StrategyKind::RawManifest);
        GraphBuilder::new().build(&analysis)
    })
}

fn rule_strategy() -> impl Strategy<Value = FilterRule> {
    (
        prop::collection::vec(pattern_strategy(), 0..4),
        prop::collection::vec(pattern_strategy(), 0..3),
    )
        .prop_map(|(block, allow)| FilterRule::new(block, allow))
}

proptest! {
    #[test]
    fn filtering_is_idempotent(graph in graph_strategy(), rule in rule_strategy()) {
        let filter = DependencyFilter::new(&rule);
        let once = filter.apply(&graph);
        let twice = filter.apply(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn filtering_never_drops_vertices(graph in graph_strategy(), rule in rule_strategy()) {
        let filtered = DependencyFilter::new(&rule).apply(&graph);
        prop_assert_eq!(filtered.node_count(), graph.node_count());
        prop_assert!(filtered.edge_count() <= graph.edge_count());
    }

    #[test]
    fn allow_list_wins_regardless_of_order(
        name in name_strategy(),
        mut block in prop::collection::vec(pattern_strategy(), 0..3),
        position in 0usize..4,
    ) {
        let index = position.min(block.len());
        block.insert(index, format!("{name}*"));
        let rule = FilterRule::new(block, [name.to_lowercase()]);

        prop_assert!(DependencyFilter::new(&rule).decide(&name).retains());
    }

    #[test]
    fn blocked_targets_lose_every_incoming_edge(graph in graph_strategy(), rule in rule_strategy()) {
        let filter = DependencyFilter::new(&rule);
        let filtered = filter.apply(&graph);
        for edge in filtered.edges() {
            prop_assert!(filter.decide(edge.target).retains());
        }
    }
}
