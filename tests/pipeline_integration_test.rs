mod common;

use common::{sdk_manifest, SolutionFixture};
use indoc::indoc;
use pretty_assertions::assert_eq;
use splitmap::config::{FilterRule, LoaderConfig, ScoringWeights, SplitmapConfig};
use splitmap::core::{CancellationToken, StrategyKind};
use splitmap::errors::{ConfigValidationError, Error};
use splitmap::metrics::MetricKind;
use splitmap::pipeline::analyze;

fn raw_only(filter: FilterRule) -> SplitmapConfig {
    SplitmapConfig {
        filter,
        loader: LoaderConfig {
            strategies: vec![StrategyKind::RawManifest],
            ..LoaderConfig::default()
        },
        ..SplitmapConfig::default()
    }
}

fn shop() -> SolutionFixture {
    SolutionFixture::new()
        .project("Core", "csproj", &sdk_manifest("net8.0", &[], &["Dapper"]))
        .project("Data", "csproj", &sdk_manifest("net6.0", &["Core"], &[]))
        .project("Services", "csproj", &sdk_manifest("net8.0", &["Core", "Data"], &[]))
        .project("Web", "csproj", &sdk_manifest("net8.0", &["Services"], &["Serilog"]))
        .source(
            "Core",
            "Order.cs",
            indoc! {r#"
                namespace Shop.Core;

                public class Order
                {
                    public int Id { get; set; }
                    public decimal Total { get; set; }
                }
            "#},
        )
        .source(
            "Services",
            "Pricing.cs",
            indoc! {r#"
                namespace Shop.Services;

                internal class Pricing
                {
                    decimal Discount(decimal total, bool vip)
                    {
                        if (total > 100 && vip) { return 0.1m; }
                        return total > 50 ? 0.05m : 0m;
                    }
                }
            "#},
        )
}

#[test]
fn ranks_every_project_of_a_solution() {
    let fixture = shop();
    let sln = fixture.write_solution("Shop");
    let config = raw_only(FilterRule::new(["Dapper"], Vec::<String>::new()))
        .validate()
        .unwrap();

    let report = analyze(&[sln], &config, &CancellationToken::new()).unwrap();

    assert_eq!(report.strategies(), vec![StrategyKind::RawManifest]);
    assert_eq!(report.ranking.len(), 4);
    assert!(report.integrity_errors.is_empty());
    assert!(report.partial_failures.is_empty());

    // Filtering strips edges only
    assert_eq!(report.filter_stats.removed, 1);
    assert_eq!(report.filtered_graph.node_count(), report.graph.node_count());
    assert!(report.filtered_graph.contains("Dapper"));

    let coupling = report.metrics.get(MetricKind::Coupling);
    assert_eq!(coupling.get("Core").unwrap().raw_score, 4.0);
    assert_eq!(coupling.get("Services").unwrap().raw_score, 4.0);
    assert_eq!(coupling.get("Data").unwrap().raw_score, 3.0);
    assert_eq!(coupling.get("Web").unwrap().raw_score, 2.0);

    let tech_debt = report.metrics.get(MetricKind::TechDebt);
    assert_eq!(tech_debt.get("Data").unwrap().normalized_score, 100.0);

    let complexity = report.metrics.get(MetricKind::Complexity);
    assert_eq!(complexity.get("Services").unwrap().normalized_score, 100.0);
    assert_eq!(complexity.get("Web").unwrap().raw_score, 0.0);

    let exposure = report.metrics.get(MetricKind::ExternalExposure);
    assert_eq!(exposure.get("Core").unwrap().raw_score, 3.0);
    assert_eq!(exposure.get("Services").unwrap().raw_score, 0.0);

    let combined: Vec<f64> = report.ranking.iter().map(|s| s.combined).collect();
    assert!(combined.windows(2).all(|w| w[0] >= w[1]));
    assert!(combined.iter().all(|c| (0.0..=100.0).contains(c)));
}

#[test]
fn merges_several_solutions_into_one_graph() {
    let platform = SolutionFixture::new()
        .project("Core", "csproj", &sdk_manifest("net8.0", &[], &[]));
    let platform_sln = platform.write_solution("Platform");

    let shop = SolutionFixture::new()
        .project("Cart", "csproj", &sdk_manifest("net8.0", &["Checkout"], &[]))
        .project("Checkout", "csproj", &sdk_manifest("net8.0", &["Core"], &[]));
    let shop_sln = shop.write_solution("Shop");

    let config = raw_only(FilterRule::default()).validate().unwrap();
    let report = analyze(&[platform_sln, shop_sln], &config, &CancellationToken::new()).unwrap();

    assert_eq!(report.workspaces.len(), 2);
    assert_eq!(report.graph.project_count(), 3);
    assert_eq!(report.ranking.len(), 3);

    let cross: Vec<(&str, &str)> = report
        .graph
        .edges()
        .iter()
        .filter(|edge| edge.cross_workspace)
        .map(|edge| (edge.source, edge.target))
        .collect();
    assert_eq!(cross, vec![("Checkout", "Core")]);
    assert_eq!(report.build_stats.unresolved_project_refs, 0);
}

#[test]
fn invalid_weights_never_reach_aggregation() {
    let config = SplitmapConfig {
        weights: ScoringWeights::new(0.40, 0.30, 0.11, 0.10),
        ..SplitmapConfig::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigValidationError::WeightSum { .. })
    ));
}

#[test]
fn unloadable_workspace_reports_the_loading_stage() {
    let fixture = SolutionFixture::new().missing_project("Ghost");
    let sln = fixture.write_solution("Empty");
    let config = raw_only(FilterRule::default()).validate().unwrap();

    let err = analyze(&[sln], &config, &CancellationToken::new()).unwrap_err();

    assert!(matches!(err, Error::Load(_)));
    assert_eq!(err.stage(), "workspace loading");
}

#[test]
fn cancellation_discards_the_run() {
    let fixture = shop();
    let sln = fixture.write_solution("Shop");
    let config = raw_only(FilterRule::default()).validate().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(matches!(
        analyze(&[sln], &config, &cancel),
        Err(Error::Cancelled { .. })
    ));
}
