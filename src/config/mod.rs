//! Configuration for an analysis run.
//!
//! Configuration is read once (see [`loader`]), validated into a
//! [`ValidatedConfig`], and then passed by reference into every stage.

pub mod filter;
pub mod loader;
pub mod scoring;

pub use filter::FilterRule;
pub use loader::{load_config, parse_config, CONFIG_FILE_NAME};
pub use scoring::{ScoringWeights, ValidatedWeights, WEIGHT_SUM_TOLERANCE};

use crate::core::StrategyKind;
use crate::errors::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Contents of `.splitmap.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitmapConfig {
    #[serde(default)]
    pub filter: FilterRule,
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Workspace loader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Strategies to try, in order
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,

    /// Upper bound for a single `dotnet msbuild` invocation
    #[serde(default = "default_dotnet_timeout_secs")]
    pub dotnet_timeout_secs: u64,

    /// Parse manifests in parallel in the raw-manifest strategy
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            dotnet_timeout_secs: default_dotnet_timeout_secs(),
            parallel: default_parallel(),
        }
    }
}

impl LoaderConfig {
    pub fn dotnet_timeout(&self) -> Duration {
        Duration::from_secs(self.dotnet_timeout_secs)
    }
}

fn default_strategies() -> Vec<StrategyKind> {
    StrategyKind::ALL.to_vec()
}
fn default_dotnet_timeout_secs() -> u64 {
    300
}
fn default_parallel() -> bool {
    true
}

impl SplitmapConfig {
    /// Reject invalid weights or pattern lists before any analysis runs.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigValidationError> {
        let weights = self.weights.validate()?;
        self.filter.validate()?;
        if self.loader.strategies.is_empty() {
            return Err(ConfigValidationError::NoStrategies);
        }

        Ok(ValidatedConfig {
            filter: self.filter,
            weights,
            loader: self.loader,
        })
    }
}

/// Configuration that passed validation; the only form the pipeline accepts.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub filter: FilterRule,
    pub weights: ValidatedWeights,
    pub loader: LoaderConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn empty_config_uses_defaults() {
        let config: SplitmapConfig = toml::from_str("").unwrap();
        assert_eq!(config, SplitmapConfig::default());
        assert!(config.filter.is_empty());
        assert_eq!(config.loader.strategies, StrategyKind::ALL.to_vec());
    }

    #[test]
    fn full_config_round_trips_through_validation() {
        let config: SplitmapConfig = toml::from_str(indoc! {r#"
            [filter]
            block = ["Acme.Vendor.*", "Telerik.*"]
            allow = ["Acme.Vendor.Billing"]

            [weights]
            coupling = 0.25
            complexity = 0.25
            tech_debt = 0.25
            external_exposure = 0.25

            [loader]
            strategies = ["build-metadata", "raw-manifest"]
            dotnet_timeout_secs = 60
            parallel = false
        "#})
        .unwrap();

        let validated = config.validate().unwrap();
        assert_eq!(validated.filter.block_patterns.len(), 2);
        assert_eq!(validated.loader.dotnet_timeout(), Duration::from_secs(60));
        assert!(!validated.loader.parallel);
    }

    #[test]
    fn empty_strategy_list_is_rejected() {
        let config = SplitmapConfig {
            loader: LoaderConfig {
                strategies: Vec::new(),
                ..LoaderConfig::default()
            },
            ..SplitmapConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::NoStrategies)
        ));
    }
}
