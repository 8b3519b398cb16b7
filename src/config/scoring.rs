//! Aggregation weights for extraction-difficulty scoring.

use crate::errors::ConfigValidationError;
use crate::metrics::MetricKind;
use serde::{Deserialize, Serialize};

/// Allowed distance between the weight sum and 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Raw weights as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for coupling (0.0-1.0)
    #[serde(default = "default_coupling_weight")]
    pub coupling: f64,

    /// Weight for internal code complexity (0.0-1.0)
    #[serde(default = "default_complexity_weight")]
    pub complexity: f64,

    /// Weight for platform lag (0.0-1.0)
    #[serde(default = "default_tech_debt_weight")]
    pub tech_debt: f64,

    /// Weight for public contract surface (0.0-1.0)
    #[serde(default = "default_external_exposure_weight")]
    pub external_exposure: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            coupling: default_coupling_weight(),
            complexity: default_complexity_weight(),
            tech_debt: default_tech_debt_weight(),
            external_exposure: default_external_exposure_weight(),
        }
    }
}

impl ScoringWeights {
    pub fn new(coupling: f64, complexity: f64, tech_debt: f64, external_exposure: f64) -> Self {
        Self {
            coupling,
            complexity,
            tech_debt,
            external_exposure,
        }
    }

    pub fn sum(&self) -> f64 {
        self.coupling + self.complexity + self.tech_debt + self.external_exposure
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("Coupling", self.coupling),
            ("Complexity", self.complexity),
            ("TechDebt", self.tech_debt),
            ("ExternalExposure", self.external_exposure),
        ]
    }

    /// Check every weight and the total. Weights are never renormalized.
    pub fn validate(&self) -> Result<ValidatedWeights, ConfigValidationError> {
        for (name, value) in self.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigValidationError::InvalidWeight { name, value });
            }
        }

        let sum = self.sum();
        // Epsilon absorbs float error at the tolerance boundary (e.g. 0.99).
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE + 1e-9 {
            return Err(ConfigValidationError::WeightSum {
                sum,
                tolerance: WEIGHT_SUM_TOLERANCE,
            });
        }

        Ok(ValidatedWeights(*self))
    }
}

pub fn default_coupling_weight() -> f64 {
    0.40
}
pub fn default_complexity_weight() -> f64 {
    0.30
}
pub fn default_tech_debt_weight() -> f64 {
    0.20
}
pub fn default_external_exposure_weight() -> f64 {
    0.10
}

/// Weights that passed [`ScoringWeights::validate`].
///
/// Aggregation only accepts this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedWeights(ScoringWeights);

impl ValidatedWeights {
    pub fn weight(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Coupling => self.0.coupling,
            MetricKind::Complexity => self.0.complexity,
            MetricKind::TechDebt => self.0.tech_debt,
            MetricKind::ExternalExposure => self.0.external_exposure,
        }
    }

    pub fn raw(&self) -> &ScoringWeights {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let weights = ScoringWeights::default().validate().unwrap();
        assert_eq!(weights.weight(MetricKind::Coupling), 0.40);
        assert_eq!(weights.weight(MetricKind::ExternalExposure), 0.10);
    }

    #[test]
    fn rejects_sum_of_point_nine_one() {
        let err = ScoringWeights::new(0.40, 0.30, 0.20, 0.01)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigValidationError::WeightSum { .. }));
        assert!(err.to_string().contains("0.910"));
    }

    #[test]
    fn accepts_sums_within_tolerance() {
        assert!(ScoringWeights::new(0.40, 0.30, 0.20, 0.09).validate().is_ok());
        assert!(ScoringWeights::new(0.40, 0.30, 0.20, 0.11).validate().is_ok());
        assert!(ScoringWeights::new(0.40, 0.30, 0.20, 0.12).validate().is_err());
    }

    #[test]
    fn rejects_negative_and_non_finite_weights() {
        let err = ScoringWeights::new(1.2, -0.2, 0.0, 0.0).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::InvalidWeight { name: "Complexity", .. }
        ));
        assert!(ScoringWeights::new(f64::NAN, 0.5, 0.5, 0.0).validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let weights: ScoringWeights = toml::from_str("coupling = 0.5\ncomplexity = 0.2").unwrap();
        assert_eq!(weights.tech_debt, 0.20);
        assert!(weights.validate().is_ok());
    }
}
