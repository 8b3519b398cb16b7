use crate::errors::ConfigValidationError;
use serde::{Deserialize, Serialize};

/// Block/allow patterns for the dependency filter.
///
/// A pattern is either exact text or a prefix followed by a single trailing
/// `*`. Matching is case-insensitive. Empty lists make the filter a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(default, rename = "block", alias = "block_patterns")]
    pub block_patterns: Vec<String>,
    #[serde(default, rename = "allow", alias = "allow_patterns")]
    pub allow_patterns: Vec<String>,
}

impl FilterRule {
    pub fn new<B, A>(block: B, allow: A) -> Self
    where
        B: IntoIterator,
        B::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            block_patterns: block.into_iter().map(Into::into).collect(),
            allow_patterns: allow.into_iter().map(Into::into).collect(),
        }
    }

    /// Block list for the usual framework and runtime package families.
    pub fn framework_defaults() -> Self {
        Self::new(
            [
                "System.*",
                "Microsoft.*",
                "mscorlib",
                "netstandard",
                "NETStandard.Library",
            ],
            Vec::<String>::new(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.block_patterns.is_empty() && self.allow_patterns.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        validate_patterns("block", &self.block_patterns)?;
        validate_patterns("allow", &self.allow_patterns)
    }
}

fn validate_patterns(list: &'static str, patterns: &[String]) -> Result<(), ConfigValidationError> {
    for (index, pattern) in patterns.iter().enumerate() {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(ConfigValidationError::EmptyPattern { list, index });
        }
        if trimmed.trim_end_matches('*').contains('*') || trimmed.ends_with("**") {
            return Err(ConfigValidationError::MisplacedWildcard {
                list,
                pattern: pattern.clone(),
            });
        }
    }
    Ok(())
}
