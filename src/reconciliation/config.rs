//! Lettrage configuration

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Settings driving automatic and manual lettrage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Largest absolute residual `|debit - credit|` accepted for a pair
    pub tolerance: BigDecimal,
    /// Algorithm used when a run does not name one
    pub default_algorithm: MatchingAlgorithm,
    /// Maximum number of lines considered per account in one run
    pub batch_limit: Option<usize>,
    /// Reject manual lettrage whose net balance exceeds the tolerance
    pub require_balanced_manual: bool,
    /// Only pair a debit with a credit; otherwise any two lines whose sum
    /// is within the tolerance may pair
    pub require_opposite_sides: bool,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            tolerance: BigDecimal::from(1),
            default_algorithm: MatchingAlgorithm::FirstMatch,
            batch_limit: None,
            require_balanced_manual: false,
            require_opposite_sides: false,
        }
    }
}

impl ReconciliationConfig {
    pub fn with_tolerance(mut self, tolerance: BigDecimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_algorithm(mut self, algorithm: MatchingAlgorithm) -> Self {
        self.default_algorithm = algorithm;
        self
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    pub fn require_balanced_manual(mut self, required: bool) -> Self {
        self.require_balanced_manual = required;
        self
    }

    pub fn require_opposite_sides(mut self, required: bool) -> Self {
        self.require_opposite_sides = required;
        self
    }

    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> LedgerResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.tolerance < BigDecimal::from(0) {
            return Err(LedgerError::Config(format!(
                "Tolerance cannot be negative: {}",
                self.tolerance
            )));
        }

        if self.batch_limit == Some(0) {
            return Err(LedgerError::Config(
                "Batch limit must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults() {
        let config = ReconciliationConfig::default();
        assert_eq!(config.tolerance, BigDecimal::from(1));
        assert_eq!(config.default_algorithm, MatchingAlgorithm::FirstMatch);
        assert!(config.batch_limit.is_none());
        assert!(!config.require_balanced_manual);
        assert!(!config.require_opposite_sides);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ReconciliationConfig::from_json_str(
            r#"{ "tolerance": "0.05", "default_algorithm": "ClosestMatch" }"#,
        )
        .unwrap();
        assert_eq!(config.tolerance, BigDecimal::from_str("0.05").unwrap());
        assert_eq!(config.default_algorithm, MatchingAlgorithm::ClosestMatch);
        assert!(config.batch_limit.is_none());

        let strict =
            ReconciliationConfig::from_json_str(r#"{ "require_opposite_sides": true }"#).unwrap();
        assert!(strict.require_opposite_sides);
        assert_eq!(strict.tolerance, BigDecimal::from(1));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            ReconciliationConfig::from_json_str(r#"{ "tolerance": "-1" }"#),
            Err(LedgerError::Config(_))
        ));
        assert!(ReconciliationConfig::default()
            .with_batch_limit(0)
            .validate()
            .is_err());
        assert!(ReconciliationConfig::from_json_str("not json").is_err());
    }
}
