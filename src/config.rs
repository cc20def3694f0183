//! Engine and analysis configuration
//!
//! Every field has a default, so a JSON config only needs the keys it
//! overrides:
//!
//! ```
//! use gomoku::config::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "max_depth": 4, "analysis": { "time_budget_ms": 500 } }"#).unwrap();
//! assert_eq!(config.max_depth, 4);
//! assert_eq!(config.analysis.time_budget_ms, 500);
//! assert_eq!(config.top_n, EngineConfig::default().top_n);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Search limits and feature switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wall-clock budget of one best-move search
    pub time_budget_ms: u64,
    /// Deepest alpha-beta iteration (depths 2, 4, ... up to this)
    pub max_depth: u8,
    /// VCF depth bound in plies
    pub vcf_depth: u8,
    /// VCT depth bound in plies
    pub vct_depth: u8,
    /// Node budget of one VCF search
    pub vcf_node_budget: u64,
    /// Node budget of one VCT search
    pub vct_node_budget: u64,
    /// Transposition table capacity in entries
    pub tt_capacity: usize,
    /// Maximum moves searched per node
    pub candidate_limit: usize,
    /// Chebyshev distance from existing stones for candidate cells
    pub candidate_radius: u8,
    pub use_move_ordering: bool,
    pub use_transposition_table: bool,
    /// Number of scored root moves to report
    pub top_n: usize,
    pub analysis: AnalysisConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 1000,
            max_depth: 8,
            vcf_depth: 12,
            vct_depth: 6,
            vcf_node_budget: 50_000,
            vct_node_budget: 20_000,
            tt_capacity: 1 << 18,
            candidate_limit: 20,
            candidate_radius: 2,
            use_move_ordering: true,
            use_transposition_table: true,
            top_n: 3,
            analysis: AnalysisConfig::default(),
        }
    }
}

/// Game walkthrough limits and swing thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Total budget for analyzing a whole game
    pub time_budget_ms: u64,
    /// Upper bound on the search slice of one move
    pub per_move_ms: u64,
    /// Alpha-beta depth used to find best alternatives
    pub search_depth: u8,
    /// Maximum moves searched per node during analysis
    pub candidate_limit: usize,
    /// VCF depth bound used to detect missed wins
    pub vcf_depth: u8,
    /// Nodes allowed for scoring a played move; a move that needs more is
    /// reported without a quality
    pub played_move_node_limit: u64,
    /// Win-probability swing (percentage points) marking a significant move
    pub significant_swing: f64,
    /// Win-probability swing (percentage points) marking a critical move
    pub critical_swing: f64,
    /// Shortest game accepted for analysis
    pub min_moves: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 2000,
            per_move_ms: 100,
            search_depth: 2,
            candidate_limit: 12,
            vcf_depth: 8,
            played_move_node_limit: 200_000,
            significant_swing: 20.0,
            critical_swing: 50.0,
            min_moves: 5,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every search fail or do nothing.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        if self.time_budget_ms == 0 {
            return invalid("time_budget_ms must be positive");
        }
        if self.max_depth == 0 {
            return invalid("max_depth must be at least 1");
        }
        if self.tt_capacity == 0 {
            return invalid("tt_capacity must be positive");
        }
        if self.candidate_limit == 0 {
            return invalid("candidate_limit must be positive");
        }
        if !(1..=4).contains(&self.candidate_radius) {
            return invalid("candidate_radius must be between 1 and 4");
        }
        if self.top_n == 0 {
            return invalid("top_n must be at least 1");
        }
        self.analysis.validate()
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        if self.time_budget_ms == 0 || self.per_move_ms == 0 {
            return invalid("analysis budgets must be positive");
        }
        if self.search_depth == 0 {
            return invalid("analysis search_depth must be at least 1");
        }
        if self.candidate_limit == 0 {
            return invalid("analysis candidate_limit must be positive");
        }
        if self.played_move_node_limit == 0 {
            return invalid("analysis played_move_node_limit must be positive");
        }
        if !(0.0..=100.0).contains(&self.significant_swing)
            || !(0.0..=100.0).contains(&self.critical_swing)
            || self.significant_swing > self.critical_swing
        {
            return invalid("swing thresholds must satisfy 0 <= significant <= critical <= 100");
        }
        if self.min_moves == 0 {
            return invalid("min_moves must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        let analysis = AnalysisConfig::default();
        assert_eq!(analysis.time_budget_ms, 2000);
        assert_eq!(analysis.per_move_ms, 100);
        assert_eq!(analysis.min_moves, 5);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = EngineConfig {
            time_budget_ms: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = EngineConfig::default();
        config.analysis.significant_swing = 60.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial_and_malformed() {
        let config = EngineConfig::from_json(r#"{"use_move_ordering": false}"#).unwrap();
        assert!(!config.use_move_ordering);
        assert_eq!(config.max_depth, 8);

        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(EngineConfig::from_json(r#"{"tt_capacity": 0}"#).is_err());
    }
}
