//! Experiment result types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::{ChoiceCounts, ExperimentMetadata};

// ============================================================================
// ChoiceResult
// ============================================================================

/// Counters and performance for one choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceResult {
    pub name: String,
    pub plays: u64,
    pub rewards: u64,
    /// `rewards / max(plays, 1)`
    pub performance: f64,
}

impl ChoiceResult {
    pub fn new(name: impl Into<String>, counts: ChoiceCounts) -> Self {
        Self {
            name: name.into(),
            plays: counts.plays,
            rewards: counts.rewards,
            performance: counts.performance(),
        }
    }

    pub fn counts(&self) -> ChoiceCounts {
        ChoiceCounts::new(self.plays, self.rewards)
    }
}

// ============================================================================
// ExperimentResults
// ============================================================================

/// Ranked results report for an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub name: String,
    pub metadata: Option<ExperimentMetadata>,
    /// Best-performing choice
    pub default: Option<String>,
    /// Chi-squared across all choices; absent with fewer than two choices
    pub chi_squared: Option<f64>,
    /// 95% significance; `None` when the choice count is beyond the lookup table
    pub confident: Option<bool>,
    /// Choices ordered by descending performance
    pub choices: Vec<ChoiceResult>,
}

fn display_or_none<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}

impl fmt::Display for ExperimentResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        writeln!(
            f,
            "- creation date: {}",
            display_or_none(&self.metadata.as_ref().map(|m| m.creation_date.as_str()))
        )?;
        writeln!(f, "- default choice: {}", display_or_none(&self.default))?;
        writeln!(f, "- chi squared: {}", display_or_none(&self.chi_squared))?;
        writeln!(f, "- confident: {}", display_or_none(&self.confident))?;
        writeln!(f, "- choices:")?;

        for choice in &self.choices {
            writeln!(
                f,
                "  - {}: plays={}, rewards={}, performance={}",
                choice.name, choice.plays, choice.rewards, choice.performance
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExperimentResults {
        ExperimentResults {
            name: "ex-data".to_string(),
            metadata: None,
            default: Some("arm1".to_string()),
            chi_squared: Some(0.5),
            confident: Some(false),
            choices: vec![
                ChoiceResult::new("arm1", ChoiceCounts::new(4, 2)),
                ChoiceResult::new("arm2", ChoiceCounts::new(4, 1)),
            ],
        }
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        assert!(text.starts_with("ex-data:\n"));
        assert!(text.contains("- creation date: none"));
        assert!(text.contains("- default choice: arm1"));
        assert!(text.contains("- confident: false"));
        assert!(text.contains("  - arm1: plays=4, rewards=2, performance=0.5"));
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["default"], "arm1");
        assert_eq!(json["choices"][1]["performance"], 0.25);
        assert!(json["metadata"].is_null());
    }
}
