//! Recommendation derived from a successful analysis.
//!
//! The persistence collaborator stores these; the core only knows how to
//! derive one from an [`AnalysisOutcome`].

use super::outcome::AnalysisOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters copied from the analysis text.
const DESCRIPTION_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub category: String,
    pub impact: String,
    pub monthly_savings: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Recommendation {
    /// Derive a pending recommendation from a successful outcome.
    ///
    /// Returns `None` unless the outcome is a success with non-empty text.
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Option<Self> {
        if !outcome.is_success() || outcome.text.trim().is_empty() {
            return None;
        }

        Some(Self {
            title: "Cost Optimization Recommendations".to_string(),
            description: outcome.text.chars().take(DESCRIPTION_LIMIT).collect(),
            category: "cost_optimization".to_string(),
            impact: "high".to_string(),
            monthly_savings: 0.0,
            status: "pending".to_string(),
            created_at: outcome.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::outcome::AnalysisStatus;

    #[test]
    fn derived_only_from_success() {
        let partial = AnalysisOutcome::new(AnalysisStatus::Partial, "half done");
        assert!(Recommendation::from_outcome(&partial).is_none());

        let empty = AnalysisOutcome::new(AnalysisStatus::Success, "   ");
        assert!(Recommendation::from_outcome(&empty).is_none());
    }

    #[test]
    fn description_is_capped() {
        let text = "Stop idle instances. ".repeat(60);
        let outcome = AnalysisOutcome::new(AnalysisStatus::Success, text);
        let rec = Recommendation::from_outcome(&outcome).unwrap();

        assert_eq!(rec.description.chars().count(), DESCRIPTION_LIMIT);
        assert_eq!(rec.status, "pending");
        assert_eq!(rec.created_at, outcome.timestamp);
    }
}
