//! Output formatter trait

use costpilot_domain::AnalysisOutcome;

/// Trait for formatting analysis outcomes
pub trait OutputFormatter {
    /// Format the outcome with statistics and the tool call trail
    fn format(&self, outcome: &AnalysisOutcome) -> String;

    /// Format as JSON
    fn format_json(&self, outcome: &AnalysisOutcome) -> String;

    /// Format the analysis text only (concise output)
    fn format_text(&self, outcome: &AnalysisOutcome) -> String;
}
