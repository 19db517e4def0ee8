//! Console output formatter for analysis outcomes

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use costpilot_domain::util::preview;
use costpilot_domain::{AnalysisOutcome, AnalysisStatus, Turn};
use std::collections::HashMap;

/// Longest argument rendering shown in the tool call trail.
const ARGS_PREVIEW_CHARS: usize = 80;

/// Formats analysis outcomes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the outcome with statistics and every tool call made
    pub fn format(outcome: &AnalysisOutcome) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Cost Optimization Analysis"));
        output.push('\n');

        output.push_str(&Self::section_header("Analysis"));
        output.push('\n');
        output.push_str(Self::body(outcome));
        output.push('\n');

        let calls = Self::tool_trail(outcome);
        if !calls.is_empty() {
            output.push_str(&Self::section_header("Tool Calls"));
            for line in calls {
                output.push_str(&format!("  {}\n", line));
            }
        }

        output.push_str(&Self::section_header("Statistics"));
        output.push_str(&Self::statistics(outcome));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(outcome: &AnalysisOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the analysis text only (concise output)
    pub fn format_text(outcome: &AnalysisOutcome) -> String {
        let mut output = String::new();
        output.push_str(Self::body(outcome));
        output.push_str("\n\n");
        output.push_str(&Self::status_line(outcome));
        output.push('\n');
        output
    }

    /// One-line status with counts, colored by outcome.
    pub fn status_line(outcome: &AnalysisOutcome) -> String {
        let status = match outcome.status {
            AnalysisStatus::Success => outcome.status.as_str().green().bold(),
            AnalysisStatus::Partial | AnalysisStatus::Cancelled => {
                outcome.status.as_str().yellow().bold()
            }
            AnalysisStatus::Error => outcome.status.as_str().red().bold(),
        };
        let mut line = format!(
            "{} {} ({} iterations, {} tool calls)",
            "Status:".dimmed(),
            status,
            outcome.iteration_count,
            outcome.tool_call_count
        );
        if let Some(message) = &outcome.message {
            line.push_str(&format!(" - {}", message));
        }
        line
    }

    fn body(outcome: &AnalysisOutcome) -> &str {
        if outcome.text.trim().is_empty() {
            "(no analysis text)"
        } else {
            &outcome.text
        }
    }

    fn statistics(outcome: &AnalysisOutcome) -> String {
        let mut out = format!(
            "{} {}\n{} {}\n{} {}\n",
            "Status:".cyan().bold(),
            outcome.status,
            "Iterations:".cyan().bold(),
            outcome.iteration_count,
            "Tool calls:".cyan().bold(),
            outcome.tool_call_count,
        );
        if let Some(message) = &outcome.message {
            out.push_str(&format!("{} {}\n", "Message:".cyan().bold(), message));
        }
        out.push_str(&format!(
            "{} {}\n",
            "Finished:".cyan().bold(),
            outcome.timestamp.to_rfc3339()
        ));
        out
    }

    /// `name(args) ok|error` for each call, in transcript order.
    fn tool_trail(outcome: &AnalysisOutcome) -> Vec<String> {
        let turns = outcome.transcript.turns();
        let results: HashMap<&str, bool> = turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::ToolResult { call_id, payload } => Some((
                    call_id.as_str(),
                    payload.get("status").and_then(|s| s.as_str()) == Some("success"),
                )),
                _ => None,
            })
            .collect();

        turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::Assistant { tool_calls, .. } => Some(tool_calls),
                _ => None,
            })
            .flatten()
            .map(|call| {
                let args = serde_json::Value::Object(call.arguments.clone()).to_string();
                let mark = match results.get(call.id.as_str()) {
                    Some(true) => "ok".green(),
                    Some(false) => "error".red(),
                    None => "no result".yellow(),
                };
                format!(
                    "{}({}) {}",
                    call.tool_name.bold(),
                    preview(&args, ARGS_PREVIEW_CHARS),
                    mark
                )
            })
            .collect()
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, outcome: &AnalysisOutcome) -> String {
        Self::format(outcome)
    }

    fn format_json(&self, outcome: &AnalysisOutcome) -> String {
        Self::format_json(outcome)
    }

    fn format_text(&self, outcome: &AnalysisOutcome) -> String {
        Self::format_text(outcome)
    }
}
