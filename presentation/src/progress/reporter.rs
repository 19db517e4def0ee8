//! Progress reporting for analysis runs

use colored::Colorize;
use costpilot_application::AnalysisProgressNotifier;
use costpilot_domain::util::preview;
use costpilot_domain::{AnalysisOutcome, FinishReason};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const ARGS_PREVIEW_CHARS: usize = 60;
const TEXT_PREVIEW_CHARS: usize = 120;

/// Reports progress with a spinner while the model thinks
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
    verbose: bool,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            verbose: false,
        }
    }

    /// Also print interim assistant text
    pub fn verbose() -> Self {
        Self {
            spinner: Mutex::new(None),
            verbose: true,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Print above the spinner, or plainly when none is active.
    fn println(&self, line: String) {
        match self.spinner.lock().ok().and_then(|s| s.clone()) {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }

    fn finish_spinner(&self) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisProgressNotifier for ProgressReporter {
    fn on_iteration_start(&self, iteration: usize, max_iterations: usize) {
        self.finish_spinner();

        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(format!("Iteration {}/{}", iteration, max_iterations));
        pb.set_message("Waiting for model...");
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut guard) = self.spinner.lock() {
            *guard = Some(pb);
        }
    }

    fn on_inference_complete(&self, finish_reason: &FinishReason, tool_calls: usize) {
        if let Ok(guard) = self.spinner.lock()
            && let Some(pb) = guard.as_ref()
        {
            match finish_reason {
                FinishReason::ToolCalls => pb.set_message(format!("Running {} tool(s)...", tool_calls)),
                _ => pb.set_message("Finishing..."),
            }
        }
    }

    fn on_assistant_text(&self, text: &str) {
        if self.verbose && !text.trim().is_empty() {
            self.println(format!("  {}", preview(text.trim(), TEXT_PREVIEW_CHARS).dimmed()));
        }
    }

    fn on_tool_call(&self, tool_name: &str, args: &str) {
        self.println(format!(
            "  {} {}({})",
            "->".cyan(),
            tool_name.bold(),
            preview(args, ARGS_PREVIEW_CHARS).dimmed()
        ));
    }

    fn on_tool_result(&self, tool_name: &str, success: bool, cached: bool) {
        let mark = if success { "v".green() } else { "x".red() };
        let cached = if cached { " (cached)".dimmed().to_string() } else { String::new() };
        self.println(format!("    {} {}{}", mark, tool_name, cached));
    }

    fn on_tool_resolved(&self, original_name: &str, resolved_name: &str) {
        self.println(format!(
            "    {} {} -> {}",
            "alias".dimmed(),
            original_name,
            resolved_name
        ));
    }

    fn on_retry(&self, operation: &str, attempt: u32, max_attempts: u32, error: &str) {
        self.println(format!(
            "    {} {} (attempt {}/{}): {}",
            "retry".yellow(),
            operation,
            attempt,
            max_attempts,
            error
        ));
    }

    fn on_complete(&self, _outcome: &AnalysisOutcome) {
        self.finish_spinner();
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl AnalysisProgressNotifier for SimpleProgress {
    fn on_iteration_start(&self, iteration: usize, max_iterations: usize) {
        println!(
            "{} {}",
            "->".cyan(),
            format!("Iteration {}/{}", iteration, max_iterations).bold()
        );
    }

    fn on_tool_call(&self, tool_name: &str, _args: &str) {
        println!("  {} {}", "*".cyan(), tool_name);
    }

    fn on_tool_result(&self, tool_name: &str, success: bool, _cached: bool) {
        if success {
            println!("  {} {}", "v".green(), tool_name);
        } else {
            println!("  {} {} (failed)", "x".red(), tool_name);
        }
    }

    fn on_retry(&self, operation: &str, attempt: u32, max_attempts: u32, _error: &str) {
        println!("  {} {} ({}/{})", "retry".yellow(), operation, attempt, max_attempts);
    }

    fn on_complete(&self, outcome: &AnalysisOutcome) {
        println!("{} {}", "->".cyan(), outcome.status);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costpilot_domain::AnalysisStatus;

    #[test]
    fn spinner_is_replaced_per_iteration_and_cleared_on_complete() {
        let reporter = ProgressReporter::new();
        reporter.on_iteration_start(1, 10);
        assert!(reporter.spinner.lock().unwrap().is_some());

        reporter.on_inference_complete(&FinishReason::ToolCalls, 2);
        reporter.on_tool_call("get_ec2_instances", r#"{"region":"us-east-1"}"#);
        reporter.on_tool_result("get_ec2_instances", true, false);
        reporter.on_iteration_start(2, 10);
        assert!(reporter.spinner.lock().unwrap().is_some());

        reporter.on_complete(&AnalysisOutcome::new(AnalysisStatus::Success, "done"));
        assert!(reporter.spinner.lock().unwrap().is_none());
    }
}
