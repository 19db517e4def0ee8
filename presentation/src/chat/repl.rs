//! REPL (Read-Eval-Print Loop) for interactive analysis

use crate::cli::commands::OutputFormat;
use crate::{ConsoleFormatter, ProgressReporter};
use costpilot_application::{
    InferenceClient, NoAnalysisProgress, RunAnalysisInput, RunAnalysisUseCase,
    ToolExecutorPort,
};
use costpilot_domain::{AnalysisOutcome, ClientProfile};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// A slash command typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Help,
    Save(PathBuf),
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match (name, arg) {
            ("/quit" | "/exit" | "/q", _) => ReplCommand::Quit,
            ("/help" | "/h" | "/?", _) => ReplCommand::Help,
            ("/save", Some(path)) => ReplCommand::Save(PathBuf::from(path)),
            _ => ReplCommand::Unknown(line.trim().to_string()),
        }
    }
}

/// Write every outcome of the session as a JSON array.
pub fn save_outcomes(path: &Path, outcomes: &[AnalysisOutcome]) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(outcomes).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
}

/// Interactive analysis REPL
pub struct AnalysisRepl<I: InferenceClient + 'static, T: ToolExecutorPort + 'static> {
    use_case: RunAnalysisUseCase<I, T>,
    profile: ClientProfile,
    format: OutputFormat,
    show_progress: bool,
    outcomes: Vec<AnalysisOutcome>,
}

impl<I: InferenceClient + 'static, T: ToolExecutorPort + 'static> AnalysisRepl<I, T> {
    /// Create a new AnalysisRepl
    pub fn new(use_case: RunAnalysisUseCase<I, T>, profile: ClientProfile) -> Self {
        Self {
            use_case,
            profile,
            format: OutputFormat::Text,
            show_progress: true,
            outcomes: Vec::new(),
        }
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Outcomes of the questions asked so far
    pub fn outcomes(&self) -> &[AnalysisOutcome] {
        &self.outcomes
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        // Try to load history
        let history_path = dirs::data_dir().map(|p| p.join("costpilot").join("history.txt"));

        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let readline = rl.readline("costpilot> ");

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    // Handle commands
                    if line.starts_with('/') {
                        if self.handle_command(ReplCommand::parse(line)) {
                            break;
                        }
                        continue;
                    }

                    // Add to history
                    let _ = rl.add_history_entry(line);

                    self.process_question(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        // Save history
        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("costpilot - interactive analysis");
        println!();
        println!("Account role: {}", self.profile.identity_ref);
        println!("Region:       {}", self.profile.region);
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /save FILE        - Save this session's results as JSON");
        println!("  /quit, /exit, /q  - Exit");
        println!();
        println!("Anything else is analyzed against the account. Ctrl-C cancels a running analysis.");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                true
            }
            ReplCommand::Help => {
                println!();
                Self::print_help();
                false
            }
            ReplCommand::Save(path) => {
                match save_outcomes(&path, &self.outcomes) {
                    Ok(()) => println!(
                        "Saved {} result(s) to {}",
                        self.outcomes.len(),
                        path.display()
                    ),
                    Err(e) => eprintln!("Failed to save {}: {}", path.display(), e),
                }
                false
            }
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                false
            }
        }
    }

    async fn process_question(&mut self, question: &str) {
        println!();

        let token = CancellationToken::new();
        let watcher = {
            let token = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Cancelling analysis");
                    token.cancel();
                }
            })
        };

        let use_case = self.use_case.clone().with_cancellation(token);
        let input = RunAnalysisInput::new(self.profile.clone(), question);

        let outcome = if self.show_progress {
            let progress = ProgressReporter::new();
            use_case.execute(input, &progress).await
        } else {
            use_case.execute(input, &NoAnalysisProgress).await
        };
        watcher.abort();

        let output = match self.format {
            OutputFormat::Text => ConsoleFormatter::format_text(&outcome),
            OutputFormat::Full => ConsoleFormatter::format(&outcome),
            OutputFormat::Json => ConsoleFormatter::format_json(&outcome),
        };
        println!("{}", output);
        println!();

        self.outcomes.push(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costpilot_domain::AnalysisStatus;

    #[test]
    fn parses_commands() {
        assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/q"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/help"), ReplCommand::Help);
        assert_eq!(
            ReplCommand::parse("/save  results/today.json "),
            ReplCommand::Save(PathBuf::from("results/today.json"))
        );
        assert_eq!(
            ReplCommand::parse("/save"),
            ReplCommand::Unknown("/save".to_string())
        );
        assert_eq!(
            ReplCommand::parse("/models"),
            ReplCommand::Unknown("/models".to_string())
        );
    }

    #[test]
    fn saves_outcomes_as_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let outcomes = vec![
            AnalysisOutcome::new(AnalysisStatus::Success, "first"),
            AnalysisOutcome::new(AnalysisStatus::Partial, "second").with_message("budget"),
        ];

        save_outcomes(&path, &outcomes).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let saved = value.as_array().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0]["text"], "first");
        assert_eq!(saved[1]["status"], "partial");
    }
}
