//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The analysis text with a short status line
    Text,
    /// Analysis, statistics and the tool calls that were made
    Full,
    /// The complete outcome as JSON
    Json,
}

/// CLI arguments for costpilot
#[derive(Parser, Debug)]
#[command(name = "costpilot")]
#[command(author, version, about = "AWS cost optimization analysis driven by a tool-using model")]
#[command(long_about = r#"
costpilot assumes a read-only role in an AWS account and lets a model on
Amazon Bedrock inspect the account's resources, metrics and spend through a
fixed catalog of read-only tools, then report optimization opportunities.

Configuration files are loaded from (lowest to highest priority):
1. ~/.config/costpilot/config.toml   Global config
2. ./costpilot.toml                  Project-level config
3. --config <path>                   Explicit config file
4. COSTPILOT_* environment variables (e.g. COSTPILOT_AWS__REGION)

Example:
  costpilot --role-arn arn:aws:iam::123456789012:role/CostReadOnly "Find idle EC2 instances"
  costpilot --role-arn arn:aws:iam::123456789012:role/CostReadOnly --format json -o report.json
  costpilot --role-arn arn:aws:iam::123456789012:role/CostReadOnly    (interactive)
"#)]
pub struct Cli {
    /// What to analyze (starts the interactive REPL when omitted)
    pub query: Option<String>,

    /// Role to assume in the analyzed account
    #[arg(long, value_name = "ARN", env = "COSTPILOT_ROLE_ARN")]
    pub role_arn: Option<String>,

    /// Region of the analyzed account's regional resources
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Region of the Bedrock endpoint (defaults to --region)
    #[arg(long, value_name = "REGION")]
    pub inference_region: Option<String>,

    /// Bedrock model id
    #[arg(long, value_name = "MODEL_ID")]
    pub model: Option<String>,

    /// Named AWS profile for the base credentials
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Maximum number of inference round-trips
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Write the outcome as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Console output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Record conversation events as JSON lines in this file
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_shot_invocation() {
        let cli = Cli::try_parse_from([
            "costpilot",
            "--role-arn",
            "arn:aws:iam::123456789012:role/CostReadOnly",
            "--region",
            "eu-west-1",
            "--max-iterations",
            "5",
            "--format",
            "json",
            "-o",
            "report.json",
            "-vv",
            "Find idle instances",
        ])
        .unwrap();

        assert_eq!(cli.query.as_deref(), Some("Find idle instances"));
        assert_eq!(
            cli.role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/CostReadOnly")
        );
        assert_eq!(cli.region.as_deref(), Some("eu-west-1"));
        assert_eq!(cli.max_iterations, Some(5));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.output, Some(PathBuf::from("report.json")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn defaults_to_text_and_repl() {
        let cli = Cli::try_parse_from(["costpilot", "--no-config"]).unwrap();
        assert!(cli.query.is_none());
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.no_config);
        assert!(!cli.quiet);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["costpilot", "--format", "yaml"]).is_err());
    }
}
