//! CLI entrypoint for costpilot
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use costpilot_application::{
    ConversationLogger, CredentialBroker, InventoryBackend, RunAnalysisInput, RunAnalysisUseCase,
    ToolRegistry,
};
use costpilot_domain::{AnalysisOutcome, ClientProfile, Recommendation};
use costpilot_infrastructure::{
    AwsInventoryBackend, BedrockInferenceClient, ConfigLoader, FileConfig,
    JsonSchemaToolConverter, JsonlConversationLogger, StsCredentialBroker, base_config,
};
use costpilot_presentation::{AnalysisRepl, Cli, ConsoleFormatter, OutputFormat, ProgressReporter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Kept alive until exit so buffered log lines reach the file
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        print_config_locations();
        return Ok(ExitCode::SUCCESS);
    }

    info!("Starting costpilot");

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };
    apply_cli_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    let role_arn = cli
        .role_arn
        .clone()
        .ok_or_else(|| anyhow!("--role-arn (or COSTPILOT_ROLE_ARN) is required"))?;
    let mut profile = ClientProfile::new(role_arn, &config.aws.region);
    if let Some(region) = &config.aws.inference_region {
        profile = profile.with_inference_region(region);
    }

    // === Dependency Injection ===
    let aws_profile = config.aws.profile.as_deref();
    let account_config = base_config(aws_profile, &config.aws.region).await;
    let inference_config = base_config(aws_profile, profile.effective_inference_region()).await;

    let params = config.analysis_params();
    let broker: Arc<dyn CredentialBroker> = Arc::new(
        StsCredentialBroker::new(&account_config).with_session_name(&config.aws.role_session_name),
    );
    let backend: Arc<dyn InventoryBackend> = Arc::new(
        AwsInventoryBackend::new(&config.aws.region).with_merger(config.pagination_merger()),
    );
    let registry = Arc::new(ToolRegistry::new(backend, broker, &params));
    let inference = Arc::new(BedrockInferenceClient::new(
        &inference_config,
        &config.aws.model_id,
    ));

    let mut use_case =
        RunAnalysisUseCase::new(inference, registry, &JsonSchemaToolConverter).with_params(params);

    let conversation_log = cli
        .conversation_log
        .clone()
        .or_else(|| config.logging.conversation_log.as_ref().map(PathBuf::from));
    if let Some(path) = conversation_log
        && let Some(logger) = JsonlConversationLogger::new(&path)
    {
        info!("Recording conversation to {}", path.display());
        let logger: Arc<dyn ConversationLogger> = Arc::new(logger);
        use_case = use_case.with_conversation_logger(logger);
    }

    // Interactive mode when no query is given
    let Some(query) = cli.query.clone() else {
        let mut repl = AnalysisRepl::new(use_case, profile)
            .with_progress(!cli.quiet)
            .with_format(cli.format);
        repl.run().await?;
        if let Some(path) = &cli.output {
            write_outcomes(path, repl.outcomes())?;
        }
        return Ok(ExitCode::SUCCESS);
    };

    // === Single-shot analysis ===
    if !cli.quiet && cli.format != OutputFormat::Json {
        print_header(&profile, &config.aws.model_id, &query);
    }

    let token = CancellationToken::new();
    let watcher = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received Ctrl-C, cancelling analysis");
                token.cancel();
            }
        })
    };

    let use_case = use_case.with_cancellation(token);
    let input = RunAnalysisInput::new(profile, query);
    let outcome = if cli.quiet {
        use_case.execute(input, &costpilot_application::NoAnalysisProgress).await
    } else {
        let progress = ProgressReporter::new();
        use_case.execute(input, &progress).await
    };
    watcher.abort();

    let output = match cli.format {
        OutputFormat::Text => ConsoleFormatter::format_text(&outcome),
        OutputFormat::Full => ConsoleFormatter::format(&outcome),
        OutputFormat::Json => ConsoleFormatter::format_json(&outcome),
    };
    println!("{}", output);

    if let Some(path) = &cli.output {
        write_outcome(path, &outcome)?;
        if !cli.quiet {
            eprintln!("Results saved to {}", path.display());
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize logging based on verbosity level; `RUST_LOG` wins when set.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    });

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("--log-file must name a file: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

/// CLI flags are the highest-priority configuration layer.
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(profile) = &cli.profile {
        config.aws.profile = Some(profile.clone());
    }
    if let Some(region) = &cli.region {
        config.aws.region = region.clone();
    }
    if let Some(region) = &cli.inference_region {
        config.aws.inference_region = Some(region.clone());
    }
    if let Some(model) = &cli.model {
        config.aws.model_id = model.clone();
    }
    if let Some(max) = cli.max_iterations {
        config.analysis.max_iterations = max;
    }
    if let Some(path) = &cli.conversation_log {
        config.logging.conversation_log = Some(path.display().to_string());
    }
}

fn print_config_locations() {
    let show = |label: &str, path: Option<PathBuf>| match path {
        Some(path) => {
            let state = if path.exists() { "found" } else { "not found" };
            println!("{:<8} {} ({})", label, path.display(), state);
        }
        None => println!("{:<8} (unavailable)", label),
    };
    show("global", ConfigLoader::global_config_path());
    show("project", ConfigLoader::project_config_path());
}

fn print_header(profile: &ClientProfile, model_id: &str, query: &str) {
    println!();
    println!("+============================================================+");
    println!("|           costpilot - AWS Cost Optimization Analysis       |");
    println!("+============================================================+");
    println!();
    println!("Role:   {}", profile.identity_ref);
    println!("Region: {}", profile.region);
    println!("Model:  {}", model_id);
    println!("Query:  {}", query);
    println!();
}

/// The outcome, plus the recommendation record a successful run yields.
fn write_outcome(path: &Path, outcome: &AnalysisOutcome) -> Result<()> {
    let mut value = serde_json::to_value(outcome)?;
    if let Some(recommendation) = Recommendation::from_outcome(outcome)
        && let Some(fields) = value.as_object_mut()
    {
        fields.insert(
            "recommendation".to_string(),
            serde_json::to_value(recommendation)?,
        );
    }
    let json = serde_json::to_string_pretty(&value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn write_outcomes(path: &Path, outcomes: &[AnalysisOutcome]) -> Result<()> {
    let json = serde_json::to_string_pretty(outcomes)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
