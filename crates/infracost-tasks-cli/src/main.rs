//! Infracost pipeline tasks CLI
//!
//! The `infracost-task` binary is what the pipeline agent executes.
//!
//! ## Commands
//!
//! - `comment`: Render a cost estimate with `infracost output` and post it
//! - `configure`: Apply task inputs to the infracost CLI configuration
//!
//! Task inputs are read from `INPUT_*` environment variables set by the
//! agent; command-line flags override them.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use infracost_tasks_ci::{
    AgentLog, CiEnvironment, CommentTask, CommentTaskOptions, ConfigureTask, EnvPlatformDetector,
    InfracostCli, TaskInputs, TaskResult,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "infracost-task")]
#[command(author = "Infracost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Infracost pipeline tasks", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to the infracost executable
    #[arg(long, global = true, env = "INFRACOST_BIN", default_value = "infracost")]
    infracost_bin: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post a cost estimate comment to the current pull request or commit
    Comment(CommentArgs),

    /// Configure the infracost CLI (API key, currency, pricing endpoint)
    Configure(ConfigureArgs),
}

#[derive(Args)]
struct CommentArgs {
    /// Infracost JSON file, or a JSON array of files
    #[arg(long)]
    path: Option<String>,

    /// update, delete-and-new, new or hide-and-new
    #[arg(long)]
    behavior: Option<String>,

    /// pull-request or commit
    #[arg(long)]
    target_type: Option<String>,

    /// Tag distinguishing comments from several tasks on one target
    #[arg(long)]
    tag: Option<String>,

    /// Render the comment without posting it
    #[arg(long)]
    dry_run: bool,

    /// Token for GitHub repositories
    #[arg(long, hide_env_values = true)]
    github_token: Option<String>,

    /// Token for Azure Repos repositories
    #[arg(long, hide_env_values = true)]
    azure_repos_token: Option<String>,

    /// Where `infracost output` writes the report
    #[arg(long, default_value = "infracost-comment.md")]
    out_file: PathBuf,

    /// Working directory for `infracost output`
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Timeout for `infracost output` in seconds (0 disables it)
    #[arg(long, env = "INFRACOST_TIMEOUT_SECS", default_value = "0")]
    timeout_secs: u64,

    /// Timeout for each comment API request in seconds
    #[arg(long, default_value = "30")]
    http_timeout_secs: u64,
}

#[derive(Args)]
struct ConfigureArgs {
    /// Infracost API key
    #[arg(long, hide_env_values = true)]
    api_key: Option<String>,

    /// ISO 4217 currency code
    #[arg(long)]
    currency: Option<String>,

    /// Self-hosted pricing API endpoint
    #[arg(long)]
    pricing_api_endpoint: Option<String>,

    /// Send estimates to the Infracost dashboard
    #[arg(long)]
    enable_dashboard: bool,
}

fn overlay(inputs: &mut TaskInputs, name: &str, value: Option<String>) {
    if let Some(value) = value {
        inputs.set(name, value);
    }
}

fn comment_inputs(args: &CommentArgs) -> TaskInputs {
    let mut inputs = TaskInputs::from_env();
    overlay(&mut inputs, "path", args.path.clone());
    overlay(&mut inputs, "behavior", args.behavior.clone());
    overlay(&mut inputs, "targetType", args.target_type.clone());
    overlay(&mut inputs, "tag", args.tag.clone());
    overlay(&mut inputs, "githubToken", args.github_token.clone());
    overlay(&mut inputs, "azureReposToken", args.azure_repos_token.clone());
    if args.dry_run {
        inputs.set("dryRun", "true");
    }
    inputs
}

fn configure_inputs(args: &ConfigureArgs) -> TaskInputs {
    let mut inputs = TaskInputs::from_env();
    overlay(&mut inputs, "apiKey", args.api_key.clone());
    overlay(&mut inputs, "currency", args.currency.clone());
    overlay(
        &mut inputs,
        "pricingApiEndpoint",
        args.pricing_api_endpoint.clone(),
    );
    if args.enable_dashboard {
        inputs.set("enableDashboard", "true");
    }
    inputs
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = CiEnvironment::from_env();

    // Setup logging
    let level = if cli.verbose || env.debug_enabled() {
        Level::DEBUG
    } else {
        Level::INFO
    };
    infracost_tasks_core::init_tracing(cli.json, level);

    let result = match &cli.command {
        Commands::Comment(args) => cmd_comment(&cli, args, env).await?,
        Commands::Configure(args) => cmd_configure(&cli, args, env).await?,
    };

    std::process::exit(result.exit_code());
}

/// Generate and post the cost estimate comment
async fn cmd_comment(cli: &Cli, args: &CommentArgs, env: CiEnvironment) -> Result<TaskResult> {
    let inputs = comment_inputs(args);
    let mut log = AgentLog::stdout(env.debug_enabled());

    let detector = EnvPlatformDetector::new(env.clone())
        .with_timeout(Duration::from_secs(args.http_timeout_secs));
    let task = CommentTask::new(Arc::new(InfracostCli), Arc::new(detector)).with_options(
        CommentTaskOptions {
            binary: cli.infracost_bin.clone(),
            out_file: args.out_file.clone(),
            working_dir: args.working_dir.clone(),
            timeout_secs: args.timeout_secs,
        },
    );

    let result = task
        .run_and_report(&inputs, &env, &mut log)
        .await
        .context("Failed to write task result")?;
    info!(result = %result, "Comment task finished");
    Ok(result)
}

/// Apply configuration inputs to the infracost CLI
async fn cmd_configure(cli: &Cli, args: &ConfigureArgs, env: CiEnvironment) -> Result<TaskResult> {
    let inputs = configure_inputs(args);
    let mut log = AgentLog::stdout(env.debug_enabled());

    let result = ConfigureTask::new(&cli.infracost_bin)
        .run_and_report(&inputs, &env, &mut log)
        .await
        .context("Failed to write task result")?;
    info!(result = %result, "Configure task finished");
    Ok(result)
}
