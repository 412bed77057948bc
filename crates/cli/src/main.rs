//! bocactl CLI - Main Entry Point
//!
//! Validates provisioning documents, plans and runs contest provisioning
//! against a BOCA server, and harvests submitted runs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use bocactl_common::{BrowserKind, DEFAULT_CONFIG_FILE};
use commands::{config, plan, run, validate, Context, Overrides};

/// bocactl - declarative provisioning for BOCA contest servers
#[derive(Parser)]
#[command(name = "bocactl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "BOCACTL_CONFIG", default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// BOCA base URL (overrides the configuration file)
    #[arg(long, env = "BOCACTL_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long, global = true)]
    browser: Option<BrowserKind>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Per-operation timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a document against an operation's contract
    Validate(validate::ValidateArgs),

    /// Show the steps an operation would take, without a browser
    Plan(plan::PlanArgs),

    /// Carry out an operation in the browser
    Run(run::RunArgs),

    /// Download code and judge output of every run
    Harvest(run::HarvestArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let overrides = Overrides {
        base_url: cli.base_url,
        browser: cli.browser,
        headed: cli.headed,
        timeout_secs: cli.timeout,
    };
    let ctx = Context {
        config: commands::load_config(&cli.config, &overrides)?,
        config_path: cli.config,
        format: cli.format,
    };

    let result = match cli.command {
        Commands::Validate(args) => validate::execute(args, &ctx),
        Commands::Plan(args) => plan::execute(args, &ctx).await,
        Commands::Run(args) => run::execute(args, &ctx).await,
        Commands::Harvest(args) => run::harvest(args, &ctx).await,
        Commands::Config(cmd) => config::execute(cmd, &ctx),
        Commands::Version => {
            println!("bocactl v{}", bocactl_common::VERSION);
            Ok(())
        }
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
