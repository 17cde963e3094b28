//! TestDeck CLI - Main Entry Point
//!
//! Browse a project's test tree, build selections, manage saved suites and
//! drive batch runs against the test hub API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use testdeck_common::WorkspaceApi;

mod client;
mod commands;
mod config;
mod output;

use commands::{history, queue, run, suite, tree, SelectionArgs};
use config::{expand_home, ClientConfig};

/// TestDeck CLI - test selection and batch runs
#[derive(Parser)]
#[command(name = "testdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path [default: ~/.testdeck/config.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Test hub API base URL (overrides the config file)
    #[arg(long, env = "TESTDECK_API_URL", global = true)]
    api_url: Option<String>,

    /// Project ID (overrides the config file)
    #[arg(short, long, env = "TESTDECK_PROJECT", global = true)]
    project: Option<String>,

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
    /// Show the project's test tree
    Tree(tree::TreeArgs),

    /// Preview the execution queue for a selection
    Queue(SelectionArgs),

    /// Run the selected tests as one batch
    Run(run::RunArgs),

    /// Inspect or cancel an existing run
    #[command(subcommand)]
    Runs(run::RunCommands),

    /// Manage saved suites
    #[command(subcommand)]
    Suite(suite::SuiteCommands),

    /// List past runs
    History,

    /// Rescan the project's test files on disk
    Scan,

    /// Manage the client configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),

    /// Check that the API is reachable
    Status,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .as_deref()
        .map(expand_home)
        .unwrap_or_else(testdeck_common::default_config_path);
    let mut config = ClientConfig::load(&config_path)?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(project) = cli.project {
        config.project_id = Some(project);
    }
    config.validate()?;

    let hub = client::HubClient::new(&config.api_url, config.request_timeout())?;
    let api: Arc<dyn WorkspaceApi> = Arc::new(hub.clone());

    match cli.command {
        Commands::Tree(args) => {
            tree::execute(args, api, &config, config.project()?, cli.format).await?
        }
        Commands::Queue(args) => {
            queue::execute(args, api, &config, config.project()?, cli.format).await?
        }
        Commands::Run(args) => {
            run::execute(args, api, &config, config.project()?, cli.format).await?
        }
        Commands::Runs(cmd) => {
            run::execute_command(cmd, api, config.project()?, cli.format).await?
        }
        Commands::Suite(cmd) => {
            suite::execute(cmd, api, &config, config.project()?, cli.format).await?
        }
        Commands::History => history::execute(api, config.project()?, cli.format).await?,
        Commands::Scan => {
            let project = config.project()?;
            let count = api.rescan(&project).await?;
            output::print_message(&format!("Found {} files", count), cli.format);
        }
        Commands::Config(cmd) => {
            commands::config::execute(cmd, &config, &config_path, cli.format)?
        }
        Commands::Status => {
            if hub.health_check().await {
                output::print_success(&format!("API is reachable at {}", hub.base_url()));
            } else {
                output::print_error(&format!("API is not responding at {}", hub.base_url()));
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("TestDeck CLI v{}", testdeck_common::VERSION);
        }
    }

    Ok(())
}
