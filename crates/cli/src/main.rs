//! Isle CLI - Main Entry Point
//!
//! Validates the installed scripts, checks Docker access where needed, and
//! hands the command line to the script that implements it.

use anyhow::Context;
use clap::Parser;
use isle_cli::{output, Dispatcher};
use isle_core::{config, IsleConfig};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Isle-Mesh CLI - Orchestrate Isle-Mesh networks and mesh-apps
#[derive(Parser)]
#[command(name = "isle")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
struct Cli {
    /// Installation directory holding the CLI scripts
    #[arg(long, env = "ISLE_ROOT", value_name = "DIR")]
    root: Option<PathBuf>,

    /// Built-in command surface version
    #[arg(long, env = "ISLE_MANIFEST", value_name = "VERSION")]
    manifest: Option<String>,

    /// Manifest file replacing the built-in command surface
    #[arg(long, env = "ISLE_MANIFEST_FILE", value_name = "FILE")]
    manifest_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, env = "ISLE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Command, subcommand and arguments passed through to the script
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ISLE_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .log_internal_errors(false)
        .init();

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => output::report(&err),
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let mut config = IsleConfig::load(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;

    if let Some(root) = cli.root {
        config.install_root = Some(root);
    }
    if let Some(version) = cli.manifest {
        config.manifest = version;
        config.manifest_file = None;
    }
    if let Some(file) = cli.manifest_file {
        config.manifest_file = Some(file);
    }

    let manifest = config.manifest()?;
    let install_root = config.install_root()?;
    let caller_dir = std::env::current_dir().context("cannot determine current directory")?;
    debug!(
        manifest = %manifest.version,
        root = %install_root.display(),
        "configuration loaded"
    );

    let dispatcher = Dispatcher::from_config(&manifest, &config, &install_root, &caller_dir);
    let mut stdout = std::io::stdout().lock();
    let code = dispatcher.dispatch(&cli.args, &mut stdout)?;
    // The child has already run; its code wins over a closed stdout
    let _ = stdout.flush();
    Ok(code)
}
