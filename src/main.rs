mod cli;
mod commands;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use devrun::config::{Arguments, ConfigStore, LogLevel, RegistryFile, Settings};
use devrun::output::{Console, TerminalConsole, Tone};
use devrun::process::ShellRunner;
use devrun::prompt::TerminalGateway;
use devrun::{Context, Error as DevrunError, Orchestrator, ServiceRegistry};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(devrun_error) = e.downcast_ref::<DevrunError>() {
            eprintln!("Error: {}", devrun_error);
            if let Some(suggestion) = devrun_error.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Commands that need no config ──────────────────────────────────
    let args = match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            return Ok(());
        }
        Commands::Start { args } | Commands::Stop { args } => Arguments::parse(args),
        Commands::List => Arguments::default(),
    };

    // ── Load config (created on first run) ────────────────────────────
    let console: Arc<dyn Console> = Arc::new(TerminalConsole::new());
    let gateway = Arc::new(TerminalGateway::new());
    let config_path = cli.config.clone().unwrap_or_else(ConfigStore::default_path);
    let store = ConfigStore::open_or_create(&config_path, gateway.as_ref(), console.as_ref()).await?;

    let resolved = Settings::resolve(store.file(), &args.overrides)?;
    init_tracing(resolved.settings.log_level);
    tracing::debug!(config = %config_path.display(), settings = ?resolved.settings, "Resolved settings");

    for key in &resolved.ignored {
        console.log(&[
            Tone::Yellow.text("Unknown option"),
            Tone::Cyan.text(key),
            Tone::Yellow.text("ignored"),
        ]);
    }
    for arg in &args.rejected {
        console.log(&[
            Tone::Yellow.text("Malformed option"),
            Tone::Cyan.text(arg),
            Tone::Yellow.text("ignored"),
        ]);
    }

    // ── Load registry ─────────────────────────────────────────────────
    let registry_path = match cli.registry.clone() {
        Some(path) => path,
        None => RegistryFile::find(&std::env::current_dir()?)?,
    };
    tracing::debug!(registry = %registry_path.display(), "Loading service registry");
    let registry = ServiceRegistry::from_file(&registry_path, store)?;

    let ctx = Context::new(
        resolved.settings,
        Arc::new(ShellRunner::new()),
        gateway,
        console,
    );
    let mut orchestrator = Orchestrator::new(registry, ctx);

    match cli.command {
        Commands::Start { .. } => commands::run_start(&mut orchestrator, args.services).await,
        Commands::Stop { .. } => commands::run_stop(&orchestrator, args.services).await,
        Commands::List => commands::run_list(&orchestrator),
        Commands::Completions { .. } => unreachable!("handled before config loading"),
    }
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.tracing_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
