use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "devrun")]
#[command(about = "devrun - Set up and run a local development stack")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ~/.devrun/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Service registry path (defaults to devrun.yaml in this or a parent directory)
    #[arg(short, long, global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prepare and run services, respawning them when they exit
    Start {
        /// Service names and key=value overrides, in any order
        /// (e.g. `member-app ion-core clean=yes env=stage4`)
        #[arg(value_name = "SERVICE|KEY=VALUE")]
        args: Vec<String>,
    },
    /// Stop the named services' sessions, or every running one
    Stop {
        /// Service names and key=value overrides, in any order
        #[arg(value_name = "SERVICE|KEY=VALUE")]
        args: Vec<String>,
    },
    /// List registered services with their paths and roles
    List,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
