//! edgesearch-admin: cache maintenance for an edgesearch deployment.
//!
//! Reads the same configuration as the server (`EDGESEARCH_*` variables and
//! `EDGESEARCH_CONFIG_FILE`) and operates on its durable cache database.
//! Logs go to stderr so command output on stdout stays pipeable.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use edgesearch_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{Command, Outcome};

#[derive(Parser, Debug)]
#[command(name = "edgesearch-admin", version, about = "Inspect and maintain the edgesearch result cache")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let outcome = commands::run(&config, cli.command).await?;
    match outcome {
        Outcome::Found(text) => {
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Outcome::NotFound(text) => {
            eprintln!("{text}");
            Ok(ExitCode::from(1))
        }
    }
}
