//! `worker <app_name>` (spec §6).

use std::path::PathBuf;

use clap::Parser;
use map_reduce_rs::config::Config;
use map_reduce_rs::{app, worker};
use tracing_subscriber::EnvFilter;

/// MapReduce worker: pulls tasks from the coordinator and executes them.
#[derive(Parser, Debug)]
#[command(name = "worker")]
struct Cli {
    /// Name of the registered user application (e.g. "wordcount").
    app_name: String,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let app = app::resolve(&cli.app_name)?;
    let config = Config::from_env()?;
    let client = worker::connect(&config).await?;
    worker::run(client, app, &PathBuf::from("."), &config).await?;

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_target(verbose >= 2)
        .init();
}
