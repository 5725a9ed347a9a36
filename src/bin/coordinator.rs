//! `coordinator <R> <input_file>...` (spec §6).

use std::path::PathBuf;

use clap::Parser;
use map_reduce_rs::config::Config;
use map_reduce_rs::coordinator;
use tracing_subscriber::EnvFilter;

/// MapReduce coordinator: owns the task registry and answers worker RPCs.
#[derive(Parser, Debug)]
#[command(name = "coordinator")]
struct Cli {
    /// Number of reduce partitions.
    reduce_n: u32,

    /// Input files; their count fixes the number of map tasks.
    #[arg(required = true)]
    input_files: Vec<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.reduce_n < 1 {
        anyhow::bail!("R must be at least 1");
    }

    let mut inputs = Vec::with_capacity(cli.input_files.len());
    for path in &cli.input_files {
        if !path.is_file() {
            anyhow::bail!("input file {path:?} does not exist or is not a regular file");
        }
        inputs.push(path.to_string_lossy().into_owned());
    }

    let config = Config::from_env()?;
    coordinator::run(inputs, cli.reduce_n, config).await?;

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
