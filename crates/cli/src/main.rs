use clap::{Parser, Subcommand};

mod commands;

use commands::{BacktestArgs, ReplayArgs};

#[derive(Parser)]
#[command(name = "expiry-trade")]
#[command(about = "Expiry-cycle backtester for index options", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank, allocate, and settle every expiration cycle in the input files
    Backtest(BacktestArgs),
    /// Copy an existing order table unchanged
    Replay(ReplayArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Backtest(args) => {
            commands::run_backtest(args).await?;
        }
        Commands::Replay(args) => {
            commands::run_replay(&args)?;
        }
    }

    Ok(())
}
