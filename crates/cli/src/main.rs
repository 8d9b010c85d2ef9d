use clap::{Parser, Subcommand};

mod commands;
mod display;

use commands::{DaemonArgs, HistoryArgs, RankArgs, RunArgs};

#[derive(Parser)]
#[command(name = "confluence")]
#[command(about = "Smart-money confluence scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a ticker universe once for an as-of date
    Run(RunArgs),
    /// Run scheduled batches (daemon mode)
    Daemon(DaemonArgs),
    /// Show the latest records ranked by score
    Rank(RankArgs),
    /// Show the record history of one ticker
    History(HistoryArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => commands::run_batch(args).await?,
        Commands::Daemon(args) => commands::run_daemon(args).await?,
        Commands::Rank(args) => commands::run_rank(args).await?,
        Commands::History(args) => commands::run_history(args).await?,
    }

    Ok(())
}
