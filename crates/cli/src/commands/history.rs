//! Time series of records for one ticker.

use anyhow::Result;
use clap::Args;
use confluence_ranking::{Ranker, TickerStatus};

use super::{load_config, open_records, parse_date};
use crate::display::format_history;

/// Arguments for the history command.
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Ticker symbol
    #[arg(long)]
    pub ticker: String,

    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Records file written by `run --output`; defaults to the database
    #[arg(long)]
    pub records: Option<String>,

    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,

    /// Number of days back from the end date
    #[arg(long, default_value_t = 30)]
    pub days: i64,

    /// End date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub end: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Runs the history command.
///
/// # Errors
/// Returns an error if the dates are invalid or the records cannot be read.
pub async fn run_history(args: HistoryArgs) -> Result<()> {
    let end = parse_date(args.end.as_deref())?;
    let start = end - chrono::Duration::days(args.days.max(0));
    let ticker = args.ticker.trim().to_uppercase();

    let config = load_config(&args.config)?;
    let store = open_records(&config, args.records.as_deref(), args.db_url.as_deref()).await?;
    let ranker = Ranker::new(store);

    let records = ranker.history(&ticker, start, end).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("{}", format_history(&ticker, &records));

    if records.is_empty() {
        if let TickerStatus::Scored(latest) = ranker.lookup(&ticker).await? {
            println!(
                "Latest record is dated {} (outside {} to {}).",
                latest.signal_date, start, end
            );
        }
    }

    Ok(())
}
