//! Ranked view of the latest record per ticker.

use anyhow::{anyhow, Result};
use clap::Args;
use confluence_core::{Direction, SignalSource};
use confluence_ranking::{Ranker, RecordQuery};

use super::{load_config, open_records};
use crate::display::format_ranking;

/// Arguments for the rank command.
#[derive(Args, Debug, Clone)]
pub struct RankArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Records file written by `run --output`; defaults to the database
    #[arg(long)]
    pub records: Option<String>,

    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,

    /// Minimum composite score
    #[arg(long)]
    pub min_score: Option<f64>,

    /// Direction filter (bullish, bearish, mixed, neutral)
    #[arg(long)]
    pub direction: Option<String>,

    /// Only tickers where this source participated (e.g. "insider")
    #[arg(long)]
    pub source: Option<String>,

    /// Single ticker
    #[arg(long)]
    pub ticker: Option<String>,

    /// Maximum rows
    #[arg(short, long, default_value_t = 25)]
    pub limit: usize,

    /// Rows to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl RankArgs {
    /// Builds the query from the filter flags.
    ///
    /// # Errors
    /// Returns an error for an unknown direction or source name.
    pub fn query(&self) -> Result<RecordQuery> {
        let mut query = RecordQuery::new().limit(self.limit).offset(self.offset);

        if let Some(min) = self.min_score {
            query = query.min_score(min);
        }
        if let Some(raw) = &self.direction {
            let direction = Direction::parse(raw)
                .ok_or_else(|| anyhow!("Unknown direction '{raw}'. Use bullish, bearish, mixed or neutral"))?;
            query = query.direction(direction);
        }
        if let Some(raw) = &self.source {
            let source = SignalSource::parse(raw).ok_or_else(|| {
                let known: Vec<_> = SignalSource::ALL.iter().map(SignalSource::as_str).collect();
                anyhow!("Unknown source '{raw}'. Known: {}", known.join(", "))
            })?;
            query = query.source(source);
        }
        if let Some(ticker) = &self.ticker {
            query = query.ticker(ticker.clone());
        }

        Ok(query)
    }
}

/// Runs the rank command.
///
/// # Errors
/// Returns an error if the filters are invalid or the records cannot be read.
pub async fn run_rank(args: RankArgs) -> Result<()> {
    let query = args.query()?;
    let config = load_config(&args.config)?;
    let store = open_records(&config, args.records.as_deref(), args.db_url.as_deref()).await?;

    let ranked = Ranker::new(store).top(&query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else {
        println!("{}", format_ranking(&ranked));
    }

    Ok(())
}
