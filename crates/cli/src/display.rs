//! Terminal presentation of confluence records.
//!
//! Score bands, labels and colours exist only here; the scoring crates emit
//! plain numbers and directions.

#![allow(clippy::format_push_string)]

use colored::{Color, Colorize};
use confluence_core::{ConfluenceRecord, Direction, SignalSource};
use confluence_scheduler::RunSummary;

/// Conviction band of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScoreBand {
    None,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl ScoreBand {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::VeryStrong
        } else if score >= 50.0 {
            Self::Strong
        } else if score >= 25.0 {
            Self::Moderate
        } else if score > 0.0 {
            Self::Weak
        } else {
            Self::None
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
            Self::VeryStrong => "very strong",
        }
    }

    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::None => Color::BrightBlack,
            Self::Weak => Color::White,
            Self::Moderate => Color::Yellow,
            Self::Strong => Color::Cyan,
            Self::VeryStrong => Color::BrightGreen,
        }
    }
}

#[must_use]
pub const fn direction_color(direction: Direction) -> Color {
    match direction {
        Direction::Bullish => Color::Green,
        Direction::Bearish => Color::Red,
        Direction::Mixed => Color::Yellow,
        Direction::Neutral => Color::BrightBlack,
    }
}

/// Short column header for a source.
#[must_use]
pub const fn source_column(source: SignalSource) -> &'static str {
    match source {
        SignalSource::Congress => "CONG",
        SignalSource::Ark => "ARK",
        SignalSource::DarkPool => "DARK",
        SignalSource::Institutional => "INST",
        SignalSource::Insider => "INSD",
        SignalSource::ShortInterest => "SHRT",
        SignalSource::Superinvestor => "SUPR",
    }
}

fn source_cell(score: f64) -> String {
    if score > 0.0 {
        format!("{score:>6.1}")
    } else {
        format!("{:>6}", "-")
    }
}

fn score_cell(score: f64) -> String {
    let band = ScoreBand::from_score(score);
    format!("{score:>6.2} {:<11}", band.label())
        .color(band.color())
        .to_string()
}

fn direction_cell(direction: Direction) -> String {
    format!("{:<8}", direction.as_str())
        .color(direction_color(direction))
        .to_string()
}

fn header(title: &str) -> String {
    let mut output = String::new();
    output.push('\n');
    output.push_str(&"═".repeat(100));
    output.push('\n');
    output.push_str(&format!("{}\n", title.bold()));
    output.push_str(&"═".repeat(100));
    output.push('\n');
    output
}

fn source_headers() -> String {
    SignalSource::ALL
        .into_iter()
        .map(|s| format!("{:>6}", source_column(s)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn source_cells(record: &ConfluenceRecord) -> String {
    SignalSource::ALL
        .into_iter()
        .map(|s| source_cell(record.score_for(s)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ranked table, one row per record in the given order.
#[must_use]
pub fn format_ranking(records: &[ConfluenceRecord]) -> String {
    let mut output = header("CONFLUENCE RANKING");

    if records.is_empty() {
        output.push_str("No records match.\n");
        return output;
    }

    output.push_str(&format!(
        "{:>4} {:<8} {:<18} {:<8} {:>3} {:>10}  {}\n",
        "#",
        "Ticker",
        "Score",
        "Dir",
        "N",
        "Date",
        source_headers()
    ));
    output.push_str(&"─".repeat(100));
    output.push('\n');

    for (rank, record) in records.iter().enumerate() {
        output.push_str(&format!(
            "{:>4} {:<8} {} {} {:>3} {:>10}  {}\n",
            rank + 1,
            record.ticker,
            score_cell(record.score),
            direction_cell(record.direction),
            record.source_count,
            record.signal_date,
            source_cells(record)
        ));
    }

    output
}

/// Dated series for one ticker, with the evidence behind the latest record.
#[must_use]
pub fn format_history(ticker: &str, records: &[ConfluenceRecord]) -> String {
    let mut output = header(&format!("CONFLUENCE HISTORY: {ticker}"));

    let Some(latest) = records.last() else {
        output.push_str(&format!("No data for {ticker}.\n"));
        return output;
    };

    output.push_str(&format!(
        "{:<10} {:<18} {:<8} {:>3}  {}\n",
        "Date",
        "Score",
        "Dir",
        "N",
        source_headers()
    ));
    output.push_str(&"─".repeat(100));
    output.push('\n');

    for record in records {
        output.push_str(&format!(
            "{:<10} {} {} {:>3}  {}\n",
            record.signal_date,
            score_cell(record.score),
            direction_cell(record.direction),
            record.source_count,
            source_cells(record)
        ));
    }

    output.push('\n');
    output.push_str(&format_details(latest));
    output
}

/// Evidence lines of one record.
#[must_use]
pub fn format_details(record: &ConfluenceRecord) -> String {
    let mut output = format!("Evidence for {} @ {}\n", record.ticker, record.signal_date);
    if record.details.is_empty() {
        output.push_str("  (no participating sources)\n");
    }
    for detail in &record.details {
        output.push_str(&format!(
            "  {:<15} {:>10}  {}\n",
            detail.source.as_str(),
            detail.date,
            detail.description
        ));
    }
    output
}

/// End-of-run report.
#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    let mut output = header("CONFLUENCE RUN");

    if let Some(as_of) = summary.as_of {
        output.push_str(&format!("As of:                 {as_of}\n"));
    }
    output.push_str(&format!(
        "Succeeded:             {}\n",
        summary.succeeded.len().to_string().green()
    ));
    output.push_str(&format!(
        "Failed:                {}\n",
        if summary.failed.is_empty() {
            "0".normal()
        } else {
            summary.failed.len().to_string().red()
        }
    ));
    output.push_str(&format!("Skipped:               {}\n", summary.skipped.len()));
    output.push_str(&format!(
        "Source unavailable:    {}\n",
        summary.unavailable.len()
    ));
    output.push_str(&format!("Dropped events:        {}\n", summary.dropped_events));

    for (ticker, reason) in &summary.failed {
        output.push_str(&format!("  {} {ticker}: {reason}\n", "✗".red()));
    }
    if !summary.skipped.is_empty() {
        output.push_str(&format!("  skipped: {}\n", summary.skipped.join(", ")));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use confluence_core::SignalDetail;

    fn record(ticker: &str, score: f64, direction: Direction) -> ConfluenceRecord {
        let date = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        ConfluenceRecord {
            ticker: ticker.to_string(),
            score,
            direction,
            source_count: 1,
            source_scores: SignalSource::ALL
                .into_iter()
                .map(|s| (s, if s == SignalSource::Insider { score } else { 0.0 }))
                .collect(),
            details: vec![SignalDetail {
                source: SignalSource::Insider,
                description: "2 buy(s) ($1,500,000), 0 sell(s) ($0), cluster".to_string(),
                date,
            }],
            signal_date: date,
            computed_at: Utc.with_ymd_and_hms(2025, 6, 30, 22, 30, 0).unwrap(),
        }
    }

    #[test]
    fn bands_cover_the_score_range() {
        assert_eq!(ScoreBand::from_score(0.0), ScoreBand::None);
        assert_eq!(ScoreBand::from_score(0.01), ScoreBand::Weak);
        assert_eq!(ScoreBand::from_score(24.99), ScoreBand::Weak);
        assert_eq!(ScoreBand::from_score(25.0), ScoreBand::Moderate);
        assert_eq!(ScoreBand::from_score(50.0), ScoreBand::Strong);
        assert_eq!(ScoreBand::from_score(75.0), ScoreBand::VeryStrong);
        assert_eq!(ScoreBand::from_score(100.0), ScoreBand::VeryStrong);
    }

    #[test]
    fn bands_are_ordered_by_conviction() {
        let scores = [0.0, 10.0, 30.0, 60.0, 90.0];
        let bands: Vec<_> = scores.iter().map(|s| ScoreBand::from_score(*s)).collect();
        assert!(bands.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn direction_colours_are_distinct() {
        let colors = [
            direction_color(Direction::Bullish),
            direction_color(Direction::Bearish),
            direction_color(Direction::Mixed),
            direction_color(Direction::Neutral),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn ranking_table_lists_rows_in_order() {
        let records = vec![
            record("NVDA", 72.0, Direction::Bullish),
            record("GME", 41.5, Direction::Bearish),
        ];

        let table = format_ranking(&records);

        let nvda = table.find("NVDA").unwrap();
        let gme = table.find("GME").unwrap();
        assert!(nvda < gme);
        assert!(table.contains("72.00"));
        assert!(table.contains("strong"));
        assert!(table.contains("INSD"));
    }

    #[test]
    fn empty_views_say_so() {
        assert!(format_ranking(&[]).contains("No records match."));
        assert!(format_history("TSLA", &[]).contains("No data for TSLA."));
    }

    #[test]
    fn history_shows_latest_evidence() {
        let records = vec![record("PLTR", 48.0, Direction::Bullish)];

        let text = format_history("PLTR", &records);

        assert!(text.contains("Evidence for PLTR @ 2025-06-30"));
        assert!(text.contains("cluster"));
    }

    #[test]
    fn summary_lists_failures() {
        let mut summary = RunSummary {
            succeeded: vec!["AMD".to_string()],
            ..RunSummary::default()
        };
        summary
            .failed
            .insert("GME".to_string(), "failed to persist".to_string());

        let text = format_summary(&summary);

        assert!(text.contains("GME: failed to persist"));
        assert!(text.contains("Dropped events:        0"));
    }
}
