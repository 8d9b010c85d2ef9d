use confluence_core::{ConfluenceRecord, Direction, SignalSource};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Filters and pagination for ranked views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordQuery {
    pub min_score: Option<f64>,
    pub direction: Option<Direction>,
    /// Only records where this source participated.
    pub source: Option<SignalSource>,
    /// Case-insensitive exact ticker match.
    pub ticker: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl RecordQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    #[must_use]
    pub fn source(mut self, source: SignalSource) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Returns true if the record passes every filter.
    #[must_use]
    pub fn matches(&self, record: &ConfluenceRecord) -> bool {
        self.min_score.map_or(true, |min| record.score >= min)
            && self.direction.map_or(true, |d| record.direction == d)
            && self.source.map_or(true, |s| record.has_source(s))
            && self
                .ticker
                .as_deref()
                .map_or(true, |t| record.ticker.eq_ignore_ascii_case(t.trim()))
    }
}

/// Ranking order: score descending, then ticker ascending.
#[must_use]
pub fn rank_order(a: &ConfluenceRecord, b: &ConfluenceRecord) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.ticker.cmp(&b.ticker))
}

/// Filters, sorts and paginates records.
#[must_use]
pub fn rank(records: Vec<ConfluenceRecord>, query: &RecordQuery) -> Vec<ConfluenceRecord> {
    let mut matched: Vec<ConfluenceRecord> =
        records.into_iter().filter(|r| query.matches(r)).collect();
    matched.sort_by(rank_order);

    matched
        .into_iter()
        .skip(query.offset)
        .take(query.limit.unwrap_or(usize::MAX))
        .collect()
}
