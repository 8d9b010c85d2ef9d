//! Confluence score repository.
//!
//! Upserts records by (ticker, signal_date) and serves the latest-per-ticker
//! and time-series reads used by the ranking layer.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use confluence_core::ConfluenceRecord;
use sqlx::PgPool;

use crate::models::ConfluenceScoreRow;
use crate::store::{normalize_ticker, RecordStore};

const COLUMNS: &str = "ticker, signal_date, score, direction, source_count, \
     congress_score, ark_score, darkpool_score, institutional_score, insider_score, \
     short_interest_score, superinvestor_score, details, computed_at";

/// Repository for the `confluence_scores` table.
#[derive(Debug, Clone)]
pub struct ConfluenceRepository {
    pool: PgPool,
}

impl ConfluenceRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, sql: &str, ticker: Option<&str>, range: Option<(NaiveDate, NaiveDate)>) -> Result<Vec<ConfluenceRecord>> {
        let mut query = sqlx::query_as::<_, ConfluenceScoreRow>(sql);
        if let Some(ticker) = ticker {
            query = query.bind(normalize_ticker(ticker));
        }
        if let Some((start, end)) = range {
            query = query.bind(start).bind(end);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ConfluenceScoreRow::into_record)
            .collect()
    }
}

fn upsert_query(
    row: &ConfluenceScoreRow,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r"
        INSERT INTO confluence_scores
            (ticker, signal_date, score, direction, source_count,
             congress_score, ark_score, darkpool_score, institutional_score,
             insider_score, short_interest_score, superinvestor_score,
             details, computed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (ticker, signal_date) DO UPDATE SET
            score = EXCLUDED.score,
            direction = EXCLUDED.direction,
            source_count = EXCLUDED.source_count,
            congress_score = EXCLUDED.congress_score,
            ark_score = EXCLUDED.ark_score,
            darkpool_score = EXCLUDED.darkpool_score,
            institutional_score = EXCLUDED.institutional_score,
            insider_score = EXCLUDED.insider_score,
            short_interest_score = EXCLUDED.short_interest_score,
            superinvestor_score = EXCLUDED.superinvestor_score,
            details = EXCLUDED.details,
            computed_at = EXCLUDED.computed_at
        ",
    )
    .bind(&row.ticker)
    .bind(row.signal_date)
    .bind(row.score)
    .bind(&row.direction)
    .bind(row.source_count)
    .bind(row.congress_score)
    .bind(row.ark_score)
    .bind(row.darkpool_score)
    .bind(row.institutional_score)
    .bind(row.insider_score)
    .bind(row.short_interest_score)
    .bind(row.superinvestor_score)
    .bind(&row.details)
    .bind(row.computed_at)
}

#[async_trait]
impl RecordStore for ConfluenceRepository {
    async fn upsert(&self, record: &ConfluenceRecord) -> Result<()> {
        let mut row = ConfluenceScoreRow::from_record(record)?;
        row.ticker = normalize_ticker(&row.ticker);
        upsert_query(&row).execute(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, ticker: &str, signal_date: NaiveDate) -> Result<Option<ConfluenceRecord>> {
        let row = sqlx::query_as::<_, ConfluenceScoreRow>(&format!(
            "SELECT {COLUMNS} FROM confluence_scores WHERE ticker = $1 AND signal_date = $2"
        ))
        .bind(normalize_ticker(ticker))
        .bind(signal_date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ConfluenceScoreRow::into_record).transpose()
    }

    async fn latest(&self, ticker: &str) -> Result<Option<ConfluenceRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM confluence_scores WHERE ticker = $1 \
             ORDER BY signal_date DESC LIMIT 1"
        );
        Ok(self.fetch(&sql, Some(ticker), None).await?.into_iter().next())
    }

    async fn latest_all(&self) -> Result<Vec<ConfluenceRecord>> {
        let sql = format!(
            "SELECT DISTINCT ON (ticker) {COLUMNS} FROM confluence_scores \
             ORDER BY ticker ASC, signal_date DESC"
        );
        self.fetch(&sql, None, None).await
    }

    async fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ConfluenceRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM confluence_scores \
             WHERE ticker = $1 AND signal_date >= $2 AND signal_date <= $3 \
             ORDER BY signal_date ASC"
        );
        self.fetch(&sql, Some(ticker), Some((start, end))).await
    }
}
