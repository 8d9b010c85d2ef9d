use anyhow::{Context, Result};
use confluence_core::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::repositories::{ConfluenceRepository, SignalEventRepository};

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS confluence_scores (
        ticker                TEXT             NOT NULL,
        signal_date           DATE             NOT NULL,
        score                 DOUBLE PRECISION NOT NULL,
        direction             TEXT             NOT NULL,
        source_count          INTEGER          NOT NULL,
        congress_score        DOUBLE PRECISION NOT NULL DEFAULT 0,
        ark_score             DOUBLE PRECISION NOT NULL DEFAULT 0,
        darkpool_score        DOUBLE PRECISION NOT NULL DEFAULT 0,
        institutional_score   DOUBLE PRECISION NOT NULL DEFAULT 0,
        insider_score         DOUBLE PRECISION NOT NULL DEFAULT 0,
        short_interest_score  DOUBLE PRECISION NOT NULL DEFAULT 0,
        superinvestor_score   DOUBLE PRECISION NOT NULL DEFAULT 0,
        details               JSONB            NOT NULL DEFAULT '[]'::jsonb,
        computed_at           TIMESTAMPTZ      NOT NULL,
        PRIMARY KEY (ticker, signal_date)
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_confluence_scores_date_score
        ON confluence_scores (signal_date DESC, score DESC)
    ",
    r"
    CREATE TABLE IF NOT EXISTS signal_events (
        id          BIGSERIAL   PRIMARY KEY,
        ticker      TEXT        NOT NULL,
        event_date  DATE        NOT NULL,
        source      TEXT        NOT NULL,
        payload     JSONB       NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_signal_events_ticker_date
        ON signal_events (ticker, event_date)
    ",
];

/// Connection pool plus the repositories built on it.
#[derive(Debug, Clone)]
pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Connects to `PostgreSQL` with the configured pool size.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .with_context(|| "Failed to connect to database")?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the tables and indexes if they do not exist.
    ///
    /// # Errors
    /// Returns an error if any DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema ready");
        Ok(())
    }

    #[must_use]
    pub fn records(&self) -> ConfluenceRepository {
        ConfluenceRepository::new(self.pool.clone())
    }

    #[must_use]
    pub fn events(&self) -> SignalEventRepository {
        SignalEventRepository::new(self.pool.clone())
    }
}
