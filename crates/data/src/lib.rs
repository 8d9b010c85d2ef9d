//! Persistence and event sources for the confluence engine.
//!
//! This crate provides:
//! - The `RecordStore` and `EventSource` seams
//! - `PostgreSQL` repositories for scores and raw events
//! - An in-memory record store and JSON-file event source

pub mod database;
pub mod event_source;
pub mod memory_store;
pub mod models;
pub mod repositories;
pub mod store;

pub use database::DatabaseClient;
pub use event_source::{parse_events, InMemoryEventSource, JsonEventSource};
pub use memory_store::InMemoryRecordStore;
pub use models::{ConfluenceScoreRow, SignalEventRow};
pub use repositories::{ConfluenceRepository, SignalEventRepository};
pub use store::{normalize_ticker, EventSource, RecordStore};
