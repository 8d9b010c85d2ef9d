//! Core types for the smart-money confluence engine.
//!
//! This crate provides:
//! - The known signal sources and their raw event schemas
//! - Normalized per-source scores and the final confluence record
//! - The source weight table
//! - Error taxonomy and layered configuration

pub mod config;
pub mod config_loader;
pub mod config_watcher;
pub mod error;
pub mod event;
pub mod record;
pub mod score;
pub mod source;
pub mod weights;

pub use config::{
    AppConfig, ConfluenceParams, DatabaseConfig, EngineConfig, SchedulerConfig, MAX_LOOKBACK_DAYS,
};
pub use config_loader::ConfigLoader;
pub use config_watcher::ConfigWatcher;
pub use error::{ConfluenceError, ConfluenceResult};
pub use event::{
    AmountRange, CongressTrade, DarkPoolVolume, EtfTrade, EventPayload, InsiderTransaction,
    InstitutionalFiling, ShortInterestReport, SignalEvent, SuperinvestorHolding, TradeSide,
};
pub use record::{ConfluenceRecord, Direction, SignalDetail};
pub use score::{Sign, SourceScore};
pub use source::SignalSource;
pub use weights::{SourceWeightTable, DEFAULT_CONTEXT};
