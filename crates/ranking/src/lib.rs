//! Read-only query and ranking layer over persisted confluence records.

pub mod query;
pub mod ranker;

pub use query::{rank, rank_order, RecordQuery};
pub use ranker::{Ranker, TickerStatus};
