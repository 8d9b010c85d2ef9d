//! Database row models.

pub mod confluence;
pub mod signal_event;

pub use confluence::ConfluenceScoreRow;
pub use signal_event::SignalEventRow;
