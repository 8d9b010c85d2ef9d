//! PostgreSQL repositories.
//!
//! Each repository provides typed access to one table.

pub mod confluence_repo;
pub mod signal_event_repo;

pub use confluence_repo::ConfluenceRepository;
pub use signal_event_repo::SignalEventRepository;
