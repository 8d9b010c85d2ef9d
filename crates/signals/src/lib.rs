//! Scoring core: per-source normalizers, confluence aggregation, direction
//! resolution and record building.

pub mod aggregator;
pub mod common;
pub mod direction;
pub mod engine;
pub mod normalizer;
pub mod window;

pub use aggregator::{Aggregate, ConfluenceAggregator};
pub use direction::resolve_direction;
pub use engine::{build_record, round2, ComputedRecord, ConfluenceEngine};
pub use normalizer::{normalize, normalize_all, normalize_counted, saturate, NormalizedSources};
pub use window::LookbackWindow;
