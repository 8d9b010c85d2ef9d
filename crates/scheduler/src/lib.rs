//! Batch runs of the confluence engine over a ticker universe, on demand or
//! on a cron schedule.

pub mod runner;
pub mod scheduler;

pub use runner::{BatchRunner, RunSummary, RunnerSettings};
pub use scheduler::ConfluenceScheduler;
