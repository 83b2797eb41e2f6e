//! Asynchronous fetch runner for long-range forecast requests.
//!
//! Jobs are queued in the database and executed by a polling worker.
//! Delivery is at-least-once: a job that fails anywhere (fetch or
//! persistence) is retried whole after a fixed delay, so duplicate
//! weather-query rows are possible and readers must tolerate them.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchWeatherJob, enqueue_fetch};
pub use worker::{JobRunner, WorkerConfig};

pub const JOB_KIND_FETCH_WEATHER: &str = "fetch_weather";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Fixed delay before a failed job is re-attempted, applied uniformly
/// regardless of what failed.
pub const RETRY_DELAY_SECS: i64 = 60;

pub const DEFAULT_MAX_ATTEMPTS: i64 = 3;
