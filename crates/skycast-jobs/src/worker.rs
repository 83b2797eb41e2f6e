use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use tracing::{error, info, warn};

use skycast_db::{Database, models::JobRow, now_timestamp};
use skycast_provider::WeatherClient;

use crate::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, JOB_KIND_FETCH_WEATHER, RETRY_DELAY_SECS, fetch};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Polling interval when the queue is empty.
    pub poll_interval_ms: u64,
    /// Fixed delay between attempts of a failed job.
    pub retry_delay_secs: i64,
    /// Attempts before a job is marked failed for good.
    pub max_attempts: i64,
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            retry_delay_secs: RETRY_DELAY_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `JOB_WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `JOB_POLL_INTERVAL_MS` | `500` | Polling interval when queue is empty |
    /// | `JOB_MAX_ATTEMPTS` | `3` | Attempts before a job is marked failed |
    pub fn from_env() -> Self {
        let enabled = std::env::var("JOB_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let poll_interval_ms = std::env::var("JOB_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        let max_attempts = std::env::var("JOB_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
            .max(1);

        Self {
            poll_interval_ms,
            max_attempts,
            enabled,
            ..Self::default()
        }
    }
}

/// Polls the queue and executes due jobs, one at a time. Runs for the
/// lifetime of the process; there is no cancellation of an in-flight job.
pub struct JobRunner {
    db: Arc<Database>,
    client: WeatherClient,
    config: WorkerConfig,
}

impl JobRunner {
    pub fn new(db: Arc<Database>, client: WeatherClient, config: WorkerConfig) -> Self {
        Self { db, client, config }
    }

    pub async fn run(self) {
        if !self.config.enabled {
            info!("Job runner disabled, not starting");
            return;
        }

        info!(
            "Job runner started (poll every {} ms, max {} attempts)",
            self.config.poll_interval_ms, self.config.max_attempts
        );

        let mut interval = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));

        loop {
            interval.tick().await;

            // Drain everything due before going back to sleep.
            loop {
                match self.step().await {
                    Ok(true) => continue,
                    Ok(false) => break,
                    Err(e) => {
                        warn!("Job runner error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    /// Claims and runs one due job. Returns false when the queue is empty.
    async fn step(&self) -> anyhow::Result<bool> {
        let Some(job) = self.db.claim_due_job(&now_timestamp())? else {
            return Ok(false);
        };

        info!("Job {} started ({}, attempt {})", job.id, job.kind, job.attempts + 1);

        match self.execute(&job).await {
            Ok(()) => {
                self.db.complete_job(&job.id)?;
                info!("Job {} completed", job.id);
            }
            Err(e) => {
                // The whole job retries after a fixed delay, whatever failed.
                if job.attempts + 1 >= self.config.max_attempts {
                    self.db.fail_job(&job.id, &e.to_string())?;
                    error!("Job {} failed after {} attempts: {}", job.id, job.attempts + 1, e);
                } else {
                    let run_at = (Utc::now() + chrono::Duration::seconds(self.config.retry_delay_secs))
                        .to_rfc3339_opts(SecondsFormat::Micros, true);
                    self.db.reschedule_job(&job.id, &run_at, &e.to_string())?;
                    warn!(
                        "Job {} failed (attempt {}), retrying in {} s: {}",
                        job.id,
                        job.attempts + 1,
                        self.config.retry_delay_secs,
                        e
                    );
                }
            }
        }

        Ok(true)
    }

    async fn execute(&self, job: &JobRow) -> anyhow::Result<()> {
        match job.kind.as_str() {
            JOB_KIND_FETCH_WEATHER => fetch::run_fetch_job(&self.db, &self.client, &job.payload).await,
            other => anyhow::bail!("unknown job kind: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(config: WorkerConfig) -> JobRunner {
        JobRunner::new(
            Arc::new(Database::open_in_memory().unwrap()),
            WeatherClient::new("https://example.test/timeline", "KEY"),
            config,
        )
    }

    #[tokio::test]
    async fn unknown_job_kind_fails_and_reschedules() {
        let runner = runner(WorkerConfig::default());
        runner
            .db
            .enqueue_job("job-1", "resize_image", "{}", "2020-01-01T00:00:00.000000Z")
            .unwrap();

        assert!(runner.step().await.unwrap());

        let job = runner.db.get_job("job-1").unwrap().unwrap();
        assert_eq!(job.status, "queued");
        assert_eq!(job.attempts, 1);
        assert!(job.last_error.unwrap().contains("unknown job kind"));
    }

    #[tokio::test]
    async fn job_is_marked_failed_after_max_attempts() {
        let runner = runner(WorkerConfig {
            max_attempts: 1,
            ..WorkerConfig::default()
        });
        runner
            .db
            .enqueue_job("job-1", "resize_image", "{}", "2020-01-01T00:00:00.000000Z")
            .unwrap();

        assert!(runner.step().await.unwrap());

        let job = runner.db.get_job("job-1").unwrap().unwrap();
        assert_eq!(job.status, "failed");
        assert_eq!(job.attempts, 1);
    }

    #[tokio::test]
    async fn step_reports_an_empty_queue() {
        let runner = runner(WorkerConfig::default());
        assert!(!runner.step().await.unwrap());
    }
}
