use crate::models::JobRow;
use crate::queries::OptionalExt;
use crate::{Database, now_timestamp};
use anyhow::Result;
use rusqlite::Connection;

/// Job queue operations. The queue lives in the same SQLite file as the
/// domain tables; claiming runs under the connection mutex, so a job is
/// handed to at most one worker at a time. Delivery is at-least-once: a job
/// that fails mid-persistence is rescheduled whole.
impl Database {
    pub fn enqueue_job(&self, id: &str, kind: &str, payload: &str, run_at: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let now = now_timestamp();
            conn.execute(
                "INSERT INTO jobs (id, kind, payload, status, attempts, run_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'queued', 0, ?4, ?5, ?5)",
                (id, kind, payload, run_at, now),
            )?;
            Ok(())
        })
    }

    /// Picks the oldest due queued job and marks it running.
    pub fn claim_due_job(&self, now: &str) -> Result<Option<JobRow>> {
        self.with_conn_mut(|conn| {
            let job = {
                let mut stmt = conn.prepare(
                    "SELECT id, kind, payload, status, attempts, run_at, last_error, created_at, updated_at
                     FROM jobs
                     WHERE status = 'queued' AND run_at <= ?1
                     ORDER BY run_at
                     LIMIT 1",
                )?;
                stmt.query_row([now], job_from_row).optional()?
            };

            let Some(mut job) = job else {
                return Ok(None);
            };

            conn.execute(
                "UPDATE jobs SET status = 'running', updated_at = ?2 WHERE id = ?1",
                (&job.id, now_timestamp()),
            )?;
            job.status = "running".into();

            Ok(Some(job))
        })
    }

    pub fn complete_job(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE jobs SET status = 'completed', updated_at = ?2 WHERE id = ?1",
                (id, now_timestamp()),
            )?;
            Ok(())
        })
    }

    /// Puts a failed job back in the queue for a later attempt.
    pub fn reschedule_job(&self, id: &str, run_at: &str, error: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE jobs
                 SET status = 'queued', attempts = attempts + 1, run_at = ?2,
                     last_error = ?3, updated_at = ?4
                 WHERE id = ?1",
                (id, run_at, error, now_timestamp()),
            )?;
            Ok(())
        })
    }

    /// Terminal failure — the job stays in the table for inspection.
    pub fn fail_job(&self, id: &str, error: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE jobs
                 SET status = 'failed', attempts = attempts + 1, last_error = ?2, updated_at = ?3
                 WHERE id = ?1",
                (id, error, now_timestamp()),
            )?;
            Ok(())
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| query_job(conn, id))
    }
}

fn query_job(conn: &Connection, id: &str) -> Result<Option<JobRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, payload, status, attempts, run_at, last_error, created_at, updated_at
         FROM jobs WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], job_from_row).optional()?;
    Ok(row)
}

fn job_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<JobRow, rusqlite::Error> {
    Ok(JobRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        run_at: row.get(5)?,
        last_error: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn claim_returns_due_jobs_oldest_first() {
        let db = test_db();

        let early = Uuid::new_v4().to_string();
        let late = Uuid::new_v4().to_string();
        db.enqueue_job(&late, "fetch_weather", "{}", "2026-01-01T00:00:01.000000Z").unwrap();
        db.enqueue_job(&early, "fetch_weather", "{}", "2026-01-01T00:00:00.000000Z").unwrap();

        let job = db.claim_due_job("2026-01-01T00:00:05.000000Z").unwrap().unwrap();
        assert_eq!(job.id, early);
        assert_eq!(job.status, "running");

        // A claimed job is not handed out twice.
        let job = db.claim_due_job("2026-01-01T00:00:05.000000Z").unwrap().unwrap();
        assert_eq!(job.id, late);
        assert!(db.claim_due_job("2026-01-01T00:00:05.000000Z").unwrap().is_none());
    }

    #[test]
    fn claim_skips_jobs_not_yet_due() {
        let db = test_db();

        let id = Uuid::new_v4().to_string();
        db.enqueue_job(&id, "fetch_weather", "{}", "2026-01-01T00:01:00.000000Z").unwrap();

        assert!(db.claim_due_job("2026-01-01T00:00:59.000000Z").unwrap().is_none());
        assert!(db.claim_due_job("2026-01-01T00:01:00.000000Z").unwrap().is_some());
    }

    #[test]
    fn reschedule_increments_attempts_and_requeues() {
        let db = test_db();

        let id = Uuid::new_v4().to_string();
        db.enqueue_job(&id, "fetch_weather", "{}", "2026-01-01T00:00:00.000000Z").unwrap();
        db.claim_due_job("2026-01-01T00:00:01.000000Z").unwrap().unwrap();

        db.reschedule_job(&id, "2026-01-01T00:01:01.000000Z", "provider unreachable").unwrap();

        let job = db.get_job(&id).unwrap().unwrap();
        assert_eq!(job.status, "queued");
        assert_eq!(job.attempts, 1);
        assert_eq!(job.last_error.as_deref(), Some("provider unreachable"));

        // Not claimable until the retry delay has elapsed.
        assert!(db.claim_due_job("2026-01-01T00:00:30.000000Z").unwrap().is_none());
        assert!(db.claim_due_job("2026-01-01T00:01:01.000000Z").unwrap().is_some());
    }

    #[test]
    fn complete_and_fail_are_terminal() {
        let db = test_db();

        let done = Uuid::new_v4().to_string();
        db.enqueue_job(&done, "fetch_weather", "{}", "2026-01-01T00:00:00.000000Z").unwrap();
        db.claim_due_job("2026-01-01T00:00:01.000000Z").unwrap().unwrap();
        db.complete_job(&done).unwrap();
        assert_eq!(db.get_job(&done).unwrap().unwrap().status, "completed");

        let broken = Uuid::new_v4().to_string();
        db.enqueue_job(&broken, "fetch_weather", "{}", "2026-01-01T00:00:00.000000Z").unwrap();
        db.claim_due_job("2026-01-01T00:00:01.000000Z").unwrap().unwrap();
        db.fail_job(&broken, "gave up").unwrap();

        let job = db.get_job(&broken).unwrap().unwrap();
        assert_eq!(job.status, "failed");
        assert_eq!(job.attempts, 1);

        assert!(db.claim_due_job("2026-01-01T00:00:10.000000Z").unwrap().is_none());
    }
}
