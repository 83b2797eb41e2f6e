use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE locations (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                latitude    TEXT NOT NULL,
                longitude   TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- One row per fetched day. Deliberately no uniqueness constraint:
            -- repeated queries and at-least-once job retries produce duplicates.
            CREATE TABLE weather_queries (
                id              TEXT PRIMARY KEY,
                user_id         TEXT REFERENCES users(id) ON DELETE CASCADE,
                location_id     TEXT NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
                query_date      TEXT NOT NULL,
                forecast_date   TEXT NOT NULL,
                raw_data        TEXT NOT NULL
            );

            CREATE INDEX idx_weather_queries_user
                ON weather_queries(user_id, query_date);

            CREATE TABLE search_history (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                location_id TEXT NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
                search_date TEXT NOT NULL
            );

            CREATE INDEX idx_search_history_user
                ON search_history(user_id, search_date);

            CREATE TABLE jobs (
                id          TEXT PRIMARY KEY,
                kind        TEXT NOT NULL,
                payload     TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'queued',
                attempts    INTEGER NOT NULL DEFAULT 0,
                run_at      TEXT NOT NULL,
                last_error  TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_jobs_due ON jobs(status, run_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
