use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use skycast_db::{Database, now_timestamp};
use skycast_provider::{DateSpec, WeatherClient};
use skycast_types::location::LocationRef;

use crate::JOB_KIND_FETCH_WEATHER;

/// Payload of a deferred weather fetch. `user_id`/`location_id` are both
/// optional; history is only persisted when both are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchWeatherJob {
    pub location: LocationRef,
    pub start: DateSpec,
    pub end: DateSpec,
    pub user_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

/// Queues a fetch for immediate pickup and returns the job identifier.
/// Nothing is persisted to weather history here — that happens inside the
/// job, after the upstream fetch succeeds.
pub fn enqueue_fetch(db: &Database, job: &FetchWeatherJob) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let payload = serde_json::to_string(job)?;
    db.enqueue_job(&id.to_string(), JOB_KIND_FETCH_WEATHER, &payload, &now_timestamp())?;
    Ok(id)
}

/// Executes one queued fetch: calls the provider for the stored range and,
/// if the job carries both a user and a location, records the search plus
/// one weather query per returned day. Any error propagates to the worker,
/// which reschedules the whole job.
pub async fn run_fetch_job(
    db: &Arc<Database>,
    client: &WeatherClient,
    payload: &str,
) -> Result<()> {
    let job: FetchWeatherJob =
        serde_json::from_str(payload).context("invalid fetch_weather payload")?;

    let document = client.fetch(&job.location, Some(job.start), Some(job.end)).await?;

    if let (Some(user_id), Some(location_id)) = (job.user_id, job.location_id) {
        let db = db.clone();
        tokio::task::spawn_blocking(move || {
            // The user or location may have been deleted while the job sat
            // in the queue; that fails the attempt like any other error.
            let user = db
                .get_user_by_id(&user_id.to_string())?
                .ok_or_else(|| anyhow::anyhow!("User matching query does not exist"))?;
            let location = db
                .get_location(&location_id.to_string())?
                .ok_or_else(|| anyhow::anyhow!("Location matching query does not exist"))?;

            persist_forecast_days(&db, &user.id, &location.id, &document)
        })
        .await??;
    }

    Ok(())
}

/// Records one search-history entry and one weather query per day object in
/// the provider document. Each insert is independent — there is no batch
/// transaction, so a failure mid-loop leaves the earlier days persisted
/// (the retried job will then write duplicates).
pub fn persist_forecast_days(
    db: &Database,
    user_id: &str,
    location_id: &str,
    document: &Value,
) -> Result<usize> {
    db.create_search_history_entry(&Uuid::new_v4().to_string(), user_id, location_id)?;

    let days = document.get("days").and_then(Value::as_array).map_or(&[][..], Vec::as_slice);

    for day in days {
        let forecast_date = day
            .get("datetime")
            .and_then(Value::as_str)
            .context("day object has no datetime field")?;

        db.create_weather_query(
            &Uuid::new_v4().to_string(),
            Some(user_id),
            location_id,
            forecast_date,
            &day.to_string(),
        )?;
    }

    Ok(days.len())
}
