use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use skycast_db::models::LocationRow;
use skycast_jobs::fetch::{FetchWeatherJob, enqueue_fetch, persist_forecast_days};
use skycast_provider::DateSpec;
use skycast_types::api::{Claims, TaskAccepted, TaskStatus};
use skycast_types::location::LocationRef;
use skycast_types::models::WeatherQuery;

use crate::auth::AppState;
use crate::convert::{coordinates_ref, weather_query_model};
use crate::error::{ApiError, run_blocking};

#[derive(Debug, Deserialize)]
pub struct CurrentQuery {
    pub location_id: Option<Uuid>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub location_id: Option<Uuid>,
    pub address: Option<String>,
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub location_id: Option<Uuid>,
    pub date: Option<String>,
}

/// Ranges past three days are handed to the job runner instead of being
/// fetched inside the request.
fn is_long_range(days: i64) -> bool {
    days > 3
}

/// GET /weather — the caller's ten most recent weather queries, newest first.
pub async fn list_weather_queries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let user_id = claims.sub.to_string();
    let rows = run_blocking(move || db.list_recent_weather_queries(&user_id, 10)).await?;

    let queries: Vec<WeatherQuery> = rows.into_iter().map(weather_query_model).collect();
    Ok(Json(queries))
}

/// GET /weather/current — current conditions for a stored location or a
/// free-text address.
pub async fn current(
    State(state): State<AppState>,
    Query(q): Query<CurrentQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let (location, location_ref) = resolve_location(&state, q.location_id, q.address).await?;

    let document = state.weather.fetch_current(&location_ref).await?;

    // Only a stored location gets history rows; an ad-hoc address fetch
    // leaves no trace.
    let document = match location {
        Some(row) => {
            let db = state.db.clone();
            let user_id = claims.sub.to_string();
            let today = Utc::now().date_naive().to_string();
            run_blocking(move || {
                db.create_search_history_entry(&Uuid::new_v4().to_string(), &user_id, &row.id)?;
                db.create_weather_query(
                    &Uuid::new_v4().to_string(),
                    Some(&user_id),
                    &row.id,
                    &today,
                    &document.to_string(),
                )?;
                Ok(document)
            })
            .await?
        }
        None => document,
    };

    Ok(Json(document))
}

/// GET /weather/forecast — up to `days` days ahead. Short ranges are
/// fetched inline and persisted per day; long ranges return 202 with a job
/// identifier, and nothing is persisted until the job runs.
pub async fn forecast(
    State(state): State<AppState>,
    Query(q): Query<ForecastQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let (location, location_ref) = resolve_location(&state, q.location_id, q.address).await?;

    let end = Utc::now().date_naive() + chrono::Duration::days(q.days);

    if is_long_range(q.days) {
        let location_id = location
            .as_ref()
            .map(|row| row.id.parse::<Uuid>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("corrupt location id: {}", e))?;

        let job = FetchWeatherJob {
            location: location_ref,
            start: DateSpec::Today,
            end: DateSpec::On(end),
            user_id: Some(claims.sub),
            location_id,
        };

        let db = state.db.clone();
        let task_id = run_blocking(move || enqueue_fetch(&db, &job)).await?;

        return Ok((StatusCode::ACCEPTED, Json(TaskAccepted { task_id })).into_response());
    }

    let document = state
        .weather
        .fetch(&location_ref, Some(DateSpec::Today), Some(DateSpec::On(end)))
        .await?;

    let document = match location {
        Some(row) => {
            let db = state.db.clone();
            let user_id = claims.sub.to_string();
            run_blocking(move || {
                persist_forecast_days(&db, &user_id, &row.id, &document)?;
                Ok(document)
            })
            .await?
        }
        None => document,
    };

    Ok(Json(document).into_response())
}

/// GET /weather/history — one historical day for a stored location. Both
/// parameters are required, and the fetch is always recorded.
pub async fn history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(location_id), Some(date)) = (q.location_id, q.date) else {
        return Err(ApiError::BadRequest(
            "Both location_id and date must be provided".into(),
        ));
    };

    // A malformed date is past parameter validation: it fails like any
    // other downstream error rather than as a 400.
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date '{}': {}", date, e))?;

    let (location, location_ref) = resolve_location(&state, Some(location_id), None).await?;
    let row = location.ok_or_else(|| anyhow::anyhow!("location resolution failed"))?;

    let document = state.weather.fetch_historical(&location_ref, date).await?;

    let db = state.db.clone();
    let user_id = claims.sub.to_string();
    let forecast_date = date.to_string();
    let document = run_blocking(move || {
        db.create_search_history_entry(&Uuid::new_v4().to_string(), &user_id, &row.id)?;
        db.create_weather_query(
            &Uuid::new_v4().to_string(),
            Some(&user_id),
            &row.id,
            &forecast_date,
            &document.to_string(),
        )?;
        Ok(document)
    })
    .await?;

    Ok(Json(document))
}

/// GET /weather/tasks/{id} — poll a deferred fetch.
pub async fn task_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let job = run_blocking(move || db.get_job(&id.to_string()))
        .await?
        .ok_or_else(|| ApiError::NotFound("task not found".into()))?;

    Ok(Json(TaskStatus {
        task_id: id,
        status: job.status,
        attempts: job.attempts,
        error: job.last_error,
    }))
}

/// Resolves the polymorphic location input. A `location_id` must reference
/// a stored location — a miss surfaces as the generic server error, not a
/// 404. A bare address queries the provider with no persisted location
/// attached. Neither is a user error.
async fn resolve_location(
    state: &AppState,
    location_id: Option<Uuid>,
    address: Option<String>,
) -> Result<(Option<LocationRow>, LocationRef), ApiError> {
    if let Some(id) = location_id {
        let db = state.db.clone();
        let row = run_blocking(move || db.get_location(&id.to_string()))
            .await?
            .ok_or_else(|| anyhow::anyhow!("Location matching query does not exist"))?;

        let location_ref = coordinates_ref(&row)?;
        Ok((Some(row), location_ref))
    } else if let Some(address) = address {
        Ok((None, LocationRef::Address(address)))
    } else {
        Err(ApiError::BadRequest(
            "Either location_id or address must be provided".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_days_stay_synchronous() {
        assert!(!is_long_range(3));
        assert!(is_long_range(4));
    }

    #[test]
    fn days_defaults_to_seven() {
        let q: ForecastQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.days, 7);
        assert!(q.location_id.is_none());
        assert!(q.address.is_none());
    }

    #[test]
    fn history_requires_both_params() {
        let q: HistoryQuery = serde_json::from_str(r#"{"date":"2026-08-06"}"#).unwrap();
        assert!(q.location_id.is_none());
        assert_eq!(q.date.as_deref(), Some("2026-08-06"));
    }
}
