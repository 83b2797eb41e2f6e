use axum::{Extension, Json, extract::State, response::IntoResponse};

use skycast_types::api::{Claims, FrequentLocation};
use skycast_types::models::SearchHistoryEntry;

use crate::auth::AppState;
use crate::convert::{parse_uuid, search_history_model};
use crate::error::{ApiError, run_blocking};

const FREQUENT_LOCATIONS_LIMIT: u32 = 5;

/// GET /search-history — the caller's searches, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let user_id = claims.sub.to_string();
    let rows = run_blocking(move || db.list_search_history(&user_id)).await?;

    let entries: Vec<SearchHistoryEntry> = rows.into_iter().map(search_history_model).collect();
    Ok(Json(entries))
}

/// GET /search-history/frequent_locations — the caller's five most searched
/// locations, count descending.
pub async fn frequent_locations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let user_id = claims.sub.to_string();
    let rows =
        run_blocking(move || db.frequent_locations(&user_id, FREQUENT_LOCATIONS_LIMIT)).await?;

    let locations: Vec<FrequentLocation> = rows
        .into_iter()
        .map(|row| FrequentLocation {
            location_id: parse_uuid(&row.location_id, "location id"),
            location_name: row.location_name,
            search_count: row.search_count,
        })
        .collect();

    Ok(Json(locations))
}
