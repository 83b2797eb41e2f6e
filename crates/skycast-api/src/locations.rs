use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use skycast_types::api::{Claims, CreateLocationRequest};
use skycast_types::models::Location;

use crate::auth::AppState;
use crate::convert::location_model;
use crate::error::{ApiError, run_blocking};

/// Largest magnitude that fits the 9-digit / 6-fractional coordinate format.
const COORDINATE_MAX: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 6);

pub async fn list_locations(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let rows = run_blocking(move || db.list_locations()).await?;

    let locations: Vec<Location> = rows.iter().map(location_model).collect();
    Ok(Json(locations))
}

pub async fn create_location(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }

    // Coordinates are normalized to 6 fractional digits (9 digits total) so
    // stored values compare exactly.
    let latitude = normalize_coordinate(req.latitude, "latitude")?;
    let longitude = normalize_coordinate(req.longitude, "longitude")?;

    let id = Uuid::new_v4();

    let db = state.db.clone();
    let name = req.name.clone();
    let (lat, lon) = (latitude.to_string(), longitude.to_string());
    run_blocking(move || db.create_location(&id.to_string(), &name, &lat, &lon)).await?;

    Ok((
        StatusCode::CREATED,
        Json(Location {
            id,
            name: req.name,
            latitude,
            longitude,
        }),
    ))
}

pub async fn get_location(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let row = run_blocking(move || db.get_location(&id.to_string()))
        .await?
        .ok_or_else(|| ApiError::NotFound("location not found".into()))?;

    Ok(Json(location_model(&row)))
}

pub async fn delete_location(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let deleted = run_blocking(move || db.delete_location(&id.to_string())).await?;

    if !deleted {
        return Err(ApiError::NotFound("location not found".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn normalize_coordinate(value: Decimal, what: &str) -> Result<Decimal, ApiError> {
    let mut rounded = value.round_dp(6);
    if rounded.abs() > COORDINATE_MAX {
        return Err(ApiError::BadRequest(format!(
            "{what} must fit 9 digits with 6 decimal places"
        )));
    }
    rounded.rescale(6);
    Ok(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn coordinates_rescale_to_six_fractional_digits() {
        let v = Decimal::from_str("50.45010049").unwrap();
        assert_eq!(normalize_coordinate(v, "latitude").unwrap().to_string(), "50.450100");

        let short = Decimal::from_str("50.45").unwrap();
        assert_eq!(normalize_coordinate(short, "latitude").unwrap().to_string(), "50.450000");
    }

    #[test]
    fn oversized_coordinates_are_rejected() {
        let v = Decimal::from_str("1000.0").unwrap();
        assert!(normalize_coordinate(v, "latitude").is_err());

        let edge = Decimal::from_str("999.999999").unwrap();
        assert!(normalize_coordinate(edge, "latitude").is_ok());
    }
}
