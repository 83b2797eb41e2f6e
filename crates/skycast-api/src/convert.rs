//! Row-to-response mapping. Stored values are parsed defensively: a corrupt
//! cell is logged and replaced with a default rather than failing the whole
//! listing.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use skycast_db::models::{LocationRow, SearchHistoryRow, WeatherQueryRow};
use skycast_types::location::LocationRef;
use skycast_types::models::{Location, SearchHistoryEntry, UserSummary, WeatherQuery};

/// Coordinate reference for the provider, from a stored location. Stored
/// coordinates feed outbound requests, so a corrupt value is an error here
/// rather than a logged default.
pub(crate) fn coordinates_ref(row: &LocationRow) -> anyhow::Result<LocationRef> {
    let lat: Decimal = row
        .latitude
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt latitude '{}': {}", row.latitude, e))?;
    let lon: Decimal = row
        .longitude
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt longitude '{}': {}", row.longitude, e))?;
    Ok(LocationRef::Coordinates { lat, lon })
}

pub(crate) fn parse_uuid(value: &str, what: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, value, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(value: &str, what: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite-generated timestamps are "YYYY-MM-DD HH:MM:SS" without a
            // timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}': {}", what, value, e);
            DateTime::default()
        })
}

pub(crate) fn parse_date(value: &str, what: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, value, e);
        NaiveDate::default()
    })
}

pub(crate) fn parse_decimal(value: &str, what: &str) -> Decimal {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, value, e);
        Decimal::default()
    })
}

pub(crate) fn location_model(row: &LocationRow) -> Location {
    Location {
        id: parse_uuid(&row.id, "location id"),
        name: row.name.clone(),
        latitude: parse_decimal(&row.latitude, "latitude"),
        longitude: parse_decimal(&row.longitude, "longitude"),
    }
}

pub(crate) fn weather_query_model(row: WeatherQueryRow) -> WeatherQuery {
    let raw_data = serde_json::from_str(&row.raw_data).unwrap_or_else(|e| {
        warn!("Corrupt raw_data on weather query '{}': {}", row.id, e);
        serde_json::Value::Null
    });

    WeatherQuery {
        id: parse_uuid(&row.id, "weather query id"),
        user_id: row.user_id.as_deref().map(|u| parse_uuid(u, "user id")),
        location: Location {
            id: parse_uuid(&row.location_id, "location id"),
            name: row.location_name,
            latitude: parse_decimal(&row.latitude, "latitude"),
            longitude: parse_decimal(&row.longitude, "longitude"),
        },
        query_date: parse_timestamp(&row.query_date, "query_date"),
        forecast_date: parse_date(&row.forecast_date, "forecast_date"),
        raw_data,
    }
}

pub(crate) fn search_history_model(row: SearchHistoryRow) -> SearchHistoryEntry {
    SearchHistoryEntry {
        id: parse_uuid(&row.id, "search history id"),
        user: UserSummary {
            id: parse_uuid(&row.user_id, "user id"),
            username: row.username,
        },
        location: Location {
            id: parse_uuid(&row.location_id, "location id"),
            name: row.location_name,
            latitude: parse_decimal(&row.latitude, "latitude"),
            longitude: parse_decimal(&row.longitude, "longitude"),
        },
        search_date: parse_timestamp(&row.search_date, "search_date"),
    }
}
