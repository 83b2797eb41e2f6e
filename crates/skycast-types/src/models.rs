use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A named place with fixed-precision coordinates (6 fractional digits).
/// Locations are immutable once created; deleting one cascades to the
/// weather queries and search history entries that reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
}

/// One resolved day of weather for one location, as fetched for one user.
/// `raw_data` is the provider's JSON stored verbatim for replay; duplicates
/// across repeated fetches (or job retries) are expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherQuery {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub location: Location,
    pub query_date: DateTime<Utc>,
    pub forecast_date: NaiveDate,
    pub raw_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: Uuid,
    pub user: UserSummary,
    pub location: Location,
    pub search_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}
