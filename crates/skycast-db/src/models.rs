/// Database row types — these map directly to SQLite rows.
/// Distinct from skycast-types API models to keep the DB layer independent;
/// timestamps, dates, and coordinates stay as stored TEXT and are parsed at
/// the API boundary.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct LocationRow {
    pub id: String,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

/// Weather query joined with its location (single query, no N+1).
pub struct WeatherQueryRow {
    pub id: String,
    pub user_id: Option<String>,
    pub location_id: String,
    pub location_name: String,
    pub latitude: String,
    pub longitude: String,
    pub query_date: String,
    pub forecast_date: String,
    pub raw_data: String,
}

/// Search history entry joined with user and location.
pub struct SearchHistoryRow {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub location_id: String,
    pub location_name: String,
    pub latitude: String,
    pub longitude: String,
    pub search_date: String,
}

pub struct FrequentLocationRow {
    pub location_id: String,
    pub location_name: String,
    pub search_count: i64,
}

pub struct JobRow {
    pub id: String,
    pub kind: String,
    pub payload: String,
    pub status: String,
    pub attempts: i64,
    pub run_at: String,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
