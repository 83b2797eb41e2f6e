use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims shared between the auth handlers (token issuance) and the
/// request middleware (token validation). Canonical definition lives here
/// in skycast-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Locations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateLocationRequest {
    pub name: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
}

// -- Search history --

/// One row of the frequent-locations aggregate: how many times the caller
/// searched for a given location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequentLocation {
    pub location_id: Uuid,
    pub location_name: String,
    pub search_count: i64,
}

// -- Deferred fetches --

/// Returned with 202 when a long-range forecast is handed to the job
/// runner instead of fetched synchronously.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskAccepted {
    pub task_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TaskStatus {
    pub task_id: Uuid,
    pub status: String,
    pub attempts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
