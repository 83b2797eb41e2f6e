use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Errors surfaced by the HTTP handlers. Every variant renders as
/// `{"error": "<message>"}`; the message is the raw error text.
///
/// Failures past parameter validation — location lookup during a weather
/// request, the upstream provider, store writes — all collapse into the
/// single `Internal` variant and one generic status code. Splitting them
/// into distinct statuses would change observable behavior, so the split
/// stays a local change here if it is ever wanted.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<skycast_provider::ProviderError> for ApiError {
    fn from(e: skycast_provider::ProviderError) -> Self {
        ApiError::Internal(e.into())
    }
}

/// Run blocking database work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("internal task failure"))
        })?
        .map_err(ApiError::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_variants() {
        assert_eq!(
            ApiError::BadRequest("missing".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound("nope".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn provider_errors_collapse_into_internal() {
        // reqwest and axum share the same http::StatusCode type.
        let e = skycast_provider::ProviderError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "quota exceeded".into(),
        };
        let api: ApiError = e.into();
        assert_eq!(api.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
