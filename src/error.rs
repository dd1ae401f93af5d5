use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::ProviderKind;

/// Application-level errors
///
/// Provider clients return the provider-scoped variants; the aggregator decides
/// whether to fall through to the next provider by matching on them.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0} has no API key configured")]
    ProviderUnavailable(ProviderKind),

    #[error("{0} rejected the API key")]
    Auth(ProviderKind),

    #[error("{0} rate limit exceeded")]
    RateLimited(ProviderKind),

    #[error("{0} request timed out")]
    Timeout(ProviderKind),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Malformed {provider} response: {reason}")]
    MalformedResponse {
        provider: ProviderKind,
        reason: String,
    },

    #[error("{provider} returned HTTP {status}")]
    Upstream { provider: ProviderKind, status: u16 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("All providers failed for {0}")]
    AllProvidersFailed(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn malformed(provider: ProviderKind, reason: impl Into<String>) -> Self {
        AppError::MalformedResponse {
            provider,
            reason: reason.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) | AppError::AllProvidersFailed(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            AppError::ProviderUnavailable(_)
            | AppError::Auth(_)
            | AppError::RateLimited(_)
            | AppError::MalformedResponse { .. }
            | AppError::Upstream { .. }
            | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_providers_failed_maps_to_not_found() {
        let response = AppError::AllProvidersFailed("tt0000001".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_provider_errors_map_to_bad_gateway() {
        for err in [
            AppError::Auth(ProviderKind::Tmdb),
            AppError::RateLimited(ProviderKind::Omdb),
            AppError::malformed(ProviderKind::Imdb, "missing results"),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
        }
    }

    #[test]
    fn test_timeout_maps_to_gateway_timeout() {
        let response = AppError::Timeout(ProviderKind::Tmdb).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_error_messages_name_the_provider() {
        assert_eq!(
            AppError::Auth(ProviderKind::Omdb).to_string(),
            "omdb rejected the API key"
        );
        assert_eq!(
            AppError::malformed(ProviderKind::Tmdb, "bad json").to_string(),
            "Malformed tmdb response: bad json"
        );
    }
}
