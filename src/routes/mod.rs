use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::app_state::AppState;
use crate::services::pacs::PacsError;

pub mod archive_ws;
pub mod auth;
pub mod dicom;
pub mod health;
pub mod metrics;
pub mod news;

/// Client-visible error for the JSON API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("invalid verification code")]
    InvalidCode,

    #[error("email already registered")]
    EmailTaken,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Pacs(#[from] PacsError),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::InvalidCode | ApiError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::EmailTaken => StatusCode::CONFLICT,
            ApiError::NotFound(_) | ApiError::Pacs(PacsError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pacs(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "database query failed");
        ApiError::Internal
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        ApiError::Validation(report.to_string())
    }
}

/// Authenticated caller, extracted from an `Authorization: Bearer` header.
pub struct AuthUser {
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        let claims = state
            .tokens
            .decode(token)
            .map_err(|_| ApiError::Unauthorized)?;
        Ok(AuthUser { email: claims.sub })
    }
}
