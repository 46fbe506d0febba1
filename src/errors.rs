use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    HttpStatus(u16),

    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout
        } else {
            CatalogError::Network(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("record identifier must not be empty")]
    EmptyIdentifier,

    #[error("storage operation exceeded the request deadline")]
    Deadline,

    #[error("store worker is no longer running")]
    Closed,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("page {0:?} is not loaded")]
    MissingPage(String),
}

/// Handler-level error. Converted into an HTTP status plus a JSON body
/// so a failing request never takes the listener task down with it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed request body: {0}")]
    BadRequest(String),

    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] CatalogError),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("failed to persist {} record(s)", .failed.len())]
    Persist { failed: Vec<String> },

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) | ApiError::Persist { .. } | ApiError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        } else {
            tracing::warn!("request rejected: {self}");
        }

        let failed = match self {
            ApiError::Persist { ref failed } => Some(failed.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: self.to_string(),
            failed,
        };

        (status, Json(body)).into_response()
    }
}
