use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use table_engine::TableError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("{0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("refresh failed: {0}")]
    Refresh(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownEntity(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidQuery(_) | ApiError::Table(_) => StatusCode::BAD_REQUEST,
            ApiError::Refresh(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
