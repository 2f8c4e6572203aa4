use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};
use ts_core::{Error, ErrorKind, Stage};

/// A stage failure rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub stage: Stage,
    pub error: Error,
}

impl ApiError {
    pub fn new(stage: Stage, error: Error) -> Self {
        Self { stage, error }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Config if self.stage == Stage::Trends => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Config => StatusCode::SERVICE_UNAVAILABLE,
            // Article sites are not providers, so their status is never passed through.
            ErrorKind::Upstream if self.stage == Stage::Extract => StatusCode::BAD_GATEWAY,
            ErrorKind::Upstream => self
                .error
                .status()
                .filter(|s| (400..=599).contains(s))
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ErrorKind::Network => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::ExtractionFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::EmptyResponse | ErrorKind::EmptyStream => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("❌ {} stage failed ({}): {}", self.stage, status.as_u16(), self.error);
        } else {
            warn!("⚠️ {} stage rejected ({}): {}", self.stage, status.as_u16(), self.error);
        }
        (status, Json(json!({ "error": self.error.to_string() }))).into_response()
    }
}
