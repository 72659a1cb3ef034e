//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use cstudio_models::{MediaError, SlotTransitionError};
use cstudio_workflow::WorkflowError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timeout: {0}")]
    Timeout(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(msg) => ApiError::Validation(msg),
            WorkflowError::Media(e) => e.into(),
            WorkflowError::Slot(e) => e.into(),
            WorkflowError::PollTimeout { .. } => ApiError::Timeout(err.to_string()),
            WorkflowError::Cancelled => ApiError::Conflict(err.to_string()),
            WorkflowError::Provider(_)
            | WorkflowError::AnalysisFailed { .. }
            | WorkflowError::InvalidResponse(_)
            | WorkflowError::MissingVideoUri
            | WorkflowError::OperationFailed(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<SlotTransitionError> for ApiError {
    fn from(err: SlotTransitionError) -> Self {
        match err {
            SlotTransitionError::UnknownSlot(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::Conflict(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        (self.status_code(), Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cstudio_models::SlotId;

    #[test]
    fn test_workflow_error_status() {
        let cases = [
            (WorkflowError::validation("x"), StatusCode::BAD_REQUEST),
            (WorkflowError::MissingVideoUri, StatusCode::BAD_GATEWAY),
            (
                WorkflowError::PollTimeout {
                    attempts: 120,
                    elapsed_secs: 600,
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                WorkflowError::Slot(SlotTransitionError::UnknownSlot(SlotId::new("gen-9"))),
                StatusCode::NOT_FOUND,
            ),
            (
                WorkflowError::Slot(SlotTransitionError::StillPending(SlotId::new("gen-0"))),
                StatusCode::CONFLICT,
            ),
            (WorkflowError::Media(MediaError::Empty), StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_response_uses_error_status() {
        let response = ApiError::conflict("Batch generation is running").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let err = ApiError::from(WorkflowError::AnalysisFailed {
            label: "分析服务暂时不可用",
            source: cstudio_genai::GenAiError::NoImageData,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("分析服务暂时不可用"));
    }
}
