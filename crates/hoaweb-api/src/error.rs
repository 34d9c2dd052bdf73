//! Error types for hoaweb-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hoaweb_core::error::{
    DefaultErrorLogger, ErrorCode, ErrorContext, ErrorDetails, ErrorLogger,
};
use hoaweb_core::CoreError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {}", .0.message)]
    NotFound(ErrorDetails),

    #[error("Bad request: {}", .0.message)]
    BadRequest(ErrorDetails),

    #[error("Unavailable: {}", .0.message)]
    Unavailable(ErrorDetails),

    #[error("Internal server error: {}", .0.message)]
    Internal(ErrorDetails),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(ErrorDetails::new(ErrorCode::ValidationError, message.into()))
    }

    /// Map a core error and log it under the given operation
    pub fn from_core(error: CoreError, operation: &str) -> Self {
        Self::logged(error, &ErrorContext::new(operation))
    }

    pub fn logged(error: CoreError, context: &ErrorContext) -> Self {
        match error.code() {
            ErrorCode::InvalidAmount | ErrorCode::ValidationError => {
                DefaultErrorLogger.log_warning(&error.to_string(), context)
            }
            _ => DefaultErrorLogger.log_error(&error, context),
        }
        ApiError::from(error)
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> &ErrorDetails {
        match self {
            ApiError::NotFound(d)
            | ApiError::BadRequest(d)
            | ApiError::Unavailable(d)
            | ApiError::Internal(d) => d,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        let details = error.to_details();
        match error {
            CoreError::BudgetNotAvailable { .. }
            | CoreError::LineItemNotFound { .. }
            | CoreError::ProjectNotFound { .. } => ApiError::NotFound(details),
            CoreError::InvalidAmount { .. } | CoreError::ValidationError { .. } => {
                ApiError::BadRequest(details)
            }
            CoreError::LoadFailed { .. } => ApiError::Unavailable(details),
            _ => ApiError::Internal(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.details(),
        }));
        (self.status(), body).into_response()
    }
}
