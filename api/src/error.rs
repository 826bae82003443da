use authz::AuthzError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::DatabaseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, warn};

/// Field name to the messages describing what is wrong with it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthenticated.")]
    Unauthorized,

    /// A policy denial; the reason is returned to the caller unchanged.
    #[error("{0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("The given data was invalid.")]
    Validation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error envelope: `{success: false, message, errors}`.
///
/// `errors` is an empty list except for validation failures, where it maps
/// each field to its messages.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Object)]
    pub errors: serde_json::Value,
}

impl ApiError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::InternalError(detail) => {
                error!("Request failed: {}", detail);
                "Server Error".to_string()
            }
            other => other.to_string(),
        };
        let errors = match self {
            ApiError::Validation(fields) => serde_json::to_value(fields)
                .unwrap_or_else(|_| serde_json::Value::Array(Vec::new())),
            _ => serde_json::Value::Array(Vec::new()),
        };

        let body = ApiErrorResponse {
            success: false,
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Denied { reason } => ApiError::Forbidden(reason),
            AuthzError::UnknownRole(_) => ApiError::invalid("roles", err.to_string()),
            AuthzError::UnknownPermission(_) => ApiError::invalid("permissions", err.to_string()),
            AuthzError::SecurityAnomaly(_) => {
                warn!("{}", err);
                ApiError::Unauthorized
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => ApiError::NotFound(what),
            DatabaseError::Validation(message) => ApiError::BadRequest(message),
            DatabaseError::Authz(e) => e.into(),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ApiError::InternalError(format!("session store: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON of the wrong shape
            JsonRejection::JsonDataError(e) => ApiError::invalid("body", e.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid("query", rejection.body_text())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
