use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catalog::Entity;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid {} data", .entity.label())]
    InvalidPayload { entity: Entity, errors: Vec<String> },

    #[error("Invalid id")]
    InvalidId,

    #[error("Invalid {0} parameter")]
    InvalidParameter(&'static str),

    #[error("Invalid query parameters")]
    InvalidQuery(#[from] QueryRejection),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Username or email already exists")]
    Duplicate,

    #[error("Failed to {action}")]
    Internal {
        action: &'static str,
        source: StoreError,
    },
}

impl AppError {
    /// Maps a storage failure for a handler; `action` names the operation in the 500 message.
    pub fn store(action: &'static str) -> impl Fn(StoreError) -> AppError {
        move |e| match e {
            StoreError::NotFound(entity) => AppError::NotFound(entity),
            StoreError::Duplicate => AppError::Duplicate,
            source => AppError::Internal { action, source },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidPayload { .. }
            | AppError::InvalidId
            | AppError::InvalidParameter(_)
            | AppError::InvalidQuery(_)
            | AppError::Duplicate => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::InvalidPayload { errors, .. } => {
                json!({ "message": self.to_string(), "errors": errors })
            }
            AppError::InvalidQuery(rejection) => {
                json!({ "message": self.to_string(), "errors": [rejection.body_text()] })
            }
            AppError::Internal { action, source } => {
                error!(%source, "Failed to {action}");
                json!({ "message": self.to_string() })
            }
            _ => json!({ "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
