use crate::engine::SizingError;
use crate::market::ContextError;
use crate::oracle::OracleError;
use crate::orchestration::PlanningError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<PlanningError> for AppError {
    fn from(err: PlanningError) -> Self {
        if let Some(reason) = err.rejection() {
            return if reason.is_authorization() {
                AppError::Forbidden(err.to_string())
            } else {
                AppError::BadRequest(err.to_string())
            };
        }
        let message = err.to_string();
        match err {
            PlanningError::LeverageTooHigh { .. }
            | PlanningError::Routing(_)
            | PlanningError::Arithmetic(_) => AppError::BadRequest(message),
            PlanningError::Context(ContextError::UnknownAsset(_)) => AppError::BadRequest(message),
            PlanningError::Context(ContextError::NoRoute { .. }) => AppError::NotFound(message),
            PlanningError::Context(_) => AppError::Internal(message),
            PlanningError::Sizing(SizingError::Oracle(e)) | PlanningError::Oracle(e) => {
                oracle_error(e, message)
            }
            PlanningError::Sizing(SizingError::NegativeWithdrawal) => AppError::Upstream(message),
            PlanningError::Sizing(_) => AppError::BadRequest(message),
            PlanningError::Collaborator(_) => AppError::Upstream(message),
        }
    }
}

fn oracle_error(err: OracleError, message: String) -> AppError {
    match err {
        OracleError::Arithmetic(_) => AppError::BadRequest(message),
        _ => AppError::Upstream(message),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
