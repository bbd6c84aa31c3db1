use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::error::{DomainError, FieldErrors};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// An extractor refused the request before it reached a handler.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("request timed out")]
    Timeout,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) fields: Option<BTreeMap<String, String>>,
}

impl ErrorBody {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
        }
    }

    fn with_fields(fields: BTreeMap<String, String>) -> Self {
        Self {
            error: "validation failed".to_string(),
            fields: Some(fields),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Domain(err) => domain_response(err),
            AppError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody::with_fields(validator_fields(&err)),
            ),
            AppError::Rejected { status, message } => (status, ErrorBody::message(message)),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorBody::message("unauthorized")),
            AppError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                ErrorBody::message("request timed out"),
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %format!("{err:#}"), "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("internal error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn domain_response(err: DomainError) -> (StatusCode, ErrorBody) {
    match err {
        DomainError::Validation(fields) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorBody::with_fields(domain_fields(&fields)),
        ),
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorBody::message(err.to_string())),
        DomainError::AlreadyExists(_) => (StatusCode::CONFLICT, ErrorBody::message(err.to_string())),
        DomainError::Unauthenticated | DomainError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, ErrorBody::message(err.to_string()))
        }
        DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorBody::message(err.to_string())),
        DomainError::Unexpected(reason) => {
            tracing::error!(%reason, "unexpected domain error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::message("internal error"),
            )
        }
    }
}

fn domain_fields(fields: &FieldErrors) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|(field, message)| (field.to_string(), message.to_string()))
        .collect()
}

fn validator_fields(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errors)| {
            let first = errors.first()?;
            let message = first
                .message
                .as_ref()
                .map_or_else(|| first.code.to_string(), ToString::to_string);
            Some((field.to_string(), message))
        })
        .collect()
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
