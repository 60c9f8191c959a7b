//! HTTP error mapping.
//!
//! Every failure is tagged with the handler operation that produced it and
//! logged once, when the response is rendered.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use orgtree_core::{
    DepartmentServiceError, EmployeeServiceError, ErrorKind, RepoError, StatusClass,
};
use serde::Serialize;
use thiserror::Error;

const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{source}")]
    Department {
        op: &'static str,
        #[source]
        source: DepartmentServiceError,
    },

    #[error("{source}")]
    Employee {
        op: &'static str,
        #[source]
        source: EmployeeServiceError,
    },

    #[error("{source}")]
    Repo {
        op: &'static str,
        #[source]
        source: RepoError,
    },

    #[error("invalid request: {message}")]
    InvalidRequest { op: &'static str, message: String },

    #[error("not found: {message}")]
    NotFound { op: &'static str, message: String },

    #[error("internal error: {message}")]
    Internal { op: &'static str, message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn department(op: &'static str) -> impl FnOnce(DepartmentServiceError) -> Self {
        move |source| Self::Department { op, source }
    }

    pub fn employee(op: &'static str) -> impl FnOnce(EmployeeServiceError) -> Self {
        move |source| Self::Employee { op, source }
    }

    pub fn repo(op: &'static str) -> impl FnOnce(RepoError) -> Self {
        move |source| Self::Repo { op, source }
    }

    pub fn invalid_request(op: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            op,
            message: message.into(),
        }
    }

    pub fn not_found(op: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            op,
            message: message.into(),
        }
    }

    pub fn internal(op: &'static str, message: impl Into<String>) -> Self {
        Self::Internal {
            op,
            message: message.into(),
        }
    }

    /// Handler operation that produced this error.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Department { op, .. }
            | Self::Employee { op, .. }
            | Self::Repo { op, .. }
            | Self::InvalidRequest { op, .. }
            | Self::NotFound { op, .. }
            | Self::Internal { op, .. } => op,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Department { source, .. } => source.kind(),
            Self::Employee { source, .. } => source.kind(),
            Self::Repo { source, .. } => source.kind(),
            Self::InvalidRequest { .. } => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind().status_class() {
            StatusClass::NotFound => StatusCode::NOT_FOUND,
            StatusClass::Conflict => StatusCode::CONFLICT,
            StatusClass::BadRequest => StatusCode::BAD_REQUEST,
            StatusClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(
                "event={} module=api status=error error_code={kind} http_status={} error={}",
                self.op(),
                status.as_u16(),
                self
            );
            INTERNAL_MESSAGE.to_string()
        } else {
            warn!(
                "event={} module=api status=error error_code={kind} http_status={}",
                self.op(),
                status.as_u16()
            );
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
