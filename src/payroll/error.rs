use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotAuthorized,
    Conflict,
    DependencyFailure,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("invalid period '{0}': expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("payroll for {0} is already posted and cannot be regenerated")]
    AlreadyPosted(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("dependency failure: {0}")]
    DependencyFailure(String),

    #[error("chart of accounts is missing required roles: {0}")]
    AccountsNotConfigured(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no active employee is eligible to approve payroll")]
    NoActiveApprover,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl PayrollError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PayrollError::InvalidPeriod(_) | PayrollError::InvalidInput(_) => ErrorKind::InvalidInput,
            PayrollError::NotAuthorized(_) => ErrorKind::NotAuthorized,
            PayrollError::AlreadyPosted(_) | PayrollError::Conflict(_) => ErrorKind::Conflict,
            PayrollError::DependencyFailure(_) | PayrollError::AccountsNotConfigured(_) => {
                ErrorKind::DependencyFailure
            }
            PayrollError::NotFound(_) | PayrollError::NoActiveApprover => ErrorKind::NotFound,
            PayrollError::Database(_) | PayrollError::Payload(_) => ErrorKind::Internal,
        }
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        PayrollError::NotAuthorized(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PayrollError::Conflict(message.into())
    }
}

impl ResponseError for PayrollError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotAuthorized => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::DependencyFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let kind = self.kind();
        let message = if kind == ErrorKind::Internal {
            tracing::error!(error = %self, "Payroll operation failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": message,
            "kind": kind.as_ref(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(
            PayrollError::InvalidPeriod("2025-13".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PayrollError::AlreadyPosted("2025-01".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            PayrollError::AccountsNotConfigured("cash".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(PayrollError::NoActiveApprover.kind(), ErrorKind::NotFound);
        assert_eq!(
            PayrollError::not_authorized("nope").status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
