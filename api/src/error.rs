use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::result::DatabaseErrorKind;
use orgdesk_db::ordering::OrderingError;
use thiserror::Error;

use orgdesk_http_errors::ErrorResponseData;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database Error: {0}")]
    DbErr(#[from] diesel::result::Error),

    #[error("Database Pool Error: {0}")]
    DbPool(#[from] deadpool_diesel::PoolError),

    #[error("Database Error: {0}")]
    DeadpoolInteract(String),

    #[error("Server error: {0}")]
    ServerError(#[from] hyper::Error),

    #[error("Missing permission {0}")]
    MissingPermission(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Permission lookup failed: {0}")]
    AuthUnavailable(orgdesk_auth::Error),

    #[error("Not found")]
    NotFound,

    #[error("Unknown {0}")]
    ObjectNotFound(&'static str),

    #[error("{0} is still in use by {1} record(s)")]
    InUse(&'static str, i64),

    #[error("Built-in permission {0} cannot be deleted")]
    BuiltinPermission(String),

    #[error("Cannot reorder: {0}")]
    ReorderBoundary(OrderingError),

    #[error("{0}")]
    Validation(String),

    #[error("Unknown permission codes: {}", .0.join(", "))]
    UnknownPermissionCodes(Vec<String>),

    #[error(transparent)]
    Generic(#[from] anyhow::Error),
}

impl Error {
    fn error_kind(&self) -> &'static str {
        match self {
            Error::DbErr(diesel::result::Error::NotFound) => "not_found",
            Error::DbErr(diesel::result::Error::DatabaseError(kind, _)) => match kind {
                DatabaseErrorKind::UniqueViolation => "conflict",
                DatabaseErrorKind::ForeignKeyViolation => "invariant_violation",
                _ => "db",
            },
            Error::DbErr(_) => "db",
            Error::DbPool(_) => "unavailable",
            Error::DeadpoolInteract(_) => "db",
            Error::ServerError(_) => "internal_server_error",
            Error::MissingPermission(_) => "missing_permission",
            Error::Unauthenticated => "authn",
            Error::AuthUnavailable(_) => "unavailable",
            Error::NotFound => "not_found",
            Error::ObjectNotFound(_) => "not_found",
            Error::InUse(..) => "invariant_violation",
            Error::BuiltinPermission(_) => "invariant_violation",
            Error::ReorderBoundary(OrderingError::NotFound) => "not_found",
            Error::ReorderBoundary(_) => "invariant_violation",
            Error::Validation(_) => "validation",
            Error::UnknownPermissionCodes(_) => "validation",
            Error::Generic(_) => "internal_server_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error_kind() {
            "authn" => StatusCode::UNAUTHORIZED,
            "missing_permission" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "conflict" | "invariant_violation" => StatusCode::CONFLICT,
            "validation" => StatusCode::BAD_REQUEST,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn response_tuple(&self) -> (StatusCode, ErrorResponseData) {
        let status = self.status_code();
        let kind = self.error_kind();
        let body = if status.is_server_error() {
            ErrorResponseData::new(kind, self.to_string())
        } else {
            ErrorResponseData::expected(kind, self.to_string())
        };

        (status, body)
    }
}

impl From<orgdesk_auth::Error> for Error {
    fn from(e: orgdesk_auth::Error) -> Self {
        match e {
            orgdesk_auth::Error::MissingPermission(code) => Error::MissingPermission(code),
            orgdesk_auth::Error::InvalidSessionToken => Error::Unauthenticated,
            e @ orgdesk_auth::Error::StoreUnavailable(_) => Error::AuthUnavailable(e),
        }
    }
}

impl From<OrderingError> for Error {
    fn from(e: OrderingError) -> Self {
        Error::ReorderBoundary(e)
    }
}

impl From<deadpool_diesel::InteractError> for Error {
    fn from(e: deadpool_diesel::InteractError) -> Self {
        Error::DeadpoolInteract(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (code, json) = self.response_tuple();
        (code, Json(json)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_violation() -> diesel::result::Error {
        diesel::result::Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_string()),
        )
    }

    #[test]
    fn taxonomy_status_codes() {
        let cases = [
            (Error::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                Error::MissingPermission("org.news.edit".into()),
                StatusCode::FORBIDDEN,
            ),
            (Error::NotFound, StatusCode::NOT_FOUND),
            (
                Error::DbErr(diesel::result::Error::NotFound),
                StatusCode::NOT_FOUND,
            ),
            (Error::DbErr(unique_violation()), StatusCode::CONFLICT),
            (Error::InUse("group", 1), StatusCode::CONFLICT),
            (
                Error::ReorderBoundary(OrderingError::AlreadyFirst),
                StatusCode::CONFLICT,
            ),
            (
                Error::ReorderBoundary(OrderingError::DuplicateOrder),
                StatusCode::CONFLICT,
            ),
            (
                Error::ReorderBoundary(OrderingError::NotFound),
                StatusCode::NOT_FOUND,
            ),
            (Error::Validation("name: empty".into()), StatusCode::BAD_REQUEST),
            (
                Error::UnknownPermissionCodes(vec!["system.superadmin".into()]),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::from(orgdesk_auth::Error::store(anyhow::anyhow!("down"))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::Generic(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn auth_denial_keeps_code() {
        let err = Error::from(orgdesk_auth::Error::MissingPermission(
            "system.users.view".to_string(),
        ));
        let (status, body) = err.response_tuple();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.kind(), "missing_permission");
        assert_eq!(err.to_string(), "Missing permission system.users.view");
    }
}
