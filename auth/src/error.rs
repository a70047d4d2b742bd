use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orgdesk_http_errors::ErrorResponseData;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing permission {0}")]
    MissingPermission(String),

    #[error("Invalid session token")]
    InvalidSessionToken,

    #[error("Permission store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl Error {
    /// Wrap a failure from the underlying store.
    pub fn store(err: impl Into<anyhow::Error>) -> Self {
        Error::StoreUnavailable(err.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingPermission(_) => StatusCode::FORBIDDEN,
            Error::InvalidSessionToken => StatusCode::UNAUTHORIZED,
            Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            // Token problems all look alike to the caller.
            Error::InvalidSessionToken => ErrorResponseData::expected("authn", "Unauthorized"),
            Error::MissingPermission(_) => {
                ErrorResponseData::expected("missing_permission", self.to_string())
            }
            Error::StoreUnavailable(_) => ErrorResponseData::new("unavailable", self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
