use serde::Serialize;
use std::borrow::Cow;
use tracing::{event, Level};

#[derive(Debug, Serialize)]
pub struct ErrorResponseData {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    kind: Cow<'static, str>,
    message: Cow<'static, str>,
}

impl ErrorResponseData {
    /// Create the response body for a server-side failure. This is logged at the error level.
    pub fn new(
        kind: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> ErrorResponseData {
        let ret = Self::build(kind, message);
        event!(Level::ERROR, kind=%ret.error.kind, message=%ret.error.message);
        ret
    }

    /// Create the response body for a rejection that is part of normal operation, such as a
    /// missing permission or an unknown object. These are only logged at the debug level.
    pub fn expected(
        kind: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> ErrorResponseData {
        let ret = Self::build(kind, message);
        event!(Level::DEBUG, kind=%ret.error.kind, message=%ret.error.message);
        ret
    }

    fn build(
        kind: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> ErrorResponseData {
        ErrorResponseData {
            error: ErrorDetails {
                kind: kind.into(),
                message: message.into(),
            },
        }
    }

    pub fn kind(&self) -> &str {
        &self.error.kind
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorResponseData;

    #[test]
    fn serializes_envelope() {
        let data = ErrorResponseData::expected("not_found", "Not found");
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "error": { "kind": "not_found", "message": "Not found" } })
        );
        assert_eq!(data.kind(), "not_found");
    }
}
