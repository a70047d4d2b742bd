use axum::{
    http::{header::AUTHORIZATION, Request},
    response::{IntoResponse, Response},
};

use crate::Error;

pub fn invalid_message() -> Response {
    Error::InvalidSessionToken.into_response()
}

pub fn extract_bearer_auth_value<B>(req: &Request<B>) -> Result<Option<String>, Response> {
    match req.headers().get(AUTHORIZATION) {
        None => Ok(None),
        Some(value) => {
            let (auth_type, token) = value
                .to_str()
                .map_err(|_| invalid_message())?
                .split_once(' ')
                .ok_or_else(invalid_message)?;

            if auth_type != "Bearer" || token.is_empty() {
                return Err(invalid_message());
            }

            Ok(Some(token.to_string()))
        }
    }
}
