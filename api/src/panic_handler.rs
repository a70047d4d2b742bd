use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orgdesk_http_errors::ErrorResponseData;

pub fn handle_panic(production: bool, err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if production {
        "Server error".to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };

    let body = ErrorResponseData::new("panic", details);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::handle_panic;

    async fn body_text(res: axum::response::Response) -> String {
        let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn development_shows_panic_message() {
        let res = handle_panic(false, Box::new("index out of bounds"));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(res).await.contains("index out of bounds"));
    }

    #[tokio::test]
    async fn production_hides_panic_message() {
        let res = handle_panic(true, Box::new("secret".to_string()));
        let body = body_text(res).await;
        assert!(!body.contains("secret"), "{body}");
        assert!(body.contains("panic"), "{body}");
    }
}
