use axum::{
    body::Body,
    http::{HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use orgdesk_http_errors::ErrorResponseData;
use tower::{Layer, Service};

const REQUEST_ID: &str = "x-request-id";

/// In production, replace the body of server errors and authentication failures with a generic
/// message so that internal details and permission codes do not leak to clients.
#[derive(Debug, Clone)]
pub struct ObfuscateErrorLayer {
    enabled: bool,
}

impl ObfuscateErrorLayer {
    pub fn new(enabled: bool) -> ObfuscateErrorLayer {
        ObfuscateErrorLayer { enabled }
    }
}

impl<S> Layer<S> for ObfuscateErrorLayer {
    type Service = ObfuscateError<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ObfuscateError {
            inner,
            enabled: self.enabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObfuscateError<S> {
    inner: S,
    enabled: bool,
}

fn generic_body(status: StatusCode) -> Option<ErrorResponseData> {
    let (kind, message) = match status {
        StatusCode::UNAUTHORIZED => ("authn", "Unauthorized"),
        StatusCode::FORBIDDEN => ("missing_permission", "Forbidden"),
        StatusCode::SERVICE_UNAVAILABLE => ("unavailable", "Service unavailable"),
        s if s.is_server_error() => ("internal_server_error", "Internal error"),
        _ => return None,
    };

    Some(ErrorResponseData::expected(kind, message))
}

impl<S> Service<Request<Body>> for ObfuscateError<S>
where
    S: Service<Request<Body>> + Send + 'static,
    S::Future: Send + 'static,
    S::Response: IntoResponse + Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let enabled = self.enabled;
        let fut = self.inner.call(req);
        Box::pin(async move {
            let res = fut.await?.into_response();
            if !enabled {
                return Ok(res);
            }

            let status = res.status();
            let Some(body) = generic_body(status) else {
                return Ok(res);
            };

            // The original headers describe the original body, which may have been compressed.
            // Only the request id carries over.
            let mut replaced = (status, Json(body)).into_response();
            if let Some(request_id) = res.headers().get(REQUEST_ID) {
                replaced
                    .headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID), request_id.clone());
            }
            Ok(replaced)
        })
    }
}
