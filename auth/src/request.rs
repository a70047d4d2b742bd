use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{event, Level};

use crate::{
    extract_token::{extract_bearer_auth_value, invalid_message},
    session::SessionLookup,
    store::PrincipalId,
};

/// Attached to the request extensions when the session token resolved to a principal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal(pub PrincipalId);

/// Resolves the caller's principal from the bearer token. Requests without a token pass
/// through untouched so that public routes keep working; the route guard rejects them.
#[derive(Clone)]
pub struct AuthenticationLayer {
    sessions: Arc<dyn SessionLookup>,
}

impl AuthenticationLayer {
    pub fn new(sessions: Arc<dyn SessionLookup>) -> Self {
        Self { sessions }
    }
}

impl<S> Layer<S> for AuthenticationLayer {
    type Service = Authenticator<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Authenticator {
            sessions: self.sessions.clone(),
            inner,
        }
    }
}

#[derive(Clone)]
pub struct Authenticator<S> {
    sessions: Arc<dyn SessionLookup>,
    inner: S,
}

impl<S> Service<Request<Body>> for Authenticator<S>
where
    S: Service<Request<Body>> + Send + Clone + 'static,
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);

        let sessions = self.sessions.clone();
        Box::pin(async move {
            let token = match extract_bearer_auth_value(&req) {
                Ok(token) => token,
                Err(res) => return Ok(res),
            };

            if let Some(token) = token {
                match sessions.principal_for_session(&token).await {
                    Ok(Some(principal)) => {
                        req.extensions_mut()
                            .insert(AuthenticatedPrincipal(principal));
                    }
                    Ok(None) => return Ok(invalid_message()),
                    Err(e) => {
                        event!(Level::ERROR, error=%e, "session lookup failed");
                        return Ok(e.into_response());
                    }
                }
            }

            Ok(inner.call(req).await?.into_response())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Request, StatusCode},
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    use super::{AuthenticatedPrincipal, AuthenticationLayer};
    use crate::memory::MemoryStore;

    async fn whoami(principal: Option<Extension<AuthenticatedPrincipal>>) -> String {
        principal
            .map(|Extension(p)| p.0.to_string())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn app(store: Arc<MemoryStore>) -> Router {
        Router::new()
            .route("/", get(whoami))
            .layer(AuthenticationLayer::new(store))
    }

    async fn body_string(res: axum::response::Response) -> String {
        let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn attaches_principal_for_known_session() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_principal(true);
        store.add_session("tok", user);

        let res = app(store)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(AUTHORIZATION, "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, user.to_string());
    }

    #[tokio::test]
    async fn passes_through_without_token() {
        let store = Arc::new(MemoryStore::new());
        let res = app(store)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "anonymous");
    }

    #[tokio::test]
    async fn rejects_unknown_session() {
        let store = Arc::new(MemoryStore::new());
        let res = app(store)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(AUTHORIZATION, "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_store_outage_is_unavailable() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let res = app(store)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(AUTHORIZATION, "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
