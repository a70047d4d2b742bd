pub mod auth;
pub mod config;
pub mod error;
pub mod obfuscate_errors;
pub mod panic_handler;
pub mod routes;
pub mod shared_state;
pub mod tracing_config;
pub mod validation;

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::anyhow;
use axum::{routing::IntoMakeService, Router};
use hyper::server::conn::AddrIncoming;
use orgdesk_auth::{PermissionEvaluator, PermissionRegistry, SessionLookup};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::{event, Level};

pub use crate::error::Error;
use crate::{
    auth::{auth_layer, DbPermissionStore},
    obfuscate_errors::ObfuscateErrorLayer,
    shared_state::{AppState, InnerState},
};

pub struct Server {
    pub host: String,
    pub port: u16,
    pub server: axum::Server<AddrIncoming, IntoMakeService<Router>>,
}

impl Server {
    pub async fn run(self) -> Result<(), Error> {
        self.server.await?;
        Ok(())
    }
}

/// Wrap the routes in the global middleware stack. The session lookup is separate from the
/// state so that tests can authenticate against an in-memory store.
pub fn build_app(state: AppState, sessions: Arc<dyn SessionLookup>) -> Router {
    let production = state.production;

    routes::configure_routes().with_state(state).layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(move |err| {
                panic_handler::handle_panic(production, err)
            }))
            .layer(ObfuscateErrorLayer::new(production))
            .compression()
            .set_x_request_id(MakeRequestUuid)
            .propagate_x_request_id()
            .layer(auth_layer(sessions))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::INFO)),
            )
            .into_inner(),
    )
}

pub async fn create_server(config: config::Config) -> Result<Server, anyhow::Error> {
    let db = orgdesk_db::connect(config.database_url.as_str(), config.database_pool_size)?;

    let conn = db.get().await?;
    let applied = conn
        .interact(orgdesk_db::run_migrations)
        .await
        .map_err(|e| anyhow!("{e}"))??;
    drop(conn);
    for version in &applied {
        event!(Level::INFO, %version, "applied migration");
    }

    let store = Arc::new(DbPermissionStore::new(db.clone()));
    let state = Arc::new(InnerState {
        production: config.production(),
        db,
        evaluator: PermissionEvaluator::new(store.clone()),
        registry: PermissionRegistry::new(store.clone()),
    });

    let app = build_app(state, store);

    let bind_ip: IpAddr = config.host.parse()?;
    let addr = SocketAddr::from((bind_ip, config.port));
    let builder = axum::Server::try_bind(&addr)?;
    let server = builder.serve(app.into_make_service());
    let port = server.local_addr().port();
    event!(Level::INFO, "Listening on {}:{}", config.host, port);

    Ok(Server {
        host: config.host,
        port,
        server,
    })
}
