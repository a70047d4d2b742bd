//! Shared helpers for the workspace's tests.

use std::{future::Future, time::Duration};

use once_cell::sync::Lazy;
use tracing::subscriber::set_global_default;
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

fn configure_tracing() {
    LogTracer::builder()
        .with_max_level(log::LevelFilter::Debug)
        .init()
        .expect("Failed to create logger");

    let env_filter = EnvFilter::try_from_env("LOG")
        .unwrap_or_else(|_| EnvFilter::new("info,orgdesk_auth=debug,orgdesk_api=debug"));

    let tree = HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(tree)
        .with(ErrorLayer::default());
    set_global_default(subscriber).expect("Setting subscriber");
}

/// Set `TEST_LOG` to see tracing output from tests.
pub static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        configure_tracing();
    }
});

pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Poll `f` every 100ms until it returns a value, giving up after `attempts` tries.
pub async fn wait_for<Fut, DATA>(attempts: usize, f: impl Fn() -> Fut) -> Option<DATA>
where
    Fut: Future<Output = Option<DATA>>,
{
    for _ in 0..attempts {
        if let Some(d) = f().await {
            return Some(d);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    None
}
