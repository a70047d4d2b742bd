mod common;

#[cfg(feature = "test-db")]
mod app;
