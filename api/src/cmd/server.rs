use orgdesk_api::tracing_config::{self, TracingConfig};

pub async fn run(config: orgdesk_api::config::Config) -> Result<(), eyre::Report> {
    tracing_config::configure(TracingConfig::from_config(&config), std::io::stdout)
        .map_err(|e| eyre::eyre!(e))?;

    let server = orgdesk_api::create_server(config)
        .await
        .map_err(|e| eyre::eyre!(e))?;
    let result = server.run().await;

    tracing_config::teardown();

    result?;
    Ok(())
}
