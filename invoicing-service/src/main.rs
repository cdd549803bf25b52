use invoicing_service::config::InvoicingConfig;
use invoicing_service::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = InvoicingConfig::load()?;

    init_tracing(
        "invoicing-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        backend = ?config.storage.backend,
        port = config.common.port,
        "Starting invoicing-service"
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
