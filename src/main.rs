use actix_web::{middleware::from_fn, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tuition_ledger::config::{Config, LogFormat};
use tuition_ledger::middleware::request_id;
use tuition_ledger::AppServices;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config);

    tracing::info!("Starting Tuition Ledger");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!(
        backend = ?config.ledger.backend,
        confirmation = ?config.provider.confirmation,
        "Ledger configured"
    );

    let services = AppServices::from_config(&config)
        .await
        .context("Failed to initialize services")?;

    // Start HTTP server
    let (host, port) = config.server.bind_address();
    let server = HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(from_fn(request_id))
            .wrap(TracingLogger::default())
            .configure(move |cfg| services.configure(cfg))
    })
    .workers(config.server.workers)
    .shutdown_timeout(config.server.shutdown_timeout_secs)
    .bind((host, port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run();

    tracing::info!(host = host, port = port, "Server started");

    server.await.context("HTTP server error")
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("tuition_ledger={},actix_web=info", config.app.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    match config.app.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
