mod config;
mod corpus;
mod error;
mod matcher;
mod model;
mod resolver;
mod server;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use faq_common::audit::AuditLog;
use faq_common::geolocation::GeoLocator;

use config::Config;
use resolver::AnswerResolver;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting faq-bot");

    let config = Config::from_env()?;
    info!(
        faq_path = %config.faq_path,
        match_cutoff = config.match_cutoff,
        audit = config.audit_webhook_url.is_some(),
        geolocation = config.geolocation_url.is_some(),
        timeout_ms = config.collaborator_timeout.as_millis(),
        "configuration loaded"
    );

    let entries = corpus::load_corpus(&config.faq_path())?;
    let resolver = AnswerResolver::new(entries, config.match_cutoff);
    info!(entries = resolver.len(), "faq corpus loaded");

    let geo = GeoLocator::new(config.geolocation_url.as_deref(), config.collaborator_timeout)?;
    let audit = AuditLog::new(config.audit_webhook_url.as_deref(), config.collaborator_timeout)?;
    if !audit.is_enabled() {
        info!("AUDIT_WEBHOOK_URL not set, running without audit logging");
    }

    let state = AppState::new(resolver, geo, audit);
    let app = server::create_router(state.clone());

    let addr = SocketAddr::new(config.host, config.port);
    let listener = TcpListener::bind(addr).await?;
    info!(listen_addr = %addr, "serving");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("draining pending audit records");
    state.drain_background().await;

    info!("faq-bot shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
