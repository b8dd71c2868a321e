use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

use ara_mail_service::config::Settings;
use ara_mail_service::dispatch::EmailDispatcher;
use ara_mail_service::postgres::PostgresPool;
use ara_mail_service::provider::create_email_provider;
use ara_mail_service::render::{JinjaTemplateEngine, TemplateEngine};
use ara_mail_service::server::{create_app, AppState};
use ara_mail_service::telemetry::init_telemetry;
use ara_mail_service::template::create_template_repository;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;

    // Initialize tracing (keep the guard alive until exit)
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!(
        provider = settings.email.provider.as_str(),
        "Configuration loaded"
    );

    // Optional PostgreSQL pool
    let postgres = match settings.database {
        Some(ref db) => {
            let pool = PostgresPool::new(db)
                .await
                .context("failed to connect to PostgreSQL")?;
            Some(pool)
        }
        None => None,
    };
    let synchronize = settings.database.as_ref().map_or(false, |db| db.synchronize);

    // Send pipeline
    let repository =
        create_template_repository(&settings.templates, postgres.as_ref(), synchronize).await?;
    let engine = Arc::new(JinjaTemplateEngine::from_placeholder(
        settings.templates.missing_placeholder.clone(),
    ));
    tracing::info!(
        engine = engine.engine_name(),
        missing_placeholder = ?settings.templates.missing_placeholder,
        "Template engine ready"
    );
    let provider = create_email_provider(&settings.email)?;
    let dispatcher = Arc::new(EmailDispatcher::new(repository, engine, provider));
    tracing::info!(
        provider = dispatcher.provider_name(),
        template_backend = dispatcher.repository_backend(),
        "Email dispatcher initialized"
    );

    let addr = settings.server_addr();
    let state = AppState::new(settings, dispatcher, postgres.clone());
    let app = create_app(state);

    // Start server
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = postgres {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
