use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use school_transport::{
    config::environment::EnvironmentConfig,
    create_app_router,
    database::DatabaseConnection,
    repositories::Repositories,
    services::{
        email_service::{EmailSender, LogEmailSender, SmtpEmailSender},
        notification_service::DispatchMode,
        paypack_client::PaypackClient,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚌 School Transport API ({})", config.environment);

    let repositories = match config.database_config() {
        Some(database) => {
            let connection = DatabaseConnection::connect(&database)
                .await
                .map_err(|e| {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    e
                })?;
            Repositories::postgres(connection.pool().clone())
        }
        None => {
            warn!("⚠️ DATABASE_URL not set, using the in-memory store");
            Repositories::in_memory()
        }
    };

    let payment_gateway = Arc::new(PaypackClient::new(config.payment.clone())?);

    let email_sender: Arc<dyn EmailSender> = match &config.email.smtp_host {
        Some(host) => Arc::new(SmtpEmailSender::new(&config.email, host)?),
        None => {
            warn!("⚠️ SMTP_HOST not set, emails will only be logged");
            Arc::new(LogEmailSender)
        }
    };

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_url()))?;

    let state = AppState::new(
        config,
        repositories,
        payment_gateway,
        email_sender,
        DispatchMode::Background,
    );
    let app = create_app_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("   GET  /health");
    info!("   /api/v1/auth, /plans, /schedules, /travels, /users, /transporters, /schools, /activity-logs");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Failed to listen for Ctrl+C: {}", e);
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
                error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
