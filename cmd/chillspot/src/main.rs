//! # Chillspot server
//!
//! Assembles the adapters selected at compile time and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::AppState;
use auth_adapters::JwtIdentityResolver;
use configs::{DatabaseSettings, LogSettings, Settings};
use domains::{Clock, IdentityResolver, SystemClock};
use storage_adapters::MemoryStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(feature = "db-postgres")]
use secrecy::ExposeSecret;
#[cfg(feature = "db-postgres")]
use storage_adapters::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Settings and logging
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);

    // 2. Adapters
    let identity: Arc<dyn IdentityResolver> = Arc::new(JwtIdentityResolver::new(&settings.auth.jwt_secret));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = build_state(&settings.database, identity, clock).await?;

    // 3. Serve
    let addr = settings.server.addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "chillspot listening");

    axum::serve(listener, api_adapters::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn build_state(
    database: &DatabaseSettings,
    identity: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<AppState> {
    if let Some(state) = postgres_state(database, identity.clone(), clock.clone()).await? {
        return Ok(state);
    }

    warn!("running on the in-memory store; data is lost on shutdown");
    Ok(AppState::from_store(Arc::new(MemoryStore::with_default_badges()), identity, clock))
}

#[cfg(feature = "db-postgres")]
async fn postgres_state(
    database: &DatabaseSettings,
    identity: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Option<AppState>> {
    let Some(url) = &database.url else {
        return Ok(None);
    };

    let store = PgStore::connect(url.expose_secret(), database.max_connections)
        .await
        .context("connecting to PostgreSQL")?;
    if database.run_migrations {
        store.migrate().await.context("running migrations")?;
    }

    info!(max_connections = database.max_connections, "using PostgreSQL store");
    Ok(Some(AppState::from_store(Arc::new(store), identity, clock)))
}

#[cfg(not(feature = "db-postgres"))]
async fn postgres_state(
    database: &DatabaseSettings,
    _identity: Arc<dyn IdentityResolver>,
    _clock: Arc<dyn Clock>,
) -> anyhow::Result<Option<AppState>> {
    if database.url.is_some() {
        warn!("database.url is ignored; built without the db-postgres feature");
    }
    Ok(None)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
