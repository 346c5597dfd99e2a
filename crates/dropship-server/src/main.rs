mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use dropship_supplier::AffiliateSettings;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = dropship_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = dropship_db::connect_pool_from_config(&config).await?;
    dropship_db::run_migrations(&pool).await?;

    let publisher = Arc::new(dropship_sync::build_live_publisher(&config, pool.clone())?);
    match publisher.tokens().restore().await {
        Ok(true) => tracing::info!("reusing persisted marketplace token"),
        Ok(false) => tracing::info!("no usable persisted marketplace token; will exchange on demand"),
        Err(e) => tracing::warn!(error = %e, "could not load persisted marketplace token"),
    }

    let shutdown = CancellationToken::new();
    let _scheduler =
        scheduler::build_scheduler(Arc::clone(&publisher), &config.sync_cron, shutdown.clone())
            .await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        dropship_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        publisher,
        affiliate: AffiliateSettings::from_app_config(&config),
        shutdown: shutdown.clone(),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "dropship-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
    shutdown.cancel();
}
