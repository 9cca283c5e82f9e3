mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use cfactory_pipeline::{PipelineContext, Worker, WorkerConfig};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(cfactory_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = cfactory_db::PoolConfig::from_app_config(&config);
    let pool = cfactory_db::connect_pool(&config.database_url, pool_config).await?;
    cfactory_db::run_migrations(&pool).await?;

    // Settle anything a previous process left mid-run before taking new work.
    let report = cfactory_pipeline::recover_interrupted(
        &pool,
        Duration::from_secs(config.stale_run_after_secs),
    )
    .await?;
    if !report.is_empty() {
        tracing::warn!(?report, "recovered interrupted work at startup");
    }

    let ctx = Arc::new(PipelineContext::from_app_config(pool.clone(), &config)?);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let worker = Worker::new(Arc::clone(&ctx), WorkerConfig::from_app_config(&config));
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    let _scheduler = scheduler::build_scheduler(pool.clone(), Arc::clone(&config)).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        cfactory_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        store: Arc::clone(&ctx.store),
        download_ttl: Duration::from_secs(config.download_url_ttl_secs),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("http server stopped; waiting for in-flight jobs");
    // Receivers treat a send error (worker already gone) like shutdown.
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "worker task panicked");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
