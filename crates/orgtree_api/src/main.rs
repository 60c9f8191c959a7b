//! `orgtree-server` entry point.

use anyhow::{Context, Result};
use log::{error, info};
use orgtree_api::config::Settings;
use orgtree_api::{router, AppState};
use tower_http::timeout::TimeoutLayer;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;

    let log_dir = settings
        .log_dir()
        .context("failed to resolve log directory")?
        .map(|dir| dir.to_string_lossy().into_owned());
    orgtree_core::init_logging(settings.effective_log_level(), log_dir.as_deref())
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    if let Err(err) = run(settings).await {
        error!("event=server_start module=api status=error error={err:#}");
        return Err(err);
    }
    Ok(())
}

async fn run(settings: Settings) -> Result<()> {
    let conn = settings
        .database
        .open()
        .with_context(|| format!("failed to open database `{}`", settings.database.path))?;

    let app = router(AppState::new(conn)).layer(TimeoutLayer::new(settings.request_timeout()));

    let listener = tokio::net::TcpListener::bind(&settings.http.address)
        .await
        .with_context(|| format!("failed to bind `{}`", settings.http.address))?;

    info!(
        "event=server_start module=api status=ok env={} address={} request_timeout_secs={}",
        settings.env.as_str(),
        settings.http.address,
        settings.http.request_timeout_secs
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("event=server_stop module=api status=ok");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("event=shutdown_signal module=api status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("event=shutdown_signal module=api status=error signal=sigterm error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("event=shutdown_signal module=api status=ok signal=ctrl_c");
        }
        _ = terminate => {
            info!("event=shutdown_signal module=api status=ok signal=sigterm");
        }
    }
}
