//! Process signal handling: shutdown (Ctrl+C, SIGTERM) and SIGHUP log level reload.

use std::path::PathBuf;

use tracing::{error, info};

use crate::app::logging::{level_to_filter, reload_filter};
use crate::config::persistence::load_config;

/// Resolves on the first Ctrl+C or (unix) SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to setup SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Shutdown signal received (Ctrl+C)"),
        () = terminate => info!("Shutdown signal received (SIGTERM)"),
    }
}

/// On SIGHUP, re-read `logging.log_level` from the config file and swap the filter.
#[cfg(unix)]
pub fn spawn_log_reload(config_path: Option<PathBuf>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGHUP handler: {}", e);
            return;
        }
    };

    tokio::spawn(async move {
        while sighup.recv().await.is_some() {
            info!("SIGHUP received, reloading log level configuration");

            let config = match load_config(config_path.as_deref()).await {
                Ok(c) => c,
                Err(e) => {
                    error!("Failed to reload config: {:#}", e);
                    continue;
                }
            };

            let level = config.logging.log_level;
            let filter = level_to_filter(&level).unwrap_or("info");
            match reload_filter(filter) {
                Ok(()) => info!("Log level reloaded: {}", level.to_uppercase()),
                Err(e) => error!("Failed to reload log level: {}", e),
            }
        }
    });
}

#[cfg(not(unix))]
pub fn spawn_log_reload(_config_path: Option<PathBuf>) {}
