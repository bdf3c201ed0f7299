//! Background version and update polling.
//!
//! Checks immediately at startup and then every 30 minutes. Failures are
//! logged and retried on the next cycle; the kiosk keeps running on the
//! version it has.

use tokio::sync::mpsc;

use crate::api::{ApiClient, UpdateCheck, VersionInfo};
use crate::config;

/// Events emitted by the poller
#[derive(Debug, Clone)]
pub enum UpdateEvent {
    VersionLoaded(VersionInfo),
    UpdateAvailable(UpdateCheck),
}

/// Handle for stopping the poller
pub struct UpdateHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl UpdateHandle {
    /// Stop the polling task
    pub async fn close(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Start the update poller and return its handle.
/// Uses a callback to hand events to the main loop.
pub fn start<F>(api: ApiClient, callback: F) -> UpdateHandle
where
    F: Fn(UpdateEvent) + Send + Sync + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        loop {
            check_once(&api, &callback).await;

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    log::info!("Update poller shutting down");
                    return;
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_millis(
                    config::UPDATE_CHECK_INTERVAL_MS
                )) => {}
            }
        }
    });

    UpdateHandle { shutdown_tx }
}

async fn check_once<F>(api: &ApiClient, callback: &F)
where
    F: Fn(UpdateEvent),
{
    // The update check only runs once the version endpoint answered.
    let info = match api.version().await {
        Ok(info) => info,
        Err(e) => {
            log::error!("Failed to fetch version info: {}", e);
            return;
        }
    };
    callback(UpdateEvent::VersionLoaded(info));

    match api.check_update().await {
        Ok(check) => {
            if check.status == "success" && check.has_update {
                log::info!(
                    "Update available: {} -> {}",
                    check.current_version,
                    check.latest_version
                );
                callback(UpdateEvent::UpdateAvailable(check));
            }
        }
        Err(e) => log::error!("Update check failed: {}", e),
    }
}
