//! Photo kiosk front end - wires the headless core to a running process.

use fotokiosk::app::{AppMessage, KioskContext};
use fotokiosk::state::KioskEvent;
use fotokiosk::updater::UpdateEvent;
use fotokiosk::{config, theme, updater};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting photo kiosk (backend: {})", config::api_base());

    let theme = theme::theme_for(&config::theme_name());
    log::info!("Theme: {}", theme.name());

    let (ctx, mut rx) = KioskContext::new(theme);

    // Kick off the initial catalog load.
    ctx.process_event(KioskEvent::Start);

    // Version and update polling, immediately and then every 30 minutes.
    let update_tx = ctx.message_tx.clone();
    let updates = updater::start(ctx.api.clone(), move |event| {
        let event = match event {
            UpdateEvent::VersionLoaded(info) => KioskEvent::VersionLoaded {
                version: info.version,
            },
            UpdateEvent::UpdateAvailable(check) => KioskEvent::UpdateAvailable { info: check },
        };
        update_tx.send(AppMessage::Event(event));
    });

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Some(msg) => ctx.handle_message(msg),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutdown requested");
                break;
            }
        }
    }

    updates.close().await;
    log::info!("Photo kiosk shutting down");
}
