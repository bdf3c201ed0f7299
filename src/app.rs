//! Application context - bridges the state machine with async services.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::config;
use crate::printer::{Notice, NoticeCallback, PrinterService};
use crate::state::{KioskCommand, KioskEvent, KioskStateMachine};
use crate::theme::Theme;

/// Messages sent from async tasks to the main event loop
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// Process a kiosk event through the state machine
    Event(KioskEvent),
    /// Prefetched photo bytes to stash in the context cache
    PhotoBytes { name: String, bytes: Vec<u8> },
}

/// Sender that can dispatch messages to the event loop from any task
#[derive(Clone)]
pub struct MessageSender {
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl MessageSender {
    pub fn send(&self, msg: AppMessage) {
        let _ = self.tx.send(msg);
    }
}

/// Application context - holds state and provides methods to interact with it
pub struct KioskContext {
    /// The UI-free state machine
    pub state_machine: RefCell<KioskStateMachine>,
    /// HTTP API client
    pub api: ApiClient,
    /// Print submission queue
    pub printer: PrinterService,
    /// Look selected at startup
    pub theme: Box<dyn Theme>,
    /// Prefetched photo bytes for the shell, keyed by file name
    photo_cache: RefCell<HashMap<String, Vec<u8>>>,
    /// Sender for dispatching messages to the event loop
    pub message_tx: MessageSender,
}

impl KioskContext {
    pub fn new(theme: Box<dyn Theme>) -> (Rc<Self>, mpsc::UnboundedReceiver<AppMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let message_tx = MessageSender { tx };

        let api = ApiClient::new();

        // Print-status notices flow back through the event loop so the
        // state machine owns their lifecycle.
        let notice_tx = message_tx.clone();
        let notices: NoticeCallback = Arc::new(move |notice: Notice| {
            notice_tx.send(AppMessage::Event(KioskEvent::NoticePosted { notice }));
        });
        let printer = PrinterService::new(Arc::new(api.clone()), notices);

        let ctx = Rc::new(Self {
            state_machine: RefCell::new(KioskStateMachine::new()),
            api,
            printer,
            theme,
            photo_cache: RefCell::new(HashMap::new()),
            message_tx,
        });

        (ctx, rx)
    }

    /// Send an event to the state machine (from any task)
    pub fn send_event(&self, event: KioskEvent) {
        self.message_tx.send(AppMessage::Event(event));
    }

    /// Bytes of a previously prefetched photo, if still cached
    pub fn cached_photo(&self, name: &str) -> Option<Vec<u8>> {
        self.photo_cache.borrow().get(name).cloned()
    }

    /// Handle one message from the event loop
    pub fn handle_message(self: &Rc<Self>, msg: AppMessage) {
        match msg {
            AppMessage::Event(event) => {
                self.process_event(event);
            }
            AppMessage::PhotoBytes { name, bytes } => {
                self.photo_cache.borrow_mut().insert(name.clone(), bytes);
                self.process_event(KioskEvent::PhotoFetched { name });
            }
        }
    }

    /// Process an event and execute resulting commands.
    /// This must be called from the event-loop task.
    pub fn process_event(self: &Rc<Self>, event: KioskEvent) -> Vec<KioskCommand> {
        let commands = self.state_machine.borrow_mut().process(event);

        for cmd in &commands {
            self.execute_command(cmd.clone());
        }

        commands
    }

    /// Execute a command from the state machine
    fn execute_command(self: &Rc<Self>, cmd: KioskCommand) {
        match cmd {
            KioskCommand::LoadCatalog => {
                let tx = self.message_tx.clone();
                let api = self.api.clone();

                tokio::spawn(async move {
                    match api.fetch_catalog().await {
                        Ok(catalog) => {
                            tx.send(AppMessage::Event(KioskEvent::CatalogLoaded { catalog }));
                        }
                        Err(e) => {
                            tx.send(AppMessage::Event(KioskEvent::CatalogFailed {
                                error: e.to_string(),
                            }));
                        }
                    }
                });
            }

            KioskCommand::FetchPhoto { name } => {
                if self.photo_cache.borrow().contains_key(&name) {
                    self.send_event(KioskEvent::PhotoFetched { name });
                    return;
                }

                let tx = self.message_tx.clone();
                let api = self.api.clone();

                tokio::spawn(async move {
                    match api.fetch_image(&config::photo_url(&name)).await {
                        Ok(bytes) => {
                            tx.send(AppMessage::PhotoBytes { name, bytes });
                        }
                        Err(e) => {
                            // Non-fatal: the shell falls back to loading the
                            // photo straight from its URL.
                            log::error!("Failed to prefetch photo {}: {}", name, e);
                        }
                    }
                });
            }

            KioskCommand::SubmitPrint { name } => {
                let tx = self.message_tx.clone();
                let job = self.printer.print_image(&name, None);

                tokio::spawn(async move {
                    match job.await {
                        Ok(_) => {
                            tx.send(AppMessage::Event(KioskEvent::PrintFinished));
                        }
                        Err(e) => {
                            tx.send(AppMessage::Event(KioskEvent::PrintFailed {
                                error: e.to_string(),
                            }));
                        }
                    }
                });
            }

            KioskCommand::ScheduleNoticeFade { id } => {
                let tx = self.message_tx.clone();

                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(config::NOTICE_DISPLAY_MS)).await;
                    tx.send(AppMessage::Event(KioskEvent::NoticeFading { id }));
                });
            }

            KioskCommand::ScheduleNoticeExpiry { id } => {
                let tx = self.message_tx.clone();

                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(config::NOTICE_FADE_MS)).await;
                    tx.send(AppMessage::Event(KioskEvent::NoticeExpired { id }));
                });
            }

            KioskCommand::RefreshUi => {
                // Rendering belongs to the embedding shell.
            }
        }
    }
}
