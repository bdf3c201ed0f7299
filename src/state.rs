//! UI-free state machine and business logic.
//!
//! This module contains the pure Rust state machine that can be tested
//! independently of any display shell. The shell observes state changes
//! and renders accordingly; all catalog and selection state that the old
//! front end kept in module-level globals lives here, in one value.

use crate::api::{Catalog, UpdateCheck};
use crate::printer::Notice;

/// Top-level kiosk states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KioskState {
    /// Catalog fetch in progress
    Loading,
    /// Catalog loaded, the visitor can browse and print
    Browsing,
    /// Catalog loaded but no photos exist for today
    Empty,
    /// Catalog fetch failed
    Failed,
}

/// Phase of a transient print-status notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticePhase {
    Visible,
    Fading,
}

/// A notice currently on screen
#[derive(Debug, Clone)]
pub struct ActiveNotice {
    pub id: u64,
    pub notice: Notice,
    pub phase: NoticePhase,
}

/// Events that drive the kiosk
#[derive(Debug, Clone)]
pub enum KioskEvent {
    /// Begin (or retry) loading the catalog
    Start,

    // Backend responses
    CatalogLoaded { catalog: Catalog },
    CatalogFailed { error: String },
    /// Bytes for a photo landed in the context cache
    PhotoFetched { name: String },

    // Visitor actions
    SelectGroup { id: String },
    SelectVariant { name: String },
    PrintPressed,

    // Print queue results
    PrintFinished,
    PrintFailed { error: String },

    // Print-status notices
    NoticePosted { notice: Notice },
    NoticeFading { id: u64 },
    NoticeExpired { id: u64 },

    // Version and update polling
    VersionLoaded { version: String },
    UpdateAvailable { info: UpdateCheck },
    UpdateBannerClosed,
}

/// Commands emitted by the state machine for the context/shell to execute
#[derive(Debug, Clone)]
pub enum KioskCommand {
    /// Fetch the catalog from the backend
    LoadCatalog,
    /// Prefetch the displayed photo's bytes
    FetchPhoto { name: String },
    /// Queue a print job for the displayed photo
    SubmitPrint { name: String },
    /// Start the fade timer for a notice
    ScheduleNoticeFade { id: u64 },
    /// Start the removal timer for a fading notice
    ScheduleNoticeExpiry { id: u64 },
    /// Tell the shell to re-render
    RefreshUi,
}

/// The kiosk state machine
#[derive(Debug)]
pub struct KioskStateMachine {
    pub state: KioskState,
    pub catalog: Catalog,
    pub selected_group: Option<String>,
    /// Size/crop variations of the selected group
    pub variants: Vec<String>,
    /// File shown in the main view
    pub displayed: Option<String>,
    /// A submission started from the print button is still pending
    pub printing: bool,
    /// Message for the shell's blocking failure alert
    pub last_print_error: Option<String>,
    pub notices: Vec<ActiveNotice>,
    next_notice_id: u64,
    /// Backend version shown in the footer
    pub version: String,
    pub update: Option<UpdateCheck>,
    pub error: Option<String>,
}

impl Default for KioskStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl KioskStateMachine {
    pub fn new() -> Self {
        Self {
            state: KioskState::Loading,
            catalog: Catalog::new(),
            selected_group: None,
            variants: Vec::new(),
            displayed: None,
            printing: false,
            last_print_error: None,
            notices: Vec::new(),
            next_notice_id: 0,
            version: "1.0.0".to_string(),
            update: None,
            error: None,
        }
    }

    /// Process an event and return commands to execute
    pub fn process(&mut self, event: KioskEvent) -> Vec<KioskCommand> {
        let mut commands = Vec::new();

        match event {
            KioskEvent::Start => {
                if matches!(self.state, KioskState::Loading | KioskState::Failed) {
                    self.state = KioskState::Loading;
                    self.error = None;
                    commands.push(KioskCommand::LoadCatalog);
                    commands.push(KioskCommand::RefreshUi);
                }
            }

            KioskEvent::CatalogLoaded { catalog } => {
                self.catalog = catalog;
                if self.catalog.is_empty() {
                    self.state = KioskState::Empty;
                } else {
                    self.state = KioskState::Browsing;
                    // The first group opens automatically.
                    if let Some(id) = self.catalog.keys().next().cloned() {
                        self.apply_group_selection(&id, &mut commands);
                    }
                }
                commands.push(KioskCommand::RefreshUi);
            }

            KioskEvent::CatalogFailed { error } => {
                self.state = KioskState::Failed;
                self.error = Some(error);
                commands.push(KioskCommand::RefreshUi);
            }

            KioskEvent::PhotoFetched { name } => {
                if self.displayed.as_deref() == Some(name.as_str()) {
                    commands.push(KioskCommand::RefreshUi);
                }
            }

            KioskEvent::SelectGroup { id } => {
                if self.state == KioskState::Browsing && self.apply_group_selection(&id, &mut commands)
                {
                    commands.push(KioskCommand::RefreshUi);
                }
            }

            KioskEvent::SelectVariant { name } => {
                if self.state == KioskState::Browsing && self.variants.contains(&name) {
                    self.displayed = Some(name.clone());
                    commands.push(KioskCommand::FetchPhoto { name });
                    commands.push(KioskCommand::RefreshUi);
                }
            }

            KioskEvent::PrintPressed => {
                if self.state == KioskState::Browsing && !self.printing {
                    if let Some(name) = self.displayed.clone() {
                        self.printing = true;
                        self.last_print_error = None;
                        commands.push(KioskCommand::SubmitPrint { name });
                        commands.push(KioskCommand::RefreshUi);
                    }
                }
            }

            KioskEvent::PrintFinished => {
                self.printing = false;
                commands.push(KioskCommand::RefreshUi);
            }

            KioskEvent::PrintFailed { error } => {
                self.printing = false;
                self.last_print_error = Some(error);
                commands.push(KioskCommand::RefreshUi);
            }

            KioskEvent::NoticePosted { notice } => {
                let id = self.next_notice_id;
                self.next_notice_id += 1;
                self.notices.push(ActiveNotice {
                    id,
                    notice,
                    phase: NoticePhase::Visible,
                });
                commands.push(KioskCommand::ScheduleNoticeFade { id });
                commands.push(KioskCommand::RefreshUi);
            }

            KioskEvent::NoticeFading { id } => {
                if let Some(active) = self.notices.iter_mut().find(|n| n.id == id) {
                    if active.phase == NoticePhase::Visible {
                        active.phase = NoticePhase::Fading;
                        commands.push(KioskCommand::ScheduleNoticeExpiry { id });
                        commands.push(KioskCommand::RefreshUi);
                    }
                }
            }

            KioskEvent::NoticeExpired { id } => {
                let before = self.notices.len();
                self.notices.retain(|n| n.id != id);
                if self.notices.len() != before {
                    commands.push(KioskCommand::RefreshUi);
                }
            }

            KioskEvent::VersionLoaded { version } => {
                self.version = version;
                commands.push(KioskCommand::RefreshUi);
            }

            KioskEvent::UpdateAvailable { info } => {
                self.update = Some(info);
                commands.push(KioskCommand::RefreshUi);
            }

            KioskEvent::UpdateBannerClosed => {
                if self.update.take().is_some() {
                    commands.push(KioskCommand::RefreshUi);
                }
            }
        }

        commands
    }

    /// Select a group and display its first variation. Returns false for
    /// unknown group IDs.
    fn apply_group_selection(&mut self, id: &str, commands: &mut Vec<KioskCommand>) -> bool {
        let variants = match self.catalog.get(id) {
            Some(variants) => variants.clone(),
            None => return false,
        };

        self.selected_group = Some(id.to_string());
        self.variants = variants;
        self.displayed = self.variants.first().cloned();
        if let Some(name) = self.displayed.clone() {
            commands.push(KioskCommand::FetchPhoto { name });
        }
        true
    }
}
