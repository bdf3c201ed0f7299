//! Headless core of the photo kiosk front end.
//!
//! A display shell embeds this crate and owns the pixels; the core owns
//! state, ordering, and backend I/O:
//! - `state`: UI-free state machine with the business logic (testable)
//! - `app`: bridges the state machine to async operations
//! - `api`: typed HTTP client for the kiosk backend
//! - `printer`: FIFO print submission queue and printer directory
//! - `theme`: seasonal markup selected once at startup
//! - `updater`: periodic version and update polling

pub mod api;
pub mod app;
pub mod config;
pub mod printer;
pub mod state;
pub mod theme;
pub mod updater;
