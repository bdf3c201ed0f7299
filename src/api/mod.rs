//! API client for the kiosk backend.

pub mod http;

pub use http::{ApiClient, ApiError, Catalog, UpdateCheck, VersionInfo};
