//! Configuration constants for the photo kiosk.

use once_cell::sync::Lazy;

/// Backend base URL used when `KIOSK_API_BASE` is unset
pub const DEFAULT_API_BASE: &str = "http://localhost:5000";

/// Theme used when `KIOSK_THEME` is unset
pub const DEFAULT_THEME: &str = "default";

/// Print-status notice display duration before the fade starts, in milliseconds
pub const NOTICE_DISPLAY_MS: u64 = 3000;

/// Print-status notice fade-out duration in milliseconds
pub const NOTICE_FADE_MS: u64 = 500;

/// Interval between update checks in milliseconds (30 minutes)
pub const UPDATE_CHECK_INTERVAL_MS: u64 = 30 * 60 * 1000;

/// Bounded wait for a single print submission in milliseconds
pub const PRINT_SUBMIT_TIMEOUT_MS: u64 = 30_000;

/// Bounded wait for the printer directory load in milliseconds
pub const DIRECTORY_LOAD_TIMEOUT_MS: u64 = 10_000;

static API_BASE: Lazy<String> = Lazy::new(|| {
    let raw = std::env::var("KIOSK_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
    match url::Url::parse(&raw) {
        Ok(_) => raw.trim_end_matches('/').to_string(),
        Err(e) => {
            log::warn!(
                "Invalid KIOSK_API_BASE '{}' ({}), using {}",
                raw,
                e,
                DEFAULT_API_BASE
            );
            DEFAULT_API_BASE.to_string()
        }
    }
});

/// Base URL for HTTP API calls
pub fn api_base() -> &'static str {
    &API_BASE
}

/// Theme name selected at startup
pub fn theme_name() -> String {
    std::env::var("KIOSK_THEME").unwrap_or_else(|_| DEFAULT_THEME.to_string())
}

/// Build the photo catalog URL
pub fn images_url() -> String {
    format!("{}/api/images", api_base())
}

/// Build the printer listing URL
pub fn printers_url() -> String {
    format!("{}/api/printers", api_base())
}

/// Build the print submission URL
pub fn print_url() -> String {
    format!("{}/api/print", api_base())
}

/// Build the version info URL
pub fn version_url() -> String {
    format!("{}/api/version", api_base())
}

/// Build the update check URL
pub fn check_update_url() -> String {
    format!("{}/api/check-update", api_base())
}

/// Build the full URL for a photo reference.
///
/// Accepts an absolute URL, a backend-relative path, or a bare file name.
pub fn photo_url(reference: &str) -> String {
    if reference.starts_with("http") {
        reference.to_string()
    } else if reference.starts_with('/') {
        format!("{}{}", api_base(), reference)
    } else {
        format!("{}/imagens/{}", api_base(), reference)
    }
}
