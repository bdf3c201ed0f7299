//! HTTP API client for the kiosk backend.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::config;
use crate::printer::{PrintOutcome, PrintRequest, PrinterDirectory};

/// The day's photos, grouped by photo ID. Each group holds the size and
/// crop variations of one shot, in backend order.
pub type Catalog = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server error: {0}")]
    Server(String),
    /// A failure the backend described itself; the message is user-facing
    #[error("{0}")]
    Backend(String),
}

/// Error payload shape the backend uses on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    erro: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error.or(self.message).or(self.erro)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub update_url: Option<String>,
    #[serde(default)]
    pub required_update: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCheck {
    pub status: String,
    #[serde(default)]
    pub current_version: String,
    #[serde(default)]
    pub latest_version: String,
    #[serde(default)]
    pub has_update: bool,
    #[serde(default)]
    pub required_update: bool,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub changelog: Vec<String>,
}

/// HTTP client for the kiosk backend API
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the day's photo catalog
    pub async fn fetch_catalog(&self) -> Result<Catalog, ApiError> {
        let url = config::images_url();
        log::info!("Loading catalog from {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let catalog: Catalog = response.json().await?;
        log::info!("Catalog loaded: {} photo groups", catalog.len());
        Ok(catalog)
    }

    /// Fetch image bytes from a URL
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        log::debug!("Fetching image from {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ApiError::Server(format!("Failed to fetch image: {}", status)));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// List the printers the backend knows about
    pub async fn list_printers(&self) -> Result<PrinterDirectory, ApiError> {
        let url = config::printers_url();
        log::info!("Loading printers from {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let directory: PrinterDirectory = response.json().await?;
        Ok(directory)
    }

    /// Submit one print job
    pub async fn submit_print(&self, request: &PrintRequest) -> Result<PrintOutcome, ApiError> {
        let url = config::print_url();
        log::info!(
            "Submitting print job for {} (printer: {})",
            request.image_path,
            request.printer_name
        );

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let outcome: PrintOutcome = response.json().await?;
        Ok(outcome)
    }

    /// Fetch the running backend version
    pub async fn version(&self) -> Result<VersionInfo, ApiError> {
        let url = config::version_url();
        log::debug!("Fetching version info from {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let info: VersionInfo = response.json().await?;
        Ok(info)
    }

    /// Ask the backend whether an update is available
    pub async fn check_update(&self) -> Result<UpdateCheck, ApiError> {
        let url = config::check_update_url();
        log::debug!("Checking for updates at {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let check: UpdateCheck = response.json().await?;
        Ok(check)
    }

    /// Turn a non-success response into an error, preferring the backend's
    /// own message when the body parses
    async fn error_from(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
        {
            Some(message) => ApiError::Backend(message),
            None => ApiError::Server(format!("{}: {}", status, body)),
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}
