//! HTTP fallback transport to the local backend server

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{
    Backend, BackendError, ExtractRequest, HashDownloadReport, HashStatus, JobResponse,
    RepathRequest, UpdateEvent, UpdateSink,
};

/// Where the backend listens when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5001";

const EXTRACT_WAD: &str = "/api/extract-wad";
const REPATH: &str = "/api/bumpath/repath";
const CANCEL_OPERATIONS: &str = "/api/cancel-operations";
const HASHES_DIRECTORY: &str = "/api/hashes/directory";
const HASHES_CHECK: &str = "/api/hashes/check";
const HASHES_DOWNLOAD: &str = "/api/hashes/download";
const RESTART: &str = "/api/restart";
const UPDATE_VERSION: &str = "/api/update/version";
const UPDATE_CHECK: &str = "/api/update/check";
const UPDATE_DOWNLOAD: &str = "/api/update/download";
const UPDATE_PROGRESS: &str = "/api/update/progress";
const UPDATE_INSTALL: &str = "/api/update/install";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Polls before an update download is considered stuck (10 minutes)
const MAX_PROGRESS_POLLS: u32 = 1200;

#[derive(Deserialize)]
struct PathBody {
    path: PathBuf,
}

#[derive(Deserialize)]
struct VersionBody {
    version: String,
}

/// Backend reached over plain HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the server at `base_url`.
    ///
    /// No overall request timeout: extraction of a large WAD can take minutes.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("frogtools/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn get<T: DeserializeOwned>(&self, route: &'static str) -> Result<T, BackendError> {
        debug!("GET {}", route);
        let response = self
            .client
            .get(self.url(route))
            .send()
            .await
            .map_err(|e| request_error(route, e))?;
        decode(route, response).await
    }

    async fn post<B, T>(&self, route: &'static str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", route);
        let response = self
            .client
            .post(self.url(route))
            .json(body)
            .send()
            .await
            .map_err(|e| request_error(route, e))?;
        decode(route, response).await
    }

    /// POST without a body, ignoring whatever the server replies with
    async fn post_unit(&self, route: &'static str) -> Result<(), BackendError> {
        debug!("POST {}", route);
        let response = self
            .client
            .post(self.url(route))
            .send()
            .await
            .map_err(|e| request_error(route, e))?;
        check_status(route, response).await.map(|_| ())
    }
}

fn request_error(route: &'static str, e: reqwest::Error) -> BackendError {
    BackendError::Request {
        route,
        message: e.to_string(),
    }
}

async fn check_status(route: &'static str, response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        route,
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(
    route: &'static str,
    response: Response,
) -> Result<T, BackendError> {
    let response = check_status(route, response).await?;
    response.json::<T>().await.map_err(|e| BackendError::Decode {
        route,
        message: e.to_string(),
    })
}

impl Backend for HttpBackend {
    async fn extract_wad(&self, request: &ExtractRequest) -> Result<JobResponse, BackendError> {
        self.post(EXTRACT_WAD, request).await
    }

    async fn repath(&self, request: &RepathRequest) -> Result<JobResponse, BackendError> {
        self.post(REPATH, request).await
    }

    async fn cancel_operations(&self) -> Result<(), BackendError> {
        self.post_unit(CANCEL_OPERATIONS).await
    }

    async fn hashes_directory(&self) -> Result<PathBuf, BackendError> {
        let body: PathBody = self.get(HASHES_DIRECTORY).await?;
        Ok(body.path)
    }

    async fn check_hashes(&self) -> Result<HashStatus, BackendError> {
        self.get(HASHES_CHECK).await
    }

    async fn download_hashes(&self) -> Result<HashDownloadReport, BackendError> {
        self.post(HASHES_DOWNLOAD, &serde_json::json!({})).await
    }

    async fn restart(&self) -> Result<(), BackendError> {
        self.post_unit(RESTART).await
    }

    async fn app_version(&self) -> Result<String, BackendError> {
        let body: VersionBody = self.get(UPDATE_VERSION).await?;
        Ok(body.version)
    }

    async fn check_update(&self) -> Result<UpdateEvent, BackendError> {
        self.post(UPDATE_CHECK, &serde_json::json!({})).await
    }

    /// Starts the download, then polls progress until a terminal event.
    async fn download_update(&self, sink: UpdateSink) -> Result<(), BackendError> {
        self.post_unit(UPDATE_DOWNLOAD).await?;

        let mut last_percent = None;
        for _ in 0..MAX_PROGRESS_POLLS {
            let event: UpdateEvent = self.get(UPDATE_PROGRESS).await?;
            let terminal = event.is_terminal();

            // Only forward progress when it moved
            if let UpdateEvent::DownloadProgress { percent, .. } = &event {
                if last_percent == Some(*percent) {
                    sleep(PROGRESS_POLL_INTERVAL).await;
                    continue;
                }
                last_percent = Some(*percent);
            }

            sink(event);
            if terminal {
                return Ok(());
            }
            sleep(PROGRESS_POLL_INTERVAL).await;
        }

        warn!("Update download still running after {} polls", MAX_PROGRESS_POLLS);
        Err(BackendError::UpdateStalled)
    }

    async fn install_update(&self) -> Result<(), BackendError> {
        self.post_unit(UPDATE_INSTALL).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let backend = HttpBackend::new("http://127.0.0.1:5001/").unwrap();
        assert_eq!(backend.base_url(), DEFAULT_BACKEND_URL);
        assert_eq!(
            backend.url(EXTRACT_WAD),
            "http://127.0.0.1:5001/api/extract-wad"
        );
    }

    #[tokio::test]
    #[ignore] // Requires a running backend
    async fn test_live_backend_version() {
        let backend = HttpBackend::new(DEFAULT_BACKEND_URL).unwrap();
        let version = backend.app_version().await.unwrap();
        assert!(!version.is_empty());
    }
}
