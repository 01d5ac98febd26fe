//! GitHub repository connectivity check for the settings screen

use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

const API_BASE_URL: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Credentials as stored in preferences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GithubCredentials {
    pub username: String,
    pub token: String,
    pub repo: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GithubError {
    #[error("GitHub {0} is not set")]
    Missing(&'static str),

    #[error("Invalid repository name '{0}'")]
    InvalidRepo(String),

    #[error("GitHub request failed: {0}")]
    Request(String),
}

impl GithubCredentials {
    /// Every field present, repo a bare name
    pub fn validate(&self) -> Result<(), GithubError> {
        if self.username.trim().is_empty() {
            return Err(GithubError::Missing("username"));
        }
        if self.token.trim().is_empty() {
            return Err(GithubError::Missing("token"));
        }
        let repo = self.repo.trim();
        if repo.is_empty() {
            return Err(GithubError::Missing("repository"));
        }
        if repo.contains('/') || repo.chars().any(char::is_whitespace) {
            return Err(GithubError::InvalidRepo(repo.to_string()));
        }
        Ok(())
    }

    pub fn repo_path(&self) -> String {
        format!("{}/{}", self.username.trim(), self.repo.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: String,
}

/// Outcome of a connection test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected(RepoInfo),
    /// Token rejected (401) or lacking access (403)
    Unauthorized,
    NotFound,
    Unexpected(u16),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected(_))
    }

    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ConnectionStatus::Unauthorized,
            StatusCode::NOT_FOUND => ConnectionStatus::NotFound,
            other => ConnectionStatus::Unexpected(other.as_u16()),
        }
    }
}

pub struct GithubClient {
    client: Client,
    api_base: String,
}

impl GithubClient {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("frogtools/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base: API_BASE_URL.to_string(),
        })
    }

    pub fn repo_url(&self, credentials: &GithubCredentials) -> String {
        format!("{}/repos/{}", self.api_base, credentials.repo_path())
    }

    /// GET the repository with the token and report what came back
    pub async fn test_connection(
        &self,
        credentials: &GithubCredentials,
    ) -> Result<ConnectionStatus, GithubError> {
        credentials.validate()?;
        let url = self.repo_url(credentials);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(credentials.token.trim())
            .send()
            .await
            .map_err(|e| GithubError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(ConnectionStatus::from_status(status));
        }

        let repo: RepoInfo = response
            .json()
            .await
            .map_err(|e| GithubError::Request(e.to_string()))?;
        info!("GitHub repository {} reachable", repo.full_name);
        Ok(ConnectionStatus::Connected(repo))
    }
}
