//! Application context: the shared services every screen is built from.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::backend::{HttpBackend, DEFAULT_BACKEND_URL};
use crate::catalog::{CatalogClient, HttpFetcher};
use crate::fonts::FontManager;
use crate::prefs::{keys, JsonFileHost, PreferenceStore, RfdDialogs};
use crate::settings::SettingsScreen;
use crate::style::StyleDocument;
use crate::theme::ThemeManager;
use crate::wizard::AssetBrowser;

/// Stylesheet written by theme and font commands
const STYLESHEET_NAME: &str = "frogtools.css";

/// Services shared across screens
pub struct AppContext {
    pub prefs: Arc<PreferenceStore>,
    pub backend: HttpBackend,
}

/// Backend URL precedence: explicit override, then the `BackendUrl`
/// preference, then the default
pub fn resolve_backend_url(explicit: Option<&str>, stored: Option<&str>) -> String {
    explicit
        .or(stored)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BACKEND_URL)
        .to_string()
}

impl AppContext {
    /// Open the preference file (default location unless `prefs_path` is
    /// given) with native pickers and connect to the backend
    pub async fn open(prefs_path: Option<PathBuf>, backend_url: Option<String>) -> Result<Self> {
        let host = match prefs_path {
            Some(path) => JsonFileHost::new(path),
            None => JsonFileHost::default_location().context("Failed to locate preferences")?,
        };
        debug!("Preferences at {}", host.path().display());
        let prefs = PreferenceStore::new(host).with_dialogs(RfdDialogs);
        Self::with_store(Arc::new(prefs), backend_url).await
    }

    /// Build around an existing store
    pub async fn with_store(prefs: Arc<PreferenceStore>, backend_url: Option<String>) -> Result<Self> {
        prefs.initialize().await;
        let stored = prefs.get_string(keys::BACKEND_URL).await;
        let url = resolve_backend_url(backend_url.as_deref(), stored.as_deref());
        info!("Backend at {}", url);
        let backend = HttpBackend::new(url)?;
        Ok(Self { prefs, backend })
    }

    pub fn asset_browser(&self) -> Result<AssetBrowser<HttpFetcher, HttpBackend>> {
        let catalog = CatalogClient::new(HttpFetcher::new()?);
        Ok(AssetBrowser::new(
            catalog,
            self.backend.clone(),
            Arc::clone(&self.prefs),
        ))
    }

    pub fn settings(&self) -> SettingsScreen<HttpBackend> {
        SettingsScreen::new(Arc::clone(&self.prefs), self.backend.clone())
    }

    pub fn themes(&self) -> ThemeManager {
        ThemeManager::new(Arc::clone(&self.prefs))
    }

    pub async fn fonts(&self) -> Result<FontManager> {
        FontManager::from_prefs(Arc::clone(&self.prefs)).await
    }

    /// Style document with the saved font and theme projected onto it
    pub async fn current_style(&self) -> Result<StyleDocument> {
        let mut doc = StyleDocument::new();
        self.fonts().await?.ensure_font_persistence(&mut doc).await;
        self.themes().apply_saved(&mut doc).await;
        Ok(doc)
    }
}

/// Default stylesheet location next to the preferences
pub fn default_stylesheet_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("frogtools").join(STYLESHEET_NAME))
}
