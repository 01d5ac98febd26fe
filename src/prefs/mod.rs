//! Preference store
//!
//! A flat mapping of named settings, initialised lazily from a host
//! key/value store and persisted in full after every change. When the host
//! cannot be read or written the in-memory mapping stays the source of
//! truth for the rest of the session.

mod dialogs;
mod host;
pub mod keys;

pub use dialogs::{HostDialogs, RfdDialogs};
pub use host::{JsonFileHost, MemoryHost, PrefsHost};

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, warn};

/// Preference storage errors
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid preferences JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Preferences file {0} does not contain a JSON object")]
    NotAnObject(PathBuf),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Preference host unavailable: {0}")]
    HostUnavailable(String),
}

/// Process-wide settings, passed explicitly to every screen that needs them
pub struct PreferenceStore {
    host: Option<Box<dyn PrefsHost>>,
    dialogs: Option<Arc<dyn HostDialogs>>,
    values: RwLock<Map<String, Value>>,
    ready: OnceCell<()>,
}

impl PreferenceStore {
    /// Store backed by a host
    pub fn new(host: impl PrefsHost + 'static) -> Self {
        Self {
            host: Some(Box::new(host)),
            dialogs: None,
            values: RwLock::new(Map::new()),
            ready: OnceCell::new(),
        }
    }

    /// Store with no host: defaults only, nothing persisted
    pub fn in_memory() -> Self {
        Self {
            host: None,
            dialogs: None,
            values: RwLock::new(Map::new()),
            ready: OnceCell::new(),
        }
    }

    /// Attach native pickers for the path helpers
    pub fn with_dialogs(mut self, dialogs: impl HostDialogs + 'static) -> Self {
        self.dialogs = Some(Arc::new(dialogs));
        self
    }

    /// Populate the mapping from the host. Safe to call repeatedly.
    pub async fn initialize(&self) {
        self.ready
            .get_or_init(|| async {
                let stored = match &self.host {
                    Some(host) => match host.load_all() {
                        Ok(stored) => {
                            debug!("Loaded {} stored preferences", stored.len());
                            stored
                        }
                        Err(e) => {
                            warn!("Could not load preferences: {}. Using defaults.", e);
                            Map::new()
                        }
                    },
                    None => Map::new(),
                };
                *self.values.write().await = keys::merge_with_defaults(stored);
            })
            .await;
    }

    /// Current value of `key`, `None` for unknown keys
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.initialize().await;
        self.values.read().await.get(key).cloned()
    }

    /// Non-empty string value of `key`
    pub async fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key).await {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }

    pub async fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).await.and_then(|v| v.as_bool())
    }

    pub async fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get_string(key).await.map(PathBuf::from)
    }

    /// Update `key` and persist the whole mapping
    pub async fn set(&self, key: &str, value: impl Into<Value>) {
        self.initialize().await;
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value.into());
        // Saved under the write lock so concurrent writers reach the host in order
        self.persist(&values);
    }

    /// Drop `key` and persist the whole mapping
    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.initialize().await;
        let mut values = self.values.write().await;
        let removed = values.remove(key);
        if removed.is_some() {
            self.persist(&values);
        }
        removed
    }

    /// Copy of the full mapping
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.initialize().await;
        self.values.read().await.clone()
    }

    /// Ask the host for a directory. `None` on cancel or without a picker.
    pub async fn select_directory(&self, title: &str) -> Option<PathBuf> {
        let dialogs = self.dialogs.clone()?;
        let title = title.to_string();
        match tokio::task::spawn_blocking(move || dialogs.pick_directory(&title)).await {
            Ok(path) => path,
            Err(e) => {
                warn!("Directory picker failed: {}", e);
                None
            }
        }
    }

    /// Ask the host for the ritobin executable
    pub async fn select_ritobin_exe(&self) -> Option<PathBuf> {
        let dialogs = self.dialogs.clone()?;
        let picked = tokio::task::spawn_blocking(move || {
            let extensions: &[&str] = if cfg!(windows) { &["exe"] } else { &[] };
            dialogs.pick_file("Select ritobin_cli executable", "Executable", extensions)
        })
        .await;
        match picked {
            Ok(path) => path,
            Err(e) => {
                warn!("File picker failed: {}", e);
                None
            }
        }
    }

    /// Pick a directory and store it under `key`. Returns the stored path.
    pub async fn pick_directory_into(&self, key: &str, title: &str) -> Option<PathBuf> {
        let path = self.select_directory(title).await?;
        self.set(key, path.to_string_lossy().to_string()).await;
        Some(path)
    }

    fn persist(&self, snapshot: &Map<String, Value>) {
        let Some(host) = &self.host else {
            return;
        };
        if let Err(e) = host.save_all(snapshot) {
            warn!("Failed to persist preferences: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    struct BrokenHost;

    impl PrefsHost for BrokenHost {
        fn load_all(&self) -> Result<Map<String, Value>, PrefsError> {
            Err(PrefsError::HostUnavailable("offline".into()))
        }

        fn save_all(&self, _prefs: &Map<String, Value>) -> Result<(), PrefsError> {
            Err(PrefsError::HostUnavailable("offline".into()))
        }
    }

    struct FixedDialogs;

    impl HostDialogs for FixedDialogs {
        fn pick_directory(&self, _title: &str) -> Option<PathBuf> {
            Some(PathBuf::from("/picked/dir"))
        }

        fn pick_file(&self, _title: &str, _filter: &str, _ext: &[&str]) -> Option<PathBuf> {
            None
        }
    }

    #[tokio::test]
    async fn test_unknown_key_reads_none() {
        let store = PreferenceStore::in_memory();
        assert_eq!(store.get("NoSuchKey").await, None);
        assert_eq!(store.get_bool(keys::SHOW_PAINT).await, Some(true));
    }

    #[tokio::test]
    async fn test_set_get_survives_reinitialisation() {
        let host = MemoryHost::new();
        let values = [
            (keys::LEAGUE_PATH, json!("/games/League of Legends")),
            (keys::SHOW_PORT, json!(false)),
            (keys::THEME_VARIANT, json!("custom:Swamp")),
            (
                keys::CUSTOM_THEMES,
                json!({"Swamp": {"accent": "#33aa55", "bg": "#0b140d"}}),
            ),
            (keys::SELECTED_FONT, json!("JetBrainsMono-Regular")),
        ];

        let store = PreferenceStore::new(host.clone());
        for (key, value) in &values {
            store.set(key, value.clone()).await;
            assert_eq!(store.get(key).await.as_ref(), Some(value));
        }

        let reloaded = PreferenceStore::new(host.clone());
        for (key, value) in &values {
            assert_eq!(reloaded.get(key).await.as_ref(), Some(value));
        }
    }

    #[tokio::test]
    async fn test_every_set_persists_whole_mapping() {
        let host = MemoryHost::new();
        let store = PreferenceStore::new(host.clone());
        store.set(keys::LEAGUE_PATH, "/a").await;

        let persisted = host.snapshot();
        assert_eq!(persisted.get(keys::LEAGUE_PATH), Some(&json!("/a")));
        // Defaults are written alongside the changed key
        assert_eq!(persisted.get(keys::THEME_VARIANT), Some(&json!("onyx")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sets_all_reach_host() {
        let host = MemoryHost::new();
        let store = Arc::new(PreferenceStore::new(host.clone()));
        store.initialize().await;

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.set(&format!("Key{}", i), i).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let persisted = host.snapshot();
        for i in 0..32 {
            assert_eq!(persisted.get(&format!("Key{}", i)), Some(&json!(i)));
        }
    }

    #[tokio::test]
    async fn test_host_failure_keeps_memory_authoritative() {
        let store = PreferenceStore::new(BrokenHost);
        assert_eq!(store.get_string(keys::SELECTED_FONT).await.as_deref(), Some("system"));

        store.set(keys::EXTRACTION_PATH, "/out").await;
        assert_eq!(store.get_path(keys::EXTRACTION_PATH).await.as_deref(), Some(Path::new("/out")));
    }

    #[tokio::test]
    async fn test_remove_key() {
        let host = MemoryHost::new();
        let store = PreferenceStore::new(host.clone());
        store.set(keys::GITHUB_TOKEN, "ghp_x").await;
        assert!(store.remove(keys::GITHUB_TOKEN).await.is_some());
        assert_eq!(store.get(keys::GITHUB_TOKEN).await, None);
        assert!(!host.snapshot().contains_key(keys::GITHUB_TOKEN));
    }

    #[tokio::test]
    async fn test_empty_string_is_not_a_path() {
        let store = PreferenceStore::in_memory();
        store.set(keys::LEAGUE_PATH, "   ").await;
        assert_eq!(store.get_path(keys::LEAGUE_PATH).await, None);
    }

    #[tokio::test]
    async fn test_directory_picker_helpers() {
        let store = PreferenceStore::in_memory();
        assert_eq!(store.select_directory("Pick").await, None);

        let store = PreferenceStore::in_memory().with_dialogs(FixedDialogs);
        let picked = store.pick_directory_into(keys::EXTRACTION_PATH, "Pick").await;
        assert_eq!(picked, Some(PathBuf::from("/picked/dir")));
        assert_eq!(
            store.get_string(keys::EXTRACTION_PATH).await.as_deref(),
            Some("/picked/dir")
        );
        assert_eq!(store.select_ritobin_exe().await, None);
    }
}
