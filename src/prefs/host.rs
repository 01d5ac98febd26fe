//! Host-side storage for the preference mapping.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use super::PrefsError;

/// Bulk key/value storage provided by the host
pub trait PrefsHost: Send + Sync {
    /// Read every stored preference
    fn load_all(&self) -> Result<Map<String, Value>, PrefsError>;

    /// Replace the stored mapping with `prefs`
    fn save_all(&self, prefs: &Map<String, Value>) -> Result<(), PrefsError>;
}

/// Preferences stored as pretty JSON on disk.
///
/// Default location is `~/.config/frogtools/prefs.json`.
#[derive(Debug, Clone)]
pub struct JsonFileHost {
    path: PathBuf,
}

impl JsonFileHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Host at the default per-user location
    pub fn default_location() -> Result<Self, PrefsError> {
        let dir = dirs::config_dir().ok_or(PrefsError::NoConfigDir)?;
        Ok(Self::new(dir.join("frogtools").join("prefs.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PrefsHost for JsonFileHost {
    fn load_all(&self) -> Result<Map<String, Value>, PrefsError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| PrefsError::Io {
            path: self.path.clone(),
            source,
        })?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PrefsError::NotAnObject(self.path.clone())),
            Err(source) => Err(PrefsError::Parse {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save_all(&self, prefs: &Map<String, Value>) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PrefsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(prefs).map_err(|source| PrefsError::Parse {
            path: self.path.clone(),
            source,
        })?;

        std::fs::write(&self.path, content).map_err(|source| PrefsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory host whose clones share one mapping.
///
/// Lets a test build a second store over the snapshot the first one
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    stored: Arc<Mutex<Map<String, Value>>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            stored: Arc::new(Mutex::new(values)),
        }
    }

    /// Copy of what has been persisted so far
    pub fn snapshot(&self) -> Map<String, Value> {
        self.stored
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl PrefsHost for MemoryHost {
    fn load_all(&self) -> Result<Map<String, Value>, PrefsError> {
        self.stored
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| PrefsError::HostUnavailable("memory host lock poisoned".into()))
    }

    fn save_all(&self, prefs: &Map<String, Value>) -> Result<(), PrefsError> {
        let mut guard = self
            .stored
            .lock()
            .map_err(|_| PrefsError::HostUnavailable("memory host lock poisoned".into()))?;
        *guard = prefs.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_json_host_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let host = JsonFileHost::new(temp.path().join("nested").join("prefs.json"));
        assert!(host.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_json_host_round_trip_creates_dirs() {
        let temp = TempDir::new().unwrap();
        let host = JsonFileHost::new(temp.path().join("nested").join("prefs.json"));

        let mut prefs = Map::new();
        prefs.insert("LeaguePath".into(), json!("/games/league"));
        host.save_all(&prefs).unwrap();

        assert!(host.path().exists());
        assert_eq!(host.load_all().unwrap(), prefs);
    }

    #[test]
    fn test_json_host_rejects_non_object() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prefs.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonFileHost::new(&path).load_all().unwrap_err();
        assert!(matches!(err, PrefsError::NotAnObject(_)));
    }
}
