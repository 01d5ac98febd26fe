//! Settings screen: a form over the preference store plus the auxiliary
//! backend actions (hash tables, restart, auto-update) and the GitHub check.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::activity::ActivityLog;
use crate::backend::{Backend, HashDownloadReport, HashStatus, UpdateEvent, UpdateSink};
use crate::github::{ConnectionStatus, GithubClient, GithubCredentials};
use crate::prefs::{keys, PreferenceStore};

/// Editable copy of every setting the screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub league_path: String,
    pub extraction_path: String,
    pub hashes_path: String,
    pub ritobin_path: String,
    pub backend_url: String,
    pub extract_voiceover: bool,
    pub auto_update: bool,
    /// Page visibility toggles keyed by preference name
    pub pages: BTreeMap<String, bool>,
    pub selected_font: String,
    pub theme_variant: String,
    pub github: GithubCredentials,
}

impl SettingsForm {
    pub async fn load(prefs: &PreferenceStore) -> Self {
        let text = |key: &'static str| async move { prefs.get_string(key).await.unwrap_or_default() };
        let flag = |key: &'static str| async move { prefs.get_bool(key).await.unwrap_or(true) };

        let mut pages = BTreeMap::new();
        for key in keys::PAGE_VISIBILITY {
            pages.insert(key.to_string(), flag(key).await);
        }

        Self {
            league_path: text(keys::LEAGUE_PATH).await,
            extraction_path: text(keys::EXTRACTION_PATH).await,
            hashes_path: text(keys::HASHES_PATH).await,
            ritobin_path: text(keys::RITOBIN_PATH).await,
            backend_url: text(keys::BACKEND_URL).await,
            extract_voiceover: flag(keys::EXTRACT_VOICEOVER).await,
            auto_update: flag(keys::AUTO_UPDATE_ENABLED).await,
            pages,
            selected_font: prefs
                .get_string(keys::SELECTED_FONT)
                .await
                .unwrap_or_else(|| keys::DEFAULT_FONT.to_string()),
            theme_variant: prefs
                .get_string(keys::THEME_VARIANT)
                .await
                .unwrap_or_else(|| keys::DEFAULT_THEME.to_string()),
            github: GithubCredentials {
                username: text(keys::GITHUB_USERNAME).await,
                token: text(keys::GITHUB_TOKEN).await,
                repo: text(keys::GITHUB_REPO).await,
            },
        }
    }

    /// Write every field back. Blank paths are stored as empty strings.
    pub async fn save(&self, prefs: &PreferenceStore) {
        let strings = [
            (keys::LEAGUE_PATH, &self.league_path),
            (keys::EXTRACTION_PATH, &self.extraction_path),
            (keys::HASHES_PATH, &self.hashes_path),
            (keys::RITOBIN_PATH, &self.ritobin_path),
            (keys::BACKEND_URL, &self.backend_url),
            (keys::SELECTED_FONT, &self.selected_font),
            (keys::THEME_VARIANT, &self.theme_variant),
            (keys::GITHUB_USERNAME, &self.github.username),
            (keys::GITHUB_TOKEN, &self.github.token),
            (keys::GITHUB_REPO, &self.github.repo),
        ];
        for (key, value) in strings {
            prefs.set(key, value.trim()).await;
        }

        prefs.set(keys::EXTRACT_VOICEOVER, self.extract_voiceover).await;
        prefs.set(keys::AUTO_UPDATE_ENABLED, self.auto_update).await;
        for (key, visible) in &self.pages {
            prefs.set(key, *visible).await;
        }
        debug!("Settings saved");
    }
}

/// Auto-update lifecycle as shown to the user
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UpdateStatus {
    #[default]
    Idle,
    Checking,
    Available {
        version: String,
        release_notes: Option<String>,
    },
    UpToDate,
    Downloading {
        percent: f64,
    },
    Downloaded {
        version: String,
    },
    Installing,
    Error(String),
}

impl UpdateStatus {
    /// Fold one backend event into the status
    pub fn apply(&mut self, event: &UpdateEvent) {
        *self = match event {
            UpdateEvent::Checking => UpdateStatus::Checking,
            UpdateEvent::Available {
                version,
                release_notes,
            } => UpdateStatus::Available {
                version: version.clone(),
                release_notes: release_notes.clone(),
            },
            UpdateEvent::NotAvailable => UpdateStatus::UpToDate,
            UpdateEvent::Error { message } => UpdateStatus::Error(message.clone()),
            UpdateEvent::DownloadProgress { percent, .. } => UpdateStatus::Downloading {
                percent: percent.clamp(0.0, 100.0),
            },
            UpdateEvent::Downloaded { version } => UpdateStatus::Downloaded {
                version: version.clone(),
            },
        };
    }
}

pub struct SettingsScreen<B> {
    prefs: Arc<PreferenceStore>,
    backend: B,
    log: ActivityLog,
    update: UpdateStatus,
}

impl<B: Backend> SettingsScreen<B> {
    pub fn new(prefs: Arc<PreferenceStore>, backend: B) -> Self {
        Self {
            prefs,
            backend,
            log: ActivityLog::default(),
            update: UpdateStatus::Idle,
        }
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn update_status(&self) -> &UpdateStatus {
        &self.update
    }

    pub async fn load_form(&self) -> SettingsForm {
        SettingsForm::load(&self.prefs).await
    }

    pub async fn save_form(&mut self, form: &SettingsForm) {
        form.save(&self.prefs).await;
        self.log.success("Settings saved");
    }

    /// Browse for a directory and store it under `key`
    pub async fn browse_directory(&mut self, key: &str, title: &str) -> Option<PathBuf> {
        let path = self.prefs.pick_directory_into(key, title).await?;
        self.log.info(format!("{} set to {}", key, path.display()));
        Some(path)
    }

    pub async fn browse_ritobin(&mut self) -> Option<PathBuf> {
        let path = self.prefs.select_ritobin_exe().await?;
        self.prefs
            .set(keys::RITOBIN_PATH, Value::String(path.to_string_lossy().into_owned()))
            .await;
        self.log.info(format!("ritobin set to {}", path.display()));
        Some(path)
    }

    pub async fn check_hashes(&mut self) -> Option<HashStatus> {
        match self.backend.check_hashes().await {
            Ok(status) => {
                if status.all_present {
                    self.log.success("All hash tables present");
                } else {
                    self.log.warn(format!(
                        "Missing hash tables: {}",
                        status.missing.join(", ")
                    ));
                }
                Some(status)
            }
            Err(e) => {
                self.log.error(format!("Hash check failed: {}", e));
                None
            }
        }
    }

    pub async fn download_hashes(&mut self) -> Option<HashDownloadReport> {
        self.log.info("Downloading hash tables...");
        match self.backend.download_hashes().await {
            Ok(report) => {
                for error in &report.errors {
                    self.log.error(format!("Hash download error: {}", error));
                }
                if report.success {
                    self.log.success(format!(
                        "Downloaded {} hash table(s)",
                        report.downloaded.len()
                    ));
                }
                Some(report)
            }
            Err(e) => {
                self.log.error(format!("Hash download failed: {}", e));
                None
            }
        }
    }

    /// Test the stored GitHub credentials against the repository API
    pub async fn test_github_connection(&mut self, github: &GithubClient) -> Option<ConnectionStatus> {
        let credentials = self.load_form().await.github;
        match github.test_connection(&credentials).await {
            Ok(status) => {
                match &status {
                    ConnectionStatus::Connected(repo) => {
                        self.log.success(format!("Connected to {}", repo.full_name))
                    }
                    ConnectionStatus::Unauthorized => {
                        self.log.error("GitHub token was rejected")
                    }
                    ConnectionStatus::NotFound => self.log.error(format!(
                        "Repository {} not found",
                        credentials.repo_path()
                    )),
                    ConnectionStatus::Unexpected(code) => {
                        self.log.error(format!("GitHub answered HTTP {}", code))
                    }
                }
                Some(status)
            }
            Err(e) => {
                self.log.error(e.to_string());
                None
            }
        }
    }

    pub async fn restart_backend(&mut self) -> bool {
        match self.backend.restart().await {
            Ok(()) => {
                self.log.info("Backend restarting");
                true
            }
            Err(e) => {
                self.log.error(format!("Backend restart failed: {}", e));
                false
            }
        }
    }

    pub async fn app_version(&mut self) -> Option<String> {
        match self.backend.app_version().await {
            Ok(version) => Some(version),
            Err(e) => {
                self.log.warn(format!("Could not read app version: {}", e));
                None
            }
        }
    }

    pub async fn check_for_updates(&mut self) -> &UpdateStatus {
        self.update.apply(&UpdateEvent::Checking);
        let event = match self.backend.check_update().await {
            Ok(event) => event,
            Err(e) => UpdateEvent::Error {
                message: e.to_string(),
            },
        };
        self.log_update_event(&event);
        self.update.apply(&event);
        &self.update
    }

    /// Check at startup when auto-update is enabled
    pub async fn auto_check(&mut self) -> Option<&UpdateStatus> {
        if !self
            .prefs
            .get_bool(keys::AUTO_UPDATE_ENABLED)
            .await
            .unwrap_or(true)
        {
            debug!("Auto-update disabled");
            return None;
        }
        Some(self.check_for_updates().await)
    }

    /// Download the pending update. Events are folded into the status and
    /// forwarded to `observer` as they arrive.
    pub async fn download_update(&mut self, observer: Option<UpdateSink>) -> &UpdateStatus {
        if !matches!(self.update, UpdateStatus::Available { .. }) {
            self.log.warn("No update available to download");
            return &self.update;
        }

        let folded = Arc::new(Mutex::new(self.update.clone()));
        let sink_status = Arc::clone(&folded);
        let sink: UpdateSink = Arc::new(move |event: UpdateEvent| {
            if let Ok(mut status) = sink_status.lock() {
                status.apply(&event);
            }
            if let Some(observer) = &observer {
                observer(event);
            }
        });

        let result = self.backend.download_update(sink).await;
        if let Ok(status) = folded.lock() {
            self.update = status.clone();
        }
        if let Err(e) = result {
            self.update = UpdateStatus::Error(e.to_string());
        }

        match &self.update {
            UpdateStatus::Downloaded { version } => {
                let message = format!("Update {} downloaded", version);
                self.log.success(message);
            }
            UpdateStatus::Error(message) => {
                let message = format!("Update download failed: {}", message);
                self.log.error(message);
            }
            _ => {}
        }
        &self.update
    }

    /// Install a downloaded update. The backend restarts the app.
    pub async fn install_update(&mut self) -> bool {
        if !matches!(self.update, UpdateStatus::Downloaded { .. }) {
            self.log.warn("No downloaded update to install");
            return false;
        }
        match self.backend.install_update().await {
            Ok(()) => {
                self.update = UpdateStatus::Installing;
                self.log.info("Installing update...");
                true
            }
            Err(e) => {
                self.log.error(format!("Update install failed: {}", e));
                false
            }
        }
    }

    fn log_update_event(&mut self, event: &UpdateEvent) {
        match event {
            UpdateEvent::Available { version, .. } => {
                self.log.info(format!("Update {} available", version))
            }
            UpdateEvent::NotAvailable => self.log.info("FrogTools is up to date"),
            UpdateEvent::Error { message } => {
                self.log.error(format!("Update check failed: {}", message))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{Call, RecordingBackend};
    use crate::prefs::{HostDialogs, MemoryHost};
    use std::path::Path;

    struct PickDir(&'static str);

    impl HostDialogs for PickDir {
        fn pick_directory(&self, _title: &str) -> Option<PathBuf> {
            Some(PathBuf::from(self.0))
        }

        fn pick_file(&self, _title: &str, _filter: &str, _ext: &[&str]) -> Option<PathBuf> {
            Some(Path::new(self.0).join("ritobin_cli"))
        }
    }

    #[tokio::test]
    async fn test_form_round_trip() {
        let host = MemoryHost::new();
        let prefs = PreferenceStore::new(host.clone());
        let mut form = SettingsForm::load(&prefs).await;
        assert_eq!(form.selected_font, keys::DEFAULT_FONT);
        assert_eq!(form.theme_variant, keys::DEFAULT_THEME);
        assert!(form.pages.values().all(|v| *v));

        form.league_path = "/games/league ".into();
        form.pages.insert(keys::SHOW_PAINT.to_string(), false);
        form.github.repo = "assets".into();
        form.save(&prefs).await;

        let reloaded = SettingsForm::load(&PreferenceStore::new(host)).await;
        assert_eq!(reloaded.league_path, "/games/league");
        assert_eq!(reloaded.pages[keys::SHOW_PAINT], false);
        assert_eq!(reloaded.pages[keys::SHOW_PORT], true);
        assert_eq!(reloaded.github.repo, "assets");
    }

    #[tokio::test]
    async fn test_browse_stores_picked_paths() {
        let prefs = Arc::new(PreferenceStore::in_memory().with_dialogs(PickDir("/picked")));
        let mut screen = SettingsScreen::new(prefs.clone(), RecordingBackend::new());

        screen.browse_directory(keys::EXTRACTION_PATH, "Output").await.unwrap();
        assert_eq!(
            prefs.get_path(keys::EXTRACTION_PATH).await,
            Some(PathBuf::from("/picked"))
        );

        screen.browse_ritobin().await.unwrap();
        assert_eq!(
            prefs.get_path(keys::RITOBIN_PATH).await,
            Some(PathBuf::from("/picked/ritobin_cli"))
        );
    }

    #[tokio::test]
    async fn test_hash_actions_log() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        let mut screen = SettingsScreen::new(prefs, RecordingBackend::new());

        let status = screen.check_hashes().await.unwrap();
        assert!(!status.all_present);
        assert!(screen.log().contains("hashes.game.txt"));

        let report = screen.download_hashes().await.unwrap();
        assert!(report.success);
        assert!(screen.log().contains("Downloaded 1 hash table(s)"));
    }

    #[tokio::test]
    async fn test_update_lifecycle() {
        let backend = RecordingBackend::new().with_update_events(vec![
            UpdateEvent::DownloadProgress {
                percent: 50.0,
                transferred: 5,
                total: 10,
            },
            UpdateEvent::Downloaded {
                version: "2.5.0".into(),
            },
        ]);
        let prefs = Arc::new(PreferenceStore::in_memory());
        let mut screen = SettingsScreen::new(prefs, backend.clone());

        assert!(!screen.install_update().await);

        let status = screen.check_for_updates().await.clone();
        assert!(matches!(status, UpdateStatus::Available { ref version, .. } if version == "2.5.0"));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_sink = seen.clone();
        let observer: UpdateSink = Arc::new(move |e: UpdateEvent| seen_sink.lock().unwrap().push(e));
        let status = screen.download_update(Some(observer)).await.clone();
        assert_eq!(
            status,
            UpdateStatus::Downloaded {
                version: "2.5.0".into()
            }
        );
        assert_eq!(seen.lock().unwrap().len(), 2);

        assert!(screen.install_update().await);
        assert_eq!(screen.update_status(), &UpdateStatus::Installing);
        assert!(backend.calls().contains(&Call::InstallUpdate));
    }

    #[tokio::test]
    async fn test_auto_check_respects_preference() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        prefs.set(keys::AUTO_UPDATE_ENABLED, false).await;
        let backend = RecordingBackend::new();
        let mut screen = SettingsScreen::new(prefs, backend.clone());
        assert!(screen.auto_check().await.is_none());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_status_folds_events() {
        let mut status = UpdateStatus::default();
        status.apply(&UpdateEvent::Checking);
        assert_eq!(status, UpdateStatus::Checking);
        status.apply(&UpdateEvent::NotAvailable);
        assert_eq!(status, UpdateStatus::UpToDate);
        status.apply(&UpdateEvent::DownloadProgress {
            percent: 140.0,
            transferred: 0,
            total: 0,
        });
        assert_eq!(status, UpdateStatus::Downloading { percent: 100.0 });
        status.apply(&UpdateEvent::Error {
            message: "offline".into(),
        });
        assert_eq!(status, UpdateStatus::Error("offline".into()));
    }
}
