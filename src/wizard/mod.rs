//! Asset browser: catalog browsing, skin selection, and the extract and
//! repath workflows driven through the backend.
//!
//! Flow:
//! 1. `load_catalog`     Idle -> LoadingCatalog -> Browsing
//! 2. `select_champion`  skins of one champion, chromas on demand
//! 3. `toggle_selection` build the ordered selection list
//! 4. `extract_selected` one backend extract per selection
//! 5. `begin_repath` -> prefix steps -> `run_repath`
//!
//! Every action logs its own failures to the activity log; missing
//! configuration additionally raises a blocking alert.

mod extract;
mod prefix;
mod repath;
mod selection;

pub use extract::{champions_dir, main_wad, output_dir, voiceover_wads};
pub use prefix::{PrefixError, PrefixMap, PrefixStep, PrefixTarget, PrefixWizard, DEFAULT_PREFIX};
pub use repath::{ChampionJob, RepathJobSpec};
pub use selection::{Selection, SelectionList, SelectionSpec, SelectionSpecError};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::activity::{ActivityLog, Alert};
use crate::backend::{Backend, JobOutcome};
use crate::cancel::CancelToken;
use crate::catalog::{urls, CatalogClient, CatalogError, Champion, Chroma, JsonFetcher, Skin};
use crate::prefs::{keys, PreferenceStore};

/// Pause between extracting a champion's WAD and repathing it
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub settle_delay: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Status of one extraction entry or one repathed champion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Running,
    Done,
    Failed(String),
    Cancelled,
}

impl ItemStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, ItemStatus::Pending | ItemStatus::Running)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::Running => write!(f, "running"),
            ItemStatus::Done => write!(f, "done"),
            ItemStatus::Failed(msg) => write!(f, "failed: {}", msg),
            ItemStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProgress {
    pub label: String,
    pub status: ItemStatus,
}

/// Single source of truth for what the browser is doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Idle,
    LoadingCatalog,
    Browsing,
    Extracting { progress_by_item: Vec<ItemProgress> },
    AwaitingPrefixes { step: usize, total: usize },
    Repathing { progress_by_champion: Vec<ItemProgress> },
    Cancelled,
}

impl WizardState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WizardState::LoadingCatalog
                | WizardState::Extracting { .. }
                | WizardState::Repathing { .. }
        )
    }

    fn items_mut(&mut self) -> Option<&mut Vec<ItemProgress>> {
        match self {
            WizardState::Extracting { progress_by_item } => Some(progress_by_item),
            WizardState::Repathing {
                progress_by_champion,
            } => Some(progress_by_champion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Extract,
    Repath,
}

/// Emitted whenever an entry changes status
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub status: ItemStatus,
}

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Final per-entry results of an extract or repath run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub items: Vec<ItemProgress>,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn count(&self, pred: impl Fn(&ItemStatus) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.status)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| *s == ItemStatus::Done)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Failed(_)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Nothing selected")]
    NothingSelected,

    #[error("{0} is not set. Configure it in Settings.")]
    MissingConfig(&'static str),

    #[error("Hash tables are not available: {0}")]
    NoHashes(String),

    #[error("No champion selected")]
    NoChampion,

    #[error("Unknown champion '{0}'")]
    UnknownChampion(String),

    #[error("{champion} has no skin {skin}")]
    UnknownSkin { champion: String, skin: u32 },

    #[error("Skin {skin} has no chroma {chroma}")]
    UnknownChroma { skin: String, chroma: u64 },

    #[error("Prefix selection is not open")]
    NoPrefixWizard,

    #[error("Another operation is running")]
    Busy,

    #[error(transparent)]
    Prefix(#[from] PrefixError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Cancels a running batch from outside the `&mut` borrow that drives it
#[derive(Clone)]
pub struct CancelHandle<B> {
    token: CancelToken,
    backend: B,
}

impl<B: Backend> CancelHandle<B> {
    /// Stop scheduling further entries and tell the backend, best effort
    pub async fn cancel(&self) {
        self.token.cancel();
        if let Err(e) = self.backend.cancel_operations().await {
            warn!("Backend cancel request failed: {}", e);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Paths every backend job needs
struct JobPaths {
    league: PathBuf,
    extraction: PathBuf,
    hashes: PathBuf,
}

pub struct AssetBrowser<F, B> {
    catalog: CatalogClient<F>,
    backend: B,
    prefs: Arc<PreferenceStore>,
    config: WizardConfig,
    log: ActivityLog,
    alerts: Vec<Alert>,
    cancel: CancelToken,
    state: WizardState,
    progress: Option<ProgressCallback>,
    version: Option<String>,
    champions: Vec<Champion>,
    current: Option<Champion>,
    skins: Vec<Skin>,
    selection: SelectionList,
    repath: Option<(RepathJobSpec, PrefixWizard)>,
}

impl<F: JsonFetcher, B: Backend> AssetBrowser<F, B> {
    pub fn new(catalog: CatalogClient<F>, backend: B, prefs: Arc<PreferenceStore>) -> Self {
        Self {
            catalog,
            backend,
            prefs,
            config: WizardConfig::default(),
            log: ActivityLog::default(),
            alerts: Vec::new(),
            cancel: CancelToken::new(),
            state: WizardState::Idle,
            progress: None,
            version: None,
            champions: Vec::new(),
            current: None,
            skins: Vec::new(),
            selection: SelectionList::new(),
            repath: None,
        }
    }

    pub fn with_config(mut self, config: WizardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Hand pending alerts to the caller for display
    pub fn take_alerts(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }

    pub fn champions(&self) -> &[Champion] {
        &self.champions
    }

    pub fn current_champion(&self) -> Option<&Champion> {
        self.current.as_ref()
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    pub fn selection(&self) -> &SelectionList {
        &self.selection
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel_handle(&self) -> CancelHandle<B>
    where
        B: Clone,
    {
        CancelHandle {
            token: self.cancel.clone(),
            backend: self.backend.clone(),
        }
    }

    fn alert(&mut self, title: &str, message: impl Into<String>) {
        let alert = Alert::new(title, message);
        warn!("{}", alert);
        self.alerts.push(alert);
    }

    fn settle_state(&mut self, cancelled: bool) {
        self.state = if cancelled {
            WizardState::Cancelled
        } else if self.champions.is_empty() {
            WizardState::Idle
        } else {
            WizardState::Browsing
        };
    }

    fn set_item(&mut self, phase: Phase, index: usize, status: ItemStatus) {
        let Some(items) = self.state.items_mut() else {
            return;
        };
        let total = items.len();
        let Some(item) = items.get_mut(index) else {
            return;
        };
        item.status = status.clone();
        let label = item.label.clone();
        if let Some(cb) = &self.progress {
            cb(ProgressEvent {
                phase,
                index,
                total,
                label,
                status,
            });
        }
    }

    fn cancel_remaining(&mut self, phase: Phase, from: usize) {
        let total = self.state.items_mut().map(|i| i.len()).unwrap_or(0);
        for index in from..total {
            self.set_item(phase, index, ItemStatus::Cancelled);
        }
    }

    fn finish_run(&mut self, cancelled: bool) -> RunSummary {
        let items = self.state.items_mut().map(std::mem::take).unwrap_or_default();
        self.selection.clear();
        self.settle_state(cancelled);
        RunSummary { items, cancelled }
    }

    /// Fetch the champion list (retried) and the current patch version
    pub async fn load_catalog(&mut self) -> Result<&[Champion], WizardError> {
        if self.state.is_busy() {
            return Err(WizardError::Busy);
        }
        self.state = WizardState::LoadingCatalog;
        self.log.info("Loading champion catalog...");

        match self.catalog.champions().await {
            Ok(champions) => {
                self.log
                    .success(format!("Loaded {} champions", champions.len()));
                self.champions = champions;
                self.state = WizardState::Browsing;
            }
            Err(e) => {
                self.log.error(format!("Failed to load champions: {}", e));
                self.alert("Catalog unavailable", e.to_string());
                self.state = WizardState::Idle;
                return Err(e.into());
            }
        }

        match self.catalog.latest_version().await {
            Ok(version) => {
                debug!("Latest patch {}", version);
                self.version = Some(version);
            }
            Err(e) => self.log.warn(format!("Could not fetch patch version: {}", e)),
        }
        Ok(&self.champions)
    }

    /// Icon URL for `champion`, once the patch version is known
    pub fn champion_icon(&self, champion: &Champion) -> Option<String> {
        let version = self.version.as_deref()?;
        Some(urls::champion_icon_url(version, &champion.alias))
    }

    /// Look a champion up by name, alias or id, ignoring case
    pub fn find_champion(&self, query: &str) -> Option<&Champion> {
        let query = query.trim();
        self.champions.iter().find(|c| {
            c.id == query
                || c.name.eq_ignore_ascii_case(query)
                || c.alias.eq_ignore_ascii_case(query)
        })
    }

    /// Make `champion` current and load its skins
    pub async fn select_champion(&mut self, champion: &Champion) -> Result<&[Skin], WizardError> {
        match self.catalog.skins_for(champion).await {
            Ok(skins) => {
                debug!("{} has {} skins", champion.name, skins.len());
                self.skins = skins;
                self.current = Some(champion.clone());
                Ok(&self.skins)
            }
            Err(e) => {
                self.log
                    .error(format!("Failed to load skins for {}: {}", champion.name, e));
                Err(e.into())
            }
        }
    }

    /// Chromas of a skin of the current champion; empty on failure
    pub async fn chromas_for(&mut self, skin: &Skin) -> Vec<Chroma> {
        let Some(champion) = self.current.clone() else {
            return Vec::new();
        };
        match self.catalog.chromas_for(&champion, skin).await {
            Ok(chromas) => chromas,
            Err(e) => {
                self.log
                    .warn(format!("Could not load chromas for {}: {}", skin.name, e));
                Vec::new()
            }
        }
    }

    /// Select or deselect a skin (or chroma) of the current champion.
    /// Returns whether it is selected afterwards.
    pub fn toggle_selection(
        &mut self,
        skin: &Skin,
        chroma: Option<&Chroma>,
    ) -> Result<bool, WizardError> {
        let champion = self.current.clone().ok_or(WizardError::NoChampion)?;
        let selection = Selection::new(champion, skin.clone(), chroma.cloned());
        Ok(self.selection.toggle(selection))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.repath = None;
        if matches!(self.state, WizardState::AwaitingPrefixes { .. }) {
            self.settle_state(false);
        }
    }

    /// Resolve a `champion:skin[:chroma]` spec and add it to the selection
    pub async fn select_spec(&mut self, spec: &SelectionSpec) -> Result<Selection, WizardError> {
        let champion = self
            .find_champion(&spec.champion)
            .cloned()
            .ok_or_else(|| WizardError::UnknownChampion(spec.champion.clone()))?;
        let skin = self
            .select_champion(&champion)
            .await?
            .iter()
            .find(|s| s.id == spec.skin)
            .cloned()
            .ok_or_else(|| WizardError::UnknownSkin {
                champion: champion.name.clone(),
                skin: spec.skin,
            })?;

        let chroma = match spec.chroma {
            Some(id) => Some(
                self.chromas_for(&skin)
                    .await
                    .into_iter()
                    .find(|c| c.id == id)
                    .ok_or_else(|| WizardError::UnknownChroma {
                        skin: skin.name.clone(),
                        chroma: id,
                    })?,
            ),
            None => None,
        };

        let selection = Selection::new(champion, skin, chroma);
        self.selection.insert(selection.clone());
        Ok(selection)
    }

    /// League and extraction paths, alerting when either is missing
    async fn required_paths(&mut self) -> Result<(PathBuf, PathBuf), WizardError> {
        let Some(league) = self.prefs.get_path(keys::LEAGUE_PATH).await else {
            self.alert(
                "League path not set",
                "Set the League of Legends folder in Settings before extracting.",
            );
            return Err(WizardError::MissingConfig("League path"));
        };
        let Some(extraction) = self.prefs.get_path(keys::EXTRACTION_PATH).await else {
            self.alert(
                "Extraction path not set",
                "Set an extraction output folder in Settings before extracting.",
            );
            return Err(WizardError::MissingConfig("Extraction path"));
        };
        Ok((league, extraction))
    }

    /// `HashesPath` preference, else the backend's own hash directory
    async fn hash_path(&mut self) -> Result<PathBuf, WizardError> {
        if let Some(path) = self.prefs.get_path(keys::HASHES_PATH).await {
            return Ok(path);
        }
        match self.backend.hashes_directory().await {
            Ok(path) => {
                debug!("Using backend hash directory {}", path.display());
                Ok(path)
            }
            Err(e) => {
                self.log.error(format!("Could not locate hash tables: {}", e));
                self.alert(
                    "Hash tables missing",
                    "Download hash tables in Settings or set a hashes folder.",
                );
                Err(WizardError::NoHashes(e.to_string()))
            }
        }
    }

    async fn job_paths(&mut self) -> Result<JobPaths, WizardError> {
        let (league, extraction) = self.required_paths().await?;
        let hashes = self.hash_path().await?;
        Ok(JobPaths {
            league,
            extraction,
            hashes,
        })
    }

    /// Extract every selection in order, one backend call each, plus its
    /// voiceover WADs when enabled
    pub async fn extract_selected(&mut self) -> Result<RunSummary, WizardError> {
        if self.state.is_busy() {
            return Err(WizardError::Busy);
        }
        if self.selection.is_empty() {
            self.log.warn("No skins selected for extraction");
            return Err(WizardError::NothingSelected);
        }
        let paths = self.job_paths().await?;
        let voiceover = self
            .prefs
            .get_bool(keys::EXTRACT_VOICEOVER)
            .await
            .unwrap_or(false);

        let selections = self.selection.as_slice().to_vec();
        self.cancel.reset();
        self.state = WizardState::Extracting {
            progress_by_item: selections
                .iter()
                .map(|s| ItemProgress {
                    label: s.label(),
                    status: ItemStatus::Pending,
                })
                .collect(),
        };
        info!("Extracting {} selection(s)", selections.len());

        let mut cancelled = false;
        for (index, selection) in selections.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.log.warn("Extraction cancelled");
                self.cancel_remaining(Phase::Extract, index);
                cancelled = true;
                break;
            }

            self.set_item(Phase::Extract, index, ItemStatus::Running);
            let label = selection.label();
            let wad = main_wad(&paths.league, &selection.champion);
            let request = extract::extract_request(selection, wad, &paths.extraction, &paths.hashes);

            let status = match self.backend.extract_wad(&request).await {
                Ok(response) => match response.outcome() {
                    JobOutcome::Success => {
                        self.log.success(format!("Extracted {}", label));
                        if voiceover {
                            self.extract_voiceovers(selection, &paths).await
                        } else {
                            ItemStatus::Done
                        }
                    }
                    JobOutcome::Failed(msg) => {
                        self.log.error(format!("Failed to extract {}: {}", label, msg));
                        ItemStatus::Failed(msg)
                    }
                    JobOutcome::Cancelled => {
                        self.log.warn(format!("Extraction of {} cancelled", label));
                        ItemStatus::Cancelled
                    }
                },
                Err(e) => {
                    self.log.error(format!("Failed to extract {}: {}", label, e));
                    ItemStatus::Failed(e.to_string())
                }
            };

            let halted = status == ItemStatus::Cancelled;
            self.set_item(Phase::Extract, index, status);
            if halted {
                self.cancel_remaining(Phase::Extract, index + 1);
                cancelled = true;
                break;
            }
        }

        let summary = self.finish_run(cancelled);
        self.log.info(format!(
            "Extraction finished: {} done, {} failed",
            summary.succeeded(),
            summary.failed()
        ));
        Ok(summary)
    }

    async fn extract_voiceovers(&mut self, selection: &Selection, paths: &JobPaths) -> ItemStatus {
        let wads = voiceover_wads(&paths.league, &selection.champion);
        if wads.is_empty() {
            debug!("No voiceover WADs for {}", selection.champion.name);
            return ItemStatus::Done;
        }

        let mut failures = 0;
        for wad in wads {
            if self.cancel.is_cancelled() {
                return ItemStatus::Cancelled;
            }
            let file = wad
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let request = extract::extract_request(selection, wad, &paths.extraction, &paths.hashes);
            match self.backend.extract_wad(&request).await.map(|r| r.outcome()) {
                Ok(JobOutcome::Success) => self.log.info(format!("Extracted voiceover {}", file)),
                Ok(JobOutcome::Cancelled) => return ItemStatus::Cancelled,
                Ok(JobOutcome::Failed(msg)) => {
                    failures += 1;
                    self.log.warn(format!("Voiceover {} failed: {}", file, msg));
                }
                Err(e) => {
                    failures += 1;
                    self.log.warn(format!("Voiceover {} failed: {}", file, e));
                }
            }
        }

        if failures == 0 {
            ItemStatus::Done
        } else {
            ItemStatus::Failed(format!("{} voiceover file(s) failed", failures))
        }
    }

    /// Group the selection by champion and open prefix entry.
    /// Returns the number of prefix steps.
    pub async fn begin_repath(&mut self) -> Result<usize, WizardError> {
        if self.state.is_busy() {
            return Err(WizardError::Busy);
        }
        if self.selection.is_empty() {
            self.log.warn("No skins selected for repath");
            return Err(WizardError::NothingSelected);
        }
        self.required_paths().await?;

        let job = RepathJobSpec::from_selections(self.selection.as_slice());
        let wizard = PrefixWizard::new(job.prefix_targets())?;
        let total = wizard.total();
        self.repath = Some((job, wizard));
        self.state = WizardState::AwaitingPrefixes { step: 0, total };
        Ok(total)
    }

    pub fn prefix_wizard(&self) -> Option<&PrefixWizard> {
        self.repath.as_ref().map(|(_, w)| w)
    }

    fn prefix_wizard_mut(&mut self) -> Result<&mut PrefixWizard, WizardError> {
        self.repath
            .as_mut()
            .map(|(_, w)| w)
            .ok_or(WizardError::NoPrefixWizard)
    }

    fn sync_prefix_state(&mut self) {
        if let Some((_, wizard)) = &self.repath {
            self.state = WizardState::AwaitingPrefixes {
                step: wizard.step(),
                total: wizard.total(),
            };
        }
    }

    pub fn set_prefix_input(&mut self, input: &str) -> Result<(), WizardError> {
        self.prefix_wizard_mut()?.set_input(input);
        Ok(())
    }

    pub fn submit_prefix(&mut self) -> Result<PrefixStep, WizardError> {
        let step = self.prefix_wizard_mut()?.submit();
        self.sync_prefix_state();
        Ok(step)
    }

    pub fn prefix_back(&mut self) -> Result<bool, WizardError> {
        let moved = self.prefix_wizard_mut()?.back();
        self.sync_prefix_state();
        Ok(moved)
    }

    pub fn apply_prefix_to_remaining(&mut self) -> Result<PrefixStep, WizardError> {
        let step = self.prefix_wizard_mut()?.apply_to_remaining();
        self.sync_prefix_state();
        Ok(step)
    }

    /// Close prefix entry without running anything
    pub fn abandon_repath(&mut self) {
        if self.repath.take().is_some() {
            self.log.info("Repath closed");
            self.settle_state(false);
        }
    }

    /// Extract then repath each champion with the collected prefixes
    pub async fn run_repath(&mut self) -> Result<RunSummary, WizardError> {
        let prefixes = match &self.repath {
            Some((_, wizard)) => wizard.finish()?,
            None => return Err(WizardError::NoPrefixWizard),
        };
        let paths = match self.job_paths().await {
            Ok(paths) => paths,
            Err(e) => {
                self.abandon_repath();
                return Err(e);
            }
        };
        let Some((job, _)) = self.repath.take() else {
            return Err(WizardError::NoPrefixWizard);
        };

        self.cancel.reset();
        self.state = WizardState::Repathing {
            progress_by_champion: job
                .champions
                .iter()
                .map(|c| ItemProgress {
                    label: c.champion.name.clone(),
                    status: ItemStatus::Pending,
                })
                .collect(),
        };
        info!("Repathing {} champion(s)", job.champions.len());

        let mut cancelled = false;
        for (index, champ) in job.champions.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.log.warn("Repath cancelled");
                self.cancel_remaining(Phase::Repath, index);
                cancelled = true;
                break;
            }
            self.set_item(Phase::Repath, index, ItemStatus::Running);

            let status = self.repath_champion(champ, &prefixes, &paths).await;
            let halted = status == ItemStatus::Cancelled;
            self.set_item(Phase::Repath, index, status);
            if halted {
                self.cancel_remaining(Phase::Repath, index + 1);
                cancelled = true;
                break;
            }
        }

        let summary = self.finish_run(cancelled);
        self.log.info(format!(
            "Repath finished: {} done, {} failed",
            summary.succeeded(),
            summary.failed()
        ));
        Ok(summary)
    }

    async fn repath_champion(
        &mut self,
        job: &ChampionJob,
        prefixes: &PrefixMap,
        paths: &JobPaths,
    ) -> ItemStatus {
        let name = &job.champion.name;
        let Some(first) = job.skins.first() else {
            return ItemStatus::Done;
        };

        // One archive covers every skin of the champion
        let request = crate::backend::ExtractRequest {
            wad_path: main_wad(&paths.league, &job.champion),
            output_dir: job.source_dir(&paths.extraction),
            skin_id: first.id,
            chroma_id: None,
            hash_path: paths.hashes.clone(),
        };
        match self.backend.extract_wad(&request).await.map(|r| r.outcome()) {
            Ok(JobOutcome::Success) => self.log.info(format!("Extracted {} for repath", name)),
            Ok(JobOutcome::Cancelled) => {
                self.log.warn(format!("Repath of {} cancelled", name));
                return ItemStatus::Cancelled;
            }
            Ok(JobOutcome::Failed(msg)) => {
                self.log.error(format!("Failed to extract {}: {}", name, msg));
                return ItemStatus::Failed(msg);
            }
            Err(e) => {
                self.log.error(format!("Failed to extract {}: {}", name, e));
                return ItemStatus::Failed(e.to_string());
            }
        }

        sleep(self.config.settle_delay).await;

        let distinct = job.distinct_prefixes(prefixes);
        let prefix = distinct
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        if distinct.len() > 1 {
            // Only one prefix reaches the backend per champion
            self.log.warn(format!(
                "Mixed prefixes for {}: {}; using '{}'",
                name,
                distinct.join(", "),
                prefix
            ));
        }

        let request = job.repath_request(&paths.extraction, &paths.hashes, &prefix);
        match self.backend.repath(&request).await.map(|r| r.outcome()) {
            Ok(JobOutcome::Success) => {
                self.log
                    .success(format!("Repathed {} with prefix '{}'", name, prefix));
                ItemStatus::Done
            }
            Ok(JobOutcome::Cancelled) => {
                self.log.warn(format!("Repath of {} cancelled", name));
                ItemStatus::Cancelled
            }
            Ok(JobOutcome::Failed(msg)) => {
                self.log.error(format!("Repath of {} failed: {}", name, msg));
                ItemStatus::Failed(msg)
            }
            Err(e) => {
                self.log.error(format!("Repath of {} failed: {}", name, e));
                ItemStatus::Failed(e.to_string())
            }
        }
    }

    /// Stop the current run at the next entry and tell the backend
    pub async fn cancel(&mut self) {
        self.cancel.cancel();
        self.repath = None;
        self.state = WizardState::Cancelled;
        self.log.warn("Cancelling...");
        if let Err(e) = self.backend.cancel_operations().await {
            self.log.warn(format!("Backend cancel request failed: {}", e));
        }
    }
}
