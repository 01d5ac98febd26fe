//! Extraction backend surface
//!
//! WAD parsing, hashing and repathing happen in an external process. This
//! module holds the request/response shapes it speaks and the [`Backend`]
//! trait the wizard and settings screen drive it through.

mod http;

pub use http::{HttpBackend, DEFAULT_BACKEND_URL};

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// `POST /api/extract-wad` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    pub wad_path: PathBuf,
    pub output_dir: PathBuf,
    pub skin_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chroma_id: Option<u64>,
    pub hash_path: PathBuf,
}

/// `POST /api/bumpath/repath` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepathRequest {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub selected_skin_ids: Vec<u32>,
    pub hash_path: PathBuf,
    pub ignore_missing: bool,
    pub combine_linked: bool,
    pub custom_prefix: String,
    pub process_together: bool,
}

/// Reply to an extract or repath request.
///
/// Success is implicit when neither `error` nor `cancelled` is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cancelled: bool,
}

/// Terminal result of one backend job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failed(String),
    /// Not a failure; halts the rest of the batch
    Cancelled,
}

impl JobResponse {
    pub fn ok() -> Self {
        Self {
            success: Some(true),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(message.into()),
            cancelled: false,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }

    pub fn outcome(&self) -> JobOutcome {
        if self.cancelled {
            return JobOutcome::Cancelled;
        }
        match (&self.error, self.success) {
            (Some(error), _) => JobOutcome::Failed(error.clone()),
            (None, Some(false)) => JobOutcome::Failed("Backend reported failure".to_string()),
            _ => JobOutcome::Success,
        }
    }
}

/// `GET /api/hashes/check` reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HashStatus {
    pub all_present: bool,
    pub missing: Vec<String>,
    pub directory: Option<PathBuf>,
}

/// `POST /api/hashes/download` reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HashDownloadReport {
    pub success: bool,
    pub downloaded: Vec<String>,
    pub errors: Vec<String>,
}

/// Update lifecycle notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum UpdateEvent {
    Checking,
    #[serde(rename_all = "camelCase")]
    Available {
        version: String,
        #[serde(default)]
        release_notes: Option<String>,
    },
    NotAvailable,
    Error {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    DownloadProgress {
        percent: f64,
        #[serde(default)]
        transferred: u64,
        #[serde(default)]
        total: u64,
    },
    Downloaded {
        version: String,
    },
}

impl UpdateEvent {
    /// Whether no further events follow for the current operation
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UpdateEvent::Checking | UpdateEvent::DownloadProgress { .. })
    }
}

/// Receives update events as they arrive
pub type UpdateSink = Arc<dyn Fn(UpdateEvent) + Send + Sync>;

/// Backend communication errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend request {route} failed: {message}")]
    Request { route: &'static str, message: String },

    #[error("Backend returned HTTP {status} for {route}: {body}")]
    Status {
        route: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unexpected reply from {route}: {message}")]
    Decode { route: &'static str, message: String },

    #[error("Update download did not finish")]
    UpdateStalled,
}

/// Operations the external backend exposes
pub trait Backend: Send + Sync {
    fn extract_wad(
        &self,
        request: &ExtractRequest,
    ) -> impl Future<Output = Result<JobResponse, BackendError>> + Send;

    fn repath(
        &self,
        request: &RepathRequest,
    ) -> impl Future<Output = Result<JobResponse, BackendError>> + Send;

    /// Fire-and-forget cancel of running jobs
    fn cancel_operations(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn hashes_directory(&self) -> impl Future<Output = Result<PathBuf, BackendError>> + Send;

    fn check_hashes(&self) -> impl Future<Output = Result<HashStatus, BackendError>> + Send;

    fn download_hashes(
        &self,
    ) -> impl Future<Output = Result<HashDownloadReport, BackendError>> + Send;

    fn restart(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn app_version(&self) -> impl Future<Output = Result<String, BackendError>> + Send;

    /// Resolves to `Available`, `NotAvailable` or `Error`
    fn check_update(&self) -> impl Future<Output = Result<UpdateEvent, BackendError>> + Send;

    /// Feeds progress to `sink` until `Downloaded` or `Error`
    fn download_update(
        &self,
        sink: UpdateSink,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn install_update(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording backend fake shared by wizard and settings tests

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::cancel::CancelToken;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Extract(ExtractRequest),
        Repath(RepathRequest),
        Cancel,
        HashesDirectory,
        CheckHashes,
        DownloadHashes,
        Restart,
        AppVersion,
        CheckUpdate,
        DownloadUpdate,
        InstallUpdate,
    }

    #[derive(Default)]
    struct Script {
        calls: Vec<Call>,
        extract_replies: VecDeque<Result<JobResponse, String>>,
        repath_replies: VecDeque<Result<JobResponse, String>>,
        cancel_after_extracts: Option<(usize, CancelToken)>,
        update_events: Vec<UpdateEvent>,
    }

    /// Records every call; replies default to success
    #[derive(Clone, Default)]
    pub struct RecordingBackend {
        script: Arc<Mutex<Script>>,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<Call> {
            self.script.lock().unwrap().calls.clone()
        }

        pub fn extracts(&self) -> Vec<ExtractRequest> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Extract(r) => Some(r),
                    _ => None,
                })
                .collect()
        }

        pub fn repaths(&self) -> Vec<RepathRequest> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Repath(r) => Some(r),
                    _ => None,
                })
                .collect()
        }

        pub fn reply_extract(&self, reply: Result<JobResponse, String>) {
            self.script.lock().unwrap().extract_replies.push_back(reply);
        }

        pub fn reply_repath(&self, reply: Result<JobResponse, String>) {
            self.script.lock().unwrap().repath_replies.push_back(reply);
        }

        /// Trip `token` once `count` extract calls have been served
        pub fn cancel_after_extracts(&self, count: usize, token: CancelToken) {
            self.script.lock().unwrap().cancel_after_extracts = Some((count, token));
        }

        pub fn with_update_events(self, events: Vec<UpdateEvent>) -> Self {
            self.script.lock().unwrap().update_events = events;
            self
        }

        fn record(&self, call: Call) {
            self.script.lock().unwrap().calls.push(call);
        }
    }

    fn to_backend_error(route: &'static str, message: String) -> BackendError {
        BackendError::Request { route, message }
    }

    impl Backend for RecordingBackend {
        async fn extract_wad(&self, request: &ExtractRequest) -> Result<JobResponse, BackendError> {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call::Extract(request.clone()));
            let served = script
                .calls
                .iter()
                .filter(|c| matches!(c, Call::Extract(_)))
                .count();
            if let Some((count, token)) = &script.cancel_after_extracts {
                if served >= *count {
                    token.cancel();
                }
            }
            match script.extract_replies.pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(message)) => Err(to_backend_error("extract", message)),
                None => Ok(JobResponse::ok()),
            }
        }

        async fn repath(&self, request: &RepathRequest) -> Result<JobResponse, BackendError> {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call::Repath(request.clone()));
            match script.repath_replies.pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(message)) => Err(to_backend_error("repath", message)),
                None => Ok(JobResponse::ok()),
            }
        }

        async fn cancel_operations(&self) -> Result<(), BackendError> {
            self.record(Call::Cancel);
            Ok(())
        }

        async fn hashes_directory(&self) -> Result<PathBuf, BackendError> {
            self.record(Call::HashesDirectory);
            Ok(PathBuf::from("/backend/hashes"))
        }

        async fn check_hashes(&self) -> Result<HashStatus, BackendError> {
            self.record(Call::CheckHashes);
            Ok(HashStatus {
                all_present: false,
                missing: vec!["hashes.game.txt".to_string()],
                directory: Some(PathBuf::from("/backend/hashes")),
            })
        }

        async fn download_hashes(&self) -> Result<HashDownloadReport, BackendError> {
            self.record(Call::DownloadHashes);
            Ok(HashDownloadReport {
                success: true,
                downloaded: vec!["hashes.game.txt".to_string()],
                errors: Vec::new(),
            })
        }

        async fn restart(&self) -> Result<(), BackendError> {
            self.record(Call::Restart);
            Ok(())
        }

        async fn app_version(&self) -> Result<String, BackendError> {
            self.record(Call::AppVersion);
            Ok("2.4.0".to_string())
        }

        async fn check_update(&self) -> Result<UpdateEvent, BackendError> {
            self.record(Call::CheckUpdate);
            Ok(UpdateEvent::Available {
                version: "2.5.0".to_string(),
                release_notes: None,
            })
        }

        async fn download_update(&self, sink: UpdateSink) -> Result<(), BackendError> {
            let events = {
                let mut script = self.script.lock().unwrap();
                script.calls.push(Call::DownloadUpdate);
                script.update_events.clone()
            };
            for event in events {
                sink(event);
            }
            Ok(())
        }

        async fn install_update(&self) -> Result<(), BackendError> {
            self.record(Call::InstallUpdate);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_request_wire_shape() {
        let request = ExtractRequest {
            wad_path: PathBuf::from("/league/Game/DATA/FINAL/Champions/Annie.wad.client"),
            output_dir: PathBuf::from("/out/Annie_1"),
            skin_id: 1,
            chroma_id: None,
            hash_path: PathBuf::from("/hashes"),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["wadPath"], "/league/Game/DATA/FINAL/Champions/Annie.wad.client");
        assert_eq!(value["skinId"], 1);
        assert!(value.get("chromaId").is_none());

        let with_chroma = ExtractRequest {
            chroma_id: Some(1012),
            ..request
        };
        assert_eq!(serde_json::to_value(&with_chroma).unwrap()["chromaId"], 1012);
    }

    #[test]
    fn test_repath_request_wire_shape() {
        let request = RepathRequest {
            source_dir: PathBuf::from("/src"),
            output_dir: PathBuf::from("/dst"),
            selected_skin_ids: vec![1, 3],
            hash_path: PathBuf::from("/hashes"),
            ignore_missing: true,
            combine_linked: true,
            custom_prefix: "bum".to_string(),
            process_together: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["selectedSkinIds"], json!([1, 3]));
        assert_eq!(value["customPrefix"], "bum");
        assert_eq!(value["processTogether"], true);
    }

    #[test]
    fn test_job_outcomes() {
        let implicit: JobResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(implicit.outcome(), JobOutcome::Success);

        let failed: JobResponse = serde_json::from_value(json!({"error": "no such wad"})).unwrap();
        assert_eq!(failed.outcome(), JobOutcome::Failed("no such wad".to_string()));

        let cancelled: JobResponse =
            serde_json::from_value(json!({"cancelled": true, "error": "stopped"})).unwrap();
        assert_eq!(cancelled.outcome(), JobOutcome::Cancelled);

        let unsuccessful: JobResponse = serde_json::from_value(json!({"success": false})).unwrap();
        assert!(matches!(unsuccessful.outcome(), JobOutcome::Failed(_)));
    }

    #[test]
    fn test_update_event_tags() {
        let event: UpdateEvent = serde_json::from_value(
            json!({"event": "download-progress", "percent": 42.5, "transferred": 10, "total": 20}),
        )
        .unwrap();
        assert_eq!(
            event,
            UpdateEvent::DownloadProgress {
                percent: 42.5,
                transferred: 10,
                total: 20
            }
        );
        assert!(!event.is_terminal());

        let event: UpdateEvent = serde_json::from_value(json!({"event": "not-available"})).unwrap();
        assert_eq!(event, UpdateEvent::NotAvailable);
        assert!(event.is_terminal());
    }
}
