use serde::Deserialize;
use thiserror::Error;
use workbench_core::{
    DeclaredKind, Generation, ImportError, JobId, MonitorEvent, ProbeInfo, SubmissionError,
    UploadError, UploadedFile,
};

/// Results the engine reports back to the message loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UploadFinished {
        generation: Generation,
        result: Result<Vec<UploadedFile>, UploadError>,
    },
    UrlProbed {
        generation: Generation,
        url: String,
        declared: DeclaredKind,
        result: Result<ProbeInfo, ImportError>,
    },
    SubmissionFinished {
        generation: Generation,
        result: Result<JobId, SubmissionError>,
    },
    Monitor(MonitorEvent),
    CleanupFinished(Result<String, EngineError>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid server url: {0}")]
    InvalidBaseUrl(String),
    #[error("could not build http client: {0}")]
    Client(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server refused: {0}")]
    Rejected(String),
}

/// Error text of a failed envelope. FastAPI puts it in `detail`, Flask in `error`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorFields {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorFields {
    pub fn text(&self) -> Option<String> {
        if let Some(error) = self.error.as_ref().filter(|e| !e.is_empty()) {
            return Some(error.clone());
        }
        match &self.detail {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Option<Vec<UploadedFile>>,
    #[serde(flatten)]
    pub errors: ErrorFields,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProcessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(flatten)]
    pub errors: ErrorFields,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CleanupResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub errors: ErrorFields,
}
