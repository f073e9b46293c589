use std::fmt;

use engine_logging::engine_warn;
use serde::{Deserialize, Serialize};

/// Opaque task id issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }
}

/// One decoded answer of `GET /status/{task_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub output_file: Option<String>,
}

impl StatusReport {
    pub fn new(status: JobStatus, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status,
            progress: progress.min(100),
            message: message.into(),
            output_file: None,
        }
    }

    pub fn with_output(mut self, output_file: impl Into<String>) -> Self {
        self.output_file = Some(output_file.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub output_reference: Option<String>,
}

impl Job {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            message: "Processing started...".to_string(),
            output_reference: None,
        }
    }

    /// Applies a server report. A progress regression while active is logged and not applied.
    ///
    /// Returns `false` when the reported progress was rejected.
    pub fn apply(&mut self, report: &StatusReport) -> bool {
        let progress = report.progress.min(100);
        let accepted = if report.status.is_active() && progress < self.progress {
            engine_warn!(
                "Job {} reported progress {} after {}; keeping {}",
                self.id,
                progress,
                self.progress,
                self.progress
            );
            false
        } else {
            self.progress = progress;
            true
        };
        self.status = report.status;
        self.message = report.message.clone();
        if report.output_file.is_some() {
            self.output_reference = report.output_file.clone();
        }
        accepted
    }
}
