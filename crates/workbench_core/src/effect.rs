use serde::Serialize;

use crate::file::DeclaredKind;
use crate::upload::PendingUpload;
use crate::{Generation, JobId, Operation, OptionSet, UploadedFile};

/// Body of `POST /process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitRequest {
    pub operation: Operation,
    pub files: Vec<UploadedFile>,
    pub options: OptionSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    UploadFiles {
        generation: Generation,
        files: Vec<PendingUpload>,
    },
    ProbeUrl {
        generation: Generation,
        url: String,
        declared: DeclaredKind,
    },
    SubmitJob {
        generation: Generation,
        request: SubmitRequest,
    },
    StartMonitor {
        job_id: JobId,
    },
    CancelMonitor {
        job_id: JobId,
    },
}
