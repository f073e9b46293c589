use std::time::Instant;

use crate::error::{ImportError, SubmissionError, UploadError};
use crate::file::{DeclaredKind, ProbeInfo};
use crate::monitor::MonitorEvent;
use crate::notify::ToastId;
use crate::upload::LocalFile;
use crate::{Generation, JobId, Operation, UploadedFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked an operation. Resets everything downstream.
    OperationSelected(Operation),
    /// User chose local files for an input slot.
    LocalFilesChosen { slot: String, files: Vec<LocalFile> },
    /// User clicked Upload.
    UploadClicked,
    /// Engine finished the batched upload.
    UploadFinished {
        generation: Generation,
        result: Result<Vec<UploadedFile>, UploadError>,
    },
    /// User asked to import a file by URL.
    UrlImportRequested { url: String, declared: DeclaredKind },
    /// Engine finished probing an imported URL.
    UrlProbed {
        generation: Generation,
        url: String,
        declared: DeclaredKind,
        result: Result<ProbeInfo, ImportError>,
    },
    /// User edited an option field (raw text, parsed at submission).
    OptionEdited { name: String, raw: String },
    /// User clicked Start Processing.
    SubmitClicked,
    /// Engine got an answer to the submission.
    SubmissionFinished {
        generation: Generation,
        result: Result<JobId, SubmissionError>,
    },
    /// Poll loop reported on the monitored job.
    Monitor(MonitorEvent),
    /// User stopped waiting for the running job.
    AbandonClicked,
    /// User closed a toast.
    ToastDismissed(ToastId),
    /// Periodic tick; expires toasts.
    Tick(Instant),
}

impl Msg {
    /// Job this message reports on, if any. Accepted submissions name their new job.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Msg::SubmissionFinished {
                result: Ok(job_id), ..
            } => Some(job_id),
            Msg::Monitor(event) => Some(event.job_id()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonitorFailure;

    #[test]
    fn accepted_submission_names_its_job() {
        let msg = Msg::SubmissionFinished {
            generation: 3,
            result: Ok(JobId::new("7f3a")),
        };
        assert_eq!(msg.job_id(), Some(&JobId::new("7f3a")));

        let rejected = Msg::SubmissionFinished {
            generation: 3,
            result: Err(SubmissionError::ValidationRejected("no audio stream".to_string())),
        };
        assert_eq!(rejected.job_id(), None);
    }

    #[test]
    fn monitor_events_name_their_job() {
        let msg = Msg::Monitor(MonitorEvent::Failed {
            job_id: JobId::new("7f3a"),
            failure: MonitorFailure::MonitoringLost { misses: 10 },
        });
        assert_eq!(msg.job_id(), Some(&JobId::new("7f3a")));
        assert_eq!(Msg::AbandonClicked.job_id(), None);
    }
}
