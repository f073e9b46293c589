//! Workbench core: pure workflow state machine and view-model helpers.
mod effect;
mod error;
mod file;
mod job;
mod monitor;
mod msg;
mod notify;
mod operation;
mod options;
pub mod schema;
mod state;
mod update;
mod upload;
mod view_model;

pub use effect::{Effect, SubmitRequest};
pub use error::{ImportError, MonitorFailure, OptionError, PollError, SubmissionError, UploadError};
pub use file::{
    display_name_from_url, format_file_size, DeclaredKind, FileSource, FileType, ProbeInfo,
    UploadedFile, PLACEHOLDER_FILE_NAME,
};
pub use job::{Job, JobId, JobStatus, StatusReport};
pub use monitor::{JobMonitor, MonitorEvent, MonitorPhase, MonitorSettings};
pub use msg::Msg;
pub use notify::{NotificationSink, Region, Report, Severity, Toast, ToastId, DEFAULT_TOAST_DURATION};
pub use operation::{Operation, UnknownOperation};
pub use options::{OptionForm, OptionSet, OptionValue};
pub use state::{AppState, Generation, Stage};
pub use update::update;
pub use upload::{LocalFile, PendingUpload, UploadCoordinator, LARGE_FILE_WARNING_BYTES};
pub use view_model::{
    AppViewModel, FileRowView, JobView, OptionFieldView, ReportView, SlotView, ToastView,
};
