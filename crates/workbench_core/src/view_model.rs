use crate::file::format_file_size;
use crate::notify::{Region, Severity, ToastId};
use crate::schema::{option_fields_for, slots_for, MediaKind, OptionKind};
use crate::{AppState, FileSource, FileType, JobId, JobStatus, Operation, Stage};

/// Everything a renderer needs. Derived from [`AppState`], never edited directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub stage: Stage,
    pub operation: Option<Operation>,
    pub slots: Vec<SlotView>,
    pub option_fields: Vec<OptionFieldView>,
    pub files: Vec<FileRowView>,
    pub job: Option<JobView>,
    pub output_file: Option<String>,
    pub failure: Option<String>,
    pub show_upload_section: bool,
    pub show_options_section: bool,
    pub show_processing_section: bool,
    pub show_results_section: bool,
    pub can_upload: bool,
    pub can_import_url: bool,
    pub can_submit: bool,
    pub can_abandon: bool,
    pub uploading: bool,
    pub importing: bool,
    pub toasts: Vec<ToastView>,
    pub reports: Vec<ReportView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: MediaKind,
    pub multiple: bool,
    pub pending: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionFieldView {
    pub name: &'static str,
    pub label: &'static str,
    /// What the user typed, or the default rendered as text.
    pub value: String,
    pub choices: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub name: String,
    pub file_type: FileType,
    pub size_label: String,
    pub source: FileSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastView {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportView {
    pub region: Region,
    pub message: String,
    pub severity: Severity,
}

impl AppViewModel {
    pub(crate) fn project(state: &AppState, dirty: bool) -> AppViewModel {
        let stage = state.stage;
        let has_files = !state.uploads.current_files().is_empty();
        let busy = state.uploading || state.importing;

        let slots = state
            .operation
            .map(|op| {
                slots_for(op)
                    .iter()
                    .map(|slot| SlotView {
                        name: slot.name,
                        label: slot.label,
                        kind: slot.kind,
                        multiple: slot.multiple,
                        pending: state
                            .uploads
                            .pending()
                            .iter()
                            .filter(|pending| pending.slot == slot.name)
                            .map(|pending| pending.file.file_name())
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let option_fields = state
            .operation
            .map(|op| {
                option_fields_for(op)
                    .iter()
                    .map(|field| {
                        let (default, choices) = match field.kind {
                            OptionKind::Toggle { default } => (default.to_string(), Vec::new()),
                            OptionKind::Choice { choices, default } => {
                                (default.to_string(), choices.to_vec())
                            }
                            OptionKind::Integer { default, .. } => (default.to_string(), Vec::new()),
                        };
                        OptionFieldView {
                            name: field.name,
                            label: field.label,
                            value: state
                                .option_form
                                .get(field.name)
                                .map(str::to_string)
                                .unwrap_or(default),
                            choices,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let files = state
            .uploads
            .current_files()
            .iter()
            .map(|file| FileRowView {
                name: file.original_name.clone(),
                file_type: file.file_type,
                size_label: format_file_size(file.size),
                source: file.source,
            })
            .collect();

        let job = state.job.as_ref().map(|job| JobView {
            job_id: job.id.clone(),
            status: job.status,
            progress: job.progress,
            message: job.message.clone(),
        });

        AppViewModel {
            stage,
            operation: state.operation,
            slots,
            option_fields,
            files,
            job,
            output_file: state.output.clone(),
            failure: state.failure.clone(),
            show_upload_section: state.operation.is_some(),
            show_options_section: has_files,
            show_processing_section: has_files,
            show_results_section: stage == Stage::Completed,
            can_upload: stage.accepts_files() && !state.uploading && state.uploads.has_pending(),
            can_import_url: stage.accepts_files() && !state.importing,
            can_submit: stage == Stage::ReadyToSubmit && has_files && !busy,
            can_abandon: stage == Stage::Monitoring,
            uploading: state.uploading,
            importing: state.importing,
            toasts: state
                .notifications
                .toasts()
                .iter()
                .map(|toast| ToastView {
                    id: toast.id,
                    message: toast.message.clone(),
                    severity: toast.severity,
                })
                .collect(),
            reports: state
                .notifications
                .reports()
                .map(|(region, report)| ReportView {
                    region,
                    message: report.message.clone(),
                    severity: report.severity,
                })
                .collect(),
            dirty,
        }
    }
}
