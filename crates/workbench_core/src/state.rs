use std::time::Duration;

use crate::notify::NotificationSink;
use crate::options::OptionForm;
use crate::upload::UploadCoordinator;
use crate::view_model::AppViewModel;
use crate::{Job, Operation};

/// Bumped on every operation selection; results tagged with an older value are stale.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    SelectingOperation,
    GatheringFiles,
    ReadyToSubmit,
    Submitting,
    Monitoring,
    Completed,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }

    /// Stages in which files can still be picked, uploaded or imported.
    pub fn accepts_files(self) -> bool {
        matches!(self, Stage::GatheringFiles | Stage::ReadyToSubmit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) stage: Stage,
    pub(crate) operation: Option<Operation>,
    pub(crate) generation: Generation,
    pub(crate) uploads: UploadCoordinator,
    pub(crate) option_form: OptionForm,
    pub(crate) job: Option<Job>,
    pub(crate) output: Option<String>,
    pub(crate) failure: Option<String>,
    pub(crate) uploading: bool,
    pub(crate) importing: bool,
    pub(crate) notifications: NotificationSink,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_toast_duration(toast_duration: Duration) -> Self {
        Self {
            notifications: NotificationSink::new(toast_duration),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::project(self, self.dirty)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    pub fn option_form(&self) -> &OptionForm {
        &self.option_form
    }

    /// The job being monitored, present only while in `Monitoring`.
    pub fn active_job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    pub fn notifications(&self) -> &NotificationSink {
        &self.notifications
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether the state changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Fresh workflow for `operation`. Toasts survive; everything else downstream goes.
    pub(crate) fn select(&mut self, operation: Operation) {
        self.generation += 1;
        self.operation = Some(operation);
        self.uploads.reset();
        self.option_form.clear();
        self.job = None;
        self.output = None;
        self.failure = None;
        self.uploading = false;
        self.importing = false;
        self.notifications.clear_reports();
        self.stage = Stage::GatheringFiles;
        self.mark_dirty();
    }

    /// Stage after the file list changed: ready only with at least one file.
    pub(crate) fn settle_file_stage(&mut self) {
        if self.stage.accepts_files() {
            self.stage = if self.uploads.current_files().is_empty() {
                Stage::GatheringFiles
            } else {
                Stage::ReadyToSubmit
            };
        }
    }
}
