use engine_logging::{engine_debug, engine_info};

use crate::effect::SubmitRequest;
use crate::error::UploadError;
use crate::monitor::MonitorEvent;
use crate::notify::{Region, Severity};
use crate::schema::{find_option_field, find_slot};
use crate::{AppState, Effect, Job, Msg, OptionSet, Stage, UploadedFile};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::OperationSelected(operation) => {
            let mut effects = Vec::new();
            // Stop the old poll loop before its job reference is dropped.
            if let Some(job) = state.job.take() {
                effects.push(Effect::CancelMonitor { job_id: job.id });
            }
            engine_info!("Selected operation {}", operation);
            state.select(operation);
            effects
        }
        Msg::LocalFilesChosen { slot, files } => {
            choose_local_files(&mut state, &slot, files);
            Vec::new()
        }
        Msg::UploadClicked => start_upload(&mut state),
        Msg::UploadFinished { generation, result } => {
            if generation != state.generation || !state.uploading {
                engine_debug!("Dropping stale upload result (generation {})", generation);
                return (state, Vec::new());
            }
            state.uploading = false;
            match result {
                Ok(files) => install_uploaded(&mut state, files),
                Err(err) => {
                    let message = format!("Upload failed: {err}");
                    state.notifications.notify(message.clone(), Severity::Error);
                    state
                        .notifications
                        .report(Region::Upload, message, Severity::Error);
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::UrlImportRequested { url, declared } => {
            if !state.stage.accepts_files() || state.importing {
                engine_debug!("Ignoring URL import in stage {:?}", state.stage);
                return (state, Vec::new());
            }
            let url = url.trim().to_string();
            if url.is_empty() {
                state
                    .notifications
                    .notify("Please enter a valid URL", Severity::Error);
                state.mark_dirty();
                return (state, Vec::new());
            }
            state.importing = true;
            state
                .notifications
                .notify("Importing file from URL...", Severity::Info);
            state.mark_dirty();
            vec![Effect::ProbeUrl {
                generation: state.generation,
                url,
                declared,
            }]
        }
        Msg::UrlProbed {
            generation,
            url,
            declared,
            result,
        } => {
            if generation != state.generation || !state.importing {
                engine_debug!("Dropping stale URL probe for {}", url);
                return (state, Vec::new());
            }
            state.importing = false;
            match result {
                Ok(probe) => {
                    let file = UploadedFile::from_url_probe(&url, declared, &probe);
                    engine_info!(
                        "Imported {} as {} ({} bytes)",
                        file.original_name,
                        file.file_type,
                        file.size
                    );
                    state.uploads.append_file(file);
                    state.settle_file_stage();
                    state
                        .notifications
                        .notify("File imported successfully!", Severity::Success);
                }
                Err(err) => {
                    state.notifications.notify(
                        format!("Failed to import file: {err}"),
                        Severity::Error,
                    );
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::OptionEdited { name, raw } => {
            let Some(operation) = state.operation else {
                return (state, Vec::new());
            };
            if !state.stage.accepts_files() {
                return (state, Vec::new());
            }
            if find_option_field(operation, &name).is_none() {
                state.notifications.notify(
                    format!("{operation} has no option `{name}`"),
                    Severity::Warning,
                );
            } else {
                state.option_form.set(name, raw);
                state.notifications.clear_report(Region::Options);
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::SubmissionFinished { generation, result } => {
            if generation != state.generation || state.stage != Stage::Submitting {
                engine_debug!("Dropping stale submission result (generation {})", generation);
                return (state, Vec::new());
            }
            state.mark_dirty();
            match result {
                Ok(job_id) => {
                    engine_info!("Submission accepted as task {}", job_id);
                    state.job = Some(Job::new(job_id.clone()));
                    state.stage = Stage::Monitoring;
                    state.notifications.clear_report(Region::Processing);
                    vec![Effect::StartMonitor { job_id }]
                }
                Err(err) => {
                    state.stage = Stage::ReadyToSubmit;
                    state
                        .notifications
                        .notify(format!("Processing failed: {err}"), Severity::Error);
                    Vec::new()
                }
            }
        }
        Msg::Monitor(event) => {
            apply_monitor_event(&mut state, event);
            Vec::new()
        }
        Msg::AbandonClicked => {
            if state.stage != Stage::Monitoring {
                return (state, Vec::new());
            }
            let mut effects = Vec::new();
            if let Some(job) = state.job.take() {
                engine_info!("Abandoning job {}", job.id);
                effects.push(Effect::CancelMonitor { job_id: job.id });
            }
            state.stage = Stage::ReadyToSubmit;
            state.notifications.notify(
                "Stopped waiting for the job; the server may still finish it.",
                Severity::Info,
            );
            state.mark_dirty();
            effects
        }
        Msg::ToastDismissed(id) => {
            if state.notifications.dismiss(id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick(now) => {
            if state.notifications.expire(now) {
                state.mark_dirty();
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn choose_local_files(state: &mut AppState, slot: &str, files: Vec<crate::LocalFile>) {
    let Some(operation) = state.operation else {
        return;
    };
    if !state.stage.accepts_files() {
        return;
    }
    state.mark_dirty();
    if find_slot(operation, slot).is_none() {
        state.notifications.notify(
            format!("{operation} has no input named `{slot}`"),
            Severity::Warning,
        );
        return;
    }
    match state.uploads.add_local_files(slot, files) {
        Ok(oversized) => {
            for name in oversized {
                state.notifications.notify(
                    format!("{name} is larger than 500MB and may fail to upload."),
                    Severity::Warning,
                );
            }
        }
        Err(err) => {
            state
                .notifications
                .notify(format!("Please choose a file: {err}"), Severity::Warning);
        }
    }
}

fn start_upload(state: &mut AppState) -> Vec<Effect> {
    if !state.stage.accepts_files() || state.uploading {
        engine_debug!("Ignoring upload in stage {:?}", state.stage);
        return Vec::new();
    }
    state.mark_dirty();
    if !state.uploads.has_pending() {
        state
            .notifications
            .notify(UploadError::NothingPending.to_string(), Severity::Warning);
        return Vec::new();
    }
    let files = state.uploads.take_pending();
    engine_info!("Uploading {} file(s)", files.len());
    state.uploading = true;
    state.notifications.clear_report(Region::Upload);
    vec![Effect::UploadFiles {
        generation: state.generation,
        files,
    }]
}

fn install_uploaded(state: &mut AppState, files: Vec<UploadedFile>) {
    let empty = files.is_empty();
    engine_info!("Upload returned {} file(s)", files.len());
    state.uploads.replace_files(files);
    state.settle_file_stage();
    if empty {
        state.notifications.notify(
            "The server accepted the upload but returned no files",
            Severity::Warning,
        );
    }
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.stage != Stage::ReadyToSubmit || state.uploading || state.importing {
        engine_debug!("Submit ignored in stage {:?}", state.stage);
        return Vec::new();
    }
    let Some(operation) = state.operation else {
        return Vec::new();
    };
    state.mark_dirty();

    let files = state.uploads.current_files().to_vec();
    if files.is_empty() {
        state.stage = Stage::GatheringFiles;
        state
            .notifications
            .notify("Upload or import at least one file first", Severity::Warning);
        return Vec::new();
    }

    let options = match OptionSet::from_form(operation, &state.option_form) {
        Ok(options) => options,
        Err(err) => {
            let message = err.to_string();
            state.notifications.notify(message.clone(), Severity::Error);
            state
                .notifications
                .report(Region::Options, message, Severity::Error);
            return Vec::new();
        }
    };

    engine_info!(
        "Submitting {} with {} file(s) and {} option(s)",
        operation,
        files.len(),
        options.len()
    );
    state.stage = Stage::Submitting;
    vec![Effect::SubmitJob {
        generation: state.generation,
        request: SubmitRequest {
            operation,
            files,
            options,
        },
    }]
}

fn apply_monitor_event(state: &mut AppState, event: MonitorEvent) {
    let tracked = state.stage == Stage::Monitoring
        && state
            .job
            .as_ref()
            .is_some_and(|job| &job.id == event.job_id());
    if !tracked {
        engine_debug!("Dropping monitor event for untracked job {}", event.job_id());
        return;
    }

    match event {
        MonitorEvent::Progress {
            status,
            progress,
            message,
            ..
        } => {
            if let Some(job) = state.job.as_mut() {
                job.status = status;
                job.progress = job.progress.max(progress);
                job.message = message;
            }
            state.mark_dirty();
        }
        MonitorEvent::Retrying { misses, error, .. } => {
            engine_debug!("Status check failed {} time(s) in a row: {}", misses, error);
        }
        MonitorEvent::Completed { output, .. } => {
            state.job = None;
            state.output = output;
            state.stage = Stage::Completed;
            state
                .notifications
                .notify("Processing complete!", Severity::Success);
            state.mark_dirty();
        }
        MonitorEvent::Failed { failure, .. } => {
            let message = format!("Processing failed: {failure}");
            state.job = None;
            state.failure = Some(failure.to_string());
            state.stage = Stage::Failed;
            state.notifications.notify(message.clone(), Severity::Error);
            state
                .notifications
                .report(Region::Processing, message, Severity::Error);
            state.mark_dirty();
        }
    }
}
