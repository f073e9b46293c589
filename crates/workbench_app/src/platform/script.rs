//! Drives the workflow from command-line arguments, one user action at a time.
//!
//! The driver only ever looks at the view model, the same way a person at a
//! form would, so every action still goes through `update` and its guards.
use std::collections::VecDeque;
use std::fs;

use anyhow::{Context, Result};
use workbench_core::{
    AppViewModel, DeclaredKind, LocalFile, Msg, Operation, Region, Severity, Stage,
};

use crate::cli::RunArgs;

/// Everything the user asked for on the command line, with local files sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub operation: Operation,
    pub files: Vec<(String, LocalFile)>,
    pub urls: Vec<(String, DeclaredKind)>,
    pub options: Vec<(String, String)>,
}

impl Script {
    pub fn from_args(args: &RunArgs) -> Result<Script> {
        let mut files = Vec::with_capacity(args.files.len());
        for file in &args.files {
            let metadata = fs::metadata(&file.path)
                .with_context(|| format!("reading {}", file.path.display()))?;
            if !metadata.is_file() {
                anyhow::bail!("{} is not a regular file", file.path.display());
            }
            files.push((file.slot.clone(), LocalFile::new(&file.path, metadata.len())));
        }
        Ok(Script {
            operation: args.operation,
            files,
            urls: args
                .urls
                .iter()
                .map(|url| (url.url.clone(), url.declared))
                .collect(),
            options: args
                .options
                .iter()
                .map(|option| (option.name.clone(), option.value.clone()))
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { output: Option<String> },
    Failed(String),
    /// The user stopped waiting; the job may still finish on the server.
    Abandoned,
    /// The workflow never reached a running job.
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Dispatch(Msg),
    Wait,
    Finish(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    ChooseFiles,
    Upload,
    Uploading,
    Import,
    Importing { expected_files: usize },
    Options,
    Submit,
    Submitting,
    Monitoring,
}

pub struct Driver {
    operation: Operation,
    slots: VecDeque<(String, Vec<LocalFile>)>,
    chose_files: bool,
    urls: VecDeque<(String, DeclaredKind)>,
    options: VecDeque<(String, String)>,
    phase: Phase,
}

impl Driver {
    pub fn new(script: Script) -> Self {
        // One choice per slot, so repeated `--file` flags for a slot add up.
        let mut slots: VecDeque<(String, Vec<LocalFile>)> = VecDeque::new();
        for (slot, file) in script.files {
            match slots.iter_mut().find(|(name, _)| *name == slot) {
                Some((_, files)) => files.push(file),
                None => slots.push_back((slot, vec![file])),
            }
        }
        Self {
            operation: script.operation,
            chose_files: !slots.is_empty(),
            slots,
            urls: script.urls.into(),
            options: script.options.into(),
            phase: Phase::Start,
        }
    }

    /// Next user action given what is on screen now.
    pub fn next_step(&mut self, view: &AppViewModel) -> Step {
        loop {
            match self.phase {
                Phase::Start => {
                    self.phase = Phase::ChooseFiles;
                    return Step::Dispatch(Msg::OperationSelected(self.operation));
                }
                Phase::ChooseFiles => match self.slots.pop_front() {
                    Some((slot, files)) => {
                        return Step::Dispatch(Msg::LocalFilesChosen { slot, files });
                    }
                    None if self.chose_files => self.phase = Phase::Upload,
                    None => self.phase = Phase::Import,
                },
                Phase::Upload => {
                    if !view.can_upload {
                        return abort(view, None, "none of the chosen files fit an input slot");
                    }
                    self.phase = Phase::Uploading;
                    return Step::Dispatch(Msg::UploadClicked);
                }
                Phase::Uploading => {
                    if view.uploading {
                        return Step::Wait;
                    }
                    if view.files.is_empty() {
                        return abort(view, Some(Region::Upload), "the upload stored no files");
                    }
                    self.phase = Phase::Import;
                }
                Phase::Import => match self.urls.pop_front() {
                    Some((url, declared)) => {
                        self.phase = Phase::Importing {
                            expected_files: view.files.len() + 1,
                        };
                        return Step::Dispatch(Msg::UrlImportRequested { url, declared });
                    }
                    None => self.phase = Phase::Options,
                },
                Phase::Importing { expected_files } => {
                    if view.importing {
                        return Step::Wait;
                    }
                    if view.files.len() < expected_files {
                        return abort(view, None, "a URL import failed");
                    }
                    self.phase = Phase::Import;
                }
                Phase::Options => match self.options.pop_front() {
                    Some((name, raw)) => return Step::Dispatch(Msg::OptionEdited { name, raw }),
                    None => self.phase = Phase::Submit,
                },
                Phase::Submit => {
                    if !view.can_submit {
                        return abort(view, None, "no input files to process");
                    }
                    self.phase = Phase::Submitting;
                    return Step::Dispatch(Msg::SubmitClicked);
                }
                Phase::Submitting => match view.stage {
                    Stage::Submitting => return Step::Wait,
                    Stage::Monitoring => self.phase = Phase::Monitoring,
                    _ => return abort(view, Some(Region::Options), "the job was not started"),
                },
                Phase::Monitoring => {
                    return match view.stage {
                        Stage::Monitoring => Step::Wait,
                        Stage::Completed => Step::Finish(Outcome::Completed {
                            output: view.output_file.clone(),
                        }),
                        Stage::Failed => Step::Finish(Outcome::Failed(
                            view.failure
                                .clone()
                                .unwrap_or_else(|| "processing failed".to_string()),
                        )),
                        Stage::ReadyToSubmit => Step::Finish(Outcome::Abandoned),
                        other => abort(view, None, &format!("unexpected stage {other:?}")),
                    };
                }
            }
        }
    }
}

/// Gives up with the most specific error on screen: a region report, else the newest error toast.
fn abort(view: &AppViewModel, region: Option<Region>, fallback: &str) -> Step {
    let from_report = region.and_then(|region| {
        view.reports
            .iter()
            .find(|report| report.region == region && report.severity == Severity::Error)
            .map(|report| report.message.clone())
    });
    let from_toast = || {
        view.toasts
            .iter()
            .rev()
            .find(|toast| toast.severity == Severity::Error)
            .map(|toast| toast.message.clone())
    };
    let message = from_report
        .or_else(from_toast)
        .unwrap_or_else(|| fallback.to_string());
    Step::Finish(Outcome::Aborted(message))
}
