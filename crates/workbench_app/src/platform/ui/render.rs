use std::collections::HashSet;

use workbench_core::schema::{option_fields_for, slots_for, MediaKind, OptionKind};
use workbench_core::{
    AppViewModel, FileRowView, FileSource, JobView, Operation, ReportView, Severity, Stage,
    ToastId,
};
use workbench_engine::ClientSettings;

const PROGRESS_BAR_WIDTH: usize = 20;

/// Turns successive view models into terminal lines, printing only what changed.
pub struct TextRenderer {
    settings: ClientSettings,
    last: Option<AppViewModel>,
    seen_toasts: HashSet<ToastId>,
}

impl TextRenderer {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            last: None,
            seen_toasts: HashSet::new(),
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut lines = Vec::new();
        let last = self.last.take();
        let previous = last.as_ref();

        if previous.map(|p| p.operation) != Some(view.operation) {
            if let Some(operation) = view.operation {
                lines.push(format!("Operation: {}", operation.label()));
            }
        }
        if previous.map(|p| p.stage) != Some(view.stage) {
            lines.push(format!("== {} ==", stage_label(view.stage)));
        }
        if view.uploading && !previous.is_some_and(|p| p.uploading) {
            lines.push("Uploading files...".to_string());
        }
        if previous.map(|p| &p.files) != Some(&view.files) && !view.files.is_empty() {
            lines.push(format!("Files ({}):", view.files.len()));
            lines.extend(view.files.iter().map(format_file_row));
        }
        if let Some(job) = &view.job {
            if previous.and_then(|p| p.job.as_ref()) != Some(job) {
                lines.push(format_job(job));
            }
        }
        for toast in &view.toasts {
            if self.seen_toasts.insert(toast.id) {
                lines.push(format!("[{}] {}", severity_label(toast.severity), toast.message));
            }
        }
        for report in &view.reports {
            if !previous.is_some_and(|p| p.reports.contains(report)) {
                lines.push(format_report(report));
            }
        }
        if view.stage != previous.map_or(Stage::default(), |p| p.stage) {
            match view.stage {
                Stage::Completed => lines.extend(self.results(view)),
                Stage::Failed => {
                    if let Some(failure) = &view.failure {
                        lines.push(format!("Failed: {failure}"));
                    }
                }
                Stage::Monitoring => lines.push("Press q and Enter to stop waiting.".to_string()),
                _ => {}
            }
        }

        // Expired toasts can never come back, so their ids need not be remembered.
        self.seen_toasts
            .retain(|id| view.toasts.iter().any(|toast| toast.id == *id));
        self.last = Some(view.clone());
        lines
    }

    fn results(&self, view: &AppViewModel) -> Vec<String> {
        let Some(output) = &view.output_file else {
            return vec!["Processing finished without an output file.".to_string()];
        };
        let mut lines = vec![format!("Output: {output}")];
        if let Ok(url) = self.settings.download_url(output) {
            lines.push(format!("Download: {url}"));
        }
        lines
    }
}

pub fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::SelectingOperation => "Select an operation",
        Stage::GatheringFiles => "Gathering files",
        Stage::ReadyToSubmit => "Ready to submit",
        Stage::Submitting => "Submitting",
        Stage::Monitoring => "Processing",
        Stage::Completed => "Completed",
        Stage::Failed => "Failed",
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Success => "ok",
        Severity::Warning => "warn",
        Severity::Error => "error",
    }
}

fn format_file_row(file: &FileRowView) -> String {
    let origin = match file.source {
        FileSource::Local => "",
        FileSource::Url => ", from URL",
    };
    format!(
        "  {} ({}, {}{})",
        file.name, file.file_type, file.size_label, origin
    )
}

fn format_job(job: &JobView) -> String {
    let filled = usize::from(job.progress.min(100)) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        job.progress,
        job.message
    )
}

fn format_report(report: &ReportView) -> String {
    format!(
        "! {:?}: {} ({})",
        report.region,
        report.message,
        severity_label(report.severity)
    )
}

/// Help text for `workbench operations`.
pub fn operations_listing() -> String {
    let mut out = String::new();
    for operation in Operation::ALL {
        out.push_str(&format!("{} ({})\n", operation.as_str(), operation.label()));
        for slot in slots_for(operation) {
            let many = if slot.multiple { ", several allowed" } else { "" };
            out.push_str(&format!(
                "  --file {}=PATH   {} [{}{}]\n",
                slot.name,
                slot.label,
                kind_label(slot.kind),
                many
            ));
        }
        for field in option_fields_for(operation) {
            let detail = match &field.kind {
                OptionKind::Toggle { default } => format!("true/false, default {default}"),
                OptionKind::Choice { choices, default } => {
                    format!("{}, default {default}", choices.join("/"))
                }
                OptionKind::Integer { min, max, default } => {
                    format!("{min}..={max}, default {default}")
                }
            };
            out.push_str(&format!(
                "  --option {}=VALUE   {} [{}]\n",
                field.name, field.label, detail
            ));
        }
    }
    out
}

fn kind_label(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "audio",
        MediaKind::Video => "video",
        MediaKind::Image => "image",
        MediaKind::Any => "any media",
    }
}
