use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use engine_logging::{engine_error, engine_info, engine_warn};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Workflow area a persistent report is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Region {
    Upload,
    Options,
    Processing,
}

pub type ToastId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub message: String,
    pub severity: Severity,
}

/// Transient toasts and per-region inline reports. Nothing here can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSink {
    toast_duration: Duration,
    next_id: ToastId,
    toasts: Vec<Toast>,
    reports: BTreeMap<Region, Report>,
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl NotificationSink {
    pub fn new(toast_duration: Duration) -> Self {
        Self {
            toast_duration,
            next_id: 1,
            toasts: Vec::new(),
            reports: BTreeMap::new(),
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) -> ToastId {
        self.notify_at(message, severity, Instant::now())
    }

    pub fn notify_at(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        now: Instant,
    ) -> ToastId {
        let message = message.into();
        log_for(severity, &message);
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            message,
            severity,
            shown_at: now,
        });
        id
    }

    /// Replaces the region's report.
    pub fn report(&mut self, region: Region, message: impl Into<String>, severity: Severity) {
        self.reports.insert(
            region,
            Report {
                message: message.into(),
                severity,
            },
        );
    }

    pub fn clear_report(&mut self, region: Region) {
        self.reports.remove(&region);
    }

    pub fn clear_reports(&mut self) {
        self.reports.clear();
    }

    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        self.toasts.len() != before
    }

    /// Drops toasts older than the toast duration. Returns whether any went away.
    pub fn expire(&mut self, now: Instant) -> bool {
        let duration = self.toast_duration;
        let before = self.toasts.len();
        self.toasts
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < duration);
        self.toasts.len() != before
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn report_for(&self, region: Region) -> Option<&Report> {
        self.reports.get(&region)
    }

    pub fn reports(&self) -> impl Iterator<Item = (Region, &Report)> {
        self.reports.iter().map(|(region, report)| (*region, report))
    }
}

fn log_for(severity: Severity, message: &str) {
    match severity {
        Severity::Info | Severity::Success => engine_info!("notify: {}", message),
        Severity::Warning => engine_warn!("notify: {}", message),
        Severity::Error => engine_error!("notify: {}", message),
    }
}
