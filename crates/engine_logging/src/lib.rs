#![deny(missing_docs)]
//! Shared logging utilities for the workbench crates.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a per-thread job context that prefixes log lines with the task id being
//! monitored, and a minimal test initializer for the global logger.

use std::cell::RefCell;

thread_local! {
    /// Task id of the job the current thread is working on, if any.
    static JOB_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets (or clears, with `None`) the job context for the current thread.
///
/// The message loop calls this when a job enters or leaves monitoring so that
/// everything logged while handling that job is tagged with its task id.
pub fn set_job_context(task_id: Option<&str>) {
    JOB_CONTEXT.with(|ctx| *ctx.borrow_mut() = task_id.map(str::to_owned));
}

/// Returns the job context of the current thread, if one is set.
pub fn current_job_context() -> Option<String> {
    JOB_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Formats a log line, prefixing it with the job context when one is set.
#[doc(hidden)]
pub fn with_context(args: std::fmt::Arguments<'_>) -> String {
    match current_job_context() {
        Some(task_id) => format!("[task {task_id}] {args}"),
        None => args.to_string(),
    }
}

/// Trace-level line, tagged with the current job context.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}", $crate::with_context(format_args!($($arg)*)));
    }};
}

/// Info-level line, tagged with the current job context.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}", $crate::with_context(format_args!($($arg)*)));
    }};
}

/// Debug-level line, tagged with the current job context.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}", $crate::with_context(format_args!($($arg)*)));
    }};
}

/// Warning, tagged with the current job context.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}", $crate::with_context(format_args!($($arg)*)));
    }};
}

/// Error, tagged with the current job context.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}", $crate::with_context(format_args!($($arg)*)));
    }};
}

/// Installs a stderr logger for tests.
///
/// The level comes from `WORKBENCH_TEST_LOG` (`debug` when unset or unparsable).
/// Later calls leave the first logger in place.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

    let level = std::env::var("WORKBENCH_TEST_LOG")
        .ok()
        .and_then(|raw| raw.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Debug);
    let config = ConfigBuilder::new()
        .set_thread_level(log::LevelFilter::Debug)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Never);
}
