use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::Deserialize;
use workbench_core::{MonitorSettings, DEFAULT_TOAST_DURATION};
use workbench_engine::{ClientSettings, DEFAULT_SERVER_URL};

use super::logging::LogDestination;
use crate::cli::GlobalArgs;

pub const DEFAULT_CONFIG_FILENAME: &str = "workbench.ron";

/// Settings read from `workbench.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub max_consecutive_poll_failures: u32,
    pub toast_duration_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval_ms: client.monitor.poll_interval.as_millis() as u64,
            max_consecutive_poll_failures: client.monitor.max_consecutive_failures,
            toast_duration_ms: DEFAULT_TOAST_DURATION.as_millis() as u64,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            upload_timeout_secs: client.upload_timeout.as_secs(),
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `explicit`, or `./workbench.ron` when no path was given.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
        };
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound && !required => {
                return Ok(AppConfig::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };
        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<AppConfig> {
        Ok(ron::from_str(content)?)
    }

    pub fn apply_overrides(&mut self, args: &GlobalArgs) {
        if let Some(server) = &args.server {
            self.server_url = server.clone();
        }
        if let Some(interval) = args.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if let Some(misses) = args.max_poll_failures {
            self.max_consecutive_poll_failures = misses;
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .with_context(|| format!("unknown log level `{}`", self.log_level))
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn client_settings(&self) -> Result<ClientSettings> {
        let mut settings = ClientSettings::with_base_url(&self.server_url)
            .with_context(|| format!("server url `{}`", self.server_url))?;
        settings.connect_timeout = Duration::from_secs(self.connect_timeout_secs.max(1));
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs.max(1));
        settings.upload_timeout = Duration::from_secs(self.upload_timeout_secs.max(1));
        settings.monitor = MonitorSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            max_consecutive_failures: self.max_consecutive_poll_failures.max(1),
        };
        Ok(settings)
    }
}
