use std::time::Duration;

use url::Url;
use workbench_core::MonitorSettings;

use crate::EngineError;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Total time allowed for one multipart upload. Replaces `request_timeout` on that request.
    pub upload_timeout: Duration,
    pub monitor: MonitorSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_SERVER_URL).expect("default server url is valid"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            upload_timeout: Duration::from_secs(60 * 60),
            monitor: MonitorSettings::default(),
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(base_url: &str) -> Result<Self, EngineError> {
        let base_url =
            Url::parse(base_url).map_err(|err| EngineError::InvalidBaseUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(EngineError::InvalidBaseUrl(format!(
                "{base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, EngineError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EngineError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Link the user follows to fetch a finished job's output.
    pub fn download_url(&self, output_file: &str) -> Result<Url, EngineError> {
        self.endpoint(&["download", output_file])
    }
}
