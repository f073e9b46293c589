use thiserror::Error;

/// URL import failed before a file entry could be synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("no url given")]
    EmptyUrl,
    #[error("url unreachable: {0}")]
    Unreachable(String),
    #[error("url answered with http status {0}")]
    Non2xx(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("no files chosen for slot `{slot}`")]
    NothingChosen { slot: String },
    #[error("no local files waiting to be uploaded")]
    NothingPending,
    #[error("could not read {path}: {message}")]
    Unreadable { path: String, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("server rejected upload: {0}")]
    ServerRejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("{0}")]
    ValidationRejected(String),
    #[error("network error: {0}")]
    Network(String),
}

/// A single status poll went wrong. Always transient from the monitor's view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("network error: {0}")]
    Network(String),
    #[error("status request timed out")]
    Timeout,
    #[error("status request answered with http status {0}")]
    HttpStatus(u16),
    #[error("server does not know the task")]
    NotFound,
    #[error("malformed status response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("`{raw}` is not a yes/no value for {name}")]
    InvalidToggle { name: String, raw: String },
    #[error("`{raw}` is not a valid {name} (expected one of {})", .choices.join(", "))]
    InvalidChoice {
        name: String,
        raw: String,
        choices: Vec<String>,
    },
    #[error("`{raw}` is not a number for {name}")]
    NotANumber { name: String, raw: String },
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Why a monitored job ended without an output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorFailure {
    #[error("{0}")]
    JobFailed(String),
    #[error("lost contact with the server after {misses} failed status checks")]
    MonitoringLost { misses: u32 },
}
