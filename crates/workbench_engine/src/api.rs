use engine_logging::{engine_debug, engine_info, engine_warn};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use workbench_core::{
    ImportError, JobId, JobStatus, PendingUpload, PollError, ProbeInfo, StatusReport,
    SubmissionError, SubmitRequest, UploadError, UploadedFile,
};

use crate::types::{CleanupResponse, ProcessResponse, StatusResponse, UploadResponse};
use crate::{ClientSettings, EngineError};

/// Anything that can answer "how is this job doing?".
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &JobId) -> Result<StatusReport, PollError>;
}

/// The HTTP contract of the processing server.
#[async_trait::async_trait]
pub trait MediaApi: StatusSource {
    /// Sends every pending file in one multipart request.
    async fn upload(&self, files: &[PendingUpload]) -> Result<Vec<UploadedFile>, UploadError>;

    /// `HEAD` probe for a URL import. Never downloads the body.
    async fn probe(&self, url: &str) -> Result<ProbeInfo, ImportError>;

    async fn submit(&self, request: &SubmitRequest) -> Result<JobId, SubmissionError>;

    async fn cleanup(&self) -> Result<String, EngineError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }
}

/// Reads the body as JSON without giving up on the status line when that fails.
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<(StatusCode, Result<T, String>), reqwest::Error> {
    let status = response.status();
    let body = response.bytes().await?;
    let parsed = serde_json::from_slice::<T>(&body).map_err(|err| err.to_string());
    Ok((status, parsed))
}

fn refusal(status: StatusCode, detail: Option<String>) -> String {
    detail.unwrap_or_else(|| format!("http status {}", status.as_u16()))
}

#[async_trait::async_trait]
impl StatusSource for ReqwestApi {
    async fn fetch_status(&self, job_id: &JobId) -> Result<StatusReport, PollError> {
        let url = self
            .settings
            .endpoint(&["status", job_id.as_str()])
            .map_err(|err| PollError::Network(err.to_string()))?;
        let response = self.client.get(url).send().await.map_err(map_poll_error)?;
        let (status, parsed) = read_json::<StatusResponse>(response)
            .await
            .map_err(map_poll_error)?;
        if status == StatusCode::NOT_FOUND {
            return Err(PollError::NotFound);
        }
        if !status.is_success() {
            return Err(PollError::HttpStatus(status.as_u16()));
        }
        let body = parsed.map_err(PollError::Malformed)?;
        decode_status(body)
    }
}

fn decode_status(body: StatusResponse) -> Result<StatusReport, PollError> {
    let status = match body.status.as_str() {
        "pending" | "started" => JobStatus::Pending,
        "processing" => JobStatus::Processing,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        "not_found" => return Err(PollError::NotFound),
        other => return Err(PollError::Malformed(format!("unknown status `{other}`"))),
    };
    let progress = body.progress.clamp(0.0, 100.0).round() as u8;
    Ok(StatusReport {
        status,
        progress,
        message: body.message.unwrap_or_default(),
        output_file: body.output_file.filter(|name| !name.is_empty()),
    })
}

fn map_poll_error(err: reqwest::Error) -> PollError {
    if err.is_timeout() {
        PollError::Timeout
    } else {
        PollError::Network(err.to_string())
    }
}

/// Opens the file and streams it into a part, so large inputs are never held in memory.
async fn streamed_part(pending: &PendingUpload) -> Result<Part, UploadError> {
    let unreadable = |err: std::io::Error| UploadError::Unreadable {
        path: pending.file.path.display().to_string(),
        message: err.to_string(),
    };
    let file = tokio::fs::File::open(&pending.file.path)
        .await
        .map_err(unreadable)?;
    let len = file.metadata().await.map_err(unreadable)?.len();
    engine_debug!(
        "Streaming {} ({} bytes) into slot {}",
        pending.file.file_name(),
        len,
        pending.slot
    );
    let body = Body::wrap_stream(ReaderStream::new(file));
    Ok(Part::stream_with_length(body, len).file_name(pending.file.file_name()))
}

#[async_trait::async_trait]
impl MediaApi for ReqwestApi {
    async fn upload(&self, files: &[PendingUpload]) -> Result<Vec<UploadedFile>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NothingPending);
        }
        let mut form = Form::new();
        for pending in files {
            let part = streamed_part(pending).await?;
            form = form.part(pending.slot.clone(), part);
        }

        let url = self
            .settings
            .endpoint(&["upload"])
            .map_err(|err| UploadError::Network(err.to_string()))?;
        let response = self
            .client
            .post(url)
            .timeout(self.settings.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;
        let (status, parsed) = read_json::<UploadResponse>(response)
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;

        match parsed {
            Ok(body) if body.success && status.is_success() => {
                let files = body.files.unwrap_or_default();
                engine_info!("Upload accepted, {} file(s) stored", files.len());
                Ok(files)
            }
            Ok(body) => Err(UploadError::ServerRejected(refusal(
                status,
                body.errors.text(),
            ))),
            Err(err) if status.is_success() => Err(UploadError::ServerRejected(format!(
                "malformed response: {err}"
            ))),
            Err(_) => Err(UploadError::ServerRejected(refusal(status, None))),
        }
    }

    async fn probe(&self, url: &str) -> Result<ProbeInfo, ImportError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| ImportError::Unreachable(format!("invalid url: {err}")))?;
        let response = self
            .client
            .head(parsed)
            .send()
            .await
            .map_err(|err| ImportError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            engine_warn!("Probe of {} answered {}", url, status);
            return Err(ImportError::Non2xx(status.as_u16()));
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        Ok(ProbeInfo {
            content_type,
            content_length,
        })
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<JobId, SubmissionError> {
        let url = self
            .settings
            .endpoint(&["process"])
            .map_err(|err| SubmissionError::Network(err.to_string()))?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|err| SubmissionError::Network(err.to_string()))?;
        let (status, parsed) = read_json::<ProcessResponse>(response)
            .await
            .map_err(|err| SubmissionError::Network(err.to_string()))?;

        match parsed {
            Ok(body) if body.success && status.is_success() => match body.task_id {
                Some(task_id) if !task_id.is_empty() => Ok(JobId::new(task_id)),
                _ => Err(SubmissionError::ValidationRejected(
                    "server accepted the job without a task id".to_string(),
                )),
            },
            Ok(body) => Err(SubmissionError::ValidationRejected(refusal(
                status,
                body.errors.text(),
            ))),
            Err(err) if status.is_success() => Err(SubmissionError::ValidationRejected(format!(
                "malformed response: {err}"
            ))),
            Err(_) => Err(SubmissionError::ValidationRejected(refusal(status, None))),
        }
    }

    async fn cleanup(&self) -> Result<String, EngineError> {
        let url = self.settings.endpoint(&["cleanup"])?;
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|err| EngineError::Network(err.to_string()))?;
        let (status, parsed) = read_json::<CleanupResponse>(response)
            .await
            .map_err(|err| EngineError::Network(err.to_string()))?;
        match parsed {
            Ok(body) if body.success && status.is_success() => {
                Ok(body.message.unwrap_or_else(|| "Cleanup completed".to_string()))
            }
            Ok(body) => Err(EngineError::Rejected(refusal(status, body.errors.text()))),
            Err(_) => Err(EngineError::Rejected(refusal(status, None))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(status: &str, progress: f64) -> StatusResponse {
        StatusResponse {
            status: status.to_string(),
            progress,
            message: Some("msg".to_string()),
            output_file: None,
        }
    }

    #[test]
    fn started_counts_as_pending() {
        let report = decode_status(body("started", 0.0)).unwrap();
        assert_eq!(report.status, JobStatus::Pending);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(decode_status(body("processing", 140.0)).unwrap().progress, 100);
        assert_eq!(decode_status(body("processing", -3.0)).unwrap().progress, 0);
    }

    #[test]
    fn unknown_task_is_a_transient_miss() {
        assert_eq!(decode_status(body("not_found", 0.0)), Err(PollError::NotFound));
        assert!(matches!(
            decode_status(body("exploded", 0.0)),
            Err(PollError::Malformed(_))
        ));
    }
}
