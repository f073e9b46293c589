//! Per-job polling decisions. The async loop that asks the server lives in the
//! engine; this type only decides what each answer (or missing answer) means.
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::error::{MonitorFailure, PollError};
use crate::{Job, JobId, JobStatus, StatusReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    /// Consecutive failed polls after which the job is given up as lost.
    pub max_consecutive_failures: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            max_consecutive_failures: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorPhase {
    Idle,
    Polling,
    Done(Result<Option<String>, MonitorFailure>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Progress {
        job_id: JobId,
        status: JobStatus,
        progress: u8,
        message: String,
    },
    /// A poll failed but the job is still being watched.
    Retrying {
        job_id: JobId,
        misses: u32,
        error: PollError,
    },
    Completed {
        job_id: JobId,
        output: Option<String>,
        message: String,
    },
    Failed {
        job_id: JobId,
        failure: MonitorFailure,
    },
}

impl MonitorEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            MonitorEvent::Progress { job_id, .. }
            | MonitorEvent::Retrying { job_id, .. }
            | MonitorEvent::Completed { job_id, .. }
            | MonitorEvent::Failed { job_id, .. } => job_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MonitorEvent::Completed { .. } | MonitorEvent::Failed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMonitor {
    settings: MonitorSettings,
    job: Option<Job>,
    phase: MonitorPhase,
    misses: u32,
}

impl JobMonitor {
    pub fn idle(settings: MonitorSettings) -> Self {
        Self {
            settings,
            job: None,
            phase: MonitorPhase::Idle,
            misses: 0,
        }
    }

    /// A fresh monitor polling `job_id`. Terminal monitors are never reused.
    pub fn start(job_id: JobId, settings: MonitorSettings) -> Self {
        engine_info!("Monitoring job {}", job_id);
        Self {
            settings,
            job: Some(Job::new(job_id)),
            phase: MonitorPhase::Polling,
            misses: 0,
        }
    }

    pub fn settings(&self) -> MonitorSettings {
        self.settings
    }

    pub fn phase(&self) -> &MonitorPhase {
        &self.phase
    }

    pub fn is_polling(&self) -> bool {
        self.phase == MonitorPhase::Polling
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.misses
    }

    pub fn on_report(&mut self, report: &StatusReport) -> Option<MonitorEvent> {
        if !self.is_polling() {
            engine_debug!("Ignoring status report outside polling: {:?}", report.status);
            return None;
        }
        let job = self.job.as_mut()?;
        self.misses = 0;
        job.apply(report);
        let job_id = job.id.clone();

        match report.status {
            JobStatus::Pending | JobStatus::Processing => Some(MonitorEvent::Progress {
                job_id,
                status: job.status,
                progress: job.progress,
                message: job.message.clone(),
            }),
            JobStatus::Completed => {
                let output = job.output_reference.clone();
                self.phase = MonitorPhase::Done(Ok(output.clone()));
                engine_info!("Job {} completed, output {:?}", job_id, output);
                Some(MonitorEvent::Completed {
                    job_id,
                    output,
                    message: report.message.clone(),
                })
            }
            JobStatus::Failed => {
                let failure = MonitorFailure::JobFailed(report.message.clone());
                self.phase = MonitorPhase::Done(Err(failure.clone()));
                engine_warn!("Job {} failed: {}", job_id, report.message);
                Some(MonitorEvent::Failed { job_id, failure })
            }
        }
    }

    /// A failed poll never ends the job on its own; only a run of them does.
    pub fn on_poll_error(&mut self, error: PollError) -> Option<MonitorEvent> {
        if !self.is_polling() {
            return None;
        }
        let job_id = self.job.as_ref()?.id.clone();
        self.misses += 1;
        let bound = self.settings.max_consecutive_failures.max(1);
        if self.misses >= bound {
            let failure = MonitorFailure::MonitoringLost {
                misses: self.misses,
            };
            engine_warn!(
                "Giving up on job {} after {} failed polls, last error: {}",
                job_id,
                self.misses,
                error
            );
            self.phase = MonitorPhase::Done(Err(failure.clone()));
            return Some(MonitorEvent::Failed { job_id, failure });
        }
        engine_debug!(
            "Poll for job {} failed ({}/{}): {}",
            job_id,
            self.misses,
            bound,
            error
        );
        Some(MonitorEvent::Retrying {
            job_id,
            misses: self.misses,
            error,
        })
    }

    /// Stops polling without any completion or failure event. Idempotent.
    pub fn cancel(&mut self) -> bool {
        if !self.is_polling() {
            return false;
        }
        if let Some(job) = self.job.take() {
            engine_info!("Stopped monitoring job {}", job.id);
        }
        self.phase = MonitorPhase::Idle;
        self.misses = 0;
        true
    }
}
