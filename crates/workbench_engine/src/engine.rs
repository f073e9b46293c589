use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use workbench_core::{
    DeclaredKind, Generation, JobId, MonitorSettings, PendingUpload, SubmitRequest,
};

use crate::poll::{spawn_monitor, ChannelEventSink, EventSink, MonitorTask};
use crate::{ClientSettings, EngineError, EngineEvent, MediaApi, ReqwestApi};

enum EngineCommand {
    Upload {
        generation: Generation,
        files: Vec<PendingUpload>,
    },
    Probe {
        generation: Generation,
        url: String,
        declared: DeclaredKind,
    },
    Submit {
        generation: Generation,
        request: SubmitRequest,
    },
    StartMonitor {
        job_id: JobId,
    },
    CancelMonitor {
        job_id: JobId,
    },
    Cleanup,
}

/// Runs requests on a background tokio runtime and reports results to an [`EventSink`].
///
/// Handles built with [`EngineHandle::new`] or [`EngineHandle::with_api`] keep the
/// events on an internal channel read through `try_recv`/`recv_timeout`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Option<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let monitor = settings.monitor;
        let api = Arc::new(ReqwestApi::new(settings)?);
        Ok(Self::with_api(api, monitor))
    }

    /// HTTP engine whose events go straight to `sink`.
    pub fn connect(settings: ClientSettings, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let monitor = settings.monitor;
        let api = Arc::new(ReqwestApi::new(settings)?);
        Ok(Self::with_sink(api, monitor, sink))
    }

    pub fn with_api(api: Arc<dyn MediaApi>, monitor: MonitorSettings) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let mut handle = Self::with_sink(api, monitor, Arc::new(ChannelEventSink::new(event_tx)));
        handle.event_rx = Some(event_rx);
        handle
    }

    pub fn with_sink(
        api: Arc<dyn MediaApi>,
        monitor: MonitorSettings,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let mut monitors: HashMap<JobId, MonitorTask> = HashMap::new();

            while let Ok(command) = cmd_rx.recv() {
                monitors.retain(|_, task| !task.is_finished());
                match command {
                    EngineCommand::StartMonitor { job_id } => {
                        let _guard = runtime.enter();
                        if let Some(previous) = monitors.remove(&job_id) {
                            previous.cancel();
                        }
                        let task = spawn_monitor(api.clone(), job_id.clone(), monitor, sink.clone());
                        monitors.insert(job_id, task);
                    }
                    EngineCommand::CancelMonitor { job_id } => match monitors.remove(&job_id) {
                        Some(task) => task.cancel(),
                        None => engine_debug!("No poll loop to cancel for job {}", job_id),
                    },
                    other => {
                        let api = api.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            handle_request(api.as_ref(), other, sink.as_ref()).await;
                        });
                    }
                }
            }

            for (_, task) in monitors.drain() {
                task.cancel();
            }
            engine_info!("Engine command channel closed");
        });

        Self {
            cmd_tx,
            event_rx: None,
        }
    }

    pub fn upload(&self, generation: Generation, files: Vec<PendingUpload>) {
        self.send(EngineCommand::Upload { generation, files });
    }

    pub fn probe(&self, generation: Generation, url: impl Into<String>, declared: DeclaredKind) {
        self.send(EngineCommand::Probe {
            generation,
            url: url.into(),
            declared,
        });
    }

    pub fn submit(&self, generation: Generation, request: SubmitRequest) {
        self.send(EngineCommand::Submit {
            generation,
            request,
        });
    }

    pub fn start_monitor(&self, job_id: JobId) {
        self.send(EngineCommand::StartMonitor { job_id });
    }

    /// Idempotent; unknown or finished jobs are ignored.
    pub fn cancel_monitor(&self, job_id: JobId) {
        self.send(EngineCommand::CancelMonitor { job_id });
    }

    pub fn cleanup(&self) {
        self.send(EngineCommand::Cleanup);
    }

    /// Always `None` for handles that report to a caller-supplied sink.
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.as_ref()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.as_ref()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

async fn handle_request(api: &dyn MediaApi, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::Upload { generation, files } => {
            let result = api.upload(&files).await;
            sink.emit(EngineEvent::UploadFinished { generation, result });
        }
        EngineCommand::Probe {
            generation,
            url,
            declared,
        } => {
            let result = api.probe(&url).await;
            sink.emit(EngineEvent::UrlProbed {
                generation,
                url,
                declared,
                result,
            });
        }
        EngineCommand::Submit {
            generation,
            request,
        } => {
            let result = api.submit(&request).await;
            sink.emit(EngineEvent::SubmissionFinished { generation, result });
        }
        EngineCommand::Cleanup => {
            let result = api.cleanup().await;
            sink.emit(EngineEvent::CleanupFinished(result));
        }
        EngineCommand::StartMonitor { .. } | EngineCommand::CancelMonitor { .. } => {}
    }
}
