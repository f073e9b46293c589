use std::sync::{mpsc, Arc};

use engine_logging::{engine_info, engine_warn};
use workbench_core::{Effect, Msg};
use workbench_engine::{ClientSettings, EngineError, EngineEvent, EngineHandle, EventSink};

/// Hands effects from `update` to the engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings, msg_tx: mpsc::Sender<Msg>) -> Result<Self, EngineError> {
        let engine = EngineHandle::connect(settings, Arc::new(MsgSink { msg_tx }))?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::UploadFiles { generation, files } => {
                    engine_info!("Uploading {} file(s)", files.len());
                    self.engine.upload(generation, files);
                }
                Effect::ProbeUrl {
                    generation,
                    url,
                    declared,
                } => {
                    engine_info!("Probing {}", url);
                    self.engine.probe(generation, url, declared);
                }
                Effect::SubmitJob {
                    generation,
                    request,
                } => {
                    engine_info!(
                        "Submitting {} with {} file(s)",
                        request.operation,
                        request.files.len()
                    );
                    self.engine.submit(generation, request);
                }
                Effect::StartMonitor { job_id } => self.engine.start_monitor(job_id),
                Effect::CancelMonitor { job_id } => self.engine.cancel_monitor(job_id),
            }
        }
    }
}

/// Feeds engine results back into the message loop.
struct MsgSink {
    msg_tx: mpsc::Sender<Msg>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        if let Some(msg) = to_msg(event) {
            let _ = self.msg_tx.send(msg);
        }
    }
}

pub(crate) fn to_msg(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::UploadFinished { generation, result } => {
            Some(Msg::UploadFinished { generation, result })
        }
        EngineEvent::UrlProbed {
            generation,
            url,
            declared,
            result,
        } => Some(Msg::UrlProbed {
            generation,
            url,
            declared,
            result,
        }),
        EngineEvent::SubmissionFinished { generation, result } => {
            Some(Msg::SubmissionFinished { generation, result })
        }
        EngineEvent::Monitor(event) => Some(Msg::Monitor(event)),
        EngineEvent::CleanupFinished(result) => {
            engine_warn!("Unexpected cleanup result in the workflow loop: {:?}", result);
            None
        }
    }
}
