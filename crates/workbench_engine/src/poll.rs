use std::sync::{mpsc, Arc};

use engine_logging::{engine_debug, engine_info};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use workbench_core::{JobId, JobMonitor, MonitorEvent, MonitorPhase, MonitorSettings};

use crate::{EngineEvent, StatusSource};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// A running poll loop. Dropping it does not stop the loop; `cancel` does.
pub struct MonitorTask {
    token: CancellationToken,
    handle: JoinHandle<MonitorPhase>,
}

impl MonitorTask {
    /// Stops polling. Safe to call any number of times, also after the job ended.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the loop to end and returns where the monitor stopped.
    pub async fn join(self) -> MonitorPhase {
        self.handle.await.unwrap_or(MonitorPhase::Idle)
    }
}

/// Spawns [`run_monitor`] on the current tokio runtime.
pub fn spawn_monitor<S>(
    source: Arc<S>,
    job_id: JobId,
    settings: MonitorSettings,
    sink: Arc<dyn EventSink>,
) -> MonitorTask
where
    S: StatusSource + ?Sized + 'static,
{
    let token = CancellationToken::new();
    let loop_token = token.clone();
    let handle = tokio::spawn(async move {
        // Marks the token cancelled once the loop ends, so owners can prune it.
        let _done = loop_token.clone().drop_guard();
        run_monitor(source.as_ref(), job_id, settings, loop_token, sink.as_ref()).await
    });
    MonitorTask { token, handle }
}

/// Polls `job_id` until it completes, fails, is lost, or `cancel` fires.
///
/// One request per tick, and the next tick waits for the answer, so reports
/// are applied in the order they arrive. Nothing is emitted after cancellation.
pub async fn run_monitor<S>(
    source: &S,
    job_id: JobId,
    settings: MonitorSettings,
    cancel: CancellationToken,
    sink: &dyn EventSink,
) -> MonitorPhase
where
    S: StatusSource + ?Sized,
{
    let mut monitor = JobMonitor::start(job_id.clone(), settings);
    let mut ticker = interval_at(
        Instant::now() + settings.poll_interval,
        settings.poll_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = source.fetch_status(&job_id) => result,
        };
        if cancel.is_cancelled() {
            break;
        }

        let event = match result {
            Ok(report) => monitor.on_report(&report),
            Err(err) => monitor.on_poll_error(err),
        };
        if let Some(event) = event {
            let terminal = event.is_terminal();
            if let MonitorEvent::Progress { progress, .. } = &event {
                engine_debug!("Job {} at {}%", job_id, progress);
            }
            sink.emit(EngineEvent::Monitor(event));
            if terminal {
                return monitor.phase().clone();
            }
        }
    }

    monitor.cancel();
    engine_info!("Poll loop for job {} cancelled", job_id);
    monitor.phase().clone()
}
