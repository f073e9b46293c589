//! Workbench engine: HTTP client for the processing server and effect execution.
mod api;
mod engine;
mod poll;
mod settings;
mod types;

pub use api::{MediaApi, ReqwestApi, StatusSource};
pub use engine::EngineHandle;
pub use poll::{run_monitor, spawn_monitor, ChannelEventSink, EventSink, MonitorTask};
pub use settings::{ClientSettings, DEFAULT_SERVER_URL};
pub use types::{EngineError, EngineEvent};
