use std::sync::Once;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workbench_core::{
    DeclaredKind, ImportError, JobId, MonitorEvent, MonitorSettings, Operation, OptionSet,
    SubmitRequest,
};
use workbench_engine::{ClientSettings, EngineEvent, EngineHandle};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn engine_for(server: &MockServer) -> EngineHandle {
    let mut settings = ClientSettings::with_base_url(&server.uri()).unwrap();
    settings.monitor = MonitorSettings {
        poll_interval: Duration::from_millis(20),
        max_consecutive_failures: 3,
    };
    EngineHandle::new(settings).unwrap()
}

async fn next_event(engine: &EngineHandle) -> EngineEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(event) = engine.try_recv() {
            return event;
        }
        assert!(Instant::now() < deadline, "no engine event within 5s");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn submit_then_monitor_until_complete() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "task_id": "job-7"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/job-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "completed",
            "progress": 100,
            "message": "Processing completed!",
            "output_file": "merged.mp4"
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.submit(
        4,
        SubmitRequest {
            operation: Operation::MergeAudioVideo,
            files: Vec::new(),
            options: OptionSet::new(),
        },
    );
    assert_eq!(
        next_event(&engine).await,
        EngineEvent::SubmissionFinished {
            generation: 4,
            result: Ok(JobId::new("job-7")),
        }
    );

    engine.start_monitor(JobId::new("job-7"));
    assert_eq!(
        next_event(&engine).await,
        EngineEvent::Monitor(MonitorEvent::Completed {
            job_id: JobId::new("job-7"),
            output: Some("merged.mp4".to_string()),
            message: "Processing completed!".to_string(),
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_result_keeps_its_generation() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/missing.wav"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let url = format!("{}/missing.wav", server.uri());
    engine.probe(9, url.clone(), DeclaredKind::Audio);
    assert_eq!(
        next_event(&engine).await,
        EngineEvent::UrlProbed {
            generation: 9,
            url,
            declared: DeclaredKind::Audio,
            result: Err(ImportError::Non2xx(403)),
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_monitor_goes_quiet() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/job-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "processing",
            "progress": 10,
            "message": "Working"
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.start_monitor(JobId::new("job-8"));
    assert!(matches!(
        next_event(&engine).await,
        EngineEvent::Monitor(MonitorEvent::Progress { .. })
    ));

    engine.cancel_monitor(JobId::new("job-8"));
    engine.cancel_monitor(JobId::new("job-8"));
    tokio::time::sleep(Duration::from_millis(60)).await;
    while engine.try_recv().is_some() {}

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.try_recv(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn cleanup_round_trip() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cleanup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "Cleanup completed"
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.cleanup();
    assert_eq!(
        next_event(&engine).await,
        EngineEvent::CleanupFinished(Ok("Cleanup completed".to_string()))
    );
}
