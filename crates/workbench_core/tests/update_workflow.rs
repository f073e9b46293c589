use std::sync::Once;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use workbench_core::{
    update, AppState, DeclaredKind, Effect, FileSource, FileType, JobId, JobStatus, LocalFile,
    MonitorEvent, MonitorFailure, Msg, Operation, OptionValue, ProbeInfo, Region, Severity, Stage,
    SubmissionError, UploadError, UploadedFile,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn server_file(name: &str, file_type: FileType, size: u64) -> UploadedFile {
    UploadedFile {
        original_name: name.to_string(),
        saved_name: format!("saved_{name}"),
        file_type,
        size,
        source: FileSource::Local,
        origin_url: None,
    }
}

fn selected(op: Operation) -> AppState {
    let (state, effects) = update(AppState::new(), Msg::OperationSelected(op));
    assert!(effects.is_empty());
    state
}

/// Picks and uploads `files` for `slot`, answering the upload with `returned`.
fn upload(state: AppState, slot: &str, files: Vec<LocalFile>, returned: Vec<UploadedFile>) -> AppState {
    let (state, _) = update(
        state,
        Msg::LocalFilesChosen {
            slot: slot.to_string(),
            files,
        },
    );
    let (state, effects) = update(state, Msg::UploadClicked);
    let generation = match effects.as_slice() {
        [Effect::UploadFiles { generation, .. }] => *generation,
        other => panic!("expected one upload effect, got {other:?}"),
    };
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            generation,
            result: Ok(returned),
        },
    );
    state
}

/// Submits and accepts the submission as `task_id`.
fn submit_as(state: AppState, task_id: &str) -> AppState {
    let (state, effects) = update(state, Msg::SubmitClicked);
    let generation = match effects.as_slice() {
        [Effect::SubmitJob { generation, .. }] => *generation,
        other => panic!("expected one submit effect, got {other:?}"),
    };
    let (state, effects) = update(
        state,
        Msg::SubmissionFinished {
            generation,
            result: Ok(JobId::new(task_id)),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::StartMonitor {
            job_id: JobId::new(task_id)
        }]
    );
    state
}

fn count_toasts(state: &AppState, severity: Severity) -> usize {
    state
        .view()
        .toasts
        .iter()
        .filter(|toast| toast.severity == severity)
        .count()
}

#[test]
fn convert_format_runs_to_completion() {
    init_logging();
    let state = selected(Operation::ConvertFormat);
    assert_eq!(state.stage(), Stage::GatheringFiles);

    let state = upload(
        state,
        "media_file",
        vec![LocalFile::new("/tmp/talk.wav", 2_000_000)],
        vec![server_file("talk.wav", FileType::Unknown, 2_000_000)],
    );
    assert_eq!(state.stage(), Stage::ReadyToSubmit);
    assert!(state.view().can_submit);

    let (state, _) = update(
        state,
        Msg::OptionEdited {
            name: "target_format".to_string(),
            raw: "mp3".to_string(),
        },
    );
    let (state, effects) = update(state, Msg::SubmitClicked);
    assert_eq!(state.stage(), Stage::Submitting);
    assert!(!state.view().can_submit);
    let (generation, request) = match effects.as_slice() {
        [Effect::SubmitJob {
            generation,
            request,
        }] => (*generation, request.clone()),
        other => panic!("unexpected effects {other:?}"),
    };
    assert_eq!(request.operation, Operation::ConvertFormat);
    assert_eq!(request.files.len(), 1);
    assert_eq!(
        request.options.get("target_format"),
        Some(&OptionValue::Text("mp3".to_string()))
    );

    let (state, effects) = update(
        state,
        Msg::SubmissionFinished {
            generation,
            result: Ok(JobId::new("task-1")),
        },
    );
    assert_eq!(state.stage(), Stage::Monitoring);
    assert_eq!(
        effects,
        vec![Effect::StartMonitor {
            job_id: JobId::new("task-1")
        }]
    );

    let (state, _) = update(
        state,
        Msg::Monitor(MonitorEvent::Progress {
            job_id: JobId::new("task-1"),
            status: JobStatus::Processing,
            progress: 50,
            message: "Converting to mp3...".to_string(),
        }),
    );
    let job = state.view().job.unwrap();
    assert_eq!(job.progress, 50);
    assert_eq!(job.message, "Converting to mp3...");

    let (state, effects) = update(
        state,
        Msg::Monitor(MonitorEvent::Completed {
            job_id: JobId::new("task-1"),
            output: Some("out.mp3".to_string()),
            message: "Processing completed!".to_string(),
        }),
    );
    assert!(effects.is_empty());
    assert_eq!(state.stage(), Stage::Completed);
    assert_eq!(state.output(), Some("out.mp3"));
    assert!(state.active_job().is_none());
    assert_eq!(count_toasts(&state, Severity::Success), 1);
    let view = state.view();
    assert!(view.show_results_section);
    assert!(!view.can_submit);
}

#[test]
fn rejected_submission_returns_to_ready() {
    init_logging();
    let state = upload(
        selected(Operation::LoopAudio),
        "audio_file",
        vec![LocalFile::new("beat.mp3", 1000)],
        vec![server_file("beat.mp3", FileType::Audio, 1000)],
    );
    let (state, effects) = update(state, Msg::SubmitClicked);
    let generation = match effects.as_slice() {
        [Effect::SubmitJob { generation, .. }] => *generation,
        other => panic!("unexpected effects {other:?}"),
    };

    let (state, effects) = update(
        state,
        Msg::SubmissionFinished {
            generation,
            result: Err(SubmissionError::ValidationRejected(
                "no audio stream".to_string(),
            )),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.stage(), Stage::ReadyToSubmit);
    assert_eq!(count_toasts(&state, Severity::Error), 1);
    let view = state.view();
    assert!(view.can_submit);
    assert!(view.toasts[view.toasts.len() - 1]
        .message
        .contains("no audio stream"));
}

#[test]
fn failed_job_is_notified_and_reported() {
    init_logging();
    let state = upload(
        selected(Operation::MergeAudioVideo),
        "audio_file",
        vec![LocalFile::new("a.mp3", 10)],
        vec![server_file("a.mp3", FileType::Audio, 10)],
    );
    let state = submit_as(state, "task-9");

    let (state, effects) = update(
        state,
        Msg::Monitor(MonitorEvent::Failed {
            job_id: JobId::new("task-9"),
            failure: MonitorFailure::JobFailed("decode error".to_string()),
        }),
    );
    assert!(effects.is_empty());
    assert_eq!(state.stage(), Stage::Failed);
    assert_eq!(state.failure(), Some("decode error"));
    assert_eq!(count_toasts(&state, Severity::Error), 1);
    let report = state
        .notifications()
        .report_for(Region::Processing)
        .expect("persistent report");
    assert!(report.message.contains("decode error"));
    assert_eq!(report.severity, Severity::Error);
}

#[test]
fn selecting_while_monitoring_cancels_first() {
    init_logging();
    let state = upload(
        selected(Operation::ConvertFormat),
        "media_file",
        vec![LocalFile::new("in.avi", 10)],
        vec![server_file("in.avi", FileType::Video, 10)],
    );
    let state = submit_as(state, "task-2");

    let (state, effects) = update(state, Msg::OperationSelected(Operation::LoopAudio));
    assert_eq!(
        effects,
        vec![Effect::CancelMonitor {
            job_id: JobId::new("task-2")
        }]
    );
    assert_eq!(state.stage(), Stage::GatheringFiles);
    assert!(state.uploads().current_files().is_empty());
    assert!(state.active_job().is_none());

    // A late completion for the old job changes nothing.
    let before = state.clone();
    let (after, _) = update(
        state,
        Msg::Monitor(MonitorEvent::Completed {
            job_id: JobId::new("task-2"),
            output: Some("old.mp4".to_string()),
            message: String::new(),
        }),
    );
    assert_eq!(after, before);
}

#[test]
fn second_upload_replaces_the_file_list() {
    init_logging();
    let state = upload(
        selected(Operation::MergeAudioTracks),
        "audio_files",
        vec![LocalFile::new("1.mp3", 1), LocalFile::new("2.mp3", 1)],
        vec![
            server_file("1.mp3", FileType::Audio, 1),
            server_file("2.mp3", FileType::Audio, 1),
        ],
    );
    assert_eq!(state.uploads().current_files().len(), 2);

    let state = upload(
        state,
        "audio_files",
        vec![LocalFile::new("3.mp3", 1)],
        vec![server_file("3.mp3", FileType::Audio, 1)],
    );
    let names: Vec<_> = state
        .uploads()
        .current_files()
        .iter()
        .map(|file| file.original_name.as_str())
        .collect();
    assert_eq!(names, vec!["3.mp3"]);
    assert_eq!(state.stage(), Stage::ReadyToSubmit);
}

#[test]
fn failed_upload_releases_the_busy_flag() {
    init_logging();
    let state = selected(Operation::LoopAudio);
    let (state, _) = update(
        state,
        Msg::LocalFilesChosen {
            slot: "audio_file".to_string(),
            files: vec![LocalFile::new("x.mp3", 5)],
        },
    );
    let (state, effects) = update(state, Msg::UploadClicked);
    assert!(state.is_uploading());
    // Not reentrant while the first request is out.
    let (state, again) = update(state, Msg::UploadClicked);
    assert!(again.is_empty());

    let generation = match effects.as_slice() {
        [Effect::UploadFiles { generation, files }] => {
            assert_eq!(files.len(), 1);
            *generation
        }
        other => panic!("unexpected effects {other:?}"),
    };
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            generation,
            result: Err(UploadError::Network("connection refused".to_string())),
        },
    );
    assert!(!state.is_uploading());
    assert_eq!(state.stage(), Stage::GatheringFiles);
    assert!(!state.uploads().has_pending());
    assert_eq!(count_toasts(&state, Severity::Error), 1);
    assert!(state.notifications().report_for(Region::Upload).is_some());
}

#[test]
fn empty_upload_result_stays_gathering() {
    init_logging();
    let state = upload(
        selected(Operation::LoopAudio),
        "audio_file",
        vec![LocalFile::new("x.mp3", 5)],
        Vec::new(),
    );
    assert_eq!(state.stage(), Stage::GatheringFiles);
    assert_eq!(count_toasts(&state, Severity::Warning), 1);
    let (state, effects) = update(state, Msg::SubmitClicked);
    assert!(effects.is_empty());
    assert_eq!(state.stage(), Stage::GatheringFiles);
}

#[test]
fn upload_result_from_previous_selection_is_dropped() {
    init_logging();
    let state = selected(Operation::LoopAudio);
    let (state, _) = update(
        state,
        Msg::LocalFilesChosen {
            slot: "audio_file".to_string(),
            files: vec![LocalFile::new("x.mp3", 5)],
        },
    );
    let (state, effects) = update(state, Msg::UploadClicked);
    let Effect::UploadFiles { generation, .. } = effects[0].clone() else {
        panic!("expected upload");
    };
    let (state, _) = update(state, Msg::OperationSelected(Operation::ConvertFormat));
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            generation,
            result: Ok(vec![server_file("x.mp3", FileType::Audio, 5)]),
        },
    );
    assert!(state.uploads().current_files().is_empty());
    assert_eq!(state.stage(), Stage::GatheringFiles);
}

#[test]
fn url_import_adds_a_deferred_reference() {
    init_logging();
    let state = selected(Operation::ConvertFormat);
    let (state, effects) = update(
        state,
        Msg::UrlImportRequested {
            url: "https://example.com/clip.mp4".to_string(),
            declared: DeclaredKind::Auto,
        },
    );
    let generation = match effects.as_slice() {
        [Effect::ProbeUrl { generation, url, .. }] => {
            assert_eq!(url, "https://example.com/clip.mp4");
            *generation
        }
        other => panic!("unexpected effects {other:?}"),
    };
    assert!(state.is_importing());

    let (state, _) = update(
        state,
        Msg::UrlProbed {
            generation,
            url: "https://example.com/clip.mp4".to_string(),
            declared: DeclaredKind::Auto,
            result: Ok(ProbeInfo {
                content_type: Some("video/mp4".to_string()),
                content_length: Some(4096),
            }),
        },
    );
    let files = state.uploads().current_files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_type, FileType::Video);
    assert_eq!(files[0].original_name, "clip.mp4");
    assert_eq!(files[0].source, FileSource::Url);
    assert_eq!(files[0].origin_url.as_deref(), Some("https://example.com/clip.mp4"));
    assert_eq!(state.stage(), Stage::ReadyToSubmit);
    assert_eq!(count_toasts(&state, Severity::Success), 1);
}

#[test]
fn blank_url_is_refused_locally() {
    init_logging();
    let (state, effects) = update(
        selected(Operation::ConvertFormat),
        Msg::UrlImportRequested {
            url: "   ".to_string(),
            declared: DeclaredKind::Auto,
        },
    );
    assert!(effects.is_empty());
    assert!(!state.is_importing());
    assert_eq!(count_toasts(&state, Severity::Error), 1);
}

#[test]
fn invalid_option_blocks_submission() {
    init_logging();
    let state = upload(
        selected(Operation::LoopAudio),
        "audio_file",
        vec![LocalFile::new("x.mp3", 5)],
        vec![server_file("x.mp3", FileType::Audio, 5)],
    );
    let (state, _) = update(
        state,
        Msg::OptionEdited {
            name: "duration".to_string(),
            raw: "forever".to_string(),
        },
    );
    let (state, effects) = update(state, Msg::SubmitClicked);
    assert!(effects.is_empty());
    assert_eq!(state.stage(), Stage::ReadyToSubmit);
    assert!(state.notifications().report_for(Region::Options).is_some());
}

#[test]
fn monitoring_lost_fails_the_workflow() {
    init_logging();
    let state = upload(
        selected(Operation::LoopAudio),
        "audio_file",
        vec![LocalFile::new("x.mp3", 5)],
        vec![server_file("x.mp3", FileType::Audio, 5)],
    );
    let state = submit_as(state, "task-lost");
    let (state, _) = update(
        state,
        Msg::Monitor(MonitorEvent::Failed {
            job_id: JobId::new("task-lost"),
            failure: MonitorFailure::MonitoringLost { misses: 10 },
        }),
    );
    assert_eq!(state.stage(), Stage::Failed);

    // Picking an operation is the only way out of a terminal stage.
    let (state, effects) = update(state, Msg::SubmitClicked);
    assert!(effects.is_empty());
    assert_eq!(state.stage(), Stage::Failed);
    let (state, _) = update(state, Msg::OperationSelected(Operation::LoopAudio));
    assert_eq!(state.stage(), Stage::GatheringFiles);
    assert!(state.notifications().report_for(Region::Processing).is_none());
}

#[test]
fn abandon_stops_monitoring_and_allows_resubmit() {
    init_logging();
    let state = upload(
        selected(Operation::LoopAudio),
        "audio_file",
        vec![LocalFile::new("x.mp3", 5)],
        vec![server_file("x.mp3", FileType::Audio, 5)],
    );
    let state = submit_as(state, "task-a");
    assert!(state.view().can_abandon);

    let (state, effects) = update(state, Msg::AbandonClicked);
    assert_eq!(
        effects,
        vec![Effect::CancelMonitor {
            job_id: JobId::new("task-a")
        }]
    );
    assert_eq!(state.stage(), Stage::ReadyToSubmit);
    assert!(state.view().can_submit);
}

#[test]
fn progress_never_goes_backwards_in_the_view() {
    init_logging();
    let state = upload(
        selected(Operation::LoopAudio),
        "audio_file",
        vec![LocalFile::new("x.mp3", 5)],
        vec![server_file("x.mp3", FileType::Audio, 5)],
    );
    let mut state = submit_as(state, "task-p");
    let mut observed = Vec::new();
    for progress in [10, 50, 30, 80] {
        let (next, _) = update(
            state,
            Msg::Monitor(MonitorEvent::Progress {
                job_id: JobId::new("task-p"),
                status: JobStatus::Processing,
                progress,
                message: String::new(),
            }),
        );
        observed.push(next.view().job.unwrap().progress);
        state = next;
    }
    assert_eq!(observed, vec![10, 50, 50, 80]);
}

#[test]
fn toasts_expire_on_tick() {
    init_logging();
    let state = AppState::with_toast_duration(Duration::from_millis(50));
    let (state, _) = update(state, Msg::OperationSelected(Operation::ConvertFormat));
    let (mut state, _) = update(state, Msg::UploadClicked);
    assert_eq!(state.view().toasts.len(), 1);
    state.consume_dirty();

    let (mut state, _) = update(state, Msg::Tick(Instant::now() + Duration::from_secs(1)));
    assert!(state.view().toasts.is_empty());
    assert!(state.consume_dirty());
}

#[test]
fn unknown_slot_is_refused_with_a_warning() {
    init_logging();
    let (state, _) = update(
        selected(Operation::ConvertFormat),
        Msg::LocalFilesChosen {
            slot: "video_file".to_string(),
            files: vec![LocalFile::new("x.mp4", 5)],
        },
    );
    assert!(!state.uploads().has_pending());
    assert_eq!(count_toasts(&state, Severity::Warning), 1);
}

#[test]
fn dismissing_one_toast_keeps_the_others() {
    init_logging();
    let (state, _) = update(selected(Operation::ConvertFormat), Msg::UploadClicked);
    let (mut state, _) = update(
        state,
        Msg::UrlImportRequested {
            url: String::new(),
            declared: DeclaredKind::Auto,
        },
    );
    let toasts = state.view().toasts;
    assert_eq!(toasts.len(), 2);
    assert_eq!(toasts[0].severity, Severity::Warning);
    state.consume_dirty();

    let (mut state, effects) = update(state, Msg::ToastDismissed(toasts[0].id));
    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let remaining = state.view().toasts;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, toasts[1].id);
    assert_eq!(remaining[0].severity, Severity::Error);

    let (mut state, _) = update(state, Msg::ToastDismissed(toasts[0].id));
    assert!(!state.consume_dirty());
    assert_eq!(state.view().toasts.len(), 1);
}
