use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use engine_logging::{engine_info, engine_warn, set_job_context};
use workbench_core::{update, AppState, Msg};
use workbench_engine::{EngineEvent, EngineHandle};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::logging;
use super::script::{Driver, Outcome, Script, Step};
use super::ui::render::{operations_listing, TextRenderer};
use crate::cli::{Cli, Command};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.global.config.as_deref())?;
    config.apply_overrides(&cli.global);
    logging::initialize(config.log_destination, config.level_filter()?);

    match cli.command {
        Command::Operations => {
            print!("{}", operations_listing());
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => {
            let script = Script::from_args(&args)?;
            engine_info!(
                "Running {} against {}",
                script.operation,
                config.server_url
            );
            let outcome = run_workflow(&config, script)?;
            report_outcome(&outcome);
            Ok(ExitCode::from(exit_status(&outcome)))
        }
        Command::Cleanup => run_cleanup(&config),
    }
}

/// Owns the state between messages and pushes each change out.
struct Shell {
    state: AppState,
    runner: EffectRunner,
    renderer: TextRenderer,
}

impl Shell {
    fn dispatch_msg(&mut self, msg: Msg) {
        set_job_context(job_context(&self.state, &msg));
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        set_job_context(state.active_job().map(|job| job.id.as_str()));
        self.runner.enqueue(effects);
        if state.consume_dirty() {
            for line in self.renderer.render(&state.view()) {
                println!("{line}");
            }
        }
        self.state = state;
    }
}

/// Task id to tag log lines with while `msg` is handled.
fn job_context<'a>(state: &'a AppState, msg: &'a Msg) -> Option<&'a str> {
    msg.job_id()
        .or_else(|| state.active_job().map(|job| &job.id))
        .map(|job_id| job_id.as_str())
}

fn run_workflow(config: &AppConfig, script: Script) -> Result<Outcome> {
    let settings = config.client_settings()?;
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(settings.clone(), msg_tx.clone())
        .context("starting the request engine")?;

    // Background tick to expire toasts.
    let tick_tx = msg_tx.clone();
    thread::spawn(move || {
        while tick_tx.send(Msg::Tick(Instant::now())).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });
    spawn_abandon_listener(msg_tx);

    let mut shell = Shell {
        state: AppState::with_toast_duration(config.toast_duration()),
        runner,
        renderer: TextRenderer::new(settings),
    };
    let mut driver = Driver::new(script);

    let outcome = loop {
        match driver.next_step(&shell.state.view()) {
            Step::Dispatch(msg) => shell.dispatch_msg(msg),
            Step::Wait => {
                let msg = msg_rx.recv().context("message loop disconnected")?;
                shell.dispatch_msg(msg);
            }
            Step::Finish(outcome) => break outcome,
        }
    };
    set_job_context(None);
    Ok(outcome)
}

/// `q` + Enter on stdin abandons the running job.
fn spawn_abandon_listener(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("q") && msg_tx.send(Msg::AbandonClicked).is_err() {
                break;
            }
        }
    });
}

fn report_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Completed { output } => engine_info!("Workflow completed, output {:?}", output),
        Outcome::Failed(reason) => {
            engine_warn!("Job failed: {}", reason);
            eprintln!("workbench: job failed: {reason}");
        }
        Outcome::Abandoned => {
            engine_info!("Job abandoned by the user");
            eprintln!("workbench: stopped waiting; the server may still finish the job");
        }
        Outcome::Aborted(reason) => {
            engine_warn!("Workflow aborted: {}", reason);
            eprintln!("workbench: {reason}");
        }
    }
}

fn exit_status(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Completed { .. } => 0,
        Outcome::Failed(_) => 1,
        Outcome::Aborted(_) => 2,
        Outcome::Abandoned => 3,
    }
}

fn run_cleanup(config: &AppConfig) -> Result<ExitCode> {
    let settings = config.client_settings()?;
    let wait = settings.connect_timeout + settings.request_timeout;
    let engine = EngineHandle::new(settings).context("starting the request engine")?;

    engine.cleanup();
    match engine.recv_timeout(wait) {
        Some(EngineEvent::CleanupFinished(Ok(message))) => {
            engine_info!("Cleanup: {}", message);
            println!("{message}");
            Ok(ExitCode::SUCCESS)
        }
        Some(EngineEvent::CleanupFinished(Err(err))) => Err(err).context("cleanup failed"),
        Some(other) => bail!("unexpected engine event {other:?}"),
        None => bail!("no answer from the server within {}s", wait.as_secs()),
    }
}
