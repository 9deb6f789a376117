use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use chrono::Local;
use ingest_core::{update, Msg, PollPhase, TrackerState};
use ingest_logging::{ingest_info, ingest_warn};

use crate::config::AppConfig;
use crate::effects::EffectRunner;
use crate::render;

/// Runs one watch session until `quit`, end of work (with `exit_when_idle`),
/// or the message channel closing.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let tracker_config = config
        .tracker_config()
        .context("invalid tracker configuration")?;
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(config.sampler_settings(), msg_tx.clone())
        .context("failed to start engine")?;
    spawn_command_reader(msg_tx);

    let stdout = io::stdout();
    let clear_screen = stdout.is_terminal();
    let mut out = stdout.lock();

    let mut state = TrackerState::new(tracker_config);
    let initial = std::iter::once(Msg::SessionOpened)
        .chain(config.jobs.iter().cloned().map(Msg::JobRegistered));
    for msg in initial {
        state = dispatch(state, msg, &runner, &mut out, clear_screen)?;
    }

    while let Ok(msg) = msg_rx.recv() {
        let closing = msg == Msg::SessionClosed;
        state = dispatch(state, msg, &runner, &mut out, clear_screen)?;
        if closing {
            break;
        }
        if config.exit_when_idle
            && state.poll_phase() == PollPhase::Idle
            && state.view().all_settled()
        {
            ingest_info!("every job settled, exiting");
            dispatch(state, Msg::SessionClosed, &runner, &mut out, clear_screen)?;
            break;
        }
    }

    runner.shutdown();
    Ok(())
}

fn dispatch(
    state: TrackerState,
    msg: Msg,
    runner: &EffectRunner,
    out: &mut impl Write,
    clear_screen: bool,
) -> io::Result<TrackerState> {
    let (mut state, effects) = update(state, msg);
    runner.run(effects);
    if state.consume_dirty() {
        if clear_screen {
            write!(out, "\x1b[2J\x1b[H")?;
        }
        for line in render::render(&state.view(), Local::now()) {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
    }
    Ok(state)
}

// Registration collaborator: `add <id>`, `remove <id>` and `quit` on stdin.
fn spawn_command_reader(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    ingest_warn!("stdin closed: {}", err);
                    return;
                }
            };
            match parse_command(&line) {
                Some(msg) => {
                    if msg_tx.send(msg).is_err() {
                        return;
                    }
                }
                None if line.trim().is_empty() => {}
                None => ingest_warn!("unrecognised command: {}", line.trim()),
            }
        }
    });
}

fn parse_command(line: &str) -> Option<Msg> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    let argument = parts.next();
    if parts.next().is_some() {
        return None;
    }
    match (verb, argument) {
        ("add", Some(id)) => Some(Msg::JobRegistered(id.to_string())),
        ("remove", Some(id)) => Some(Msg::JobUnregistered(id.to_string())),
        ("quit", None) => Some(Msg::SessionClosed),
        _ => None,
    }
}
