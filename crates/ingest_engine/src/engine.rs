use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use ingest_logging::{ingest_debug, ingest_info};
use tokio::runtime::Runtime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{EngineError, EngineEvent, StatusSampler};

/// Receives everything the engine produces.
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

enum EngineCommand {
    StartPolling { interval: Duration },
    StopPolling,
    StartAnimation { interval: Duration },
    StopAnimation,
    Sample { job_ids: Vec<String> },
    Shutdown,
}

/// Owns the poll timer, the animation timer and in-flight status queries.
///
/// Dropping the handle cancels all of them and joins the worker thread, so no
/// event is emitted after the owner is gone.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(
        sampler: Arc<dyn StatusSampler>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("ingest-engine")
            .enable_all()
            .build()
            .map_err(EngineError::Runtime)?;
        let (cmd_tx, cmd_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("ingest-engine-commands".to_string())
            .spawn(move || run_commands(runtime, cmd_rx, sampler, sink))
            .map_err(EngineError::Spawn)?;

        Ok(Self {
            cmd_tx,
            worker: Some(worker),
        })
    }

    pub fn start_polling(&self, interval: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling { interval });
    }

    pub fn stop_polling(&self) {
        let _ = self.cmd_tx.send(EngineCommand::StopPolling);
    }

    pub fn start_animation(&self, interval: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::StartAnimation { interval });
    }

    pub fn stop_animation(&self) {
        let _ = self.cmd_tx.send(EngineCommand::StopAnimation);
    }

    pub fn sample(&self, job_ids: Vec<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Sample { job_ids });
    }

    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.cmd_tx.send(EngineCommand::Shutdown);
            let _ = worker.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn run_commands(
    runtime: Runtime,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    sampler: Arc<dyn StatusSampler>,
    sink: Arc<dyn EventSink>,
) {
    let shutdown = CancellationToken::new();
    let mut poll_timer: Option<CancellationToken> = None;
    let mut animation_timer: Option<CancellationToken> = None;

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::StartPolling { interval } => {
                ingest_debug!("poll timer every {:?}", interval);
                cancel(&mut poll_timer);
                poll_timer = Some(spawn_timer(
                    &runtime,
                    &shutdown,
                    interval,
                    sink.clone(),
                    || EngineEvent::PollTick,
                ));
            }
            EngineCommand::StopPolling => cancel(&mut poll_timer),
            EngineCommand::StartAnimation { interval } => {
                ingest_debug!("animation timer every {:?}", interval);
                cancel(&mut animation_timer);
                animation_timer = Some(spawn_timer(
                    &runtime,
                    &shutdown,
                    interval,
                    sink.clone(),
                    || EngineEvent::AnimationTick { at: Instant::now() },
                ));
            }
            EngineCommand::StopAnimation => cancel(&mut animation_timer),
            EngineCommand::Sample { job_ids } => {
                let sampler = sampler.clone();
                let sink = sink.clone();
                let token = shutdown.child_token();
                runtime.spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        result = sampler.sample(&job_ids) => {
                            sink.emit(EngineEvent::StatusSampled {
                                result,
                                observed_at: Instant::now(),
                            });
                        }
                    }
                });
            }
            EngineCommand::Shutdown => break,
        }
    }

    ingest_info!("engine shutting down");
    shutdown.cancel();
    runtime.shutdown_timeout(Duration::from_secs(1));
}

fn cancel(timer: &mut Option<CancellationToken>) {
    if let Some(token) = timer.take() {
        token.cancel();
    }
}

fn spawn_timer(
    runtime: &Runtime,
    shutdown: &CancellationToken,
    interval: Duration,
    sink: Arc<dyn EventSink>,
    make_event: fn() -> EngineEvent,
) -> CancellationToken {
    let token = shutdown.child_token();
    let task_token = token.clone();
    runtime.spawn(async move {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = task_token.cancelled() => break,
                _ = ticker.tick() => sink.emit(make_event()),
            }
        }
    });
    token
}
