//! Runs a `Simulation` on a dedicated OS thread at a fixed tick rate.

mod driver;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use pid_core::{Command, LiveFeed, SimError, Simulation, SimulationConfig, TickRecorder};
use tracing::{info, warn};

/// Owner-side view of a running simulation thread.
pub struct SimulationHandle {
    commands: Sender<Command>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    recorder: TickRecorder,
    feed: LiveFeed,
}

impl SimulationHandle {
    /// Queues a command for the next inter-tick gap. Returns `false` once the
    /// thread has exited.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn live(&self) -> &LiveFeed {
        &self.feed
    }

    pub fn recorder(&self) -> &TickRecorder {
        &self.recorder
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Blocks until the configured duration has elapsed.
    pub fn wait(mut self) -> TickRecorder {
        self.join();
        self.recorder.clone()
    }

    /// Stops after the tick in progress, if any, and returns the recording.
    pub fn stop(mut self) -> TickRecorder {
        self.shutdown.store(true, Ordering::Relaxed);
        self.join();
        self.recorder.clone()
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("simulation thread panicked");
            }
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.join();
    }
}

pub fn spawn_simulation(
    config: SimulationConfig,
    feed: Option<LiveFeed>,
) -> Result<SimulationHandle, SimError> {
    let start_time = Instant::now();
    let sim = Simulation::from_config(&config, start_time)?;

    let (tx, rx) = mpsc::channel();
    let shutdown = Arc::new(AtomicBool::new(false));
    let recorder = TickRecorder::new();
    let feed = feed.unwrap_or_default();

    info!(
        experiment = %config.experiment_name,
        plant = %config.plant,
        difficulty = %config.difficulty,
        rate_hz = config.tick_rate_hz,
        "starting threaded simulation"
    );

    let thread = {
        let recorder = recorder.clone();
        let feed = feed.clone();
        let shutdown = shutdown.clone();
        thread::spawn(move || {
            driver::run_simulation_thread(
                sim,
                config,
                rx,
                recorder,
                feed,
                shutdown,
                start_time,
            )
        })
    };

    Ok(SimulationHandle {
        commands: tx,
        shutdown,
        thread: Some(thread),
        recorder,
        feed,
    })
}

/// Runs one experiment to completion on a background thread.
///
/// Open-ended configs (`duration_secs = 0`) are rejected; use
/// `spawn_simulation` and `SimulationHandle::stop` for those.
pub fn run_experiment(config: SimulationConfig) -> Result<TickRecorder, SimError> {
    if config.duration_secs == 0 {
        return Err(SimError::OpenEndedRun);
    }
    Ok(spawn_simulation(config, None)?.wait())
}
