//! Runs a `Simulation` as a tokio task driven by `tokio::time::interval`.

mod driver;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use pid_core::{Command, LiveFeed, SimError, Simulation, SimulationConfig, TickRecorder};
use tracing::{info, warn};

const COMMAND_BUFFER: usize = 64;

pub struct AsyncSimulationHandle {
    commands: mpsc::Sender<Command>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    recorder: TickRecorder,
    feed: LiveFeed,
}

impl AsyncSimulationHandle {
    /// Returns `false` once the task has exited.
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub fn live(&self) -> &LiveFeed {
        &self.feed
    }

    pub fn recorder(&self) -> &TickRecorder {
        &self.recorder
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the configured duration to elapse.
    pub async fn wait(self) -> TickRecorder {
        let Self {
            task,
            recorder,
            shutdown,
            ..
        } = self;
        if let Err(e) = task.await {
            warn!(error = %e, "simulation task failed");
        }
        drop(shutdown);
        recorder
    }

    pub async fn stop(mut self) -> TickRecorder {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.wait().await
    }
}

/// Spawns the driver onto the current tokio runtime.
pub fn spawn_simulation(
    config: SimulationConfig,
    feed: Option<LiveFeed>,
) -> Result<AsyncSimulationHandle, SimError> {
    let start_time = Instant::now();
    let sim = Simulation::from_config(&config, start_time.into_std())?;

    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let recorder = TickRecorder::new();
    let feed = feed.unwrap_or_default();

    info!(
        experiment = %config.experiment_name,
        plant = %config.plant,
        difficulty = %config.difficulty,
        rate_hz = config.tick_rate_hz,
        "starting async simulation"
    );

    let task = tokio::spawn(driver::run_simulation_task(
        sim,
        config,
        rx,
        recorder.clone(),
        feed.clone(),
        shutdown_rx,
        start_time,
    ));

    Ok(AsyncSimulationHandle {
        commands: tx,
        shutdown: Some(shutdown_tx),
        task,
        recorder,
        feed,
    })
}

/// Runs one experiment to completion with no external commands.
///
/// Open-ended configs (`duration_secs = 0`) are rejected since nothing could
/// stop them.
pub async fn run_experiment(config: SimulationConfig) -> Result<TickRecorder, SimError> {
    if config.duration_secs == 0 {
        return Err(SimError::OpenEndedRun);
    }
    let (_tx, rx) = mpsc::channel(1);
    run_experiment_with_feed(config, rx, None).await
}

/// Runs one experiment inline on the calling task.
///
/// With `duration_secs = 0` this returns once every sender for `commands`
/// has been dropped.
pub async fn run_experiment_with_feed(
    config: SimulationConfig,
    commands: mpsc::Receiver<Command>,
    feed: Option<LiveFeed>,
) -> Result<TickRecorder, SimError> {
    let start_time = Instant::now();
    let sim = Simulation::from_config(&config, start_time.into_std())?;
    let recorder = TickRecorder::new();
    let (_shutdown_tx, shutdown_rx) = oneshot::channel();

    driver::run_simulation_task(
        sim,
        config,
        commands,
        recorder.clone(),
        feed.unwrap_or_default(),
        shutdown_rx,
        start_time,
    )
    .await;

    Ok(recorder)
}
