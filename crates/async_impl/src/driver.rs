use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use pid_core::metrics::log_status;
use pid_core::{
    Command, EventSchedule, LiveFeed, Simulation, SimulationConfig, TickRecord, TickRecorder,
};
use tracing::{debug, info};

pub(crate) const MODE: &str = "async";

/// Tokio counterpart of the threaded driver loop.
///
/// The `biased` select polls shutdown first, then pending commands, then the
/// ticker, so queued commands always land before the next tick.
pub(crate) async fn run_simulation_task(
    mut sim: Simulation,
    config: SimulationConfig,
    mut commands: mpsc::Receiver<Command>,
    recorder: TickRecorder,
    feed: LiveFeed,
    mut shutdown: oneshot::Receiver<()>,
    start_time: Instant,
) {
    let period = config.tick_period();
    let deadline = (config.duration_secs > 0).then(|| start_time + config.duration());
    let mut schedule = EventSchedule::new(config.events.clone());
    let mut ticker = interval_at(start_time + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut commands_open = true;

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,

            command = commands.recv(), if commands_open => match command {
                Some(command) => {
                    debug!(?command, "applying command");
                    let _ = sim.apply(command, Instant::now().into_std());
                }
                None => {
                    commands_open = false;
                    // Nothing can stop an open-ended run once its owner is gone.
                    if deadline.is_none() {
                        break;
                    }
                }
            },

            _ = ticker.tick() => {
                let now = Instant::now();
                if deadline.is_some_and(|d| now >= d) {
                    break;
                }

                let elapsed = now.duration_since(start_time).as_secs_f64();
                for event in schedule.due(elapsed) {
                    debug!(at_secs = event.at_secs, command = ?event.command, "scheduled event");
                    let _ = sim.apply(event.command.clone(), now.into_std());
                }

                if let Some(result) = sim.tick(now.into_std()) {
                    if config.enable_logging && result.tick % 60 == 0 {
                        log_status(MODE, &result);
                    }

                    let record = TickRecord::new(MODE, &result);
                    feed.add(record.clone());
                    recorder.record(record);
                }
            }
        }
    }

    info!(
        ticks = sim.stats().ticks,
        elapsed = ?start_time.elapsed(),
        "async driver stopped"
    );
}
