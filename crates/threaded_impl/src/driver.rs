use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use pid_core::metrics::log_status;
use pid_core::{
    Command, EventSchedule, LiveFeed, Simulation, SimulationConfig, TickRecord, TickRecorder,
};
use tracing::{debug, info};

pub(crate) const MODE: &str = "threaded";

/// Drives `sim` at the configured rate until shutdown or the run duration ends.
///
/// Commands are drained only between ticks, so each tick sees a consistent
/// setpoint, gains and controls.
pub(crate) fn run_simulation_thread(
    mut sim: Simulation,
    config: SimulationConfig,
    commands: Receiver<Command>,
    recorder: TickRecorder,
    feed: LiveFeed,
    shutdown_flag: Arc<AtomicBool>,
    start_time: Instant,
) {
    let period = config.tick_period();
    let deadline = (config.duration_secs > 0).then(|| start_time + config.duration());
    let mut schedule = EventSchedule::new(config.events.clone());
    let mut next_tick = start_time;
    let mut commands_open = true;
    let mut skipped = 0u64;

    while !shutdown_flag.load(Ordering::Relaxed) {
        next_tick += period;

        let now = Instant::now();
        if now < next_tick {
            thread::sleep(next_tick - now);
        } else if now - next_tick > period {
            // Too far behind; drop the missed frames rather than bursting.
            skipped += ((now - next_tick).as_nanos() / period.as_nanos().max(1)) as u64;
            next_tick = now;
        }

        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            break;
        }

        while commands_open {
            match commands.try_recv() {
                Ok(command) => {
                    debug!(?command, "applying command");
                    let _ = sim.apply(command, now);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => commands_open = false,
            }
        }

        let elapsed = now.duration_since(start_time).as_secs_f64();
        for event in schedule.due(elapsed) {
            debug!(at_secs = event.at_secs, command = ?event.command, "scheduled event");
            let _ = sim.apply(event.command.clone(), now);
        }

        if let Some(result) = sim.tick(now) {
            if config.enable_logging && result.tick % 60 == 0 {
                log_status(MODE, &result);
            }

            let record = TickRecord::new(MODE, &result);
            feed.add(record.clone());
            recorder.record(record);
        }
    }

    info!(
        ticks = sim.stats().ticks,
        skipped,
        elapsed = ?start_time.elapsed(),
        "threaded driver stopped"
    );
}
