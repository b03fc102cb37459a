mod menu;

use std::error::Error;
use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use pid_core::{load_config, RunSummary, Simulation, SimulationConfig, TickRecorder};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

type AppResult<T> = Result<T, Box<dyn Error>>;

const DEFAULT_CONFIG: &str = "configs/car_baseline.toml";

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("===========================================");
    println!("Welcome to PID Academy");
    println!("===========================================");

    loop {
        menu::show_menu()?;

        let outcome = match menu::get_user_choice()? {
            Some(1) => run_threaded_demo(),
            Some(2) => run_async_demo(),
            Some(3) => run_driver_comparison(),
            Some(4) => run_live_monitor(),
            Some(5) => export_snapshot(),
            Some(6) => {
                println!("Goodbye!");
                break;
            }
            _ => {
                println!("Invalid choice. Please select 1-6.");
                continue;
            }
        };

        if let Err(e) = outcome {
            error!(error = %e, "menu action failed");
        }
        menu::wait_for_enter()?;
    }

    Ok(())
}

fn demo_config() -> AppResult<SimulationConfig> {
    let path = menu::prompt_config(DEFAULT_CONFIG)?;
    let config = load_config(&path)?;
    println!(
        "Configuration: {} ({}), {} difficulty, gains {:.2}/{:.2}/{:.2}, {}s at {} Hz",
        config.experiment_name,
        config.plant.title(),
        config.difficulty,
        config.kp,
        config.ki,
        config.kd,
        config.duration_secs,
        config.tick_rate_hz,
    );
    for advice in config.gains().feedback() {
        println!("  {advice}");
    }
    Ok(config)
}

fn run_threaded_demo() -> AppResult<()> {
    println!("\n=== Running Threaded Simulation Demo ===");
    let mut config = demo_config()?;
    config.enable_logging = true;

    let recorder = threaded_impl::run_experiment(config.clone())?;
    display_results(&config, &recorder);
    Ok(())
}

fn run_async_demo() -> AppResult<()> {
    println!("\n=== Running Async Simulation Demo ===");
    let mut config = demo_config()?;
    config.enable_logging = true;

    let rt = tokio::runtime::Runtime::new()?;
    let recorder = rt.block_on(async_impl::run_experiment(config.clone()))?;
    display_results(&config, &recorder);
    Ok(())
}

fn run_driver_comparison() -> AppResult<()> {
    println!("\n=== Comparing Drivers (Threaded vs Async) ===");
    let mut config = demo_config()?;
    config.enable_logging = false;
    if config.seed.is_none() {
        // Same noise for both drivers
        config.seed = Some(0x5eed);
    }

    println!("\n--- Running THREADED driver ---");
    let threaded_start = Instant::now();
    let threaded = threaded_impl::run_experiment(config.clone())?;
    let threaded_elapsed = threaded_start.elapsed();

    println!("--- Running ASYNC driver ---");
    let rt = tokio::runtime::Runtime::new()?;
    let async_start = Instant::now();
    let asynchronous = rt.block_on(async_impl::run_experiment(config.clone()))?;
    let async_elapsed = async_start.elapsed();

    let (Some(t), Some(a)) = (threaded.summary(), asynchronous.summary()) else {
        println!("A driver produced no ticks.");
        return Ok(());
    };

    println!("\n=== Comparison Summary ===");
    let rows = [
        (
            "wall time (s)",
            format!("{:.2}", threaded_elapsed.as_secs_f64()),
            format!("{:.2}", async_elapsed.as_secs_f64()),
        ),
        ("ticks", t.ticks.to_string(), a.ticks.to_string()),
        (
            "mean |error|",
            format!("{:.3}", t.mean_abs_error),
            format!("{:.3}", a.mean_abs_error),
        ),
        (
            "max |error|",
            format!("{:.3}", t.max_abs_error),
            format!("{:.3}", a.max_abs_error),
        ),
        (
            "ticks at limit",
            t.ticks_at_limit.to_string(),
            a.ticks_at_limit.to_string(),
        ),
        ("final grade", t.final_grade.to_string(), a.final_grade.to_string()),
    ];
    println!("{:<22}{:>12}{:>12}", "", "threaded", "async");
    for (label, threaded_value, async_value) in rows {
        println!("{label:<22}{threaded_value:>12}{async_value:>12}");
    }

    let expected = config.duration_secs * u64::from(config.tick_rate_hz);
    println!("- Expected ~{expected} ticks per driver");
    Ok(())
}

fn run_live_monitor() -> AppResult<()> {
    println!("\n=== Live Monitor ===");
    let config = demo_config()?;
    if config.duration_secs == 0 {
        return Err("live monitor needs a finite duration_secs".into());
    }

    let unit = config.plant.unit();
    let handle = threaded_impl::spawn_simulation(config.clone(), None)?;

    let per_second = config.tick_rate_hz as usize;

    while !handle.is_finished() {
        thread::sleep(Duration::from_secs(1));
        let recent = handle.live().get_recent(per_second);
        let Some(latest) = recent.last() else {
            continue;
        };
        let mean_error = recent.iter().map(|r| r.error.abs()).sum::<f64>() / recent.len() as f64;
        println!(
            "[{:>6.1}s] {} {:>8.2}{unit} -> {:>8.2}{unit}  out {:>8.2}  |e| {:>7.3}  grade {}",
            latest.time_ms / 1000.0,
            latest.plant,
            latest.value,
            latest.setpoint,
            latest.output,
            mean_error,
            latest.grade,
        );
    }

    display_results(&config, &handle.wait());
    Ok(())
}

fn export_snapshot() -> AppResult<()> {
    println!("\n=== Export Configuration Snapshot ===");
    let config = demo_config()?;

    // Run headless on a synthetic clock so the snapshot carries real scores.
    let t0 = Instant::now();
    let mut sim = Simulation::from_config(&config, t0)?;
    let period = config.tick_period();
    let frames = config.duration_secs * u64::from(config.tick_rate_hz);
    let mut now = t0;
    for _ in 0..frames {
        now += period;
        sim.tick(now);
    }

    let snapshot = sim.snapshot();
    let json = snapshot.to_json()?;
    let path = format!("{}_snapshot.json", config.experiment_name);
    fs::write(&path, &json)?;
    info!(path = %path, frames, "snapshot written");

    println!("{json}");
    println!("Saved to {path}");
    Ok(())
}

fn display_results(config: &SimulationConfig, recorder: &TickRecorder) {
    let Some(summary) = recorder.summary() else {
        println!("No results to display.");
        return;
    };
    print_summary(config, &summary);
}

fn print_summary(config: &SimulationConfig, s: &RunSummary) {
    let unit = config.plant.unit();
    println!("\n=== Simulation Results ===");
    println!("Plant: {}", config.plant.title());
    println!("Total Ticks: {}", s.ticks);
    println!("Final Value: {:.2}{unit} (setpoint {:.2}{unit})", s.final_value, s.final_setpoint);
    println!("Mean |Error|: {:.3}, Max |Error|: {:.3}", s.mean_abs_error, s.max_abs_error);
    println!("Ticks At Range Limit: {}", s.ticks_at_limit);
    println!(
        "Scores: stability {:.1}, speed {:.1}, accuracy {:.1}",
        s.final_stability, s.final_speed, s.final_accuracy
    );
    println!("Grade: {} (best {})", s.final_grade, s.best_grade);
}
