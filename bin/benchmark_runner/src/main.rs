use std::collections::BTreeMap;
use std::env;
use std::error::Error;
use std::time::{Duration, Instant};

use criterion::{black_box, BenchmarkId, Criterion};
use pid_core::{
    load_config, Difficulty, Gains, PidController, PlantKind, SimError, Simulation,
    SimulationConfig, TickRecord, TickRecorder,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn analyze_results_detailed(results: &[TickRecord], name: &str, config: &SimulationConfig) {
    let Some(summary) = pid_core::metrics::summarize(results) else {
        println!("{}: No results to analyze", name);
        return;
    };

    let expected = config.duration_secs * u64::from(config.tick_rate_hz);
    println!("\n=== {} Detailed Analysis ===", name);
    println!("Total ticks: {} (expected ~{})", summary.ticks, expected);
    println!(
        "Error: mean |e|={:.3}, max |e|={:.3}",
        summary.mean_abs_error, summary.max_abs_error
    );
    println!(
        "Ticks at range limit: {} ({:.2}%)",
        summary.ticks_at_limit,
        summary.ticks_at_limit as f64 / summary.ticks as f64 * 100.0
    );
    println!(
        "Final: value={:.2} setpoint={:.2}",
        summary.final_value, summary.final_setpoint
    );
    println!(
        "Scores: stability={:.1} speed={:.1} accuracy={:.1} grade={} (best {})",
        summary.final_stability,
        summary.final_speed,
        summary.final_accuracy,
        summary.final_grade,
        summary.best_grade,
    );

    // Frame spacing as seen by the simulation clock
    let period_ms = config.tick_period().as_secs_f64() * 1000.0;
    let intervals: Vec<f64> = results
        .windows(2)
        .map(|w| w[1].time_ms - w[0].time_ms)
        .collect();
    if !intervals.is_empty() {
        let avg = intervals.iter().sum::<f64>() / intervals.len() as f64;
        let min = intervals.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = intervals.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let late = intervals.iter().filter(|&&i| i > period_ms * 1.5).count();
        println!(
            "Tick interval (ms): avg={:.3}, min={:.3}, max={:.3}, target={:.3}",
            avg, min, max, period_ms
        );
        println!(
            "Late ticks: {} ({:.2}%)",
            late,
            late as f64 / intervals.len() as f64 * 100.0
        );
    }

    let mut by_plant: BTreeMap<String, Vec<&TickRecord>> = BTreeMap::new();
    for r in results {
        by_plant.entry(r.plant.to_string()).or_default().push(r);
    }
    if by_plant.len() > 1 {
        println!("\nPer-plant breakdown:");
        for (plant, rows) in by_plant {
            let mean = rows.iter().map(|r| r.error.abs()).sum::<f64>() / rows.len() as f64;
            println!("  {}: {} ticks, mean |e|={:.3}", plant, rows.len(), mean);
        }
    }

    let mut grades: BTreeMap<String, usize> = BTreeMap::new();
    for r in results {
        *grades.entry(r.grade.to_string()).or_default() += 1;
    }
    let distribution: Vec<String> = grades
        .iter()
        .map(|(grade, count)| format!("{grade}={count}"))
        .collect();
    println!("Grade distribution: {}", distribution.join(", "));
}

fn benchmark_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_tick");
    for plant in PlantKind::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(plant), &plant, |b, &plant| {
            let t0 = Instant::now();
            let mut sim = Simulation::with_seed(plant, Some(1), t0);
            sim.set_difficulty(Difficulty::Expert);
            let mut now = t0;
            b.iter(|| {
                now += Duration::from_micros(16_667);
                black_box(sim.tick(black_box(now)))
            });
        });
    }
    group.finish();
}

fn benchmark_controller(c: &mut Criterion) {
    let t0 = Instant::now();
    let mut pid = PidController::with_gains(Gains::new(1.2, 0.15, 0.08), t0);
    let mut now = t0;
    c.bench_function("pid_update", |b| {
        b.iter(|| {
            now += Duration::from_micros(16_667);
            black_box(pid.update_at(black_box(60.0), black_box(42.0), now))
        });
    });
}

fn report(
    recorder: &TickRecorder,
    name: &str,
    csv_path: &str,
    config: &SimulationConfig,
) -> Result<(), Box<dyn Error>> {
    analyze_results_detailed(&recorder.get_results(), name, config);
    recorder.save_to_csv(csv_path)?;
    println!("Results saved to {}", csv_path);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Threaded,
    Async,
    Both,
}

impl Mode {
    fn runs_threaded(self) -> bool {
        matches!(self, Mode::Threaded | Mode::Both)
    }

    fn runs_async(self) -> bool {
        matches!(self, Mode::Async | Mode::Both)
    }
}

#[derive(Debug, PartialEq)]
struct RunArgs {
    config_path: String,
    mode: Mode,
    use_criterion: bool,
    plant: Option<PlantKind>,
    difficulty: Option<Difficulty>,
}

const USAGE: &str = "Usage: benchmark_runner <config_file> [threaded|async|both] [--criterion] \
[--plant <name>] [--difficulty <level>]";

fn parse_args(args: &[String]) -> Result<RunArgs, String> {
    let mut rest = args.iter().skip(1);
    let config_path = rest.next().ok_or("missing config file")?.clone();

    let mut parsed = RunArgs {
        config_path,
        mode: Mode::Both,
        use_criterion: false,
        plant: None,
        difficulty: None,
    };
    let mut mode_seen = false;

    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--criterion" => parsed.use_criterion = true,
            "--plant" => {
                let name = rest.next().ok_or("--plant needs a value")?;
                parsed.plant = Some(name.parse().map_err(|e: SimError| e.to_string())?);
            }
            "--difficulty" => {
                let level = rest.next().ok_or("--difficulty needs a value")?;
                parsed.difficulty = Some(level.parse().map_err(|e: SimError| e.to_string())?);
            }
            mode if !mode_seen && !mode.starts_with("--") => {
                parsed.mode = match mode {
                    "threaded" => Mode::Threaded,
                    "async" => Mode::Async,
                    "both" => Mode::Both,
                    other => return Err(format!("unknown mode `{other}`")),
                };
                mode_seen = true;
            }
            other => return Err(format!("unexpected argument `{other}`")),
        }
    }

    Ok(parsed)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let run = match parse_args(&args) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            eprintln!("Example: benchmark_runner configs/car_baseline.toml both");
            eprintln!("Example: benchmark_runner configs/drone_expert.toml --criterion");
            eprintln!("Example: benchmark_runner configs/car_baseline.toml async --plant drone");
            std::process::exit(1);
        }
    };

    let config_path = &run.config_path;
    let use_criterion = run.use_criterion;
    let mut config = load_config(config_path)?;
    if use_criterion {
        config.enable_logging = false;
    }
    if let Some(plant) = run.plant {
        // The file's setpoint and gains belong to its own plant.
        config.plant = plant;
        config.setpoint = None;
        let gains = plant.recommended_gains();
        (config.kp, config.ki, config.kd) = (gains.kp, gains.ki, gains.kd);
    }
    if let Some(difficulty) = run.difficulty {
        config.difficulty = difficulty;
    }

    println!("========================================");
    println!("PID Simulation Benchmark");
    println!("========================================");
    println!("Config: {}", config_path);
    println!("Experiment: {}", config.experiment_name);
    println!("Plant: {} ({})", config.plant.title(), config.plant);
    println!("Difficulty: {}", config.difficulty);
    println!("Duration: {} seconds at {} Hz", config.duration_secs, config.tick_rate_hz);
    println!("Gains: kp={} ki={} kd={}", config.kp, config.ki, config.kd);
    println!("Scheduled events: {}", config.events.len());
    if use_criterion {
        println!("Using Criterion for statistical analysis");
        println!("Logging disabled for benchmark validity");
    }
    println!("========================================\n");

    if use_criterion {
        let mut criterion = Criterion::default()
            .sample_size(50)
            .measurement_time(Duration::from_secs(5));

        benchmark_tick(&mut criterion);
        benchmark_controller(&mut criterion);
        criterion.final_summary();

        println!("\n========================================");
        println!("Criterion statistical analysis complete!");
        println!("Check the target/criterion directory for detailed HTML reports.");
        println!("========================================");
        return Ok(());
    }

    if run.mode.runs_threaded() {
        println!("Running THREADED experiment...");
        let start = Instant::now();
        let recorder = threaded_impl::run_experiment(config.clone())?;
        info!(
            elapsed = ?start.elapsed(),
            ticks = recorder.len(),
            "threaded experiment completed"
        );
        report(&recorder, "THREADED", "threaded_results.csv", &config)?;
    }

    if run.mode.runs_async() {
        println!("\nRunning ASYNC experiment...");
        let start = Instant::now();
        let recorder = tokio::runtime::Runtime::new()?
            .block_on(async_impl::run_experiment(config.clone()))?;
        info!(elapsed = ?start.elapsed(), ticks = recorder.len(), "async experiment completed");
        report(&recorder, "ASYNC", "async_results.csv", &config)?;
    }

    println!("\n========================================");
    println!("Benchmark complete!");
    println!("========================================");
    Ok(())
}
