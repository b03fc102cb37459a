use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::info;

use crate::plant::PlantKind;
use crate::scoring::Grade;
use crate::simulation::TickResult;

/// Flat per-tick row, shaped for CSV export.
#[derive(Debug, Serialize, Clone)]
pub struct TickRecord {
    pub tick: u64,
    pub mode: String,
    pub time_ms: f64,
    pub plant: PlantKind,
    pub setpoint: f64,
    pub value: f64,
    pub output: f64,
    pub p_term: f64,
    pub i_term: f64,
    pub d_term: f64,
    pub error: f64,
    pub manual_input: f64,
    pub noise: f64,
    pub periodic: f64,
    pub at_limit: bool,
    pub stability: f64,
    pub speed: f64,
    pub accuracy: f64,
    pub grade: Grade,
}

impl TickRecord {
    pub fn new(mode: &str, r: &TickResult) -> Self {
        Self {
            tick: r.tick,
            mode: mode.to_string(),
            time_ms: r.time_ms,
            plant: r.plant,
            setpoint: r.setpoint,
            value: r.state.value,
            output: r.pid.output,
            p_term: r.pid.p_term,
            i_term: r.pid.i_term,
            d_term: r.pid.d_term,
            error: r.pid.error,
            manual_input: r.manual_input,
            noise: r.disturbance.noise,
            periodic: r.disturbance.periodic,
            at_limit: r.state.at_limit,
            stability: r.scores.stability,
            speed: r.scores.speed,
            accuracy: r.scores.accuracy,
            grade: r.scores.grade,
        }
    }
}

/// Aggregate view over a recorded run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: usize,
    pub mean_abs_error: f64,
    pub max_abs_error: f64,
    pub ticks_at_limit: usize,
    pub final_value: f64,
    pub final_setpoint: f64,
    pub final_stability: f64,
    pub final_speed: f64,
    pub final_accuracy: f64,
    pub final_grade: Grade,
    pub best_grade: Grade,
}

/// Thread-safe recorder with internal mutability.
/// Cloning is cheap (it clones the Arc, not the data).
#[derive(Clone, Default)]
pub struct TickRecorder {
    results: Arc<Mutex<Vec<TickRecord>>>,
}

impl TickRecorder {
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::with_capacity(10_000))),
        }
    }

    fn data(&self) -> MutexGuard<'_, Vec<TickRecord>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, record: TickRecord) {
        self.data().push(record);
    }

    pub fn get_results(&self) -> Vec<TickRecord> {
        self.data().clone()
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn summary(&self) -> Option<RunSummary> {
        summarize(&self.data())
    }

    pub fn save_to_csv(&self, filename: &str) -> Result<usize, csv::Error> {
        let data = self.data();
        let mut wtr = csv::Writer::from_path(filename)?;
        for record in data.iter() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        info!(records = data.len(), filename, "saved tick records");
        Ok(data.len())
    }
}

/// Status line emitted by drivers once per second of simulated frames.
pub fn log_status(mode: &str, r: &TickResult) {
    info!(
        mode,
        tick = r.tick,
        plant = %r.plant,
        value = format_args!("{:.2}", r.state.value),
        setpoint = format_args!("{:.2}", r.setpoint),
        output = format_args!("{:.2}", r.pid.output),
        grade = %r.scores.grade,
        "tick"
    );
}

pub fn summarize(records: &[TickRecord]) -> Option<RunSummary> {
    let last = records.last()?;

    let abs_errors = records.iter().map(|r| r.error.abs());
    let mean_abs_error = abs_errors.clone().sum::<f64>() / records.len() as f64;
    let max_abs_error = abs_errors.fold(0.0, f64::max);
    let best_grade = records.iter().map(|r| r.grade).max().unwrap_or(Grade::F);

    Some(RunSummary {
        ticks: records.len(),
        mean_abs_error,
        max_abs_error,
        ticks_at_limit: records.iter().filter(|r| r.at_limit).count(),
        final_value: last.value,
        final_setpoint: last.setpoint,
        final_stability: last.stability,
        final_speed: last.speed,
        final_accuracy: last.accuracy,
        final_grade: last.grade,
        best_grade,
    })
}
