//! Catmon metrics
//!
//! Thin wrappers over the `metrics` macros so every crate uses the same
//! metric names and labels.

use contracts::Stage;
use metrics::{counter, gauge, histogram};

/// Raw edge reported by the sensor source
pub fn record_transition(pin: u32) {
    counter!("catmon_sensor_transitions_total", "pin" => pin.to_string()).increment(1);
}

/// Edge whose level was inactive after the bounce delay
pub fn record_false_alarm() {
    counter!("catmon_false_alarms_total").increment(1);
}

/// Edge dropped because it came too soon after the previous event
pub fn record_gap_drop(gap_secs: f64) {
    counter!("catmon_gap_drops_total").increment(1);
    histogram!("catmon_dropped_gap_seconds").record(gap_secs);
}

/// Event admitted into the pipeline
pub fn record_event_admitted() {
    counter!("catmon_events_admitted_total").increment(1);
}

/// One stage finished (successfully or not)
pub fn record_stage(stage: Stage, success: bool, duration_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "catmon_stage_total",
        "stage" => stage.as_str(),
        "status" => status
    )
    .increment(1);
    histogram!("catmon_stage_duration_ms", "stage" => stage.as_str()).record(duration_ms);
}

/// One pipeline run finished
pub fn record_run(status: &'static str, stages_completed: usize, duration_ms: f64) {
    counter!("catmon_runs_total", "status" => status).increment(1);
    gauge!("catmon_last_run_stages_completed").set(stages_completed as f64);
    histogram!("catmon_run_duration_ms").record(duration_ms);
}

/// Scene brightness reported with a captured image
pub fn record_brightness(lux: Option<f64>, mean_luma: Option<f64>) {
    if let Some(lux) = lux {
        gauge!("catmon_image_lux").set(lux);
    }
    if let Some(luma) = mean_luma {
        gauge!("catmon_image_mean_luma").set(luma);
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
