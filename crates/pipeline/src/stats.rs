//! Monitor statistics

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::{ErrorKind, PipelineRunOutcome, Stage};
use event_gate::GateStats;
use observability::metrics::RunningStats;

/// Statistics from one monitor session
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    /// Admitted events handed to the orchestrator
    pub events: u64,

    pub runs_succeeded: u64,

    pub runs_failed: u64,

    /// Failed runs per terminating stage
    pub failures_by_stage: BTreeMap<Stage, u64>,

    /// Kind of the most recent failure
    pub last_error: Option<ErrorKind>,

    /// Gate counters at the end of the session
    pub gate: GateStats,

    /// Wall time of the session
    pub duration: Duration,

    /// Pipeline run durations (ms)
    pub run_duration_ms: RunningStats,
}

impl MonitorStats {
    /// Account for one finished run
    pub fn record(&mut self, outcome: &PipelineRunOutcome, duration: Duration) {
        self.events += 1;
        self.run_duration_ms.push(duration.as_secs_f64() * 1000.0);
        match &outcome.failure {
            None => self.runs_succeeded += 1,
            Some(failure) => {
                self.runs_failed += 1;
                *self.failures_by_stage.entry(failure.stage).or_default() += 1;
                self.last_error = Some(failure.error.kind());
            }
        }
    }

    /// Share of runs that failed, as a percentage
    pub fn failure_rate(&self) -> f64 {
        if self.events > 0 {
            (self.runs_failed as f64 / self.events as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n================================================================");
        println!("                      Catmon Session Summary");
        println!("================================================================\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Events: {}", self.events);
        println!("   ├─ Runs succeeded: {}", self.runs_succeeded);
        println!(
            "   ├─ Runs failed: {} ({:.1}%)",
            self.runs_failed,
            self.failure_rate()
        );
        println!("   └─ Run duration (ms): {}", self.run_duration_ms.summary());

        println!("\nEvent Gate");
        println!("   ├─ Transitions: {}", self.gate.transitions);
        println!("   ├─ False alarms: {}", self.gate.false_alarms);
        println!("   ├─ Too soon: {}", self.gate.gap_drops);
        println!("   └─ Admitted: {}", self.gate.admitted);

        if !self.failures_by_stage.is_empty() {
            println!("\nFailures by Stage");
            for (stage, count) in &self.failures_by_stage {
                println!("   ├─ {stage}: {count}");
            }
            if let Some(kind) = self.last_error {
                println!("   └─ last error: {}", kind.as_str());
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use contracts::{CatmonError, StageFailure};

    #[test]
    fn test_record_counts_by_stage() {
        let mut stats = MonitorStats::default();

        let ok = PipelineRunOutcome::new(Local::now());
        stats.record(&ok, Duration::from_millis(120));

        let mut failed = PipelineRunOutcome::new(Local::now());
        failed.failure = Some(StageFailure {
            stage: Stage::Upload,
            error: CatmonError::upload("a.jpg", "catmon", "timeout"),
        });
        stats.record(&failed, Duration::from_millis(80));

        assert_eq!(stats.events, 2);
        assert_eq!(stats.runs_succeeded, 1);
        assert_eq!(stats.runs_failed, 1);
        assert_eq!(stats.failures_by_stage.get(&Stage::Upload), Some(&1));
        assert_eq!(stats.last_error, Some(ErrorKind::Upload));
        assert_eq!(stats.failure_rate(), 50.0);
        assert_eq!(stats.run_duration_ms.count(), 2);
        assert!((stats.run_duration_ms.mean() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_failure_rate_without_events() {
        assert_eq!(MonitorStats::default().failure_rate(), 0.0);
    }
}
