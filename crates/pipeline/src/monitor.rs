//! Monitor - the single control loop
//!
//! Waits on the gate, runs the orchestrator for each admitted event, and
//! tears the devices down on every exit path. The wait races the shutdown
//! signal; a run in progress is never cancelled.

use std::future::Future;
use std::time::Instant;

use contracts::{
    CaptureDevice, CatmonError, Classifier, NotificationService, SensorSource, UploadService,
};
use event_gate::EventGate;
use tracing::{error, info, warn};

use crate::orchestrator::PipelineOrchestrator;
use crate::stats::MonitorStats;

/// Owns the gate and the orchestrator for the lifetime of the process
pub struct Monitor<S, C, K, U, N>
where
    S: SensorSource,
    C: CaptureDevice,
    K: Classifier,
    U: UploadService,
    N: NotificationService,
{
    gate: EventGate<S>,
    orchestrator: PipelineOrchestrator<C, K, U, N>,
    max_events: Option<u64>,
}

impl<S, C, K, U, N> Monitor<S, C, K, U, N>
where
    S: SensorSource,
    C: CaptureDevice,
    K: Classifier,
    U: UploadService,
    N: NotificationService,
{
    pub fn new(gate: EventGate<S>, orchestrator: PipelineOrchestrator<C, K, U, N>) -> Self {
        Self {
            gate,
            orchestrator,
            max_events: None,
        }
    }

    /// Stop after this many admitted events (None = unlimited)
    pub fn with_max_events(mut self, max_events: Option<u64>) -> Self {
        self.max_events = max_events;
        self
    }

    /// Run until shutdown, sensor exhaustion, the event limit, or a fatal
    /// sensor error
    ///
    /// The sensor is released and the capture device stopped before
    /// returning, whatever the reason.
    ///
    /// # Errors
    /// `SensorRead` if the sensor can no longer be read
    pub async fn run<F>(mut self, shutdown: F) -> Result<MonitorStats, CatmonError>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut stats = MonitorStats::default();

        self.log_startup().await;
        let result = self.event_loop(shutdown, &mut stats).await;
        self.teardown().await;

        stats.gate = self.gate.stats();
        stats.duration = started.elapsed();
        info!(
            events = stats.events,
            runs_failed = stats.runs_failed,
            duration_secs = stats.duration.as_secs_f64(),
            "monitor stopped"
        );
        result.map(|()| stats)
    }

    async fn log_startup(&self) {
        let config = self.gate.config();
        let simulation = self.gate.simulation();
        let pin = self.gate.sensor().pin();
        info!(
            pin,
            bounce_ms = config.bounce.as_millis() as u64,
            event_gap_secs = config.event_gap.as_secs_f64(),
            no_sensor = simulation.no_sensor,
            simulate_capture = simulation.simulate_capture,
            max_events = ?self.max_events,
            "monitor started"
        );
        if simulation.no_sensor {
            return;
        }
        match self.gate.sensor().read().await {
            Ok(level) => info!(pin, level = %level, "switch level at start"),
            Err(e) => warn!(pin, error = %e, "switch level unavailable at start"),
        }
    }

    async fn event_loop<F>(
        &mut self,
        shutdown: F,
        stats: &mut MonitorStats,
    ) -> Result<(), CatmonError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            if let Some(max) = self.max_events {
                if stats.events >= max {
                    info!(events = stats.events, "reached max events limit");
                    return Ok(());
                }
            }

            let next = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    return Ok(());
                }
                next = self.gate.next_event() => next,
            };

            let event = match next {
                Ok(Some(event)) => event,
                Ok(None) => {
                    info!("no more events, stopping");
                    return Ok(());
                }
                Err(e) => {
                    error!(error = %e, "sensor failure, stopping monitor");
                    return Err(e);
                }
            };

            let run_started = Instant::now();
            let outcome = self.orchestrator.run(&event).await;
            stats.record(&outcome, run_started.elapsed());
            self.log_switch_level().await;
        }
    }

    /// The flap may still be open after a run; the level is informational only
    async fn log_switch_level(&self) {
        if self.gate.simulation().no_sensor {
            return;
        }
        let sensor = self.gate.sensor();
        match sensor.read().await {
            Ok(level) => info!(pin = sensor.pin(), level = %level, "run complete, switch level"),
            Err(e) => warn!(pin = sensor.pin(), error = %e, "switch level unavailable after run"),
        }
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.gate.release().await {
            warn!(error = %e, "error releasing sensor");
        }
        if let Err(e) = self.orchestrator.shutdown().await {
            warn!(error = %e, "error stopping capture device");
        }
        info!("devices released");
    }
}
