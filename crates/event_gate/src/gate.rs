//! EventGate implementation.

use chrono::{DateTime, Local};
use contracts::{
    AdmittedEvent, CatmonError, GateConfig, Level, SensorSource, SensorTransition,
    SimulationConfig,
};
use tracing::{debug, info, instrument};

/// Why a transition was or was not admitted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Passed both filters
    Admitted(AdmittedEvent),
    /// The transition itself was not to the active level
    Inactive,
    /// Level was inactive again after the bounce delay
    FalseAlarm,
    /// Came less than the event gap after the previous admitted event
    TooSoon {
        /// Seconds since the previous admitted event
        gap_secs: f64,
    },
}

impl GateDecision {
    pub fn admitted(self) -> Option<AdmittedEvent> {
        match self {
            GateDecision::Admitted(event) => Some(event),
            _ => None,
        }
    }
}

/// Counters kept by the gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    pub transitions: u64,
    pub inactive: u64,
    pub false_alarms: u64,
    pub gap_drops: u64,
    pub admitted: u64,
}

/// Filters raw sensor transitions into admitted events
///
/// Owns the sensor and the previous-event time. Called from the single
/// control task only, so it never sees two transitions at once.
pub struct EventGate<S: SensorSource> {
    sensor: S,
    config: GateConfig,
    simulation: SimulationConfig,
    /// Time of the last admitted event
    previous_event_time: Option<DateTime<Local>>,
    /// Set once the single synthesized event has been handed out
    bypass_spent: bool,
    stats: GateStats,
}

impl<S: SensorSource> EventGate<S> {
    pub fn new(sensor: S, config: GateConfig, simulation: SimulationConfig) -> Self {
        info!(
            pin = sensor.pin(),
            bounce_ms = config.bounce.as_millis() as u64,
            event_gap_secs = config.event_gap.as_secs_f64(),
            no_sensor = simulation.no_sensor,
            "event gate ready"
        );
        Self {
            sensor,
            config,
            simulation,
            previous_event_time: None,
            bypass_spent: false,
            stats: GateStats::default(),
        }
    }

    /// Wait for the next admitted event
    ///
    /// Returns `Ok(None)` when the wait loop must stop: the sensor source is
    /// exhausted, or the single synthesized event of a no-sensor run has
    /// already been handed out.
    ///
    /// # Errors
    /// `SensorRead` if the sensor can no longer be read
    pub async fn next_event(&mut self) -> Result<Option<AdmittedEvent>, CatmonError> {
        if self.simulation.no_sensor {
            return Ok(self.synthesize());
        }

        loop {
            let Some(transition) = self.sensor.wait_for_edge(self.config.bounce).await? else {
                info!(pin = self.sensor.pin(), "sensor source exhausted");
                return Ok(None);
            };
            if let Some(event) = self.admit(transition).await? {
                return Ok(Some(event));
            }
        }
    }

    /// Filter one transition: bounce re-check, then the event gap
    ///
    /// Sleeps for the bounce interval and re-reads the live level before
    /// deciding.
    #[instrument(
        level = "debug",
        name = "gate_admit",
        skip(self, transition),
        fields(pin = self.sensor.pin(), at = %transition.timestamp)
    )]
    pub async fn admit(
        &mut self,
        transition: SensorTransition,
    ) -> Result<Option<AdmittedEvent>, CatmonError> {
        self.stats.transitions += 1;
        observability::metrics::record_transition(self.sensor.pin());

        if !transition.level.is_active() {
            return Ok(self.record(GateDecision::Inactive).admitted());
        }

        tokio::time::sleep(self.config.bounce).await;
        let live = self.sensor.read().await?;
        debug!(level = %live, "switch level after bounce");

        let decision = self.decide(&transition, live);
        Ok(self.record(decision).admitted())
    }

    /// Decision for a transition given the level re-read after the bounce
    ///
    /// Updates the previous-event time on admission only. Does not sleep,
    /// so tests can drive it directly.
    pub fn decide(&mut self, transition: &SensorTransition, live: Level) -> GateDecision {
        if !transition.level.is_active() {
            return GateDecision::Inactive;
        }
        if !live.is_active() {
            return GateDecision::FalseAlarm;
        }

        if let Some(previous) = self.previous_event_time {
            let gap = transition.timestamp - previous;
            let long_enough = gap
                .to_std()
                .map(|gap| gap >= self.config.event_gap)
                .unwrap_or(false);
            if !long_enough {
                return GateDecision::TooSoon {
                    gap_secs: gap.num_milliseconds() as f64 / 1000.0,
                };
            }
        }

        self.previous_event_time = Some(transition.timestamp);
        GateDecision::Admitted(AdmittedEvent::new(transition.timestamp))
    }

    fn record(&mut self, decision: GateDecision) -> GateDecision {
        match decision {
            GateDecision::Admitted(event) => {
                self.stats.admitted += 1;
                observability::metrics::record_event_admitted();
                info!(event_time = %event.event_time, "event admitted");
            }
            GateDecision::Inactive => {
                self.stats.inactive += 1;
                debug!("transition to inactive level discarded");
            }
            GateDecision::FalseAlarm => {
                self.stats.false_alarms += 1;
                observability::metrics::record_false_alarm();
                info!("false alarm, switch low after bounce");
            }
            GateDecision::TooSoon { gap_secs } => {
                self.stats.gap_drops += 1;
                observability::metrics::record_gap_drop(gap_secs);
                info!(
                    gap_secs,
                    min_gap_secs = self.config.event_gap.as_secs_f64(),
                    "event ignored, too soon after previous event"
                );
            }
        }
        decision
    }

    /// Single synthesized event for a no-sensor run, then `None`
    fn synthesize(&mut self) -> Option<AdmittedEvent> {
        if self.bypass_spent {
            return None;
        }
        self.bypass_spent = true;
        info!("sensor bypassed, synthesizing a single event");
        let event = AdmittedEvent::new(Local::now());
        self.previous_event_time = Some(event.event_time);
        self.record(GateDecision::Admitted(event)).admitted()
    }

    pub fn previous_event_time(&self) -> Option<DateTime<Local>> {
        self.previous_event_time
    }

    pub fn stats(&self) -> GateStats {
        self.stats
    }

    pub fn config(&self) -> GateConfig {
        self.config
    }

    pub fn simulation(&self) -> SimulationConfig {
        self.simulation
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Release the sensor; idempotent
    pub async fn release(&mut self) -> Result<(), CatmonError> {
        self.sensor.release().await
    }
}
