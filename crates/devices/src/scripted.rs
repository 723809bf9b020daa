//! Scripted and disconnected sensor sources
//!
//! `ScriptedSensor` replays a fixed list of edges with explicit timestamps,
//! so gate and loop behaviour can be tested without waiting on wall time.
//! `DisconnectedSensor` stands in when no switch is wired up.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use contracts::{CatmonError, Level, SensorSource, SensorTransition};
use tracing::debug;

/// One scripted rising edge
#[derive(Debug, Clone, Copy)]
pub struct ScriptedEdge {
    /// Timestamp reported for the edge
    pub at: DateTime<Local>,
    /// Level the pin reads after the bounce delay
    pub settled: Level,
}

impl ScriptedEdge {
    /// Edge whose level stays high (a genuine flap swing)
    pub fn genuine(at: DateTime<Local>) -> Self {
        Self {
            at,
            settled: Level::High,
        }
    }

    /// Edge that has dropped back low by the time it is re-read
    pub fn glitch(at: DateTime<Local>) -> Self {
        Self {
            at,
            settled: Level::Low,
        }
    }
}

/// What a scripted sensor does once its edges run out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptEnd {
    /// Report exhaustion (`Ok(None)`)
    #[default]
    Exhausted,
    /// Fail the wait with `SensorRead`
    ReadError,
    /// Never return, like a switch nobody touches
    Idle,
}

/// Sensor that replays scripted edges
pub struct ScriptedSensor {
    pin: u32,
    edges: VecDeque<ScriptedEdge>,
    end: ScriptEnd,
    level: Level,
    released: Arc<AtomicBool>,
}

impl ScriptedSensor {
    pub fn new(pin: u32, edges: impl IntoIterator<Item = ScriptedEdge>) -> Self {
        Self {
            pin,
            edges: edges.into_iter().collect(),
            end: ScriptEnd::default(),
            level: Level::Low,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Genuine edges at the given offsets (seconds) from `start`
    pub fn from_offsets(pin: u32, start: DateTime<Local>, offsets: &[i64]) -> Self {
        Self::new(
            pin,
            offsets
                .iter()
                .map(|s| ScriptedEdge::genuine(start + chrono::Duration::seconds(*s))),
        )
    }

    pub fn with_end(mut self, end: ScriptEnd) -> Self {
        self.end = end;
        self
    }

    /// Handle reporting whether `release` was called, for teardown checks
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl SensorSource for ScriptedSensor {
    fn pin(&self) -> u32 {
        self.pin
    }

    async fn wait_for_edge(
        &mut self,
        _bounce: Duration,
    ) -> Result<Option<SensorTransition>, CatmonError> {
        match self.edges.pop_front() {
            Some(edge) => {
                self.level = edge.settled;
                debug!(
                    pin = self.pin,
                    at = %edge.at,
                    settled = %edge.settled,
                    remaining = self.edges.len(),
                    "scripted edge"
                );
                Ok(Some(SensorTransition::rising(edge.at)))
            }
            None => match self.end {
                ScriptEnd::Exhausted => Ok(None),
                ScriptEnd::ReadError => {
                    Err(CatmonError::sensor_read(self.pin, "scripted read failure"))
                }
                ScriptEnd::Idle => std::future::pending().await,
            },
        }
    }

    async fn read(&self) -> Result<Level, CatmonError> {
        Ok(self.level)
    }

    async fn release(&mut self) -> Result<(), CatmonError> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Placeholder for a missing switch; every wait fails
pub struct DisconnectedSensor {
    pin: u32,
}

impl DisconnectedSensor {
    pub fn new(pin: u32) -> Self {
        Self { pin }
    }
}

impl SensorSource for DisconnectedSensor {
    fn pin(&self) -> u32 {
        self.pin
    }

    async fn wait_for_edge(
        &mut self,
        _bounce: Duration,
    ) -> Result<Option<SensorTransition>, CatmonError> {
        Err(CatmonError::sensor_read(self.pin, "no sensor attached"))
    }

    async fn read(&self) -> Result<Level, CatmonError> {
        Err(CatmonError::sensor_read(self.pin, "no sensor attached"))
    }

    async fn release(&mut self) -> Result<(), CatmonError> {
        Ok(())
    }
}
