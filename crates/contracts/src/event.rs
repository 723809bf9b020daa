//! SensorTransition / AdmittedEvent - EventGate input and output

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logic level of the binary sensor input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The reed switch closes (pin pulled high) when the flap swings.
    pub fn is_active(self) -> bool {
        self == Level::High
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => f.write_str("low"),
            Level::High => f.write_str("high"),
        }
    }
}

/// Raw edge reported by the sensor source. Ephemeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorTransition {
    /// When the edge was observed
    pub timestamp: DateTime<Local>,

    /// Level the pin moved to
    pub level: Level,
}

impl SensorTransition {
    pub fn rising(timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            level: Level::High,
        }
    }
}

/// A transition that passed the bounce and gap filters
///
/// Consumed exactly once by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmittedEvent {
    pub event_time: DateTime<Local>,
}

impl AdmittedEvent {
    pub fn new(event_time: DateTime<Local>) -> Self {
        Self { event_time }
    }
}
