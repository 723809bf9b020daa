//! SimulationConfig - process-wide substitution switches

use serde::{Deserialize, Serialize};

/// Simulation switches, set once at start and immutable afterwards
///
/// Injected into the EventGate and the capture stage at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Skip the sensor wait: synthesize a single event, then stop
    #[serde(default)]
    pub no_sensor: bool,

    /// Use a substitute image instead of the capture device
    #[serde(default)]
    pub simulate_capture: bool,
}

impl SimulationConfig {
    pub fn new(no_sensor: bool, simulate_capture: bool) -> Self {
        Self {
            no_sensor,
            simulate_capture,
        }
    }

    /// Any simulation mode is on; generated files get the test prefix
    pub fn is_testing(&self) -> bool {
        self.no_sensor || self.simulate_capture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_testing_derivation() {
        assert!(!SimulationConfig::default().is_testing());
        assert!(SimulationConfig::new(true, false).is_testing());
        assert!(SimulationConfig::new(false, true).is_testing());
        assert!(SimulationConfig::new(true, true).is_testing());
    }
}
