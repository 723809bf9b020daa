//! # Event Gate
//!
//! Turns raw reed switch transitions into admitted events.
//!
//! Responsibilities:
//! - Bounce filter: re-read the live level after the bounce delay and
//!   discard the transition if the switch is no longer active
//! - Event gap: drop transitions closer than the gap to the last admitted
//!   event (dropped, never queued)
//! - No-sensor runs: synthesize exactly one event, then stop the wait loop
//!
//! ## Example
//!
//! ```ignore
//! use event_gate::EventGate;
//!
//! let mut gate = EventGate::new(sensor, blueprint.to_gate_config(), simulation);
//! while let Some(event) = gate.next_event().await? {
//!     orchestrator.run(&event).await;
//! }
//! ```

mod gate;

pub use contracts::{AdmittedEvent, GateConfig, SensorTransition};
pub use gate::{EventGate, GateDecision, GateStats};
