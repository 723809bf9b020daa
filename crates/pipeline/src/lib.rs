//! # Pipeline
//!
//! Per-event processing and the control loop.
//!
//! Responsibilities:
//! - Stage adapters: capture (or substitute), classify, publish
//! - `RoutingPolicy`: label to destination folder and notification text
//! - `PipelineOrchestrator`: one strictly sequential run per admitted event,
//!   the first failing stage ends the run without rollback
//! - `Monitor`: waits on the event gate, races the shutdown signal, and
//!   releases the devices on every exit path
//!
//! ## Example
//!
//! ```ignore
//! let orchestrator = PipelineOrchestrator::new(capture, classify, policy, publish);
//! let stats = Monitor::new(gate, orchestrator)
//!     .with_max_events(None)
//!     .run(shutdown_signal())
//!     .await?;
//! stats.print_summary();
//! ```

mod monitor;
mod orchestrator;
mod routing;
mod stages;
mod stats;

pub use monitor::Monitor;
pub use orchestrator::PipelineOrchestrator;
pub use routing::{greeting, RoutingPolicy};
pub use stages::{CaptureStage, ClassifyStage, PublishStage};
pub use stats::MonitorStats;
