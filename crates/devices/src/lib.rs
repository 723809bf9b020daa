//! # Devices
//!
//! Hardware and model collaborators consumed by the pipeline core.
//!
//! Responsibilities:
//! - Reed switch input over sysfs GPIO (`SysfsGpioSensor`)
//! - Still capture through an external command (`CommandCamera`)
//! - Classification through an external command (`CommandClassifier`)
//! - Scripted / mock stand-ins for tests and hardware-free runs
//! - `SimulationOverride`: substitute image selection
//! - `Sensor` / `Camera` / `Model`: backends chosen by configuration

mod backend;
mod camera;
mod classifier;
mod command;
mod gpio;
mod scripted;
mod simulation;

pub use backend::{Camera, Model, Sensor};
pub use camera::{CommandCamera, MockCamera, OUTPUT_PLACEHOLDER};
pub use classifier::{CommandClassifier, MockClassifier, IMAGE_PLACEHOLDER};
pub use gpio::SysfsGpioSensor;
pub use scripted::{DisconnectedSensor, ScriptEnd, ScriptedEdge, ScriptedSensor};
pub use simulation::{mean_luma, SimulationOverride};
