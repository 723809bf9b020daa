//! # Contracts
//!
//! Frozen interface contracts shared by every catmon crate: the event and
//! image data model, the collaborator traits the pipeline core calls, the
//! unified error type and the configuration blueprint.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Wall-clock local time (`chrono::DateTime<Local>`) is the only clock
//! - The admitted event time drives image naming, the event-gap filter and
//!   the greeting in notification text

mod blueprint;
mod classification;
mod collaborators;
mod error;
mod event;
mod image;
mod image_id;
mod outcome;
mod routing;
mod simulation;

pub use blueprint::*;
pub use classification::*;
pub use collaborators::*;
pub use error::*;
pub use event::*;
pub use image::*;
pub use image_id::ImageId;
pub use outcome::*;
pub use routing::*;
pub use simulation::*;
