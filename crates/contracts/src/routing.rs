//! RoutingDecision - RoutingPolicy output, PublishStage input

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Remote storage folder an image is uploaded into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Destination {
    /// Human-readable folder name (logs only)
    #[validate(length(min = 1))]
    pub name: String,

    /// Folder identifier understood by the upload service
    #[validate(length(min = 1))]
    pub id: String,
}

impl Destination {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Per-event routing result. Ephemeral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub destination: Destination,

    /// Text of the notification, already rendered
    pub notification_text: String,
}
