//! ClassificationResult - ClassifyStage output, RoutingPolicy input

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw classifier output
///
/// `label` is kept as the classifier spelled it; it is resolved against the
/// configured subjects by the routing policy, which rejects unknown values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,

    /// Probability of `label`, 0.0 - 1.0
    pub confidence: f64,

    /// Identifier of the model that produced the prediction
    #[serde(alias = "model_name")]
    pub model: String,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: f64, model: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence,
            model: model.into(),
        }
    }
}

/// Classification label after resolution against the configured subjects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    SubjectA,
    SubjectB,
    Unknown,
}

impl Label {
    /// Label the classifier uses for "none of the known subjects"
    pub const UNKNOWN: &'static str = "unknown";
}

/// Key into the routing table
///
/// `Unclassified` is a distinct state, not an alias of any label: it is
/// what downstream stages see when classification is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKey {
    Unclassified,
    Classified(Label),
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKey::Unclassified => f.write_str("unclassified"),
            RouteKey::Classified(Label::SubjectA) => f.write_str("subject_a"),
            RouteKey::Classified(Label::SubjectB) => f.write_str("subject_b"),
            RouteKey::Classified(Label::Unknown) => f.write_str("unknown"),
        }
    }
}
