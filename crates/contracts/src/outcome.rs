//! PipelineRunOutcome - one per admitted event, for logging

use chrono::{DateTime, Local};
use std::fmt;

use crate::{CatmonError, ImageId};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Capture,
    Classify,
    Route,
    Upload,
    Notify,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Capture,
        Stage::Classify,
        Stage::Route,
        Stage::Upload,
        Stage::Notify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Capture => "capture",
            Stage::Classify => "classify",
            Stage::Route => "route",
            Stage::Upload => "upload",
            Stage::Notify => "notify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage that terminated a run, and why
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: CatmonError,
}

/// Result of one orchestrator run
///
/// Completed stages are never rolled back when a later stage fails.
#[derive(Debug)]
pub struct PipelineRunOutcome {
    pub event_time: DateTime<Local>,

    /// Image produced by the capture stage, if it got that far
    pub image: Option<ImageId>,

    /// Stages that ran to completion, in order
    pub completed: Vec<Stage>,

    /// Optional stages that were disabled for this process
    pub skipped: Vec<Stage>,

    pub failure: Option<StageFailure>,
}

impl PipelineRunOutcome {
    pub fn new(event_time: DateTime<Local>) -> Self {
        Self {
            event_time,
            image: None,
            completed: Vec::new(),
            skipped: Vec::new(),
            failure: None,
        }
    }

    pub fn stages_completed(&self) -> usize {
        self.completed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn error(&self) -> Option<&CatmonError> {
        self.failure.as_ref().map(|f| &f.error)
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        self.failure.as_ref().map(|f| f.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let mut outcome = PipelineRunOutcome::new(Local::now());
        assert!(outcome.is_success());
        outcome.completed.push(Stage::Capture);
        outcome.failure = Some(StageFailure {
            stage: Stage::Classify,
            error: CatmonError::classification("a.jpg", "model missing"),
        });
        assert_eq!(outcome.stages_completed(), 1);
        assert_eq!(outcome.failed_stage(), Some(Stage::Classify));
        assert!(!outcome.is_success());
    }
}
