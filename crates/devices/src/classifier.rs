//! Classifiers
//!
//! `CommandClassifier` shells out to a model runner that prints one JSON
//! object `{label, confidence, model}`; `MockClassifier` returns a fixed
//! answer configured from params.

use std::collections::HashMap;

use contracts::{CapturedImage, CatmonError, ClassificationResult, Classifier, Label};
use tracing::{debug, instrument};

use crate::command;

/// Placeholder in the classifier argv replaced by the image path
pub const IMAGE_PLACEHOLDER: &str = "{image}";

/// Classifier backed by an external command
pub struct CommandClassifier {
    name: String,
    argv: Vec<String>,
}

impl CommandClassifier {
    pub fn new(name: impl Into<String>, argv: Vec<String>) -> Self {
        Self {
            name: name.into(),
            argv,
        }
    }
}

fn parse_prediction(image: &str, stdout: &str) -> Result<ClassificationResult, CatmonError> {
    let value = command::extract_json(stdout)
        .ok_or_else(|| CatmonError::classification(image, "classifier printed no JSON"))?;
    serde_json::from_value(value)
        .map_err(|e| CatmonError::classification(image, format!("malformed prediction: {e}")))
}

impl Classifier for CommandClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "classifier_predict", skip(self, image), fields(classifier = %self.name, image = %image.id))]
    async fn predict(
        &mut self,
        image: &CapturedImage,
    ) -> Result<ClassificationResult, CatmonError> {
        let argv = command::render_argv(&self.argv, IMAGE_PLACEHOLDER, &image.path);
        let output = command::run(&argv)
            .await
            .map_err(|message| CatmonError::classification(image.id.as_str(), message))?;
        let result = parse_prediction(&image.id, &output.stdout)?;
        debug!(label = %result.label, confidence = result.confidence, "prediction");
        Ok(result)
    }
}

/// Fixed-answer classifier
pub struct MockClassifier {
    answer: Result<ClassificationResult, String>,
    calls: u32,
}

impl MockClassifier {
    pub fn new(result: ClassificationResult) -> Self {
        Self {
            answer: Ok(result),
            calls: 0,
        }
    }

    /// Classifier whose every prediction fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Err(message.into()),
            calls: 0,
        }
    }

    /// Build from `label`, `confidence`, `model` params (`fail` makes it fail)
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        if let Some(message) = params.get("fail") {
            return Self::failing(message.clone());
        }
        let label = params
            .get("label")
            .cloned()
            .unwrap_or_else(|| Label::UNKNOWN.to_string());
        let confidence = params
            .get("confidence")
            .and_then(|c| c.parse().ok())
            .unwrap_or(0.0);
        let model = params
            .get("model")
            .cloned()
            .unwrap_or_else(|| "mock".to_string());
        Self::new(ClassificationResult::new(label, confidence, model))
    }
}

impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn predict(
        &mut self,
        image: &CapturedImage,
    ) -> Result<ClassificationResult, CatmonError> {
        self.calls += 1;
        debug!(image = %image.id, calls = self.calls, "mock prediction");
        self.answer
            .clone()
            .map_err(|message| CatmonError::classification(image.id.as_str(), message))
    }
}
