//! RoutingPolicy - classification label to destination and notification text
//!
//! Pure: the decision depends only on the classification, the image id and
//! the event time. The route key is resolved first and every key maps to
//! exactly one destination, so adding a label is a compile error until it
//! is routed.

use chrono::{DateTime, Datelike, Local, Timelike};
use contracts::{
    CatmonError, ClassificationResult, Destination, ImageId, Label, RouteKey, RoutingDecision,
    RoutingTable, SubjectProfile,
};

/// Greeting for the time of day, with the Christmas addition on 25 December
pub fn greeting(at: DateTime<Local>) -> String {
    let base = match at.hour() {
        0..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    };
    if at.day() == 25 && at.month() == 12 {
        format!("{base} and Happy Christmas")
    } else {
        base.to_string()
    }
}

/// Maps classification outcomes onto the configured routing table
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    table: RoutingTable,
}

impl RoutingPolicy {
    pub fn new(table: RoutingTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Labels the classifier may emit
    pub fn expected_labels(&self) -> Vec<String> {
        vec![
            self.table.subject_a.label.clone(),
            self.table.subject_b.label.clone(),
            Label::UNKNOWN.to_string(),
        ]
    }

    /// Resolve a raw label into a route key
    ///
    /// A missing or empty label is `Unclassified`.
    ///
    /// # Errors
    /// `InvalidClassification` for any other label outside the table
    pub fn resolve(&self, label: Option<&str>) -> Result<RouteKey, CatmonError> {
        let label = match label {
            None => return Ok(RouteKey::Unclassified),
            Some(label) if label.is_empty() => return Ok(RouteKey::Unclassified),
            Some(label) => label,
        };

        if label == self.table.subject_a.label {
            Ok(RouteKey::Classified(Label::SubjectA))
        } else if label == self.table.subject_b.label {
            Ok(RouteKey::Classified(Label::SubjectB))
        } else if label == Label::UNKNOWN {
            Ok(RouteKey::Classified(Label::Unknown))
        } else {
            Err(CatmonError::InvalidClassification {
                label: label.to_string(),
                expected: self.expected_labels(),
            })
        }
    }

    pub fn destination(&self, key: RouteKey) -> &Destination {
        match key {
            RouteKey::Unclassified => &self.table.default,
            RouteKey::Classified(Label::SubjectA) => &self.table.subject_a.destination,
            RouteKey::Classified(Label::SubjectB) => &self.table.subject_b.destination,
            RouteKey::Classified(Label::Unknown) => &self.table.unknown,
        }
    }

    fn subject(&self, label: Label) -> Option<&SubjectProfile> {
        match label {
            Label::SubjectA => Some(&self.table.subject_a),
            Label::SubjectB => Some(&self.table.subject_b),
            Label::Unknown => None,
        }
    }

    /// Destination and notification text for one run
    ///
    /// `classification` is `None` when classification is disabled; the text
    /// is then the notification tag followed by the image id.
    ///
    /// # Errors
    /// `InvalidClassification` for a label outside the table
    pub fn route(
        &self,
        classification: Option<&ClassificationResult>,
        image: &ImageId,
        at: DateTime<Local>,
    ) -> Result<RoutingDecision, CatmonError> {
        let key = self.resolve(classification.map(|c| c.label.as_str()))?;
        let notification_text = match (key, classification) {
            (RouteKey::Classified(label), Some(result)) => {
                self.classified_text(label, result, image, at)
            }
            _ => self.plain_text(image),
        };
        Ok(RoutingDecision {
            destination: self.destination(key).clone(),
            notification_text,
        })
    }

    fn plain_text(&self, image: &ImageId) -> String {
        format!("{} {image}", self.table.notification_tag)
    }

    fn classified_text(
        &self,
        label: Label,
        result: &ClassificationResult,
        image: &ImageId,
        at: DateTime<Local>,
    ) -> String {
        let (salutation, likelihood) = match self.subject(label) {
            Some(subject) => (
                subject.salutation.as_str(),
                format!("the likelihood of {} is", subject.display_name),
            ),
            None => (
                self.table.unknown_salutation.as_str(),
                "the likelihood is".to_string(),
            ),
        };
        format!(
            "{} {salutation}\n\n{} (using {}) says {likelihood} {:.1}%\n\n{}",
            greeting(at),
            self.table.classifier_name,
            result.model,
            result.confidence * 100.0,
            self.plain_text(image),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn table() -> RoutingTable {
        let subject = |label: &str, name: &str, salutation: &str| SubjectProfile {
            label: label.to_string(),
            display_name: name.to_string(),
            salutation: salutation.to_string(),
            destination: Destination::new(format!("catmon_{label}"), format!("folder-{label}")),
        };
        RoutingTable {
            notification_tag: "Auto-tweet from catmon2:".to_string(),
            classifier_name: "Catmonic".to_string(),
            unknown_salutation: "cat of mystery!".to_string(),
            default: Destination::new("catmon", "folder-default"),
            unknown: Destination::new("catmon_unknown", "folder-unknown"),
            subject_a: subject("boo", "Boo", "Boo, aka Fluff Bag!"),
            subject_b: subject("simba", "Simba", "Simba, aka Mr Handsome!"),
        }
    }

    fn at(month: u32, day: u32, hour: u32, min: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2023, month, day, hour, min, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn test_greeting_bands() {
        assert_eq!(greeting(at(10, 14, 0, 0)), "Good morning");
        assert_eq!(greeting(at(10, 14, 11, 59)), "Good morning");
        assert_eq!(greeting(at(10, 14, 12, 0)), "Good afternoon");
        assert_eq!(greeting(at(10, 14, 17, 59)), "Good afternoon");
        assert_eq!(greeting(at(10, 14, 18, 0)), "Good evening");
        assert_eq!(greeting(at(10, 14, 23, 59)), "Good evening");
    }

    #[test]
    fn test_christmas_greeting() {
        assert_eq!(
            greeting(at(12, 25, 8, 30)),
            "Good morning and Happy Christmas"
        );
        assert_eq!(greeting(at(12, 24, 8, 30)), "Good morning");
        assert_eq!(greeting(at(11, 25, 8, 30)), "Good morning");
    }

    #[test]
    fn test_known_subject_decision() {
        let policy = RoutingPolicy::new(table());
        let result = ClassificationResult::new("boo", 0.931, "mobilenet_v2");
        let decision = policy
            .route(Some(&result), &"2023-10-14_191503.jpg".into(), at(10, 14, 19, 15))
            .unwrap();

        assert_eq!(decision.destination, Destination::new("catmon_boo", "folder-boo"));
        assert_eq!(
            decision.notification_text,
            "Good evening Boo, aka Fluff Bag!\n\n\
             Catmonic (using mobilenet_v2) says the likelihood of Boo is 93.1%\n\n\
             Auto-tweet from catmon2: 2023-10-14_191503.jpg"
        );
    }

    #[test]
    fn test_unknown_subject_decision() {
        let policy = RoutingPolicy::new(table());
        let result = ClassificationResult::new("unknown", 0.42, "m1");
        let decision = policy
            .route(Some(&result), &"a.jpg".into(), at(10, 14, 14, 0))
            .unwrap();

        assert_eq!(decision.destination.id, "folder-unknown");
        let text = &decision.notification_text;
        assert!(text.starts_with("Good afternoon cat of mystery!"));
        assert!(text.contains("says the likelihood is 42.0%"));
        assert!(text.contains("(using m1)"));
        assert!(text.ends_with("Auto-tweet from catmon2: a.jpg"));
    }

    #[test]
    fn test_unclassified_is_tag_and_image_only() {
        let policy = RoutingPolicy::new(table());
        let decision = policy
            .route(None, &"a.jpg".into(), at(12, 25, 9, 0))
            .unwrap();
        assert_eq!(decision.destination.id, "folder-default");
        assert_eq!(decision.notification_text, "Auto-tweet from catmon2: a.jpg");
    }

    #[test]
    fn test_empty_label_is_unclassified() {
        let policy = RoutingPolicy::new(table());
        assert_eq!(policy.resolve(Some("")).unwrap(), RouteKey::Unclassified);

        let result = ClassificationResult::new("", 0.9, "m1");
        let decision = policy
            .route(Some(&result), &"a.jpg".into(), at(10, 14, 9, 0))
            .unwrap();
        assert_eq!(decision.destination.id, "folder-default");
    }

    #[test]
    fn test_foreign_label_is_rejected() {
        let policy = RoutingPolicy::new(table());
        for label in ["dog", "Boo", "unknown "] {
            let result = ClassificationResult::new(label, 0.99, "m1");
            let err = policy
                .route(Some(&result), &"a.jpg".into(), at(10, 14, 9, 0))
                .unwrap_err();
            match err {
                CatmonError::InvalidClassification { label: got, expected } => {
                    assert_eq!(got, label);
                    assert_eq!(expected, vec!["boo", "simba", "unknown"]);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_every_key_has_its_own_destination() {
        let policy = RoutingPolicy::new(table());
        let ids: Vec<_> = [
            RouteKey::Unclassified,
            RouteKey::Classified(Label::SubjectA),
            RouteKey::Classified(Label::SubjectB),
            RouteKey::Classified(Label::Unknown),
        ]
        .into_iter()
        .map(|key| policy.destination(key).id.clone())
        .collect();
        assert_eq!(
            ids,
            ["folder-default", "folder-boo", "folder-simba", "folder-unknown"]
        );
    }

    #[test]
    fn test_route_is_deterministic() {
        let policy = RoutingPolicy::new(table());
        let result = ClassificationResult::new("simba", 0.5, "m2");
        let when = at(10, 14, 7, 45);
        let first = policy.route(Some(&result), &"a.jpg".into(), when).unwrap();
        let second = policy.route(Some(&result), &"a.jpg".into(), when).unwrap();
        assert_eq!(first, second);
        assert!(first.notification_text.contains("likelihood of Simba is 50.0%"));
    }
}
