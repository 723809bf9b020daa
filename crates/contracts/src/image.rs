//! CapturedImage - CaptureStage output

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::ImageId;

/// An image written to disk for one pipeline run
///
/// The core never deletes the file; it outlives the run (uploaded and
/// referenced in the notification).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedImage {
    /// File name, used as the identifier in uploads and notifications
    pub id: ImageId,

    /// Full path of the file on the local filesystem
    pub path: PathBuf,

    /// Metadata reported by the capture device
    #[serde(default)]
    pub metadata: AcquisitionMetadata,
}

/// Acquisition metadata
///
/// All fields are optional; real cameras report lux and exposure, the
/// simulation path reports a luma estimate computed from the pixels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquisitionMetadata {
    /// Estimated scene brightness (lux)
    pub lux: Option<f64>,

    /// Exposure time (microseconds)
    pub exposure_time_us: Option<u64>,

    /// Mean luma of the decoded image, 0.0 - 255.0
    pub mean_luma: Option<f64>,

    /// Everything else the device reported
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl AcquisitionMetadata {
    /// Build from the JSON object printed by `rpicam-still --metadata -`
    ///
    /// Known keys (`Lux`, `ExposureTime`) are lifted into typed fields, the
    /// rest is kept in `extra`.
    pub fn from_json(value: Value) -> Self {
        let mut extra = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let lux = extra.remove("Lux").and_then(|v| v.as_f64());
        let exposure_time_us = extra.remove("ExposureTime").and_then(|v| v.as_u64());
        Self {
            lux,
            exposure_time_us,
            mean_luma: None,
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_lifts_known_keys() {
        let meta = AcquisitionMetadata::from_json(json!({
            "Lux": 212.5,
            "ExposureTime": 33302,
            "AnalogueGain": 1.0
        }));
        assert_eq!(meta.lux, Some(212.5));
        assert_eq!(meta.exposure_time_us, Some(33302));
        assert!(meta.extra.contains_key("AnalogueGain"));
        assert!(!meta.extra.contains_key("Lux"));
    }

    #[test]
    fn test_from_json_non_object() {
        let meta = AcquisitionMetadata::from_json(json!("garbage"));
        assert!(meta.lux.is_none());
        assert!(meta.extra.is_empty());
    }
}
