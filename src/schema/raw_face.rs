//! wellmind.detections.v1 schema definition
//!
//! Raw per-face detector output as produced by MTCNN-style face detectors,
//! optionally annotated with DeepFace-style emotion percentages. Records in
//! this shape can be replayed through the pipeline without live models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ScoreScale;
use crate::error::VisionError;

/// Current schema version
pub const SCHEMA_VERSION: &str = "wellmind.detections.v1";

/// Raw landmark positions, `[x, y]` in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawKeypoints {
    pub left_eye: [f64; 2],
    pub right_eye: [f64; 2],
    pub nose: [f64; 2],
    pub mouth_left: [f64; 2],
    pub mouth_right: [f64; 2],
}

impl RawKeypoints {
    fn all(&self) -> [(&'static str, [f64; 2]); 5] {
        [
            ("left_eye", self.left_eye),
            ("right_eye", self.right_eye),
            ("nose", self.nose),
            ("mouth_left", self.mouth_left),
            ("mouth_right", self.mouth_right),
        ]
    }
}

/// One face as reported by a face detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFace {
    /// `[x, y, width, height]`; x and y may be negative for faces clipped by the frame
    #[serde(rename = "box")]
    pub bounding_box: [f64; 4],
    /// Detection confidence (0-1)
    pub confidence: f64,
    pub keypoints: RawKeypoints,
    /// Emotion label to score, on the record's `emotion_scale`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<BTreeMap<String, f64>>,
}

impl RawFace {
    /// Validate numeric ranges
    pub fn validate(&self) -> Result<(), VisionError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(VisionError::InvalidDetection(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }

        if self.bounding_box.iter().any(|v| !v.is_finite()) {
            return Err(VisionError::InvalidDetection(
                "bounding box contains a non-finite value".to_string(),
            ));
        }
        if self.bounding_box[2] < 0.0 || self.bounding_box[3] < 0.0 {
            return Err(VisionError::InvalidDetection(
                "bounding box has negative size".to_string(),
            ));
        }

        for (name, [x, y]) in self.keypoints.all() {
            if !x.is_finite() || !y.is_finite() {
                return Err(VisionError::InvalidDetection(format!(
                    "keypoint {name} contains a non-finite value"
                )));
            }
        }

        if let Some(scores) = &self.emotion {
            if let Some((label, value)) = scores.iter().find(|(_, v)| !v.is_finite()) {
                return Err(VisionError::InvalidDetection(format!(
                    "emotion score {label} is not finite ({value})"
                )));
            }
        }

        Ok(())
    }
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Detector output for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Optional caller-provided identifier echoed in batch output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default)]
    pub faces: Vec<RawFace>,
    /// Scale of the `emotion` maps; classifiers usually report percentages
    #[serde(default = "default_emotion_scale")]
    pub emotion_scale: ScoreScale,
}

fn default_emotion_scale() -> ScoreScale {
    ScoreScale::Percent
}

impl DetectionRecord {
    pub fn new(faces: Vec<RawFace>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            image_id: None,
            faces,
            emotion_scale: default_emotion_scale(),
        }
    }

    /// Validate schema version and every face
    pub fn validate(&self) -> Result<(), VisionError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(VisionError::ParseError(format!(
                "Invalid schema version: expected {}, got {}",
                SCHEMA_VERSION, self.schema_version
            )));
        }
        for (index, face) in self.faces.iter().enumerate() {
            face.validate().map_err(|e| match e {
                VisionError::InvalidDetection(msg) => {
                    VisionError::InvalidDetection(format!("face {index}: {msg}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_face_json() -> &'static str {
        r#"{
            "box": [120, 80, 200, 240],
            "confidence": 0.998,
            "keypoints": {
                "left_eye": [170, 160],
                "right_eye": [260, 158],
                "nose": [215, 210],
                "mouth_left": [180, 260],
                "mouth_right": [250, 258]
            },
            "emotion": {"happy": 82.5, "neutral": 12.0, "sad": 5.5}
        }"#
    }

    #[test]
    fn test_deserialize_face() {
        let face: RawFace = serde_json::from_str(sample_face_json()).unwrap();
        assert_eq!(face.bounding_box, [120.0, 80.0, 200.0, 240.0]);
        assert_eq!(face.keypoints.nose, [215.0, 210.0]);
        assert_eq!(face.emotion.as_ref().unwrap()["happy"], 82.5);
        assert!(face.validate().is_ok());
    }

    #[test]
    fn test_record_defaults() {
        let record: DetectionRecord = serde_json::from_str(r#"{"faces": []}"#).unwrap();
        assert_eq!(record.schema_version, SCHEMA_VERSION);
        assert_eq!(record.emotion_scale, ScoreScale::Percent);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_rejects_wrong_schema_version() {
        let record: DetectionRecord =
            serde_json::from_str(r#"{"schema_version": "other.v2", "faces": []}"#).unwrap();
        assert!(matches!(record.validate(), Err(VisionError::ParseError(_))));
    }

    #[test]
    fn test_rejects_confidence_out_of_range() {
        let mut face: RawFace = serde_json::from_str(sample_face_json()).unwrap();
        face.confidence = 1.2;
        assert!(matches!(face.validate(), Err(VisionError::InvalidDetection(_))));
    }

    #[test]
    fn test_rejects_negative_size() {
        let mut face: RawFace = serde_json::from_str(sample_face_json()).unwrap();
        face.bounding_box[2] = -4.0;
        assert!(face.validate().is_err());
    }

    #[test]
    fn test_negative_origin_is_allowed() {
        let mut face: RawFace = serde_json::from_str(sample_face_json()).unwrap();
        face.bounding_box[0] = -12.0;
        assert!(face.validate().is_ok());
    }

    #[test]
    fn test_record_reports_face_index() {
        let mut face: RawFace = serde_json::from_str(sample_face_json()).unwrap();
        face.keypoints.nose = [f64::NAN, 1.0];
        let record = DetectionRecord::new(vec![face]);
        let err = record.validate().unwrap_err();
        assert!(err.to_string().contains("face 0"));
    }
}
