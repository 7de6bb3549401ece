//! Response envelopes
//!
//! Wraps pipeline results with a timestamp, model metadata and producer
//! information. Pipeline results are deterministic; envelopes are not.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detector::ModelInfo;
use crate::error::VisionError;
use crate::types::{EmotionAnalysis, FaceReport, SimpleMoodReport, WellnessReport};
use crate::{PRODUCER_NAME, WELLMIND_VERSION};

/// Disclaimer attached to landmark-geometry results
pub const SIMPLE_MOOD_NOTE: &str =
    "Simplified analysis based on facial landmarks. Use emotion analysis for accurate results.";

/// Software that produced a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionAnalysisResponse {
    #[serde(flatten)]
    pub analysis: EmotionAnalysis,
    /// RFC 3339 UTC
    pub timestamp: String,
    pub model_info: ModelInfo,
    pub producer: Producer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessScoreResponse {
    #[serde(flatten)]
    pub report: WellnessReport,
    pub timestamp: String,
    pub producer: Producer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceAnalysisResponse {
    #[serde(flatten)]
    pub report: FaceReport,
    pub timestamp: String,
    pub models_used: ModelInfo,
    pub producer: Producer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleMoodResponse {
    #[serde(flatten)]
    pub report: SimpleMoodReport,
    pub timestamp: String,
    pub note: String,
    pub producer: Producer,
}

/// Error payload for a thin API layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// HTTP-style status: 400 for bad input, 500 otherwise
    pub status_code: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn from_error(error: &VisionError) -> Self {
        Self {
            error: error.to_string(),
            code: error.code().to_string(),
            status_code: if error.is_client_error() { 400 } else { 500 },
            timestamp: timestamp_now(),
        }
    }
}

/// Encoder for producing response envelopes
pub struct ResponseEncoder {
    instance_id: String,
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn producer(&self) -> Producer {
        Producer {
            name: PRODUCER_NAME.to_string(),
            version: WELLMIND_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    pub fn emotion_analysis(
        &self,
        analysis: EmotionAnalysis,
        model_info: &ModelInfo,
    ) -> EmotionAnalysisResponse {
        EmotionAnalysisResponse {
            analysis,
            timestamp: timestamp_now(),
            model_info: model_info.clone(),
            producer: self.producer(),
        }
    }

    pub fn wellness_score(&self, report: WellnessReport) -> WellnessScoreResponse {
        WellnessScoreResponse {
            report,
            timestamp: timestamp_now(),
            producer: self.producer(),
        }
    }

    pub fn face_analysis(&self, report: FaceReport, model_info: &ModelInfo) -> FaceAnalysisResponse {
        FaceAnalysisResponse {
            report,
            timestamp: timestamp_now(),
            models_used: model_info.clone(),
            producer: self.producer(),
        }
    }

    pub fn simple_mood(&self, report: SimpleMoodReport) -> SimpleMoodResponse {
        SimpleMoodResponse {
            report,
            timestamp: timestamp_now(),
            note: SIMPLE_MOOD_NOTE.to_string(),
            producer: self.producer(),
        }
    }
}

/// Serialize any envelope to pretty JSON
pub fn to_json<T: Serialize>(value: &T) -> Result<String, VisionError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{analyze_emotion, analyze_simple, detect_faces, wellness_score};
    use crate::types::{BoundingBox, Emotion, EmotionEvidence, EmotionScores, Landmarks, Point};
    use chrono::DateTime;

    fn evidence() -> Vec<EmotionEvidence> {
        let point = Point(10, 10);
        vec![EmotionEvidence::new(
            0,
            BoundingBox { x: 1, y: 2, width: 30, height: 40 },
            Landmarks {
                left_eye: point,
                right_eye: Point(20, 10),
                nose: Point(15, 15),
                mouth_left: Point(10, 25),
                mouth_right: Point(20, 25),
            },
            0.93,
            EmotionScores::from_pairs([(Emotion::Sad, 0.7), (Emotion::Neutral, 0.3)]),
        )]
    }

    fn model_info() -> ModelInfo {
        ModelInfo {
            face_detection: "MTCNN".to_string(),
            emotion_recognition: "DeepFace".to_string(),
        }
    }

    #[test]
    fn test_emotion_envelope_flattens_result() {
        let encoder = ResponseEncoder::with_instance_id("test-instance".to_string());
        let response = encoder.emotion_analysis(analyze_emotion(&evidence()).unwrap(), &model_info());

        let value: serde_json::Value = serde_json::from_str(&to_json(&response).unwrap()).unwrap();
        assert_eq!(value["dominant_emotion"], "sad");
        assert_eq!(value["stress_level"], "Medium");
        assert_eq!(value["detected_faces"], 1);
        assert_eq!(value["model_info"]["face_detection"], "MTCNN");
        assert_eq!(value["producer"]["name"], PRODUCER_NAME);
        assert_eq!(value["producer"]["instance_id"], "test-instance");
        assert!(DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_other_envelopes() {
        let encoder = ResponseEncoder::new();
        assert!(Uuid::parse_str(encoder.instance_id()).is_ok());

        let wellness = encoder.wellness_score(wellness_score(&evidence()).unwrap());
        let value = serde_json::to_value(&wellness).unwrap();
        assert_eq!(value["emotion"], "sad");
        assert!(value["wellness_score"].is_number());

        let faces = encoder.face_analysis(detect_faces(&evidence()), &model_info());
        let value = serde_json::to_value(&faces).unwrap();
        assert_eq!(value["faces_detected"], 1);
        assert_eq!(value["models_used"]["emotion_recognition"], "DeepFace");
        assert_eq!(value["face_locations"][0]["keypoints"]["nose"], serde_json::json!([15, 15]));

        let simple = encoder.simple_mood(analyze_simple(&evidence()).unwrap());
        let value = serde_json::to_value(&simple).unwrap();
        assert_eq!(value["estimated_mood"], "neutral");
        assert_eq!(value["note"], SIMPLE_MOOD_NOTE);
    }

    #[test]
    fn test_error_response_status_codes() {
        let response = ErrorResponse::from_error(&VisionError::NoFaceDetected);
        assert_eq!(response.status_code, 400);
        assert_eq!(response.code, "NO_FACE_DETECTED");

        let response = ErrorResponse::from_error(&VisionError::InvalidImage("empty".to_string()));
        assert_eq!(response.status_code, 400);

        let response =
            ErrorResponse::from_error(&VisionError::DetectorUnavailable("offline".to_string()));
        assert_eq!(response.status_code, 500);
        assert!(response.error.contains("offline"));
    }
}
