//! Adapter for converting raw detector output into EmotionEvidence
//!
//! Handles coordinate clamping, score scaling, unknown-label filtering and
//! the fallback scores used when emotion classification is not possible.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::ScoreScale;
use crate::error::VisionError;
use crate::schema::raw_face::*;
use crate::types::{
    BoundingBox, Emotion, EmotionEvidence, EmotionScores, EmotionSource, Landmarks, Point,
};

/// Adapter for converting raw detections to evidence
pub struct EvidenceAdapter;

impl EvidenceAdapter {
    /// Parse a single detection record
    pub fn parse_record(json: &str) -> Result<DetectionRecord, VisionError> {
        let record: DetectionRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Parse a JSON array of records
    pub fn parse_array(json: &str) -> Result<Vec<DetectionRecord>, VisionError> {
        let records: Vec<DetectionRecord> = serde_json::from_str(json)?;
        for (index, record) in records.iter().enumerate() {
            record
                .validate()
                .map_err(|e| VisionError::ParseError(format!("record {index}: {e}")))?;
        }
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing one record per line
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<DetectionRecord>, VisionError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match Self::parse_record(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(VisionError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Convert every face in a record using its embedded emotion scores.
    ///
    /// Faces without an `emotion` map get the classifier-unavailable fallback.
    pub fn record_to_evidence(record: &DetectionRecord) -> Result<Vec<EmotionEvidence>, VisionError> {
        record.validate()?;
        record
            .faces
            .iter()
            .enumerate()
            .map(|(face_id, face)| {
                let (scores, source) = match &face.emotion {
                    Some(raw) => (
                        Self::normalize_scores(raw, record.emotion_scale),
                        EmotionSource::Classifier,
                    ),
                    None => (
                        fallback_scores(EmotionSource::ClassifierUnavailable),
                        EmotionSource::ClassifierUnavailable,
                    ),
                };
                Self::to_evidence(face_id, face, scores).map(|e| e.with_source(source))
            })
            .collect()
    }

    /// Build evidence for one raw face with already-normalized scores
    pub fn to_evidence(
        face_id: usize,
        face: &RawFace,
        scores: EmotionScores,
    ) -> Result<EmotionEvidence, VisionError> {
        face.validate()?;

        let [x, y, width, height] = face.bounding_box;
        let bounding_box = BoundingBox {
            x: to_pixel(x),
            y: to_pixel(y),
            width: to_pixel(width),
            height: to_pixel(height),
        };

        let kp = &face.keypoints;
        let landmarks = Landmarks {
            left_eye: to_point(kp.left_eye),
            right_eye: to_point(kp.right_eye),
            nose: to_point(kp.nose),
            mouth_left: to_point(kp.mouth_left),
            mouth_right: to_point(kp.mouth_right),
        };

        Ok(EmotionEvidence::new(
            face_id,
            bounding_box,
            landmarks,
            face.confidence,
            scores,
        ))
    }

    /// Map raw label scores onto the vocabulary at 0-1 scale.
    ///
    /// Unknown labels are dropped; values are clamped to [0, 1] after scaling.
    pub fn normalize_scores(raw: &BTreeMap<String, f64>, scale: ScoreScale) -> EmotionScores {
        let divisor = scale.divisor();
        let mut scores = EmotionScores::new();
        for (label, value) in raw {
            match Emotion::from_label(label) {
                Some(emotion) if value.is_finite() => {
                    scores.insert(emotion, (value / divisor).clamp(0.0, 1.0));
                }
                Some(_) => debug!(label = %label, "dropping non-finite emotion score"),
                None => debug!(label = %label, "dropping unknown emotion label"),
            }
        }
        scores
    }
}

/// Scores substituted when no classifier output exists for a face.
///
/// Both variants make `neutral` dominant.
pub fn fallback_scores(source: EmotionSource) -> EmotionScores {
    match source {
        EmotionSource::ClassifierFailed => EmotionScores::from_pairs([
            (Emotion::Happy, 0.2),
            (Emotion::Sad, 0.1),
            (Emotion::Angry, 0.1),
            (Emotion::Fear, 0.1),
            (Emotion::Surprise, 0.1),
            (Emotion::Disgust, 0.1),
            (Emotion::Neutral, 0.3),
        ]),
        EmotionSource::ClassifierUnavailable | EmotionSource::Classifier => {
            EmotionScores::from_pairs([(Emotion::Neutral, 0.8), (Emotion::Happy, 0.2)])
        }
    }
}

/// Truncate toward zero and clamp into the non-negative pixel range
fn to_pixel(value: f64) -> u32 {
    value.trunc().clamp(0.0, u32::MAX as f64) as u32
}

fn to_point([x, y]: [f64; 2]) -> Point {
    Point(x.trunc() as i32, y.trunc() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record_json() -> &'static str {
        r#"{
            "schema_version": "wellmind.detections.v1",
            "image_id": "frame-001",
            "faces": [
                {
                    "box": [-6, 14.7, 120.9, 150],
                    "confidence": 0.97,
                    "keypoints": {
                        "left_eye": [30, 60],
                        "right_eye": [80, 61],
                        "nose": [55, 90],
                        "mouth_left": [35.6, 120],
                        "mouth_right": [75, 119]
                    },
                    "emotion": {
                        "angry": 2.0, "disgust": 0.5, "fear": 1.5, "happy": 70.0,
                        "sad": 6.0, "surprise": 5.0, "neutral": 15.0
                    }
                },
                {
                    "box": [300, 40, 90, 110],
                    "confidence": 0.88,
                    "keypoints": {
                        "left_eye": [320, 80],
                        "right_eye": [360, 80],
                        "nose": [340, 100],
                        "mouth_left": [325, 125],
                        "mouth_right": [355, 125]
                    }
                }
            ]
        }"#
    }

    #[test]
    fn test_record_to_evidence() {
        let record = EvidenceAdapter::parse_record(sample_record_json()).unwrap();
        assert_eq!(record.image_id.as_deref(), Some("frame-001"));

        let evidence = EvidenceAdapter::record_to_evidence(&record).unwrap();
        assert_eq!(evidence.len(), 2);

        let first = &evidence[0];
        assert_eq!(first.face_id, 0);
        assert_eq!(first.bounding_box, BoundingBox { x: 0, y: 14, width: 120, height: 150 });
        assert_eq!(first.landmarks.mouth_left, Point(35, 120));
        assert_eq!(first.dominant_emotion, Emotion::Happy);
        assert_eq!(first.emotion_scores.len(), 7);
        assert!((first.emotion_scores.get(Emotion::Happy) - 0.7).abs() < 1e-12);
        assert_eq!(first.emotion_source, EmotionSource::Classifier);

        let second = &evidence[1];
        assert_eq!(second.face_id, 1);
        assert_eq!(second.dominant_emotion, Emotion::Neutral);
        assert_eq!(second.emotion_source, EmotionSource::ClassifierUnavailable);
        assert_eq!(second.emotion_scores.len(), 2);
    }

    #[test]
    fn test_normalize_drops_unknown_and_clamps() {
        let raw: BTreeMap<String, f64> = [
            ("Happy".to_string(), 120.0),
            ("contempt".to_string(), 40.0),
            ("sad".to_string(), -3.0),
        ]
        .into_iter()
        .collect();

        let scores = EvidenceAdapter::normalize_scores(&raw, ScoreScale::Percent);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get(Emotion::Happy), 1.0);
        assert_eq!(scores.get(Emotion::Sad), 0.0);
    }

    #[test]
    fn test_normalize_unit_scale_passthrough() {
        let raw: BTreeMap<String, f64> = [("fear".to_string(), 0.42)].into_iter().collect();
        let scores = EvidenceAdapter::normalize_scores(&raw, ScoreScale::Unit);
        assert_eq!(scores.get(Emotion::Fear), 0.42);
    }

    #[test]
    fn test_fallback_scores_are_neutral() {
        let unavailable = fallback_scores(EmotionSource::ClassifierUnavailable);
        assert_eq!(unavailable.len(), 2);
        assert_eq!(unavailable.dominant(), Some(Emotion::Neutral));

        let failed = fallback_scores(EmotionSource::ClassifierFailed);
        assert_eq!(failed.len(), 7);
        assert_eq!(failed.dominant(), Some(Emotion::Neutral));
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = "{\"faces\": []}\n\nnot json\n";
        let err = EvidenceAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = "{\"faces\": []}\n{\"image_id\": \"b\", \"faces\": []}\n";
        let records = EvidenceAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].image_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_parse_array() {
        let records = EvidenceAdapter::parse_array(r#"[{"faces": []}, {"image_id": "x"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].faces.is_empty());

        let err = EvidenceAdapter::parse_array(r#"[{"faces": []}, {"schema_version": "v0"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn test_invalid_face_rejected() {
        let json = r#"{"faces": [{
            "box": [0, 0, 10, 10],
            "confidence": 3.0,
            "keypoints": {
                "left_eye": [1, 1], "right_eye": [2, 1], "nose": [1, 2],
                "mouth_left": [1, 3], "mouth_right": [2, 3]
            }
        }]}"#;
        assert!(matches!(
            EvidenceAdapter::parse_record(json),
            Err(VisionError::InvalidDetection(_))
        ));
    }
}
