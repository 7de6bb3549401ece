//! Face detection and emotion classification boundary
//!
//! Vision models are external collaborators. They are injected into the
//! processor as trait objects; a missing emotion classifier is a supported
//! configuration that routes every face through fallback scores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::ScoreScale;
use crate::error::VisionError;
use crate::schema::{fallback_scores, DetectionRecord, EvidenceAdapter, RawFace};
use crate::types::{EmotionEvidence, EmotionSource};

/// Emotion recognition label reported when no classifier is configured
pub const BASIC_RECOGNITION: &str = "Basic Pattern Recognition";

const REPLAY_DETECTOR_NAME: &str = "Recorded detections (wellmind.detections.v1)";
const REPLAY_CLASSIFIER_NAME: &str = "Recorded emotion scores";

/// Image handed to the detectors. Bytes are opaque; decoding belongs to the detector.
#[derive(Debug, Clone, Default)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    /// MIME type, when the transport supplies one
    pub content_type: Option<String>,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Reject inputs that can't be an image before running any model
    pub fn validate(&self) -> Result<(), VisionError> {
        if let Some(content_type) = &self.content_type {
            if !content_type.starts_with("image/") {
                return Err(VisionError::InvalidImage(format!(
                    "Invalid file type: {content_type}. Please upload an image."
                )));
            }
        }
        if self.bytes.is_empty() {
            return Err(VisionError::InvalidImage("image is empty".to_string()));
        }
        Ok(())
    }
}

/// Emotion scores as reported by a classifier, on its own scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    pub scores: BTreeMap<String, f64>,
    pub scale: ScoreScale,
}

/// Locates faces and their landmarks in an image
pub trait FaceDetector: Send + Sync {
    /// Human-readable model name for response metadata
    fn name(&self) -> &str;

    fn detect_faces(&self, image: &ImageInput) -> Result<Vec<RawFace>, VisionError>;
}

/// Scores the seven emotions for one detected face
pub trait EmotionClassifier: Send + Sync {
    /// Human-readable model name for response metadata
    fn name(&self) -> &str;

    fn classify(&self, image: &ImageInput, face: &RawFace) -> Result<ClassifierOutput, VisionError>;
}

/// Names of the models behind a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub face_detection: String,
    pub emotion_recognition: String,
}

impl ModelInfo {
    /// Model names for evidence replayed from a detection record
    pub fn replay() -> Self {
        Self {
            face_detection: REPLAY_DETECTOR_NAME.to_string(),
            emotion_recognition: REPLAY_CLASSIFIER_NAME.to_string(),
        }
    }
}

/// Model capabilities available to a processor, fixed at construction
#[derive(Default)]
pub struct Capabilities {
    face_detector: Option<Box<dyn FaceDetector>>,
    emotion_classifier: Option<Box<dyn EmotionClassifier>>,
}

impl Capabilities {
    pub fn new(
        face_detector: Option<Box<dyn FaceDetector>>,
        emotion_classifier: Option<Box<dyn EmotionClassifier>>,
    ) -> Self {
        Self {
            face_detector,
            emotion_classifier,
        }
    }

    /// Capabilities replaying a recorded detection.
    ///
    /// With `with_classifier` false the recorded emotion scores are ignored,
    /// matching a deployment that only has a face detector.
    pub fn replay(record: DetectionRecord, with_classifier: bool) -> Self {
        let detector = ReplayDetector::new(record);
        let classifier: Option<Box<dyn EmotionClassifier>> = if with_classifier {
            Some(Box::new(detector.clone()))
        } else {
            None
        };
        Self::new(Some(Box::new(detector)), classifier)
    }

    pub fn has_face_detector(&self) -> bool {
        self.face_detector.is_some()
    }

    pub fn has_emotion_classifier(&self) -> bool {
        self.emotion_classifier.is_some()
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            face_detection: self
                .face_detector
                .as_ref()
                .map(|d| d.name().to_string())
                .unwrap_or_else(|| "unavailable".to_string()),
            emotion_recognition: self
                .emotion_classifier
                .as_ref()
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| BASIC_RECOGNITION.to_string()),
        }
    }

    /// Detect faces and build one evidence record per face.
    ///
    /// Face detector problems are errors. Emotion classifier problems are
    /// not: affected faces get fallback scores with `neutral` dominant.
    /// A classifier reporting [`VisionError::ClassifierUnavailable`] for a face
    /// gets the same reduced fallback as having no classifier at all.
    /// Detector problems have no fallback since without a detected face there
    /// is no box or landmarks to attach scores to.
    pub fn build_evidence(&self, image: &ImageInput) -> Result<Vec<EmotionEvidence>, VisionError> {
        image.validate()?;

        let detector = self.face_detector.as_ref().ok_or_else(|| {
            VisionError::DetectorUnavailable("Face detection model not available".to_string())
        })?;

        let faces = detector.detect_faces(image)?;
        debug!(faces = faces.len(), detector = detector.name(), "face detection complete");
        if self.emotion_classifier.is_none() && !faces.is_empty() {
            warn!(faces = faces.len(), "no emotion classifier configured, using fallback scores");
        }

        faces
            .iter()
            .enumerate()
            .map(|(face_id, face)| {
                let (scores, source) = match &self.emotion_classifier {
                    None => (
                        fallback_scores(EmotionSource::ClassifierUnavailable),
                        EmotionSource::ClassifierUnavailable,
                    ),
                    Some(classifier) => match classifier.classify(image, face) {
                        Ok(output) => (
                            EvidenceAdapter::normalize_scores(&output.scores, output.scale),
                            EmotionSource::Classifier,
                        ),
                        Err(VisionError::ClassifierUnavailable(reason)) => {
                            debug!(face_id, %reason, "no emotion scores for face, using fallback scores");
                            (
                                fallback_scores(EmotionSource::ClassifierUnavailable),
                                EmotionSource::ClassifierUnavailable,
                            )
                        }
                        Err(e) => {
                            warn!(face_id, error = %e, "emotion classification failed, using fallback scores");
                            (
                                fallback_scores(EmotionSource::ClassifierFailed),
                                EmotionSource::ClassifierFailed,
                            )
                        }
                    },
                };
                EvidenceAdapter::to_evidence(face_id, face, scores).map(|e| e.with_source(source))
            })
            .collect()
    }
}

/// Detector and classifier backed by a recorded [`DetectionRecord`]
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    record: DetectionRecord,
}

impl ReplayDetector {
    pub fn new(record: DetectionRecord) -> Self {
        Self { record }
    }
}

impl FaceDetector for ReplayDetector {
    fn name(&self) -> &str {
        REPLAY_DETECTOR_NAME
    }

    fn detect_faces(&self, _image: &ImageInput) -> Result<Vec<RawFace>, VisionError> {
        Ok(self.record.faces.clone())
    }
}

impl EmotionClassifier for ReplayDetector {
    fn name(&self) -> &str {
        REPLAY_CLASSIFIER_NAME
    }

    fn classify(&self, _image: &ImageInput, face: &RawFace) -> Result<ClassifierOutput, VisionError> {
        match &face.emotion {
            Some(scores) => Ok(ClassifierOutput {
                scores: scores.clone(),
                scale: self.record.emotion_scale,
            }),
            None => Err(VisionError::ClassifierUnavailable(
                "no emotion scores recorded for face".to_string(),
            )),
        }
    }
}
