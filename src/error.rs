//! Error types for WellMind Vision

use thiserror::Error;

/// Errors that can occur around the decision pipeline.
///
/// The decision functions themselves (stress, fatigue, wellness,
/// recommendations) are total and never produce these.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("No face detected in image")]
    NoFaceDetected,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Face detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Emotion classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Invalid face detection: {0}")]
    InvalidDetection(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse detector output: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl VisionError {
    /// Whether the caller supplied unusable input (as opposed to a server-side failure)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VisionError::NoFaceDetected
                | VisionError::InvalidImage(_)
                | VisionError::InvalidDetection(_)
                | VisionError::JsonError(_)
                | VisionError::ParseError(_)
        )
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            VisionError::NoFaceDetected => "NO_FACE_DETECTED",
            VisionError::InvalidImage(_) => "INVALID_IMAGE",
            VisionError::DetectorUnavailable(_) => "DETECTOR_UNAVAILABLE",
            VisionError::ClassifierUnavailable(_) => "CLASSIFIER_UNAVAILABLE",
            VisionError::InvalidDetection(_) => "INVALID_DETECTION",
            VisionError::JsonError(_) => "JSON_ERROR",
            VisionError::ParseError(_) => "PARSE_ERROR",
            VisionError::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}
