//! Stress classification
//!
//! Maps a dominant emotion and the detection confidence of its face to a
//! three-tier stress level.

use crate::config::PipelineConfig;
use crate::types::{Emotion, StressLevel};

/// Rule-table stress classifier
#[derive(Debug, Clone, Copy)]
pub struct StressClassifier {
    confidence_threshold: f64,
}

impl Default for StressClassifier {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl StressClassifier {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            confidence_threshold: config.stress_confidence_threshold,
        }
    }

    /// Classify stress for a dominant emotion label.
    ///
    /// Labels match case-insensitively; unknown labels classify as Medium.
    /// Confidence below the threshold forces Medium whatever the table says.
    pub fn classify(&self, dominant_emotion: &str, confidence: f64) -> StressLevel {
        if confidence < self.confidence_threshold {
            return StressLevel::Medium;
        }
        base_stress(Emotion::from_label(dominant_emotion))
    }
}

fn base_stress(emotion: Option<Emotion>) -> StressLevel {
    match emotion {
        Some(Emotion::Angry) | Some(Emotion::Fear) => StressLevel::High,
        Some(Emotion::Sad) | Some(Emotion::Disgust) => StressLevel::Medium,
        Some(Emotion::Neutral) | Some(Emotion::Surprise) | Some(Emotion::Happy) => {
            StressLevel::Low
        }
        None => StressLevel::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_stress_emotions() {
        let classifier = StressClassifier::default();
        for label in ["angry", "fear"] {
            assert_eq!(classifier.classify(label, 0.9), StressLevel::High);
        }
    }

    #[test]
    fn test_table_lookup() {
        let classifier = StressClassifier::default();
        assert_eq!(classifier.classify("sad", 0.9), StressLevel::Medium);
        assert_eq!(classifier.classify("disgust", 0.9), StressLevel::Medium);
        assert_eq!(classifier.classify("neutral", 0.9), StressLevel::Low);
        assert_eq!(classifier.classify("surprise", 0.9), StressLevel::Low);
        assert_eq!(classifier.classify("happy", 0.9), StressLevel::Low);
    }

    #[test]
    fn test_low_confidence_forces_medium() {
        let classifier = StressClassifier::default();
        for label in ["angry", "fear", "happy", "neutral", "sad", "whatever"] {
            for confidence in [0.0, 0.3, 0.59, 0.5999] {
                assert_eq!(
                    classifier.classify(label, confidence),
                    StressLevel::Medium,
                    "{label} at {confidence}"
                );
            }
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let classifier = StressClassifier::default();
        assert_eq!(classifier.classify("angry", 0.6), StressLevel::High);
    }

    #[test]
    fn test_unknown_label_is_medium() {
        let classifier = StressClassifier::default();
        assert_eq!(classifier.classify("unknownLabel", 0.9), StressLevel::Medium);
        assert_eq!(classifier.classify("", 0.9), StressLevel::Medium);
    }

    #[test]
    fn test_case_insensitive() {
        let classifier = StressClassifier::default();
        assert_eq!(classifier.classify("ANGRY", 0.9), StressLevel::High);
        assert_eq!(classifier.classify("Happy", 0.9), StressLevel::Low);
    }

    #[test]
    fn test_configured_threshold() {
        let config = PipelineConfig {
            stress_confidence_threshold: 0.95,
            ..Default::default()
        };
        let classifier = StressClassifier::from_config(&config);
        assert_eq!(classifier.classify("angry", 0.9), StressLevel::Medium);
    }
}
