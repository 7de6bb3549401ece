//! Fatigue detection
//!
//! Three independent heuristics each contribute one indicator; fatigue is
//! reported when at least two fire.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::types::{Emotion, EmotionScores};

/// Minimum number of indicators for a positive detection
const MIN_INDICATORS: u32 = 2;

/// Which fatigue indicators fired for one face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FatigueIndicators {
    /// Sad or neutral face detected with low confidence
    pub low_confidence_low_affect: bool,
    /// Emotion scores are all similar
    pub flat_affect: bool,
    /// Sadness present even if not dominant
    pub residual_sadness: bool,
}

impl FatigueIndicators {
    pub fn count(&self) -> u32 {
        [
            self.low_confidence_low_affect,
            self.flat_affect,
            self.residual_sadness,
        ]
        .into_iter()
        .filter(|fired| *fired)
        .count() as u32
    }

    pub fn is_fatigued(&self) -> bool {
        self.count() >= MIN_INDICATORS
    }
}

/// Indicator-count fatigue detector
#[derive(Debug, Clone, Copy)]
pub struct FatigueDetector {
    confidence_threshold: f64,
    variance_threshold: f64,
    sadness_threshold: f64,
}

impl Default for FatigueDetector {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl FatigueDetector {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            confidence_threshold: config.fatigue_confidence_threshold,
            variance_threshold: config.flat_affect_variance_threshold,
            sadness_threshold: config.residual_sadness_threshold,
        }
    }

    /// Evaluate each indicator separately
    pub fn indicators(
        &self,
        dominant_emotion: &str,
        confidence: f64,
        scores: &EmotionScores,
    ) -> FatigueIndicators {
        let low_affect = matches!(
            Emotion::from_label(dominant_emotion),
            Some(Emotion::Sad) | Some(Emotion::Neutral)
        );

        FatigueIndicators {
            low_confidence_low_affect: low_affect && confidence < self.confidence_threshold,
            // Empty mappings have no variance and never count as flat
            flat_affect: scores
                .variance()
                .is_some_and(|variance| variance < self.variance_threshold),
            residual_sadness: scores.get(Emotion::Sad) > self.sadness_threshold,
        }
    }

    /// Whether the face shows fatigue
    pub fn detect(&self, dominant_emotion: &str, confidence: f64, scores: &EmotionScores) -> bool {
        self.indicators(dominant_emotion, confidence, scores)
            .is_fatigued()
    }
}
