//! Wellness scoring
//!
//! Computes a 0-100 wellness score from the dominant emotion's base weight,
//! adjusted by the share of positive and negative emotion, then buckets the
//! score into stress and fatigue tiers.
//!
//! The tiers here are derived from the score alone. They are independent of
//! [`crate::stress`] and [`crate::fatigue`] and may disagree with them for the
//! same face.

use crate::config::{PipelineConfig, ScoreScale};
use crate::types::{Emotion, EmotionScores, StressLevel, WellnessAssessment};

/// Base score for labels outside the vocabulary
const UNKNOWN_BASE_SCORE: f64 = 50.0;

/// Weight of the negative-emotion ratio
const NEGATIVE_WEIGHT: f64 = 0.3;

/// Weight of the positive-emotion ratio
const POSITIVE_WEIGHT: f64 = 0.2;

const MAX_SCORE: f64 = 100.0;

/// Wellness scorer with configurable tier cutoffs and input scale
#[derive(Debug, Clone, Copy)]
pub struct WellnessScorer {
    scale: ScoreScale,
    low_cutoff: f64,
    medium_cutoff: f64,
}

impl Default for WellnessScorer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl WellnessScorer {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            scale: ScoreScale::Unit,
            low_cutoff: config.wellness_low_cutoff,
            medium_cutoff: config.wellness_medium_cutoff,
        }
    }

    /// Scorer expecting scores on the given scale, default cutoffs
    pub fn with_scale(scale: ScoreScale) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    pub fn scale(&self) -> ScoreScale {
        self.scale
    }

    /// Score a face.
    ///
    /// `scores` must be on this scorer's [`ScoreScale`]; evidence scores are 0-1.
    pub fn score(&self, dominant_emotion: &str, scores: &EmotionScores) -> WellnessAssessment {
        let base = base_score(Emotion::from_label(dominant_emotion));
        let divisor = self.scale.divisor();

        let positive_ratio = (scores.get(Emotion::Happy) + scores.get(Emotion::Surprise)) / divisor;
        let negative_ratio = (scores.get(Emotion::Sad)
            + scores.get(Emotion::Angry)
            + scores.get(Emotion::Fear))
            / divisor;

        let raw = base * (1.0 - negative_ratio * NEGATIVE_WEIGHT + positive_ratio * POSITIVE_WEIGHT);
        let wellness_score = round2(raw.clamp(0.0, MAX_SCORE));

        let (stress_level, fatigue_level) = self.tiers(wellness_score);

        WellnessAssessment {
            wellness_score,
            stress_level,
            fatigue_level,
        }
    }

    /// Stress and fatigue tiers for a final wellness score
    pub fn tiers(&self, wellness_score: f64) -> (StressLevel, StressLevel) {
        let level = if wellness_score >= self.low_cutoff {
            StressLevel::Low
        } else if wellness_score >= self.medium_cutoff {
            StressLevel::Medium
        } else {
            StressLevel::High
        };
        (level, level)
    }
}

fn base_score(emotion: Option<Emotion>) -> f64 {
    match emotion {
        Some(Emotion::Happy) => 100.0,
        Some(Emotion::Surprise) => 85.0,
        Some(Emotion::Neutral) => 70.0,
        Some(Emotion::Disgust) => 40.0,
        Some(Emotion::Sad) => 30.0,
        Some(Emotion::Fear) => 25.0,
        Some(Emotion::Angry) => 20.0,
        None => UNKNOWN_BASE_SCORE,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
