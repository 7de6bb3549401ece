//! Pipeline configuration
//!
//! Thresholds used by the decision stages. Defaults reproduce the reference
//! rule set; a JSON document may override any subset of fields.

use serde::{Deserialize, Serialize};

use crate::error::VisionError;

/// Scale of a set of emotion scores.
///
/// Evidence always carries 0-1 scores; `Percent` exists for recorded
/// classifier output and for callers feeding raw percentages straight into
/// [`crate::WellnessScorer::with_scale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScale {
    /// Scores in 0-1
    #[default]
    Unit,
    /// Scores in 0-100
    Percent,
}

impl ScoreScale {
    /// Divisor bringing a score on this scale to 0-1
    pub fn divisor(&self) -> f64 {
        match self {
            ScoreScale::Unit => 1.0,
            ScoreScale::Percent => 100.0,
        }
    }
}

/// Tunable thresholds for the decision pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Below this detection confidence stress is forced to Medium
    pub stress_confidence_threshold: f64,
    /// Sad/neutral faces below this confidence count as a fatigue indicator
    pub fatigue_confidence_threshold: f64,
    /// Score variance below this counts as flat affect
    pub flat_affect_variance_threshold: f64,
    /// Sadness above this counts as residual sadness
    pub residual_sadness_threshold: f64,
    /// Wellness scores at or above this are Low stress/fatigue
    pub wellness_low_cutoff: f64,
    /// Wellness scores at or above this (and below the low cutoff) are Medium
    pub wellness_medium_cutoff: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stress_confidence_threshold: 0.6,
            fatigue_confidence_threshold: 0.7,
            flat_affect_variance_threshold: 0.1,
            residual_sadness_threshold: 0.2,
            wellness_low_cutoff: 75.0,
            wellness_medium_cutoff: 50.0,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON, validating the result
    pub fn from_json(json: &str) -> Result<Self, VisionError> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| VisionError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, VisionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that thresholds are in range and cutoffs are ordered
    pub fn validate(&self) -> Result<(), VisionError> {
        let unit_thresholds = [
            ("stress_confidence_threshold", self.stress_confidence_threshold),
            ("fatigue_confidence_threshold", self.fatigue_confidence_threshold),
            ("flat_affect_variance_threshold", self.flat_affect_variance_threshold),
            ("residual_sadness_threshold", self.residual_sadness_threshold),
        ];
        for (name, value) in unit_thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(VisionError::ConfigError(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if !(0.0..=100.0).contains(&self.wellness_medium_cutoff)
            || !(0.0..=100.0).contains(&self.wellness_low_cutoff)
        {
            return Err(VisionError::ConfigError(
                "wellness cutoffs must be within [0, 100]".to_string(),
            ));
        }
        if self.wellness_medium_cutoff > self.wellness_low_cutoff {
            return Err(VisionError::ConfigError(format!(
                "wellness_medium_cutoff ({}) exceeds wellness_low_cutoff ({})",
                self.wellness_medium_cutoff, self.wellness_low_cutoff
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(r#"{"stress_confidence_threshold": 0.5}"#).unwrap();
        assert_eq!(config.stress_confidence_threshold, 0.5);
        assert_eq!(config.fatigue_confidence_threshold, 0.7);
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig {
            fatigue_confidence_threshold: 0.55,
            wellness_low_cutoff: 80.0,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"wellness_low_cutoff\": 80.0"));
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let result = PipelineConfig::from_json(r#"{"residual_sadness_threshold": 1.5}"#);
        assert!(matches!(result, Err(VisionError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_inverted_cutoffs() {
        let result =
            PipelineConfig::from_json(r#"{"wellness_low_cutoff": 40, "wellness_medium_cutoff": 60}"#);
        assert!(matches!(result, Err(VisionError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        // Evidence is always 0-1, so a scale setting would have no effect
        let result = PipelineConfig::from_json(r#"{"score_scale": "percent"}"#);
        match result {
            Err(VisionError::ConfigError(message)) => assert!(message.contains("score_scale")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            PipelineConfig::from_json("not json"),
            Err(VisionError::ConfigError(_))
        ));
    }

    #[test]
    fn test_scale_divisor() {
        assert_eq!(ScoreScale::Unit.divisor(), 1.0);
        assert_eq!(ScoreScale::Percent.divisor(), 100.0);
    }
}
