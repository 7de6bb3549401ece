//! Recommendation generation
//!
//! Builds an ordered list of advisory messages. Blocks are evaluated in a
//! fixed order and accumulate; a single default message is returned only
//! when no block applies.

use crate::types::{Emotion, StressLevel};

const HIGH_STRESS: [&str; 3] = [
    "High stress level detected - consider taking a 10-15 minute break",
    "Practice deep breathing techniques (4-7-8 method)",
    "Talk to your manager about redistributing tasks",
];

const FATIGUE: [&str; 3] = [
    "Signs of fatigue detected - your body needs rest",
    "Try a brisk walk outdoors",
    "Check your sleep quality over the last few nights",
];

const NEGATIVE_EMOTION: [&str; 2] = [
    "Consider talking to our emotional support chatbot",
    "Reach out to the employee assistance program",
];

const POSITIVE_REINFORCEMENT: [&str; 2] = [
    "Excellent! Keep up your current wellness practices",
    "Share with your team what is working well for you",
];

const DEFAULT_ADVICE: &str = "Keep a healthy balance between personal and professional life";

/// Stateless recommendation engine
pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Recommendations for an emotion label, stress level and fatigue flag
    pub fn recommend(emotion: &str, stress_level: StressLevel, fatigue: bool) -> Vec<String> {
        let emotion = Emotion::from_label(emotion);
        let mut recommendations: Vec<String> = Vec::new();

        if stress_level == StressLevel::High {
            recommendations.extend(HIGH_STRESS.iter().map(|s| s.to_string()));
        }

        if fatigue {
            recommendations.extend(FATIGUE.iter().map(|s| s.to_string()));
        }

        if matches!(
            emotion,
            Some(Emotion::Sad) | Some(Emotion::Angry) | Some(Emotion::Fear)
        ) {
            recommendations.extend(NEGATIVE_EMOTION.iter().map(|s| s.to_string()));
        }

        if emotion == Some(Emotion::Happy) && stress_level == StressLevel::Low {
            recommendations.extend(POSITIVE_REINFORCEMENT.iter().map(|s| s.to_string()));
        }

        if recommendations.is_empty() {
            recommendations.push(DEFAULT_ADVICE.to_string());
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_negative_blocks_in_order() {
        let result = RecommendationEngine::recommend("sad", StressLevel::High, true);

        let mut expected = owned(&HIGH_STRESS);
        expected.extend(owned(&FATIGUE));
        expected.extend(owned(&NEGATIVE_EMOTION));

        assert_eq!(result.len(), 8);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_happy_low_stress() {
        let result = RecommendationEngine::recommend("happy", StressLevel::Low, false);
        assert_eq!(result, owned(&POSITIVE_REINFORCEMENT));
    }

    #[test]
    fn test_happy_medium_stress_gets_default() {
        let result = RecommendationEngine::recommend("happy", StressLevel::Medium, false);
        assert_eq!(result, owned(&[DEFAULT_ADVICE]));
    }

    #[test]
    fn test_neutral_default() {
        let result = RecommendationEngine::recommend("neutral", StressLevel::Low, false);
        assert_eq!(result, owned(&[DEFAULT_ADVICE]));
    }

    #[test]
    fn test_fatigue_only() {
        let result = RecommendationEngine::recommend("neutral", StressLevel::Medium, true);
        assert_eq!(result, owned(&FATIGUE));
    }

    #[test]
    fn test_angry_high_stress() {
        let result = RecommendationEngine::recommend("angry", StressLevel::High, false);
        let mut expected = owned(&HIGH_STRESS);
        expected.extend(owned(&NEGATIVE_EMOTION));
        assert_eq!(result, expected);
    }

    #[test]
    fn test_fear_without_stress_still_gets_support() {
        let result = RecommendationEngine::recommend("Fear", StressLevel::Medium, false);
        assert_eq!(result, owned(&NEGATIVE_EMOTION));
    }

    #[test]
    fn test_unknown_emotion_with_high_stress() {
        let result = RecommendationEngine::recommend("confused", StressLevel::High, false);
        assert_eq!(result, owned(&HIGH_STRESS));
    }
}
