//! Landmark-geometry mood heuristic
//!
//! Rough mood estimate from the slope of the line between the mouth corners,
//! for use when no emotion classifier is available. Image y grows downward,
//! so raised corners on the right produce a negative slope.

use crate::types::{Landmarks, Mood, StressLevel};

/// Slopes within this band read as a flat mouth
const FLAT_MOUTH_SLOPE: f64 = 0.05;

/// Below this detection confidence stress is forced to Medium
const MIN_CONFIDENCE: f64 = 0.7;

/// Guards against vertical mouth lines
const SLOPE_EPSILON: f64 = 1e-6;

/// Slope of the mouth-corner line
pub fn mouth_slope(landmarks: &Landmarks) -> f64 {
    let left = landmarks.mouth_left;
    let right = landmarks.mouth_right;
    // Differences in f64: saturated keypoints overflow i32 subtraction
    let dy = right.y() as f64 - left.y() as f64;
    let dx = right.x() as f64 - left.x() as f64;
    dy / (dx + SLOPE_EPSILON)
}

/// Estimate mood and stress from landmarks and detection confidence
pub fn estimate_mood(landmarks: &Landmarks, confidence: f64) -> (Mood, StressLevel) {
    let slope = mouth_slope(landmarks);

    let (mood, stress) = if slope.abs() < FLAT_MOUTH_SLOPE {
        (Mood::Neutral, StressLevel::Medium)
    } else if slope < -FLAT_MOUTH_SLOPE {
        (Mood::Positive, StressLevel::Low)
    } else {
        (Mood::Negative, StressLevel::High)
    };

    if confidence < MIN_CONFIDENCE {
        return (mood, StressLevel::Medium);
    }

    (mood, stress)
}

/// Short recommendation list for a geometry-based estimate
pub fn basic_recommendations(mood: Mood, stress: StressLevel) -> Vec<String> {
    let mut recommendations = match mood {
        Mood::Positive => vec![
            "Positive mood detected - keep it up!".to_string(),
            "Share your positive energy with the team".to_string(),
        ],
        Mood::Negative => vec![
            "Consider taking a 10 minute break".to_string(),
            "Practice breathing exercises".to_string(),
        ],
        Mood::Neutral => vec!["Keep your balance and look after yourself".to_string()],
    };

    if stress == StressLevel::High {
        recommendations.push("Talk to your manager about your workload".to_string());
        recommendations.push("Check your sleep quality".to_string());
    }

    recommendations
}
