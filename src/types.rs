//! Core types for the WellMind Vision pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized per-face evidence, the classification enums, and the
//! deterministic results produced by the decision stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed seven-label emotion vocabulary.
///
/// Declaration order is the vocabulary order; it drives map iteration and
/// tie-breaking when picking a dominant emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Fear,
    Surprise,
    Disgust,
    Neutral,
}

impl Emotion {
    /// All labels in vocabulary order
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Disgust,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
            Emotion::Disgust => "disgust",
            Emotion::Neutral => "neutral",
        }
    }

    /// Case-insensitive label lookup. Returns `None` for labels outside the vocabulary.
    pub fn from_label(label: &str) -> Option<Emotion> {
        let label = label.trim();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-tier level shared by stress and fatigue classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

impl StressLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "Low",
            StressLevel::Medium => "Medium",
            StressLevel::High => "High",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-emotion scores on the canonical 0-1 scale.
///
/// Scores are independent; they are not required to sum to 1 and any label
/// may be absent. Absent labels read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionScores(BTreeMap<Emotion, f64>);

impl EmotionScores {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build from `(label, score)` pairs; later duplicates overwrite earlier ones
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Emotion, f64)>,
    {
        Self(pairs.into_iter().collect())
    }

    /// Score for a label, 0 when absent
    pub fn get(&self, emotion: Emotion) -> f64 {
        self.0.get(&emotion).copied().unwrap_or(0.0)
    }

    pub fn insert(&mut self, emotion: Emotion, score: f64) {
        self.0.insert(emotion, score);
    }

    pub fn contains(&self, emotion: Emotion) -> bool {
        self.0.contains_key(&emotion)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate present entries in vocabulary order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        self.0.iter().map(|(e, s)| (*e, *s))
    }

    /// Highest-scoring label; ties go to the label earliest in vocabulary order
    pub fn dominant(&self) -> Option<Emotion> {
        let mut best: Option<(Emotion, f64)> = None;
        for (emotion, score) in self.iter() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((emotion, score)),
            }
        }
        best.map(|(emotion, _)| emotion)
    }

    /// Population variance of the present values, `None` when empty
    pub fn variance(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        let n = self.0.len() as f64;
        let mean = self.0.values().sum::<f64>() / n;
        let variance = self.0.values().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(variance)
    }
}

/// Where a face's emotion scores came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionSource {
    /// Scores produced by the emotion classifier
    #[default]
    Classifier,
    /// No classifier configured; reduced fallback scores
    ClassifierUnavailable,
    /// Classifier failed for this face; full-vocabulary fallback scores
    ClassifierFailed,
}

impl EmotionSource {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, EmotionSource::Classifier)
    }
}

/// Face bounding box in pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Pixel coordinate, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point(pub i32, pub i32);

impl Point {
    pub fn x(&self) -> i32 {
        self.0
    }

    pub fn y(&self) -> i32 {
        self.1
    }
}

/// The five facial landmarks reported for every detected face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmarks {
    pub left_eye: Point,
    pub right_eye: Point,
    pub nose: Point,
    pub mouth_left: Point,
    pub mouth_right: Point,
}

/// Normalized per-face record consumed by the decision pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionEvidence {
    /// Zero-based index within one detection batch
    pub face_id: usize,
    pub bounding_box: BoundingBox,
    pub landmarks: Landmarks,
    /// Face detection confidence (0-1)
    pub detection_confidence: f64,
    /// Emotion scores (0-1)
    pub emotion_scores: EmotionScores,
    pub dominant_emotion: Emotion,
    #[serde(default)]
    pub emotion_source: EmotionSource,
}

impl EmotionEvidence {
    /// Build evidence, deriving the dominant emotion from the scores.
    ///
    /// An empty score mapping yields `neutral`.
    pub fn new(
        face_id: usize,
        bounding_box: BoundingBox,
        landmarks: Landmarks,
        detection_confidence: f64,
        emotion_scores: EmotionScores,
    ) -> Self {
        let dominant_emotion = emotion_scores.dominant().unwrap_or(Emotion::Neutral);
        Self {
            face_id,
            bounding_box,
            landmarks,
            detection_confidence,
            emotion_scores,
            dominant_emotion,
            emotion_source: EmotionSource::Classifier,
        }
    }

    /// Mark where the scores came from
    pub fn with_source(mut self, source: EmotionSource) -> Self {
        self.emotion_source = source;
        self
    }
}

/// Result of the emotion-analysis path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    pub detected_faces: usize,
    /// Face that drove the decision
    pub face_id: usize,
    pub dominant_emotion: Emotion,
    pub emotion_scores: EmotionScores,
    pub stress_level: StressLevel,
    pub fatigue_detected: bool,
    /// Detection confidence of the selected face
    pub confidence: f64,
    pub recommendations: Vec<String>,
    pub emotion_source: EmotionSource,
}

/// Score and score-derived tiers from the wellness scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellnessAssessment {
    /// 0-100, rounded to two decimals
    pub wellness_score: f64,
    pub stress_level: StressLevel,
    pub fatigue_level: StressLevel,
}

/// Result of the wellness-score path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessReport {
    pub wellness_score: f64,
    pub emotion: Emotion,
    pub stress_level: StressLevel,
    pub fatigue_level: StressLevel,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

/// Location of one detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceLocation {
    pub face_id: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
    pub keypoints: Landmarks,
}

/// Dominant emotion of one detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceEmotion {
    pub face_id: usize,
    pub emotion: Emotion,
    /// Score of the dominant emotion (0-1)
    pub emotion_score: f64,
    /// Detection confidence (0-1)
    pub confidence: f64,
}

/// Result of the multi-face detection path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceReport {
    pub faces_detected: usize,
    pub face_locations: Vec<FaceLocation>,
    pub emotions_per_face: Vec<FaceEmotion>,
    pub overall_mood: String,
}

/// Coarse mood from landmark geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Neutral,
    Negative,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Neutral => "neutral",
            Mood::Negative => "negative",
        }
    }
}

/// Result of the landmark-geometry path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleMoodReport {
    pub detected_faces: usize,
    pub estimated_mood: Mood,
    pub confidence: f64,
    pub stress_level: StressLevel,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_from_label_is_case_insensitive() {
        assert_eq!(Emotion::from_label("ANGRY"), Some(Emotion::Angry));
        assert_eq!(Emotion::from_label(" Happy "), Some(Emotion::Happy));
        assert_eq!(Emotion::from_label("contempt"), None);
        assert_eq!(Emotion::from_label(""), None);
    }

    #[test]
    fn test_dominant_picks_maximum() {
        let scores = EmotionScores::from_pairs([
            (Emotion::Happy, 0.1),
            (Emotion::Angry, 0.7),
            (Emotion::Neutral, 0.2),
        ]);
        assert_eq!(scores.dominant(), Some(Emotion::Angry));
    }

    #[test]
    fn test_dominant_tie_goes_to_vocabulary_order() {
        let scores = EmotionScores::from_pairs([
            (Emotion::Neutral, 0.4),
            (Emotion::Surprise, 0.4),
            (Emotion::Sad, 0.4),
        ]);
        assert_eq!(scores.dominant(), Some(Emotion::Sad));
        assert_eq!(EmotionScores::new().dominant(), None);
    }

    #[test]
    fn test_missing_score_reads_as_zero() {
        let scores = EmotionScores::from_pairs([(Emotion::Neutral, 0.8)]);
        assert_eq!(scores.get(Emotion::Sad), 0.0);
        assert!(!scores.contains(Emotion::Sad));
    }

    #[test]
    fn test_population_variance() {
        let scores = EmotionScores::from_pairs([(Emotion::Happy, 0.2), (Emotion::Neutral, 0.8)]);
        assert!((scores.variance().unwrap() - 0.09).abs() < 1e-12);
        assert_eq!(EmotionScores::new().variance(), None);
    }

    #[test]
    fn test_scores_serialize_as_label_map() {
        let scores = EmotionScores::from_pairs([(Emotion::Neutral, 0.8), (Emotion::Happy, 0.2)]);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"happy":0.2,"neutral":0.8}"#);

        let back: EmotionScores = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scores);
    }

    #[test]
    fn test_evidence_with_empty_scores_is_neutral() {
        let point = Point(0, 0);
        let evidence = EmotionEvidence::new(
            0,
            BoundingBox { x: 0, y: 0, width: 10, height: 10 },
            Landmarks {
                left_eye: point,
                right_eye: point,
                nose: point,
                mouth_left: point,
                mouth_right: point,
            },
            0.9,
            EmotionScores::new(),
        );
        assert_eq!(evidence.dominant_emotion, Emotion::Neutral);
    }

    #[test]
    fn test_stress_level_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&StressLevel::High).unwrap(), r#""High""#);
        assert_eq!(StressLevel::Medium.to_string(), "Medium");
    }
}
