//! Pipeline orchestration
//!
//! This module provides the public API for WellMind Vision. It selects the
//! face that drives a decision and sequences the decision stages:
//!
//! 1. Face selection - highest detection confidence wins
//! 2. StressClassifier / FatigueDetector - emotion-analysis path
//! 3. WellnessScorer - wellness-score path
//! 4. RecommendationEngine - advisory text for either path
//!
//! Everything here is a pure function of its inputs.

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::detector::{Capabilities, ImageInput};
use crate::error::VisionError;
use crate::fatigue::FatigueDetector;
use crate::geometry;
use crate::recommendations::RecommendationEngine;
use crate::stress::StressClassifier;
use crate::types::{
    Emotion, EmotionAnalysis, EmotionEvidence, EmotionScores, FaceEmotion, FaceLocation,
    FaceReport, SimpleMoodReport, StressLevel, WellnessReport,
};
use crate::wellness::WellnessScorer;

/// Mood reported when a face report contains no faces
pub const NO_FACES_MOOD: &str = "No faces detected";

/// Run the emotion-analysis path with default thresholds.
///
/// # Example
/// ```ignore
/// let evidence = EvidenceAdapter::record_to_evidence(&record)?;
/// let analysis = analyze_emotion(&evidence)?;
/// println!("{} / {}", analysis.dominant_emotion, analysis.stress_level);
/// ```
pub fn analyze_emotion(evidence: &[EmotionEvidence]) -> Result<EmotionAnalysis, VisionError> {
    DecisionPipeline::default().analyze_emotion(evidence)
}

/// Run the wellness-score path with default thresholds.
pub fn wellness_score(evidence: &[EmotionEvidence]) -> Result<WellnessReport, VisionError> {
    DecisionPipeline::default().wellness_score(evidence)
}

/// Summarize every detected face. Never fails; zero faces give an empty report.
pub fn detect_faces(evidence: &[EmotionEvidence]) -> FaceReport {
    DecisionPipeline::default().detect_faces(evidence)
}

/// Run the landmark-geometry path.
pub fn analyze_simple(evidence: &[EmotionEvidence]) -> Result<SimpleMoodReport, VisionError> {
    DecisionPipeline::default().analyze_simple(evidence)
}

/// Face with the highest detection confidence; the earliest face wins ties
pub fn select_primary_face(evidence: &[EmotionEvidence]) -> Option<&EmotionEvidence> {
    let mut faces = evidence.iter();
    let first = faces.next()?;
    Some(faces.fold(first, |best, face| {
        if face.detection_confidence > best.detection_confidence {
            face
        } else {
            best
        }
    }))
}

/// Decision stages bound to one configuration
#[derive(Debug, Clone, Copy)]
pub struct DecisionPipeline {
    stress: StressClassifier,
    fatigue: FatigueDetector,
    wellness: WellnessScorer,
}

impl Default for DecisionPipeline {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl DecisionPipeline {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            stress: StressClassifier::from_config(config),
            fatigue: FatigueDetector::from_config(config),
            wellness: WellnessScorer::from_config(config),
        }
    }

    pub fn analyze_emotion(
        &self,
        evidence: &[EmotionEvidence],
    ) -> Result<EmotionAnalysis, VisionError> {
        let face = select_primary_face(evidence).ok_or(VisionError::NoFaceDetected)?;
        let emotion = face.dominant_emotion.as_str();
        let confidence = face.detection_confidence;

        let stress_level = self.stress.classify(emotion, confidence);
        let fatigue_detected = self.fatigue.detect(emotion, confidence, &face.emotion_scores);
        let recommendations = RecommendationEngine::recommend(emotion, stress_level, fatigue_detected);

        debug!(
            face_id = face.face_id,
            emotion,
            %stress_level,
            fatigue_detected,
            "emotion analysis complete"
        );

        Ok(EmotionAnalysis {
            detected_faces: evidence.len(),
            face_id: face.face_id,
            dominant_emotion: face.dominant_emotion,
            emotion_scores: face.emotion_scores.clone(),
            stress_level,
            fatigue_detected,
            confidence,
            recommendations,
            emotion_source: face.emotion_source,
        })
    }

    /// Wellness path.
    ///
    /// Fallback scores are placeholders rather than observations, so a face
    /// without classifier output scores on its base weight alone.
    pub fn wellness_score(&self, evidence: &[EmotionEvidence]) -> Result<WellnessReport, VisionError> {
        let face = select_primary_face(evidence).ok_or(VisionError::NoFaceDetected)?;
        let emotion = face.dominant_emotion.as_str();

        let placeholder = EmotionScores::new();
        let scores = if face.emotion_source.is_fallback() {
            &placeholder
        } else {
            &face.emotion_scores
        };

        let assessment = self.wellness.score(emotion, scores);
        let fatigue = assessment.fatigue_level == StressLevel::High;
        let recommendations =
            RecommendationEngine::recommend(emotion, assessment.stress_level, fatigue);

        debug!(
            face_id = face.face_id,
            emotion,
            wellness_score = assessment.wellness_score,
            "wellness scoring complete"
        );

        Ok(WellnessReport {
            wellness_score: assessment.wellness_score,
            emotion: face.dominant_emotion,
            stress_level: assessment.stress_level,
            fatigue_level: assessment.fatigue_level,
            recommendations,
            confidence: face.detection_confidence,
        })
    }

    pub fn detect_faces(&self, evidence: &[EmotionEvidence]) -> FaceReport {
        if evidence.is_empty() {
            return FaceReport {
                faces_detected: 0,
                face_locations: Vec::new(),
                emotions_per_face: Vec::new(),
                overall_mood: NO_FACES_MOOD.to_string(),
            };
        }

        let face_locations = evidence
            .iter()
            .map(|face| FaceLocation {
                face_id: face.face_id,
                x: face.bounding_box.x,
                y: face.bounding_box.y,
                width: face.bounding_box.width,
                height: face.bounding_box.height,
                confidence: face.detection_confidence,
                keypoints: face.landmarks,
            })
            .collect();

        let emotions_per_face = evidence
            .iter()
            .map(|face| FaceEmotion {
                face_id: face.face_id,
                emotion: face.dominant_emotion,
                emotion_score: face.emotion_scores.get(face.dominant_emotion),
                confidence: face.detection_confidence,
            })
            .collect();

        FaceReport {
            faces_detected: evidence.len(),
            face_locations,
            emotions_per_face,
            overall_mood: overall_mood(evidence).as_str().to_string(),
        }
    }

    pub fn analyze_simple(
        &self,
        evidence: &[EmotionEvidence],
    ) -> Result<SimpleMoodReport, VisionError> {
        let face = select_primary_face(evidence).ok_or(VisionError::NoFaceDetected)?;
        let confidence = face.detection_confidence;

        let (mood, stress_level) = geometry::estimate_mood(&face.landmarks, confidence);
        let recommendations = geometry::basic_recommendations(mood, stress_level);

        Ok(SimpleMoodReport {
            detected_faces: evidence.len(),
            estimated_mood: mood,
            confidence,
            stress_level,
            recommendations,
        })
    }
}

/// Most frequent dominant emotion; ties go to vocabulary order
fn overall_mood(evidence: &[EmotionEvidence]) -> Emotion {
    let mut counts = [0usize; Emotion::ALL.len()];
    for face in evidence {
        counts[face.dominant_emotion as usize] += 1;
    }

    let mut best = Emotion::Neutral;
    let mut best_count = 0;
    for (emotion, count) in Emotion::ALL.into_iter().zip(counts) {
        if count > best_count {
            best = emotion;
            best_count = count;
        }
    }
    best
}

/// Processor combining injected model capabilities with the decision pipeline.
///
/// Holds no mutable state; one instance can serve concurrent requests.
pub struct VisionProcessor {
    capabilities: Capabilities,
    pipeline: DecisionPipeline,
}

impl VisionProcessor {
    /// Create a processor with default thresholds
    pub fn new(capabilities: Capabilities) -> Self {
        Self::build(capabilities, DecisionPipeline::default())
    }

    /// Create a processor with validated custom thresholds
    pub fn with_config(
        capabilities: Capabilities,
        config: &PipelineConfig,
    ) -> Result<Self, VisionError> {
        config.validate()?;
        Ok(Self::build(capabilities, DecisionPipeline::from_config(config)))
    }

    fn build(capabilities: Capabilities, pipeline: DecisionPipeline) -> Self {
        let models = capabilities.model_info();
        info!(
            face_detection = %models.face_detection,
            emotion_recognition = %models.emotion_recognition,
            classifier_available = capabilities.has_emotion_classifier(),
            "vision processor ready"
        );
        Self {
            capabilities,
            pipeline,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn pipeline(&self) -> &DecisionPipeline {
        &self.pipeline
    }

    /// Detect faces and build evidence for an image
    pub fn evidence(&self, image: &ImageInput) -> Result<Vec<EmotionEvidence>, VisionError> {
        self.capabilities.build_evidence(image)
    }

    pub fn analyze_emotion_image(&self, image: &ImageInput) -> Result<EmotionAnalysis, VisionError> {
        let evidence = self.evidence(image)?;
        self.pipeline.analyze_emotion(&evidence)
    }

    pub fn wellness_score_image(&self, image: &ImageInput) -> Result<WellnessReport, VisionError> {
        let evidence = self.evidence(image)?;
        self.pipeline.wellness_score(&evidence)
    }

    pub fn detect_faces_image(&self, image: &ImageInput) -> Result<FaceReport, VisionError> {
        let evidence = self.evidence(image)?;
        Ok(self.pipeline.detect_faces(&evidence))
    }

    pub fn analyze_simple_image(
        &self,
        image: &ImageInput,
    ) -> Result<SimpleMoodReport, VisionError> {
        let evidence = self.evidence(image)?;
        self.pipeline.analyze_simple(&evidence)
    }
}
