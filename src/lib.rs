//! WellMind Vision - Emotion to wellness decision pipeline
//!
//! Turns per-face emotion evidence produced by face detection and emotion
//! classification models into stress, fatigue and wellness assessments with
//! advisory recommendations. The pipeline is deterministic: face selection →
//! stress classification / fatigue detection or wellness scoring →
//! recommendations → response encoding.
//!
//! ## Modules
//!
//! - **Decision stages**: `stress`, `fatigue`, `wellness`, `recommendations`, `geometry`
//! - **Orchestration**: `pipeline` (pure functions and `VisionProcessor`)
//! - **Model boundary**: `detector` (injected face detector and emotion classifier)
//! - **Recorded input**: `schema` (`wellmind.detections.v1` records)

pub mod config;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod fatigue;
pub mod geometry;
pub mod pipeline;
pub mod recommendations;
pub mod schema;
pub mod stress;
pub mod types;
pub mod wellness;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{PipelineConfig, ScoreScale};
pub use detector::{Capabilities, EmotionClassifier, FaceDetector, ImageInput, ModelInfo};
pub use encoder::ResponseEncoder;
pub use error::VisionError;
pub use fatigue::FatigueDetector;
pub use pipeline::{
    analyze_emotion, analyze_simple, detect_faces, wellness_score, DecisionPipeline,
    VisionProcessor,
};
pub use recommendations::RecommendationEngine;
pub use stress::StressClassifier;
pub use wellness::WellnessScorer;

// Schema exports
pub use schema::{DetectionRecord, EvidenceAdapter, RawFace, SCHEMA_VERSION};

/// Version embedded in every response envelope
pub const WELLMIND_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for response envelopes
pub const PRODUCER_NAME: &str = "wellmind-vision";
