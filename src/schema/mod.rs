//! Unified wellmind.detections.v1 schema
//!
//! This module defines the detector-agnostic input schema for raw face
//! detections and the adapter that normalizes them into evidence.

mod raw_face;
mod adapter;

pub use raw_face::*;
pub use adapter::*;
