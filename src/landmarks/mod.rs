//! Landmark input types for the Integrity Signal Engine.
//!
//! Frames arrive from an external face-mesh detector as already-normalized
//! point arrays. This module defines those types and the anatomical index
//! convention the classifiers rely on.

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod types;

// Re-export commonly used types
pub use types::{index, EyeLandmarks, Face, FaceLandmarks, Frame, LandmarkError, LandmarkPoint};
