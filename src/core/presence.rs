//! Face presence classification.

use crate::landmarks::types::{FaceLandmarks, Frame, LandmarkError};
use serde::{Deserialize, Serialize};

/// How many usable faces a frame holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    None,
    Single,
    Multiple(usize),
}

/// Presence classification plus whatever the later stages need.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceReading {
    /// No face, or a single face that could not be read
    None { defect: Option<LandmarkError> },
    Single(FaceLandmarks),
    Multiple(usize),
}

impl PresenceReading {
    pub fn presence(&self) -> Presence {
        match self {
            PresenceReading::None { .. } => Presence::None,
            PresenceReading::Single(_) => Presence::Single,
            PresenceReading::Multiple(count) => Presence::Multiple(*count),
        }
    }

    /// Whether a face was present but too malformed to evaluate.
    pub fn is_malformed(&self) -> bool {
        matches!(self, PresenceReading::None { defect: Some(_) })
    }
}

/// Classify a frame by face count.
///
/// A lone face missing required landmarks is reported as no face at all.
/// Multiple faces are counted as-is; their landmarks are never read.
pub fn classify_presence(frame: &Frame) -> PresenceReading {
    match frame.faces.as_slice() {
        [] => PresenceReading::None { defect: None },
        [face] => match FaceLandmarks::from_face(face) {
            Ok(landmarks) => PresenceReading::Single(landmarks),
            Err(defect) => PresenceReading::None {
                defect: Some(defect),
            },
        },
        faces => PresenceReading::Multiple(faces.len()),
    }
}
