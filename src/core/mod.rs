//! Core signal processing for the integrity engine.
//!
//! This module contains:
//! - Face presence classification
//! - Blink detection from eye aspect ratio
//! - Gaze and head-pose fusion into an attention zone
//! - The hysteresis counter, trust score and alert throttle
//! - Session report building for export

pub mod blink;
pub mod gaze;
pub mod hysteresis;
pub mod presence;
pub mod report;
pub mod score;
pub mod throttle;

// Re-export commonly used types
pub use blink::{detect_blink, eye_aspect_ratio, BlinkReading};
pub use gaze::{AxisReading, Direction, GazeClassifier, GazeReading, Horizontal, Vertical, Zone};
pub use hysteresis::{HysteresisCounter, HysteresisStep};
pub use presence::{classify_presence, Presence, PresenceReading};
pub use report::{
    ReportBuilder, SessionReport, ViolationCounts, PRODUCER_NAME, REPORT_VERSION,
};
pub use score::{ScoreTier, TrustScore};
pub use throttle::AlertThrottler;
