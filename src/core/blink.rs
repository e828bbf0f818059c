//! Blink detection from the eye aspect ratio.

use crate::landmarks::types::{EyeLandmarks, FaceLandmarks};
use serde::{Deserialize, Serialize};

/// Eye-aspect-ratio reading for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkReading {
    pub left_ear: f64,
    pub right_ear: f64,
    pub avg_ear: f64,
    pub is_blinking: bool,
}

/// Lid gap over corner distance. A zero-width eye reads as fully open.
pub fn eye_aspect_ratio(eye: &EyeLandmarks) -> f64 {
    let width = eye.width();
    if width > 0.0 {
        eye.height() / width
    } else {
        1.0
    }
}

/// Average both eyes and compare against `threshold`.
pub fn detect_blink(face: &FaceLandmarks, threshold: f64) -> BlinkReading {
    let left_ear = eye_aspect_ratio(&face.left_eye);
    let right_ear = eye_aspect_ratio(&face.right_eye);
    let avg_ear = (left_ear + right_ear) / 2.0;

    BlinkReading {
        left_ear,
        right_ear,
        avg_ear,
        is_blinking: avg_ear < threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::fixtures::FaceBuilder;
    use crate::landmarks::types::{index, LandmarkPoint};

    fn landmarks(builder: FaceBuilder) -> FaceLandmarks {
        FaceLandmarks::from_face(&builder.build()).unwrap()
    }

    #[test]
    fn test_open_eyes_not_blinking() {
        let reading = detect_blink(&landmarks(FaceBuilder::neutral()), 0.08);
        assert!((reading.avg_ear - 1.0 / 3.0).abs() < 1e-9);
        assert!(!reading.is_blinking);
    }

    #[test]
    fn test_closed_eyes_blinking() {
        let reading = detect_blink(&landmarks(FaceBuilder::neutral().eyes_closed()), 0.08);
        assert!((reading.left_ear - reading.right_ear).abs() < 1e-9);
        assert!(reading.is_blinking);
    }

    #[test]
    fn test_ear_at_threshold_is_open() {
        let reading = detect_blink(
            &landmarks(FaceBuilder::neutral().eye_aspect_ratio(0.1)),
            0.1 - 1e-6,
        );
        assert!(!reading.is_blinking);
    }

    #[test]
    fn test_zero_width_eye_counts_as_open() {
        let collapsed = LandmarkPoint::new(0.43, 0.40, 0.0);
        let face = FaceBuilder::neutral()
            .eyes_closed()
            .set(index::LEFT_EYE_OUTER, collapsed)
            .set(index::LEFT_EYE_INNER, collapsed);
        let reading = detect_blink(&landmarks(face), 0.08);

        assert_eq!(reading.left_ear, 1.0);
        // (1.0 + 0.02) / 2 is well above the threshold
        assert!(!reading.is_blinking);
    }
}
