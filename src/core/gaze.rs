//! Gaze and head-pose classification.
//!
//! Two estimators run on every non-blinking single-face frame:
//!
//! - **Iris**: where each iris sits inside its eye opening, normalized by the
//!   eye's half-width and half-height and averaged over both eyes.
//! - **Head pose**: where the nose tip sits between the cheeks and between
//!   forehead and chin, normalized by half the face width and height.
//!
//! Fusion gives the iris priority: it is the finer signal and moves before
//! the head does. Both estimators share one sign convention. A positive
//! horizontal offset (toward larger image `x`) is "Right" and a positive
//! vertical offset (toward larger image `y`) is "Down". Mirrored camera feeds
//! flip the horizontal label for both estimators at once.

use crate::config::{AxisThresholds, EngineConfig};
use crate::landmarks::types::{EyeLandmarks, FaceLandmarks};
use serde::{Serialize, Serializer};

/// Horizontal deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizontal {
    Left,
    Right,
}

impl Horizontal {
    fn flipped(self) -> Self {
        match self {
            Horizontal::Left => Horizontal::Right,
            Horizontal::Right => Horizontal::Left,
        }
    }
}

/// Vertical deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertical {
    Up,
    Down,
}

/// A composed direction such as "Right-Up". Both axes empty means centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Direction {
    pub horizontal: Option<Horizontal>,
    pub vertical: Option<Vertical>,
}

impl Direction {
    pub const CENTER: Direction = Direction {
        horizontal: None,
        vertical: None,
    };

    pub fn is_centered(&self) -> bool {
        self.horizontal.is_none() && self.vertical.is_none()
    }

    /// Classify normalized offsets against per-axis limits.
    fn from_offsets(x: f64, y: f64, limits: AxisThresholds, mirror: bool) -> Self {
        let horizontal = if x > limits.x {
            Some(Horizontal::Right)
        } else if x < -limits.x {
            Some(Horizontal::Left)
        } else {
            None
        };

        let vertical = if y < -limits.y {
            Some(Vertical::Up)
        } else if y > limits.y {
            Some(Vertical::Down)
        } else {
            None
        };

        Self {
            horizontal: if mirror {
                horizontal.map(Horizontal::flipped)
            } else {
                horizontal
            },
            vertical,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let h = self.horizontal.map(|h| match h {
            Horizontal::Left => "Left",
            Horizontal::Right => "Right",
        });
        let v = self.vertical.map(|v| match v {
            Vertical::Up => "Up",
            Vertical::Down => "Down",
        });

        match (h, v) {
            (Some(h), Some(v)) => write!(f, "{h}-{v}"),
            (Some(h), None) => f.write_str(h),
            (None, Some(v)) => f.write_str(v),
            (None, None) => f.write_str("Center"),
        }
    }
}

/// Fused attention zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Looking at the screen
    Screen,
    /// Iris deviation
    Eye(Direction),
    /// Head turned or tilted while the eyes read centered
    Head(Direction),
}

impl Zone {
    /// Alert text for a sustained deviation into this zone.
    pub fn alert_message(&self) -> Option<String> {
        match self {
            Zone::Screen => None,
            Zone::Eye(_) => Some(format!("👁️ {self}")),
            Zone::Head(_) => Some(format!("🔄 {self}")),
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Screen => f.write_str("Screen"),
            Zone::Eye(direction) => write!(f, "Eye→{direction}"),
            Zone::Head(direction) => write!(f, "Head→{direction}"),
        }
    }
}

impl Serialize for Zone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Output of one estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisReading {
    /// Normalized horizontal offset
    pub offset_x: f64,
    /// Normalized vertical offset
    pub offset_y: f64,
    pub direction: Direction,
}

impl AxisReading {
    const CENTERED: AxisReading = AxisReading {
        offset_x: 0.0,
        offset_y: 0.0,
        direction: Direction::CENTER,
    };

    pub fn outside_zone(&self) -> bool {
        !self.direction.is_centered()
    }
}

/// Both estimator readings and the fused zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeReading {
    pub iris: AxisReading,
    pub head: AxisReading,
    pub zone: Zone,
}

/// Iris-first gaze/head-pose fusion classifier.
#[derive(Debug, Clone)]
pub struct GazeClassifier {
    iris_limits: AxisThresholds,
    head_limits: AxisThresholds,
    min_eye_height: f64,
    mirror_horizontal: bool,
}

impl GazeClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            iris_limits: config.iris,
            head_limits: config.head_pose,
            min_eye_height: config.min_eye_height,
            mirror_horizontal: config.mirror_horizontal,
        }
    }

    /// Run both estimators and fuse them.
    pub fn classify(&self, face: &FaceLandmarks) -> GazeReading {
        let iris = self.iris(face);
        let head = self.head_pose(face);

        let zone = if iris.outside_zone() {
            Zone::Eye(iris.direction)
        } else if head.outside_zone() {
            Zone::Head(head.direction)
        } else {
            Zone::Screen
        };

        GazeReading { iris, head, zone }
    }

    /// Iris position relative to the eye openings.
    pub fn iris(&self, face: &FaceLandmarks) -> AxisReading {
        let (left, right) = (&face.left_eye, &face.right_eye);

        // Lids this close together are an extreme angle or a squint; the
        // iris point is not trustworthy.
        if left.height() < self.min_eye_height || right.height() < self.min_eye_height {
            return AxisReading::CENTERED;
        }

        let (left_x, left_y) = normalized_iris(left);
        let (right_x, right_y) = normalized_iris(right);
        let offset_x = (left_x + right_x) / 2.0;
        let offset_y = (left_y + right_y) / 2.0;

        AxisReading {
            offset_x,
            offset_y,
            direction: Direction::from_offsets(
                offset_x,
                offset_y,
                self.iris_limits,
                self.mirror_horizontal,
            ),
        }
    }

    /// Nose position relative to the face outline.
    pub fn head_pose(&self, face: &FaceLandmarks) -> AxisReading {
        let mid_x = (face.left_cheek.x + face.right_cheek.x) / 2.0;
        let face_width = (face.right_cheek.x - face.left_cheek.x).abs();
        let offset_x = centered_ratio(face.nose.x - mid_x, face_width / 2.0);

        let mid_y = (face.forehead.y + face.chin.y) / 2.0;
        let face_height = (face.chin.y - face.forehead.y).abs();
        let offset_y = centered_ratio(face.nose.y - mid_y, face_height / 2.0);

        AxisReading {
            offset_x,
            offset_y,
            direction: Direction::from_offsets(
                offset_x,
                offset_y,
                self.head_limits,
                self.mirror_horizontal,
            ),
        }
    }
}

fn normalized_iris(eye: &EyeLandmarks) -> (f64, f64) {
    let (cx, cy) = eye.center();
    (
        centered_ratio(eye.iris.x - cx, eye.width() / 2.0),
        centered_ratio(eye.iris.y - cy, eye.height() / 2.0),
    )
}

/// `delta / half_extent`, or 0 when the extent has collapsed.
fn centered_ratio(delta: f64, half_extent: f64) -> f64 {
    if half_extent > 0.0 {
        delta / half_extent
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::fixtures::FaceBuilder;
    use crate::landmarks::types::{index, LandmarkPoint};

    fn classifier() -> GazeClassifier {
        GazeClassifier::new(&EngineConfig::default())
    }

    fn read(builder: FaceBuilder) -> GazeReading {
        let face = FaceLandmarks::from_face(&builder.build()).unwrap();
        classifier().classify(&face)
    }

    #[test]
    fn test_neutral_face_on_screen() {
        let reading = read(FaceBuilder::neutral());
        assert_eq!(reading.zone, Zone::Screen);
        assert!(reading.iris.offset_x.abs() < 1e-9);
        assert!(reading.head.offset_y.abs() < 1e-9);
    }

    #[test]
    fn test_iris_offset_normalization() {
        let reading = read(FaceBuilder::neutral().iris_offset(0.5, 0.0));
        assert!((reading.iris.offset_x - 0.5).abs() < 1e-9);
        assert_eq!(reading.zone.to_string(), "Eye→Right");
    }

    #[test]
    fn test_iris_inside_limits_stays_on_screen() {
        let reading = read(FaceBuilder::neutral().iris_offset(-0.29, 0.34));
        assert_eq!(reading.zone, Zone::Screen);
    }

    #[test]
    fn test_composed_iris_direction() {
        let reading = read(FaceBuilder::neutral().iris_offset(-0.6, -0.5));
        assert_eq!(reading.zone.to_string(), "Eye→Left-Up");

        let reading = read(FaceBuilder::neutral().iris_offset(0.0, 0.5));
        assert_eq!(reading.zone.to_string(), "Eye→Down");
    }

    #[test]
    fn test_head_pose_when_eyes_centered() {
        let reading = read(FaceBuilder::neutral().head_offset(-0.3, 0.0));
        assert!((reading.head.offset_x + 0.3).abs() < 1e-9);
        assert_eq!(reading.zone.to_string(), "Head→Left");

        let reading = read(FaceBuilder::neutral().head_offset(0.0, 0.3));
        assert_eq!(reading.zone.to_string(), "Head→Down");
    }

    #[test]
    fn test_iris_takes_priority_over_head() {
        let reading = read(
            FaceBuilder::neutral()
                .iris_offset(0.0, -0.5)
                .head_offset(0.4, 0.0),
        );
        assert!(reading.head.outside_zone());
        assert_eq!(reading.zone.to_string(), "Eye→Up");
    }

    #[test]
    fn test_compressed_eye_reads_center() {
        // Lid gap 0.0018 is under the 0.003 floor.
        let reading = read(FaceBuilder::neutral().eye_aspect_ratio(0.03).iris_offset(0.9, 0.0));
        assert_eq!(reading.iris.direction, Direction::CENTER);
    }

    #[test]
    fn test_zero_face_width_gives_zero_offset() {
        let point = LandmarkPoint::new(0.5, 0.5, 0.0);
        let reading = read(
            FaceBuilder::neutral()
                .set(index::LEFT_CHEEK, point)
                .set(index::RIGHT_CHEEK, point)
                .head_offset(0.5, 0.0),
        );
        assert_eq!(reading.head.offset_x, 0.0);
        assert_eq!(reading.zone, Zone::Screen);
    }

    #[test]
    fn test_mirror_flips_both_estimators() {
        let config = EngineConfig {
            mirror_horizontal: true,
            ..EngineConfig::default()
        };
        let classifier = GazeClassifier::new(&config);

        let eye = FaceLandmarks::from_face(&FaceBuilder::neutral().iris_offset(0.5, 0.0).build())
            .unwrap();
        assert_eq!(classifier.classify(&eye).zone.to_string(), "Eye→Left");

        let head = FaceLandmarks::from_face(&FaceBuilder::neutral().head_offset(0.5, 0.0).build())
            .unwrap();
        assert_eq!(classifier.classify(&head).zone.to_string(), "Head→Left");
    }

    #[test]
    fn test_alert_messages() {
        let eye = Zone::Eye(Direction {
            horizontal: Some(Horizontal::Right),
            vertical: Some(Vertical::Up),
        });
        assert_eq!(eye.alert_message().as_deref(), Some("👁️ Eye→Right-Up"));
        assert_eq!(Zone::Screen.alert_message(), None);
        assert_eq!(
            serde_json::to_string(&Zone::Screen).unwrap(),
            "\"Screen\""
        );
    }
}
