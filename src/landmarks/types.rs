//! Landmark frame types.
//!
//! Coordinates are normalized to the capture frame: `x` and `y` lie in `[0, 1]`,
//! `z` is a relative depth. Nothing here knows about pixels or cameras.

use serde::{Deserialize, Serialize};

/// Face-mesh landmark indices used by the engine.
pub mod index {
    pub const NOSE_TIP: usize = 1;
    pub const FOREHEAD: usize = 10;

    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_LOWER: usize = 145;
    pub const LEFT_EYE_UPPER: usize = 159;

    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;
    pub const CHIN: usize = 152;

    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_LOWER: usize = 374;
    pub const RIGHT_EYE_UPPER: usize = 386;

    pub const LEFT_IRIS: usize = 468;
    pub const RIGHT_IRIS: usize = 473;

    /// Minimum number of points a face must carry (iris refinement included).
    pub const MIN_POINTS: usize = 474;

    /// Every index the classifiers read.
    pub const REQUIRED: [usize; 15] = [
        NOSE_TIP,
        FOREHEAD,
        LEFT_EYE_OUTER,
        LEFT_EYE_INNER,
        LEFT_EYE_LOWER,
        LEFT_EYE_UPPER,
        LEFT_CHEEK,
        RIGHT_CHEEK,
        CHIN,
        RIGHT_EYE_OUTER,
        RIGHT_EYE_INNER,
        RIGHT_EYE_LOWER,
        RIGHT_EYE_UPPER,
        LEFT_IRIS,
        RIGHT_IRIS,
    ];
}

/// A single normalized landmark.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    /// Relative depth; detectors that only report 2D points may omit it
    #[serde(default)]
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Reasons a face cannot be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum LandmarkError {
    /// The face has fewer points than the index convention requires
    MissingLandmark { index: usize, len: usize },
    /// A required landmark holds NaN or infinity
    NonFinite { index: usize },
}

impl std::fmt::Display for LandmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LandmarkError::MissingLandmark { index, len } => {
                write!(f, "landmark {index} missing (face has {len} points)")
            }
            LandmarkError::NonFinite { index } => {
                write!(f, "landmark {index} has a non-finite coordinate")
            }
        }
    }
}

impl std::error::Error for LandmarkError {}

/// One detected face: a positional point list in face-mesh order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Face {
    points: Vec<LandmarkPoint>,
}

impl Face {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }

    /// Check that every landmark the engine reads is present and finite.
    pub fn validate(&self) -> Result<(), LandmarkError> {
        for &i in &index::REQUIRED {
            self.required(i)?;
        }
        Ok(())
    }

    fn required(&self, i: usize) -> Result<LandmarkPoint, LandmarkError> {
        let point = self.points.get(i).ok_or(LandmarkError::MissingLandmark {
            index: i,
            len: self.points.len(),
        })?;
        if !point.is_finite() {
            return Err(LandmarkError::NonFinite { index: i });
        }
        Ok(*point)
    }
}

/// The landmarks of one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeLandmarks {
    pub outer: LandmarkPoint,
    pub inner: LandmarkPoint,
    pub upper_lid: LandmarkPoint,
    pub lower_lid: LandmarkPoint,
    pub iris: LandmarkPoint,
}

impl EyeLandmarks {
    /// Horizontal corner-to-corner distance.
    pub fn width(&self) -> f64 {
        (self.outer.x - self.inner.x).abs()
    }

    /// Vertical lid-to-lid distance.
    pub fn height(&self) -> f64 {
        (self.upper_lid.y - self.lower_lid.y).abs()
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.outer.x + self.inner.x) / 2.0,
            (self.upper_lid.y + self.lower_lid.y) / 2.0,
        )
    }
}

/// Named view over the landmarks of a validated face.
///
/// Classifiers work on this instead of raw indices, so once a face has been
/// converted no lookup can fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceLandmarks {
    pub nose: LandmarkPoint,
    pub forehead: LandmarkPoint,
    pub chin: LandmarkPoint,
    pub left_cheek: LandmarkPoint,
    pub right_cheek: LandmarkPoint,
    pub left_eye: EyeLandmarks,
    pub right_eye: EyeLandmarks,
}

impl FaceLandmarks {
    pub fn from_face(face: &Face) -> Result<Self, LandmarkError> {
        face.validate()?;

        let eye = |outer, inner, upper, lower, iris| -> Result<EyeLandmarks, LandmarkError> {
            Ok(EyeLandmarks {
                outer: face.required(outer)?,
                inner: face.required(inner)?,
                upper_lid: face.required(upper)?,
                lower_lid: face.required(lower)?,
                iris: face.required(iris)?,
            })
        };

        Ok(Self {
            nose: face.required(index::NOSE_TIP)?,
            forehead: face.required(index::FOREHEAD)?,
            chin: face.required(index::CHIN)?,
            left_cheek: face.required(index::LEFT_CHEEK)?,
            right_cheek: face.required(index::RIGHT_CHEEK)?,
            left_eye: eye(
                index::LEFT_EYE_OUTER,
                index::LEFT_EYE_INNER,
                index::LEFT_EYE_UPPER,
                index::LEFT_EYE_LOWER,
                index::LEFT_IRIS,
            )?,
            right_eye: eye(
                index::RIGHT_EYE_OUTER,
                index::RIGHT_EYE_INNER,
                index::RIGHT_EYE_UPPER,
                index::RIGHT_EYE_LOWER,
                index::RIGHT_IRIS,
            )?,
        })
    }
}

/// All faces reported by the detector for one capture instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub faces: Vec<Face>,
}

impl Frame {
    pub fn new(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    /// A frame in which the detector found nobody.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(face: Face) -> Self {
        Self { faces: vec![face] }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}
