//! Synthetic faces for tests and demos.
//!
//! The neutral face looks straight at the camera with open eyes. Offsets are
//! expressed in the same normalized units the classifiers compute, so a test
//! can ask for "iris at +0.5 of the eye half-width" directly.

use crate::landmarks::types::{index, Face, LandmarkPoint};

/// Number of points in a refined face mesh.
pub const FACE_MESH_POINTS: usize = 478;

const LEFT_EYE_CENTER: (f64, f64) = (0.43, 0.40);
const RIGHT_EYE_CENTER: (f64, f64) = (0.57, 0.40);
const EYE_HALF_WIDTH: f64 = 0.03;
const EYE_HALF_HEIGHT: f64 = 0.01;
const FACE_HALF_WIDTH: f64 = 0.15;
const FACE_HALF_HEIGHT: f64 = 0.20;

/// Builder for synthetic faces.
#[derive(Debug, Clone)]
pub struct FaceBuilder {
    points: Vec<LandmarkPoint>,
}

impl FaceBuilder {
    /// A centered face with open eyes and irises in the middle of each eye.
    pub fn neutral() -> Self {
        let mut points = vec![LandmarkPoint::new(0.5, 0.5, 0.0); FACE_MESH_POINTS];

        let mut put = |i: usize, x: f64, y: f64| points[i] = LandmarkPoint::new(x, y, 0.0);

        put(index::NOSE_TIP, 0.5, 0.5);
        put(index::FOREHEAD, 0.5, 0.5 - FACE_HALF_HEIGHT);
        put(index::CHIN, 0.5, 0.5 + FACE_HALF_HEIGHT);
        put(index::LEFT_CHEEK, 0.5 - FACE_HALF_WIDTH, 0.5);
        put(index::RIGHT_CHEEK, 0.5 + FACE_HALF_WIDTH, 0.5);

        let (lx, ly) = LEFT_EYE_CENTER;
        put(index::LEFT_EYE_OUTER, lx - EYE_HALF_WIDTH, ly);
        put(index::LEFT_EYE_INNER, lx + EYE_HALF_WIDTH, ly);
        put(index::LEFT_EYE_UPPER, lx, ly - EYE_HALF_HEIGHT);
        put(index::LEFT_EYE_LOWER, lx, ly + EYE_HALF_HEIGHT);
        put(index::LEFT_IRIS, lx, ly);

        let (rx, ry) = RIGHT_EYE_CENTER;
        put(index::RIGHT_EYE_INNER, rx - EYE_HALF_WIDTH, ry);
        put(index::RIGHT_EYE_OUTER, rx + EYE_HALF_WIDTH, ry);
        put(index::RIGHT_EYE_UPPER, rx, ry - EYE_HALF_HEIGHT);
        put(index::RIGHT_EYE_LOWER, rx, ry + EYE_HALF_HEIGHT);
        put(index::RIGHT_IRIS, rx, ry);

        Self { points }
    }

    /// Move both irises by a fraction of the eye half-width/half-height.
    pub fn iris_offset(mut self, norm_x: f64, norm_y: f64) -> Self {
        for (iris, (cx, cy)) in [
            (index::LEFT_IRIS, LEFT_EYE_CENTER),
            (index::RIGHT_IRIS, RIGHT_EYE_CENTER),
        ] {
            self.points[iris] = LandmarkPoint::new(
                cx + norm_x * EYE_HALF_WIDTH,
                cy + norm_y * EYE_HALF_HEIGHT,
                0.0,
            );
        }
        self
    }

    /// Move the nose tip by a fraction of the face half-width/half-height.
    pub fn head_offset(mut self, norm_x: f64, norm_y: f64) -> Self {
        self.points[index::NOSE_TIP] = LandmarkPoint::new(
            0.5 + norm_x * FACE_HALF_WIDTH,
            0.5 + norm_y * FACE_HALF_HEIGHT,
            0.0,
        );
        self
    }

    /// Set both eyes' lid gap as a fraction of the eye width (the EAR).
    pub fn eye_aspect_ratio(mut self, ear: f64) -> Self {
        let half_gap = ear * EYE_HALF_WIDTH;
        for (upper, lower, (_, cy)) in [
            (index::LEFT_EYE_UPPER, index::LEFT_EYE_LOWER, LEFT_EYE_CENTER),
            (index::RIGHT_EYE_UPPER, index::RIGHT_EYE_LOWER, RIGHT_EYE_CENTER),
        ] {
            self.points[upper].y = cy - half_gap;
            self.points[lower].y = cy + half_gap;
        }
        self
    }

    /// Nearly shut lids, well under the default blink threshold.
    pub fn eyes_closed(self) -> Self {
        self.eye_aspect_ratio(0.02)
    }

    pub fn set(mut self, i: usize, point: LandmarkPoint) -> Self {
        if let Some(slot) = self.points.get_mut(i) {
            *slot = point;
        }
        self
    }

    /// Drop every point from `len` onwards, simulating a detector without
    /// iris refinement or a corrupted payload.
    pub fn truncated(mut self, len: usize) -> Self {
        self.points.truncate(len);
        self
    }

    pub fn build(self) -> Face {
        Face::new(self.points)
    }
}
