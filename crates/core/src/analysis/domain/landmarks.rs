use crate::shared::constants::{
    LEFT_EYE_INNER, LEFT_EYE_OUTER, LEFT_IRIS_CENTER, POSE_LANDMARK_INDICES, RIGHT_EYE_INNER,
    RIGHT_EYE_OUTER, RIGHT_IRIS_CENTER,
};
use crate::shared::geometry::{Point2D, Point3D};

/// One face's landmarks in frame-pixel coordinates, indexed by the face-mesh
/// taxonomy. Accessors return `None` when the mesh is too short for the
/// index they need, so a provider without iris refinement degrades to
/// pose-and-box annotation instead of failing.
#[derive(Clone, Debug)]
pub struct FaceLandmarks {
    points: Vec<Point3D>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point3D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<Point3D> {
        self.points.get(index).copied()
    }

    /// Axis-aligned box over every landmark, rounded outward to pixels.
    pub fn bounding_box(&self) -> Option<(i32, i32, i32, i32)> {
        if self.points.is_empty() {
            return None;
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some((
            min_x.floor() as i32,
            min_y.floor() as i32,
            max_x.ceil() as i32,
            max_y.ceil() as i32,
        ))
    }

    /// The six canonical 2D/3D pairs for the head-pose solve, in taxonomy
    /// order. `None` if any of the six is missing.
    pub fn pose_correspondences(&self) -> Option<(Vec<Point2D>, Vec<Point3D>)> {
        let mut image_points = Vec::with_capacity(POSE_LANDMARK_INDICES.len());
        let mut model_points = Vec::with_capacity(POSE_LANDMARK_INDICES.len());
        for &index in &POSE_LANDMARK_INDICES {
            let p = self.point(index)?;
            image_points.push(p.xy());
            model_points.push(p);
        }
        Some((image_points, model_points))
    }

    /// Left-eye corners as (screen-left, screen-right).
    pub fn left_eye_corners(&self) -> Option<(Point2D, Point2D)> {
        Some((
            self.point(LEFT_EYE_OUTER)?.xy(),
            self.point(LEFT_EYE_INNER)?.xy(),
        ))
    }

    /// Right-eye corners as (screen-left, screen-right).
    pub fn right_eye_corners(&self) -> Option<(Point2D, Point2D)> {
        Some((
            self.point(RIGHT_EYE_INNER)?.xy(),
            self.point(RIGHT_EYE_OUTER)?.xy(),
        ))
    }

    pub fn left_iris(&self) -> Option<Point2D> {
        Some(self.point(LEFT_IRIS_CENTER)?.xy())
    }

    pub fn right_iris(&self) -> Option<Point2D> {
        Some(self.point(RIGHT_IRIS_CENTER)?.xy())
    }
}
