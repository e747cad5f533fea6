/// A point in image-pixel coordinates (not normalized).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A landmark with a depth proxy: x/y in pixels, z in the same numeric
/// range as x/y (the landmark provider scales it when mapping to the frame).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn xy(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_axis_aligned() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(100.0, 0.0);
        assert_relative_eq!(a.distance_to(&b), 100.0);
    }

    #[test]
    fn test_distance_diagonal() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert_relative_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Point2D::new(-2.0, 7.0);
        let b = Point2D::new(5.0, -1.0);
        assert_relative_eq!(a.distance_to(&b), b.distance_to(&a));
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let a = Point2D::new(42.0, 17.0);
        assert_relative_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_xy_drops_depth() {
        let p = Point3D::new(1.0, 2.0, 3.0);
        assert_eq!(p.xy(), Point2D::new(1.0, 2.0));
    }
}
