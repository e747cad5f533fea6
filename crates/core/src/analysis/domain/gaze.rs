use crate::analysis::domain::error::AnalysisError;
use crate::shared::geometry::Point2D;

const LEFT_RATIO: f64 = 0.35;
const RIGHT_RATIO: f64 = 0.65;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GazeLabel {
    Left,
    Center,
    Right,
}

impl GazeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GazeLabel::Left => "Left",
            GazeLabel::Center => "Center",
            GazeLabel::Right => "Right",
        }
    }
}

/// Classifies gaze from the iris position between the two eye corners.
///
/// `corner_a` is the corner nearer the left edge of the image. The ratio is
/// the iris distance from `corner_a` over the corner-to-corner distance;
/// below 0.35 reads as Left, above 0.65 as Right. The ratio is invariant
/// under uniform scaling, so eye size and camera distance don't matter.
pub fn classify_gaze(
    corner_a: Point2D,
    corner_b: Point2D,
    iris: Point2D,
) -> Result<GazeLabel, AnalysisError> {
    let eye_width = corner_a.distance_to(&corner_b);
    if eye_width == 0.0 {
        return Err(AnalysisError::InvalidGeometry(
            "eye corners are coincident".to_string(),
        ));
    }
    let ratio = corner_a.distance_to(&iris) / eye_width;
    if ratio < LEFT_RATIO {
        Ok(GazeLabel::Left)
    } else if ratio > RIGHT_RATIO {
        Ok(GazeLabel::Right)
    } else {
        Ok(GazeLabel::Center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn horizontal_eye(iris_ratio: f64) -> (Point2D, Point2D, Point2D) {
        let a = Point2D::new(100.0, 200.0);
        let b = Point2D::new(160.0, 200.0);
        let iris = Point2D::new(100.0 + 60.0 * iris_ratio, 200.0);
        (a, b, iris)
    }

    #[rstest]
    #[case(0.2, GazeLabel::Left)]
    #[case(0.34, GazeLabel::Left)]
    #[case(0.35, GazeLabel::Center)] // boundary is inclusive of Center
    #[case(0.5, GazeLabel::Center)]
    #[case(0.65, GazeLabel::Center)]
    #[case(0.66, GazeLabel::Right)]
    #[case(0.8, GazeLabel::Right)]
    fn test_ratio_bands(#[case] ratio: f64, #[case] expected: GazeLabel) {
        let (a, b, iris) = horizontal_eye(ratio);
        assert_eq!(classify_gaze(a, b, iris).unwrap(), expected);
    }

    #[test]
    fn test_scale_invariant() {
        for scale in [0.5, 1.0, 4.0, 100.0] {
            let a = Point2D::new(0.0, 0.0);
            let b = Point2D::new(60.0 * scale, 0.0);
            let iris = Point2D::new(12.0 * scale, 0.0); // ratio 0.2
            assert_eq!(classify_gaze(a, b, iris).unwrap(), GazeLabel::Left);
        }
    }

    #[test]
    fn test_vertical_offset_ignored_by_distance_ratio() {
        // A slightly tilted eye still classifies by relative distances
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(60.0, 4.0);
        let iris = Point2D::new(30.0, 2.0);
        assert_eq!(classify_gaze(a, b, iris).unwrap(), GazeLabel::Center);
    }

    #[test]
    fn test_coincident_corners_error() {
        let a = Point2D::new(50.0, 50.0);
        let iris = Point2D::new(55.0, 50.0);
        let result = classify_gaze(a, a, iris);
        assert!(matches!(result, Err(AnalysisError::InvalidGeometry(_))));
    }

    #[test]
    fn test_label_strings() {
        assert_eq!(GazeLabel::Left.as_str(), "Left");
        assert_eq!(GazeLabel::Center.as_str(), "Center");
        assert_eq!(GazeLabel::Right.as_str(), "Right");
    }
}
