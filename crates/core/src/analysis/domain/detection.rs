/// One detected object in frame-pixel coordinates.
///
/// `bbox` is `(x1, y1, x2, y2)` with the top-left corner first. Coordinates
/// may extend past the frame edges; drawing clips them.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: (i32, i32, i32, i32),
    pub confidence: f64,
    pub class_id: u32,
}

impl Detection {
    pub fn new(bbox: (i32, i32, i32, i32), confidence: f64, class_id: u32) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
        }
    }
}

/// Keeps detections of `target_class` at or above `min_confidence`,
/// preserving input order. Idempotent by construction.
pub fn filter_detections(
    detections: &[Detection],
    target_class: u32,
    min_confidence: f64,
) -> Vec<Detection> {
    detections
        .iter()
        .filter(|d| d.class_id == target_class && d.confidence >= min_confidence)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn phone(confidence: f64) -> Detection {
        Detection::new((10, 10, 50, 50), confidence, 67)
    }

    #[rstest]
    #[case(0.9, true)]
    #[case(0.8, true)] // threshold is inclusive
    #[case(0.79, false)]
    #[case(0.1, false)]
    fn test_confidence_threshold(#[case] confidence: f64, #[case] kept: bool) {
        let result = filter_detections(&[phone(confidence)], 67, 0.8);
        assert_eq!(result.len(), usize::from(kept));
    }

    #[test]
    fn test_other_classes_rejected() {
        let detections = vec![
            Detection::new((0, 0, 10, 10), 0.99, 0),  // person
            Detection::new((0, 0, 10, 10), 0.99, 63), // laptop
            phone(0.99),
        ];
        let result = filter_detections(&detections, 67, 0.8);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].class_id, 67);
    }

    #[test]
    fn test_preserves_input_order() {
        let detections = vec![
            Detection::new((0, 0, 10, 10), 0.85, 67),
            Detection::new((20, 20, 40, 40), 0.95, 67),
            Detection::new((50, 50, 70, 70), 0.81, 67),
        ];
        let result = filter_detections(&detections, 67, 0.8);
        assert_eq!(result, detections);
    }

    #[test]
    fn test_idempotent() {
        let detections = vec![phone(0.9), phone(0.5), Detection::new((0, 0, 5, 5), 0.9, 0)];
        let once = filter_detections(&detections, 67, 0.8);
        let twice = filter_detections(&once, 67, 0.8);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_detections(&[], 67, 0.8).is_empty());
    }
}
