/// COCO object detector (YOLOv8 family) using ONNX Runtime via `ort`.
///
/// Emits every class above a low score floor; the annotation layer filters
/// for the classes it cares about.
use std::path::Path;

use crate::analysis::domain::detection::Detection;
use crate::analysis::domain::object_detector::ObjectDetector;
use crate::shared::frame::Frame;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Score floor applied before NMS. Callers filter to their own threshold.
pub const SCORE_FLOOR: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// COCO detector backed by an ONNX Runtime session.
pub struct OnnxCocoDetector {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxCocoDetector {
    /// Load a YOLOv8 COCO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting
    /// NCHW). Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxCocoDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let letterbox = Letterbox::fit(frame, self.input_size);
        let input_value = ort::value::Tensor::from_array(letterbox.tensor(frame))?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("detection model produced no outputs".into());
        }
        let raw = outputs[0].try_extract_array::<f32>()?;

        let mut candidates = parse_rows(&raw, &letterbox)?;
        let kept = nms(&mut candidates, NMS_IOU_THRESH);

        Ok(kept
            .into_iter()
            .map(|d| {
                Detection::new(
                    (
                        d.x1.round() as i32,
                        d.y1.round() as i32,
                        d.x2.round() as i32,
                        d.y2.round() as i32,
                    ),
                    d.confidence,
                    d.class_id,
                )
            })
            .collect())
    }
}

/// Decodes the model's output tensor into scored boxes in frame coordinates.
///
/// Rows are `[cx, cy, w, h, class_0 .. class_79]`. Depending on the export
/// the tensor is `[1, rows, features]` or feature-major `[1, features, rows]`;
/// both layouts are handled.
fn parse_rows(
    raw: &ndarray::ArrayViewD<'_, f32>,
    letterbox: &Letterbox,
) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
    let shape = raw.shape();
    if shape.len() != 3 {
        return Err(format!("Unexpected detector output shape: {shape:?}").into());
    }
    let feature_major = shape[1] < shape[2];
    let (rows, features) = if feature_major {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if features < 5 {
        return Err(format!("Detector row too short: {features} features").into());
    }

    let flat = raw.as_slice().ok_or("Cannot get tensor slice")?;
    let at = |row: usize, feat: usize| {
        if feature_major {
            flat[feat * rows + row]
        } else {
            flat[row * features + feat]
        }
    };

    let mut candidates = Vec::new();
    for row in 0..rows {
        let mut class_id = 0usize;
        let mut score = f32::NEG_INFINITY;
        for feat in 4..features {
            let s = at(row, feat);
            if s > score {
                score = s;
                class_id = feat - 4;
            }
        }
        if (score as f64) < SCORE_FLOOR {
            continue;
        }

        let (cx, cy) = (at(row, 0) as f64, at(row, 1) as f64);
        let (w, h) = (at(row, 2) as f64, at(row, 3) as f64);
        let (x1, y1) = letterbox.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_frame(cx + w / 2.0, cy + h / 2.0);

        candidates.push(RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence: score as f64,
            class_id: class_id as u32,
        });
    }
    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Aspect-preserving mapping between a frame and the square model input.
struct Letterbox {
    size: u32,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
    scaled_w: u32,
    scaled_h: u32,
}

impl Letterbox {
    fn fit(frame: &Frame, size: u32) -> Self {
        let scale = (size as f64 / frame.width() as f64).min(size as f64 / frame.height() as f64);
        let scaled_w = (frame.width() as f64 * scale).round() as u32;
        let scaled_h = (frame.height() as f64 * scale).round() as u32;
        Self {
            size,
            scale,
            pad_x: (size - scaled_w) / 2,
            pad_y: (size - scaled_h) / 2,
            scaled_w,
            scaled_h,
        }
    }

    /// Normalized NCHW tensor: the frame scaled into the center, padding
    /// filled with the gray value YOLO models are trained with.
    fn tensor(&self, frame: &Frame) -> ndarray::Array4<f32> {
        let side = self.size as usize;
        let mut out = ndarray::Array4::<f32>::from_elem((1, 3, side, side), 114.0 / 255.0);

        let pixels = frame.as_ndarray();
        let last_col = frame.width() as usize - 1;
        let last_row = frame.height() as usize - 1;

        for dy in 0..self.scaled_h as usize {
            let sy = ((dy as f64 / self.scale) as usize).min(last_row);
            let oy = self.pad_y as usize + dy;
            for dx in 0..self.scaled_w as usize {
                let sx = ((dx as f64 / self.scale) as usize).min(last_col);
                let ox = self.pad_x as usize + dx;
                for c in 0..3 {
                    out[[0, c, oy, ox]] = pixels[[sy, sx, c]] as f32 / 255.0;
                }
            }
        }
        out
    }

    /// Maps a point in model-input coordinates back to frame coordinates.
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    class_id: u32,
}

impl RawDetection {
    fn area(&self) -> f64 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }
}

fn iou(a: &RawDetection, b: &RawDetection) -> f64 {
    let overlap_w = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let overlap_h = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let overlap = overlap_w * overlap_h;
    if overlap == 0.0 {
        return 0.0;
    }
    overlap / (a.area() + b.area() - overlap)
}

/// Greedy NMS, suppressing only within a class. A phone overlapping a laptop
/// keeps both.
fn nms(candidates: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates.iter() {
        let duplicate = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && iou(k, candidate) > iou_thresh);
        if !duplicate {
            kept.push(candidate.clone());
        }
    }
    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn det(bbox: [f64; 4], confidence: f64, class_id: u32) -> RawDetection {
        RawDetection {
            x1: bbox[0],
            y1: bbox[1],
            x2: bbox[2],
            y2: bbox[3],
            confidence,
            class_id,
        }
    }

    fn solid(width: u32, height: u32, value: u8) -> Frame {
        Frame::new(
            vec![value; (width * height * 3) as usize],
            width,
            height,
            3,
            0,
        )
    }

    #[test]
    fn test_letterbox_fit_wide_frame() {
        // 320x160 into 640: scale 2.0, scaled 640x320, vertical padding only
        let lb = Letterbox::fit(&solid(320, 160, 0), 640);
        assert!((lb.scale - 2.0).abs() < 1e-9);
        assert_eq!((lb.scaled_w, lb.scaled_h), (640, 320));
        assert_eq!((lb.pad_x, lb.pad_y), (0, 160));
    }

    #[test]
    fn test_letterbox_fit_square_frame_has_no_padding() {
        let lb = Letterbox::fit(&solid(80, 80, 0), 640);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 0));
        assert!((lb.scale - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_letterbox_tensor_content_and_padding() {
        let frame = solid(100, 50, 255);
        let lb = Letterbox::fit(&frame, 640);
        let tensor = lb.tensor(&frame);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        // Inside the scaled image everything is white
        let inside = tensor[[0, 0, lb.pad_y as usize + 1, 1]];
        assert!((inside - 1.0).abs() < 0.01);
        // Above the image region only YOLO gray padding
        let padded = tensor[[0, 0, 0, 0]];
        assert!((padded - 114.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_letterbox_to_frame_inverts_scaling() {
        let lb = Letterbox::fit(&solid(320, 160, 0), 640);
        // Model-input point (0, 160) is the frame origin
        assert_eq!(lb.to_frame(0.0, 160.0), (0.0, 0.0));
        // Model-input center maps to frame center
        assert_eq!(lb.to_frame(320.0, 320.0), (160.0, 80.0));
    }

    #[test]
    fn test_nms_suppresses_same_class_overlap() {
        let mut candidates = vec![
            det([0.0, 0.0, 100.0, 100.0], 0.9, 67),
            det([5.0, 5.0, 105.0, 105.0], 0.8, 67),
        ];
        let kept = nms(&mut candidates, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nms_keeps_overlapping_different_classes() {
        let mut candidates = vec![
            det([0.0, 0.0, 100.0, 100.0], 0.9, 67),
            det([5.0, 5.0, 105.0, 105.0], 0.8, 63),
        ];
        assert_eq!(nms(&mut candidates, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_keeps_distant_boxes() {
        let mut candidates = vec![
            det([0.0, 0.0, 50.0, 50.0], 0.9, 67),
            det([200.0, 200.0, 250.0, 250.0], 0.8, 67),
        ];
        assert_eq!(nms(&mut candidates, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(&mut [], 0.3).is_empty());
    }

    #[test]
    fn test_nms_highest_confidence_survives() {
        let mut candidates = vec![
            det([0.0, 0.0, 100.0, 100.0], 0.5, 67),
            det([2.0, 2.0, 102.0, 102.0], 0.9, 67),
        ];
        let kept = nms(&mut candidates, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = det([0.0, 0.0, 10.0, 10.0], 1.0, 0);
        let b = det([20.0, 20.0, 30.0, 30.0], 1.0, 0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_iou_identical_is_one() {
        let a = det([0.0, 0.0, 10.0, 10.0], 1.0, 0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_iou_half_overlap() {
        // Second box covers the right half of the first
        let a = det([0.0, 0.0, 10.0, 10.0], 1.0, 0);
        let b = det([5.0, 0.0, 15.0, 10.0], 1.0, 0);
        // intersection 50, union 150
        assert!((iou(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rows_row_major_layout() {
        // 2 rows, 6 features (4 bbox + 2 classes), square frame so no padding
        let lb = Letterbox::fit(&solid(640, 640, 0), 640);
        let data = vec![
            // row 0: centered 100x100 box, class 1 wins at 0.9
            320.0, 320.0, 100.0, 100.0, 0.1, 0.9, //
            // row 1: below the score floor
            100.0, 100.0, 50.0, 50.0, 0.05, 0.1,
        ];
        let raw = ndarray::Array::from_shape_vec((1, 2, 6), data).unwrap().into_dyn();
        let parsed = parse_rows(&raw.view(), &lb).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].class_id, 1);
        assert!((parsed[0].x1 - 270.0).abs() < 1e-9);
        assert!((parsed[0].y2 - 370.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rows_feature_major_layout() {
        // Same detection transposed to [1, features, rows]
        let lb = Letterbox::fit(&solid(640, 640, 0), 640);
        let data = vec![
            320.0, 100.0, // cx
            320.0, 100.0, // cy
            100.0, 50.0, // w
            100.0, 50.0, // h
            0.1, 0.05, // class 0
            0.9, 0.1, // class 1
        ];
        let raw = ndarray::Array::from_shape_vec((1, 6, 2), data).unwrap().into_dyn();
        let parsed = parse_rows(&raw.view(), &lb).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].class_id, 1);
        assert!((parsed[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rows_rejects_bad_shape() {
        let lb = Letterbox::fit(&solid(640, 640, 0), 640);
        let raw = ndarray::Array::from_shape_vec((2, 6), vec![0.0; 12]).unwrap().into_dyn();
        assert!(parse_rows(&raw.view(), &lb).is_err());
    }
}
