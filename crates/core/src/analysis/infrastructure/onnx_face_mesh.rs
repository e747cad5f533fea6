/// Face mesh landmark provider using ONNX Runtime via `ort`.
///
/// Runs a MediaPipe-style face mesh model (468 points, or 478 with iris
/// refinement) over the whole frame and maps the normalized landmarks back
/// to frame-pixel coordinates. The model's presence score gates the result:
/// below the threshold the frame reports no face rather than garbage
/// landmarks.
use std::path::Path;

use crate::analysis::domain::landmark_provider::LandmarkProvider;
use crate::analysis::domain::landmarks::FaceLandmarks;
use crate::shared::frame::Frame;
use crate::shared::geometry::Point3D;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 192;

/// Face mesh provider backed by an ONNX Runtime session.
pub struct OnnxFaceMesh {
    session: ort::session::Session,
    input_size: u32,
    min_confidence: f64,
}

impl OnnxFaceMesh {
    /// Load a face mesh ONNX model and prepare for inference.
    pub fn new(model_path: &Path, min_confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        // Try to read input size from model metadata (NCHW: [1, 3, H, W])
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
            min_confidence,
        })
    }
}

impl LandmarkProvider for OnnxFaceMesh {
    fn landmarks(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<FaceLandmarks>, Box<dyn std::error::Error>> {
        // 1. Preprocess: squash-resize + normalize → NCHW float32
        let input_tensor = resize_normalize(frame, self.input_size);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Face mesh models emit two tensors: the landmark block (N*3 floats)
        // and a single presence logit. Output order varies by export, so
        // pick by size.
        if outputs.len() < 2 {
            return Err(format!(
                "face mesh model expected 2 outputs, got {}",
                outputs.len()
            )
            .into());
        }
        let first = outputs[0].try_extract_array::<f32>()?;
        let second = outputs[1].try_extract_array::<f32>()?;
        let (mesh, presence) = if first.len() >= second.len() {
            (first, second)
        } else {
            (second, first)
        };

        let presence = presence
            .as_slice()
            .and_then(|s| s.first().copied())
            .ok_or("Cannot read face presence score")?;
        if f64::from(sigmoid(presence)) < self.min_confidence {
            return Ok(None);
        }

        let raw = mesh.as_slice().ok_or("Cannot get landmark slice")?;
        if raw.is_empty() || raw.len() % 3 != 0 {
            return Err(format!("Unexpected landmark tensor length: {}", raw.len()).into());
        }

        Ok(Some(landmarks_from_raw(
            raw,
            frame.width(),
            frame.height(),
            self.input_size,
        )))
    }
}

/// Squash-resize a frame to `target_size` × `target_size` (no letterbox;
/// the landmark model was trained on stretched crops) and normalize to
/// [0, 1] NCHW.
fn resize_normalize(frame: &Frame, target_size: u32) -> ndarray::Array4<f32> {
    let target = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, target, target));

    let src = frame.as_ndarray(); // [H, W, C] u8
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..target {
        let src_y = (y * src_h / target).min(src_h - 1);
        for x in 0..target {
            let src_x = (x * src_w / target).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

/// Maps raw model output (x, y, z triples in input-tensor coordinates) to
/// frame-pixel landmarks. Depth is scaled with the same factor as x, keeping
/// the mesh's aspect in all three axes.
fn landmarks_from_raw(raw: &[f32], frame_w: u32, frame_h: u32, input_size: u32) -> FaceLandmarks {
    let sx = frame_w as f64 / input_size as f64;
    let sy = frame_h as f64 / input_size as f64;
    let points = raw
        .chunks_exact(3)
        .map(|p| Point3D::new(p[0] as f64 * sx, p[1] as f64 * sy, p[2] as f64 * sx))
        .collect();
    FaceLandmarks::new(points)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
