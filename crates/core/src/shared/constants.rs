pub const FACE_MESH_MODEL_NAME: &str = "face_mesh_with_iris.onnx";
pub const FACE_MESH_MODEL_URL: &str =
    "https://github.com/proctorlens/proctorlens/releases/download/v0.1.0/face_mesh_with_iris.onnx";

pub const COCO_MODEL_NAME: &str = "yolov8n.onnx";
pub const COCO_MODEL_URL: &str =
    "https://github.com/proctorlens/proctorlens/releases/download/v0.1.0/yolov8n.onnx";

/// "cell phone" in the COCO-80 label taxonomy the bundled detector is
/// trained on. This id is an external contract owned by that taxonomy:
/// swapping in a detector with a different label set requires remapping it.
pub const COCO_CLASS_CELL_PHONE: u32 = 67;

pub const DEFAULT_PHONE_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_FACE_CONFIDENCE: f64 = 0.5;

/// Number of points in the face mesh with iris refinement enabled
/// (468 mesh points + 5 per iris).
pub const LANDMARK_COUNT: usize = 478;

// Landmark indices below follow the face-mesh taxonomy: per-index semantic
// meaning is stable across frames and model versions.
pub const NOSE_TIP: usize = 1;
pub const CHIN: usize = 199;
pub const LEFT_EYE_OUTER: usize = 33;
pub const LEFT_EYE_INNER: usize = 133;
pub const RIGHT_EYE_INNER: usize = 362;
pub const RIGHT_EYE_OUTER: usize = 263;
pub const MOUTH_LEFT: usize = 61;
pub const MOUTH_RIGHT: usize = 291;
pub const LEFT_IRIS_CENTER: usize = 468;
pub const RIGHT_IRIS_CENTER: usize = 473;

/// The six canonical correspondences used for the head-pose solve.
pub const POSE_LANDMARK_INDICES: [usize; 6] = [
    LEFT_EYE_OUTER,
    RIGHT_EYE_OUTER,
    NOSE_TIP,
    MOUTH_LEFT,
    MOUTH_RIGHT,
    CHIN,
];

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
