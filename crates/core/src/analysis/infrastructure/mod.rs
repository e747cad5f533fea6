pub mod onnx_coco_detector;
pub mod onnx_face_mesh;
