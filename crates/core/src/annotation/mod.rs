pub mod draw;
pub mod frame_annotator;
