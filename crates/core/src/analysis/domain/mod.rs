pub mod detection;
pub mod error;
pub mod gaze;
pub mod head_pose;
pub mod landmark_provider;
pub mod landmarks;
pub mod object_detector;
