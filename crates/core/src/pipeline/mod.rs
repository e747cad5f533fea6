pub mod annotate_image_use_case;
pub mod annotate_media_use_case;
pub mod frame_stream;
