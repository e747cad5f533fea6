pub mod analysis;
pub mod annotation;
pub mod pipeline;
pub mod shared;
pub mod video;
