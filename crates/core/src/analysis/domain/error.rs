use thiserror::Error;

/// Errors from the pure analysis layer. Inference adapters report their own
/// failures as `Box<dyn Error>` at the trait seam; these cover the geometry
/// that runs after landmarks are in hand.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("head pose solve failed: {0}")]
    PoseSolve(String),
}
