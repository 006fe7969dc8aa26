use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Reasons a single image could not be analyzed.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The image could not be loaded or decoded.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Every sampled pixel was transparent or classified as background.
    #[error("no pixels left to analyze")]
    EmptyAnalysis,

    #[error("image size must be positive, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("image size ({width}x{height}) doesn't match the buffer length ({len})")]
    BufferSizeMismatch { width: u32, height: u32, len: usize },
}
