//! Error types for raw image construction.

use thiserror::Error;

use super::PixelFormat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("Buffer of {actual} bytes does not hold a {width}x{height} {format:?} image ({expected} bytes)")]
    BufferSizeMismatch {
        width: usize,
        height: usize,
        format: PixelFormat,
        expected: usize,
        actual: usize,
    },

    #[error("Image dimensions {width}x{height} overflow the addressable size")]
    DimensionOverflow { width: usize, height: usize },
}
