//! Error types for HyperSpec

use thiserror::Error;

/// Main error type for HyperSpec operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid mask: {0}")]
    InvalidMask(String),

    #[error("invalid image dimensions: {rows}x{cols}x{bands}")]
    InvalidDimensions {
        rows: usize,
        cols: usize,
        bands: usize,
    },

    #[error("layer index out of bounds: {index} in mask of {layers} layers")]
    LayerOutOfBounds { index: usize, layers: usize },

    #[error("shape mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    ShapeMismatch {
        er: usize,
        ec: usize,
        ar: usize,
        ac: usize,
    },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("a dataset key is required for .{0} files")]
    MissingKey(&'static str),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("unsupported sampling mode: {0}")]
    UnsupportedMode(String),

    #[error("sampling error: {0}")]
    Sampling(String),

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("model error: {0}")]
    Model(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for HyperSpec operations
pub type Result<T> = std::result::Result<T, Error>;
