//! # HyperSpec Core
//!
//! Core types and I/O for the HyperSpec hyperspectral classification toolkit.
//!
//! This crate provides:
//! - `Mask`: class-label store with a validated 2D map / 3D binary layer-stack model
//! - `HsImage`: hyperspectral image cube (rows x cols x bands)
//! - A file-format codec registry for mask I/O (image formats, `.npy`, `.h5`, `.mat`)
//!
//! The patch/sampling machinery that turns these types into training data
//! lives in `hyperspec-data`.

pub mod error;
pub mod image;
pub mod io;
pub mod mask;

pub use crate::error::{Error, Result};
pub use crate::image::HsImage;
pub use crate::mask::Mask;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::HsImage;
    pub use crate::io::MaskArray;
    pub use crate::mask::Mask;
}
