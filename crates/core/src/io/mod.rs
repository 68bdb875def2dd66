//! Mask file I/O
//!
//! File formats are handled through a registry of [`MaskCodec`]
//! implementations, dispatched on the file extension. Adding a format
//! means adding a codec, not growing a central conditional.
//!
//! The `.h5`/`.mat` codec needs a system HDF5 library and lives behind
//! the `hdf5` cargo feature; the image and `.npy` codecs are always
//! available.

mod image;
mod npy;

#[cfg(feature = "hdf5")]
mod hdf5;

pub use self::image::ImageCodec;
pub use self::npy::NpyCodec;

#[cfg(feature = "hdf5")]
pub use self::hdf5::Hdf5Codec;

use crate::error::{Error, Result};
use ndarray::{Array2, Array3};
use std::path::Path;

/// A raw mask array as decoded from disk, before validation.
#[derive(Debug, Clone)]
pub enum MaskArray {
    /// 2D label map
    TwoD(Array2<u8>),
    /// 3D layer stack
    ThreeD(Array3<u8>),
}

/// Decode/encode capability pair for one family of mask file formats.
pub trait MaskCodec: Sync {
    /// Lower-case extensions this codec claims
    fn extensions(&self) -> &'static [&'static str];

    /// Read a raw 2D or 3D mask array from `path`
    fn decode(&self, path: &Path, key: Option<&str>) -> Result<MaskArray>;

    /// Write a raw layer stack to `path`
    fn encode(&self, path: &Path, key: Option<&str>, stack: &Array3<u8>) -> Result<()>;
}

/// The registered codecs, in lookup order.
pub fn codecs() -> &'static [&'static dyn MaskCodec] {
    #[cfg(feature = "hdf5")]
    {
        &[&ImageCodec, &NpyCodec, &Hdf5Codec]
    }
    #[cfg(not(feature = "hdf5"))]
    {
        &[&ImageCodec, &NpyCodec]
    }
}

fn extension_of(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))
}

/// Find the codec responsible for `path`'s extension.
pub fn codec_for(path: &Path) -> Result<&'static dyn MaskCodec> {
    let ext = extension_of(path)?;
    codecs()
        .iter()
        .copied()
        .find(|c| c.extensions().contains(&ext.as_str()))
        .ok_or_else(|| {
            if matches!(ext.as_str(), "h5" | "mat") {
                Error::UnsupportedFormat(format!("{ext} (enable the `hdf5` feature)"))
            } else {
                Error::UnsupportedFormat(ext)
            }
        })
}

/// Read a raw mask array, dispatching on the extension.
pub fn read_mask_array(path: &Path, key: Option<&str>) -> Result<MaskArray> {
    codec_for(path)?.decode(path, key)
}

/// Write a layer stack, dispatching on the extension.
pub fn write_mask_array(path: &Path, key: Option<&str>, stack: &Array3<u8>) -> Result<()> {
    codec_for(path)?.encode(path, key, stack)
}

/// Read a bare 2D label map (`.npy` or grayscale image).
///
/// Unlike [`read_mask_array`] + validation, no contiguity check is
/// applied: split outputs legitimately have gaps in their class values.
pub fn read_label_map(path: &Path) -> Result<Array2<u8>> {
    match extension_of(path)?.as_str() {
        "npy" => self::npy::read_npy_2d(path),
        "png" | "jpg" | "jpeg" | "bmp" => self::image::read_gray_2d(path),
        ext => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}

/// Write a bare 2D label map (`.npy` or grayscale image).
pub fn write_label_map(path: &Path, map: &Array2<u8>) -> Result<()> {
    match extension_of(path)?.as_str() {
        "npy" => self::npy::write_npy_2d(path, map),
        "png" | "jpg" | "jpeg" | "bmp" => self::image::write_gray_2d(path, map),
        ext => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}
