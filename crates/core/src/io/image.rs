//! Grayscale image mask codec (png/jpg/jpeg/bmp)
//!
//! Decodes a single-channel image into a 2D label map. Encoding writes
//! layer 0 of the stack only, which is lossy for a multi-class mask;
//! keyed array formats are the faithful on-disk representation.

use crate::error::{Error, Result};
use crate::io::{MaskArray, MaskCodec};
use ::image::GrayImage;
use ndarray::{Array2, Array3, Axis};
use std::path::Path;

pub struct ImageCodec;

pub(crate) fn read_gray_2d(path: &Path) -> Result<Array2<u8>> {
    let img = ::image::open(path)
        .map_err(|e| Error::Codec(format!("image decode error: {e}")))?
        .to_luma8();
    let (width, height) = img.dimensions();
    Array2::from_shape_vec((height as usize, width as usize), img.into_raw())
        .map_err(|e| Error::Other(e.to_string()))
}

pub(crate) fn write_gray_2d(path: &Path, map: &Array2<u8>) -> Result<()> {
    let (rows, cols) = map.dim();
    let pixels: Vec<u8> = map.iter().copied().collect();
    let img = GrayImage::from_raw(cols as u32, rows as u32, pixels)
        .ok_or_else(|| Error::Other("image buffer size mismatch".into()))?;
    img.save(path)
        .map_err(|e| Error::Codec(format!("image encode error: {e}")))
}

impl MaskCodec for ImageCodec {
    fn extensions(&self) -> &'static [&'static str] {
        &["png", "jpg", "jpeg", "bmp"]
    }

    fn decode(&self, path: &Path, _key: Option<&str>) -> Result<MaskArray> {
        Ok(MaskArray::TwoD(read_gray_2d(path)?))
    }

    fn encode(&self, path: &Path, _key: Option<&str>, stack: &Array3<u8>) -> Result<()> {
        // Layer 0 only; the rest of the stack does not survive this format.
        let layer = stack.index_axis(Axis(2), 0).to_owned();
        write_gray_2d(path, &layer)
    }
}
