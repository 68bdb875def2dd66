//! NumPy `.npy` mask codec
//!
//! Masks in the wild are saved with whatever integer dtype the producing
//! tool used, so decoding tries a cascade of integer dtypes and casts
//! each element down to `u8`, rejecting values that do not fit.

use crate::error::{Error, Result};
use crate::io::{MaskArray, MaskCodec};
use ndarray::{Array2, Array3, Dimension};
use ndarray_npy::{ReadNpyExt, ReadableElement, WriteNpyExt};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub struct NpyCodec;

fn cast_to_u8<D: Dimension, T: Copy + num_traits::NumCast>(
    arr: ndarray::Array<T, D>,
) -> Result<ndarray::Array<u8, D>> {
    let mut out = ndarray::Array::zeros(arr.raw_dim());
    for (o, &v) in out.iter_mut().zip(arr.iter()) {
        *o = num_traits::cast(v).ok_or_else(|| {
            Error::InvalidMask("mask values must fit in an unsigned byte".into())
        })?;
    }
    Ok(out)
}

fn try_read<T, D>(path: &Path) -> Option<ndarray::Array<T, D>>
where
    T: ReadableElement,
    D: Dimension,
{
    let file = File::open(path).ok()?;
    ndarray::Array::<T, D>::read_npy(file).ok()
}

pub(crate) fn read_npy_2d(path: &Path) -> Result<Array2<u8>> {
    // Fail early on a missing file so it surfaces as an I/O error.
    File::open(path)?;

    if let Some(arr) = try_read::<u8, _>(path) {
        return Ok(arr);
    }
    if let Some(arr) = try_read::<u16, ndarray::Ix2>(path) {
        return cast_to_u8(arr);
    }
    if let Some(arr) = try_read::<i32, ndarray::Ix2>(path) {
        return cast_to_u8(arr);
    }
    if let Some(arr) = try_read::<i64, ndarray::Ix2>(path) {
        return cast_to_u8(arr);
    }
    Err(Error::Codec(format!(
        "{} is not a 2D integer .npy array",
        path.display()
    )))
}

fn read_npy_3d(path: &Path) -> Result<Array3<u8>> {
    if let Some(arr) = try_read::<u8, _>(path) {
        return Ok(arr);
    }
    if let Some(arr) = try_read::<u16, ndarray::Ix3>(path) {
        return cast_to_u8(arr);
    }
    if let Some(arr) = try_read::<i32, ndarray::Ix3>(path) {
        return cast_to_u8(arr);
    }
    if let Some(arr) = try_read::<i64, ndarray::Ix3>(path) {
        return cast_to_u8(arr);
    }
    Err(Error::Codec(format!(
        "{} is not a 3D integer .npy array",
        path.display()
    )))
}

pub(crate) fn write_npy_2d(path: &Path, map: &Array2<u8>) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    map.write_npy(writer)
        .map_err(|e| Error::Codec(format!("npy write error: {e}")))
}

impl MaskCodec for NpyCodec {
    fn extensions(&self) -> &'static [&'static str] {
        &["npy"]
    }

    fn decode(&self, path: &Path, _key: Option<&str>) -> Result<MaskArray> {
        File::open(path)?;

        if let Ok(map) = read_npy_2d(path) {
            return Ok(MaskArray::TwoD(map));
        }
        if let Ok(stack) = read_npy_3d(path) {
            return Ok(MaskArray::ThreeD(stack));
        }
        Err(Error::Codec(format!(
            "{} is not a 2D or 3D integer .npy array",
            path.display()
        )))
    }

    fn encode(&self, path: &Path, _key: Option<&str>, stack: &Array3<u8>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        stack
            .write_npy(writer)
            .map_err(|e| Error::Codec(format!("npy write error: {e}")))
    }
}
