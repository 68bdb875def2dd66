//! HDF5-backed mask codec for `.h5` and `.mat` files
//!
//! `.mat` files are handled as MATLAB v7.3 containers, which are plain
//! HDF5 files; the legacy v5 layout is not supported. Both extensions
//! require a dataset key selecting the array inside the container.

use crate::error::{Error, Result};
use crate::io::{MaskArray, MaskCodec};
use ndarray::{Array2, Array3};
use std::path::Path;

pub struct Hdf5Codec;

fn h5err(e: hdf5::Error) -> Error {
    Error::Codec(format!("HDF5 error: {e}"))
}

fn read_flat_u8(ds: &hdf5::Dataset) -> Result<Vec<u8>> {
    // Masks written by other tools often carry a wider integer dtype.
    if let Ok(raw) = ds.read_raw::<u8>() {
        return Ok(raw);
    }
    let raw = ds.read_raw::<i64>().map_err(h5err)?;
    raw.into_iter()
        .map(|v| {
            u8::try_from(v)
                .map_err(|_| Error::InvalidMask("mask values must fit in an unsigned byte".into()))
        })
        .collect()
}

impl MaskCodec for Hdf5Codec {
    fn extensions(&self) -> &'static [&'static str] {
        &["h5", "mat"]
    }

    fn decode(&self, path: &Path, key: Option<&str>) -> Result<MaskArray> {
        let key = key.ok_or(Error::MissingKey("h5/.mat"))?;
        let file = hdf5::File::open(path).map_err(h5err)?;
        let ds = file.dataset(key).map_err(h5err)?;
        let shape = ds.shape();
        let flat = read_flat_u8(&ds)?;

        match shape.as_slice() {
            [rows, cols] => {
                let map = Array2::from_shape_vec((*rows, *cols), flat)
                    .map_err(|e| Error::Other(e.to_string()))?;
                Ok(MaskArray::TwoD(map))
            }
            [rows, cols, layers] => {
                let stack = Array3::from_shape_vec((*rows, *cols, *layers), flat)
                    .map_err(|e| Error::Other(e.to_string()))?;
                Ok(MaskArray::ThreeD(stack))
            }
            other => Err(Error::InvalidMask(format!(
                "expected a 2D or 3D dataset, got {} dimensions",
                other.len()
            ))),
        }
    }

    fn encode(&self, path: &Path, key: Option<&str>, stack: &Array3<u8>) -> Result<()> {
        let key = key.ok_or(Error::MissingKey("h5/.mat"))?;
        let file = hdf5::File::create(path).map_err(h5err)?;
        let ds = file
            .new_dataset::<u8>()
            .shape(stack.dim())
            .create(key)
            .map_err(h5err)?;
        let flat: Vec<u8> = stack.iter().copied().collect();
        ds.write_raw(&flat).map_err(h5err)
    }
}
