//! Hyperspectral image cube

use crate::error::{Error, Result};
use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

/// A hyperspectral image: a `(rows, cols, bands)` cube of `f32` samples.
///
/// `HsImage` is the ingestion-side container the dataset machinery
/// consumes; band math, geometry correction and spectral transforms are
/// collaborators, not methods here.
#[derive(Debug, Clone)]
pub struct HsImage {
    data: Array3<f32>,
}

impl HsImage {
    /// Wrap an existing cube; every dimension must be nonzero.
    pub fn from_array(data: Array3<f32>) -> Result<Self> {
        let (rows, cols, bands) = data.dim();
        if rows == 0 || cols == 0 || bands == 0 {
            return Err(Error::InvalidDimensions { rows, cols, bands });
        }
        Ok(Self { data })
    }

    /// Borrow the cube
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// Consume the image and return the cube
    pub fn into_array(self) -> Array3<f32> {
        self.data
    }

    /// Dimensions as `(rows, cols, bands)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of spectral bands
    pub fn n_bands(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Borrow a single band
    pub fn band(&self, index: usize) -> Result<ArrayView2<'_, f32>> {
        if index >= self.n_bands() {
            return Err(Error::LayerOutOfBounds {
                index,
                layers: self.n_bands(),
            });
        }
        Ok(self.data.index_axis(Axis(2), index))
    }

    /// Globally min-max normalize the cube into `[0, 1]`.
    ///
    /// A constant cube maps to all zeros.
    pub fn normalized(&self) -> Array3<f32> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in self.data.iter() {
            min = min.min(v);
            max = max.max(v);
        }
        let range = max - min;
        if range == 0.0 {
            return Array3::zeros(self.data.dim());
        }
        self.data.mapv(|v| (v - min) / range)
    }
}
