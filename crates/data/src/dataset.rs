//! Dataset assembly
//!
//! Pairs an image cube with its label map in the layout the sampler and
//! patch extractor expect, and defines the seam for external spectral
//! transforms (PCA, standardization) applied before patch extraction.

use hyperspec_core::{Error, HsImage, Mask, Result};
use ndarray::{Array2, Array3, ArrayView3};

/// Assemble the `(image, label map)` pair consumed by training.
///
/// The image is min-max normalized to `[0, 1]` `f32`; the label map is
/// the mask's 2D projection when a mask is given.
pub fn get_dataset(hsi: &HsImage, mask: Option<&Mask>) -> (Array3<f32>, Option<Array2<u8>>) {
    (hsi.normalized(), mask.map(|m| m.get_2d()))
}

/// A fitted spectral transform applied to image cubes before patching.
///
/// PCA and standardization collaborators implement this; the toolkit
/// itself only ships the trivial range normalizer.
pub trait SpectralTransform {
    /// Fit to a cube and return the transformed cube
    fn fit_transform(&mut self, img: &ArrayView3<f32>) -> Result<Array3<f32>>;

    /// Apply an already-fitted transform
    fn transform(&self, img: &ArrayView3<f32>) -> Result<Array3<f32>>;
}

/// Global min-max normalization into `[0, 1]`, fitted on one cube.
#[derive(Debug, Clone, Default)]
pub struct MinMaxNormalize {
    range: Option<(f32, f32)>,
}

impl MinMaxNormalize {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpectralTransform for MinMaxNormalize {
    fn fit_transform(&mut self, img: &ArrayView3<f32>) -> Result<Array3<f32>> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in img.iter() {
            min = min.min(v);
            max = max.max(v);
        }
        if !(min.is_finite() && max.is_finite()) || min == max {
            return Err(Error::InvalidParameter {
                name: "img",
                value: format!("range [{min}, {max}]"),
                reason: "cannot normalize a constant or non-finite cube".into(),
            });
        }
        self.range = Some((min, max));
        self.transform(img)
    }

    fn transform(&self, img: &ArrayView3<f32>) -> Result<Array3<f32>> {
        let (min, max) = self
            .range
            .ok_or_else(|| Error::Model("transform used before fitting".into()))?;
        Ok(img.mapv(|v| (v - min) / (max - min)))
    }
}
