//! Patch extraction for patch-based classifiers
//!
//! Builds the `(patch, label)` pairs a convolutional classifier trains
//! on: the image is zero-padded so every original pixel can sit at the
//! center of a `patch_size x patch_size x bands` cube.

use crate::maybe_rayon::*;
use hyperspec_core::{Error, Result};
use ndarray::{Array1, Array3, Array4, ArrayView2, ArrayView3, Axis, s};

/// A materialized set of training patches with their labels.
///
/// `data` has shape `(n, patch_size, patch_size, bands)`; `labels` holds
/// one class index per patch, in the same order.
#[derive(Debug, Clone)]
pub struct PatchSet {
    pub data: Array4<f32>,
    pub labels: Array1<u8>,
}

impl PatchSet {
    /// Number of patches
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Whether the set holds no patches
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spatial side length of each patch
    pub fn patch_size(&self) -> usize {
        self.data.len_of(Axis(1))
    }
}

/// Zero-pad an image cube spatially by `margin` on every side.
pub fn pad_with_zeros(x: &ArrayView3<f32>, margin: usize) -> Array3<f32> {
    let (rows, cols, bands) = x.dim();
    let mut padded = Array3::zeros((rows + 2 * margin, cols + 2 * margin, bands));
    padded
        .slice_mut(s![margin..margin + rows, margin..margin + cols, ..])
        .assign(x);
    padded
}

/// Extract one centered patch per pixel of `x`, labeled from `y`.
///
/// Patches are produced in row-major raster order. With
/// `remove_zero_labels` set, background patches (label 0) are dropped and
/// the remaining labels are decremented by one, yielding zero-based class
/// indices for a classifier that excludes the background class.
///
/// `patch_size` must be odd so a patch has a well-defined center pixel.
pub fn create_patches(
    x: &ArrayView3<f32>,
    y: &ArrayView2<u8>,
    patch_size: usize,
    remove_zero_labels: bool,
) -> Result<PatchSet> {
    if patch_size % 2 == 0 || patch_size == 0 {
        return Err(Error::InvalidParameter {
            name: "patch_size",
            value: patch_size.to_string(),
            reason: "must be odd so patches have a center pixel".into(),
        });
    }
    let (rows, cols, bands) = x.dim();
    if y.dim() != (rows, cols) {
        return Err(Error::ShapeMismatch {
            er: rows,
            ec: cols,
            ar: y.dim().0,
            ac: y.dim().1,
        });
    }

    let margin = (patch_size - 1) / 2;
    let padded = pad_with_zeros(x, margin);

    // One patch per original pixel; pixel (r, c) sits at padded
    // (r + margin, c + margin), so its patch is padded[r.., c..].
    let flat: Vec<f32> = (0..rows)
        .into_par_iter()
        .flat_map(|r| {
            let mut row_flat = Vec::with_capacity(cols * patch_size * patch_size * bands);
            for c in 0..cols {
                let patch = padded.slice(s![r..r + patch_size, c..c + patch_size, ..]);
                row_flat.extend(patch.iter().copied());
            }
            row_flat
        })
        .collect();

    let mut data = Array4::from_shape_vec((rows * cols, patch_size, patch_size, bands), flat)
        .map_err(|e| Error::Other(e.to_string()))?;
    let mut labels = Array1::from_vec(y.iter().copied().collect());

    if remove_zero_labels {
        let keep: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l > 0)
            .map(|(i, _)| i)
            .collect();
        data = data.select(Axis(0), &keep);
        labels = labels.select(Axis(0), &keep).mapv(|l| l - 1);
    }

    Ok(PatchSet { data, labels })
}

/// Lazy iterator over every inference patch of an image.
///
/// Pads by `patch_size / 2` and yields one channel-first
/// `(bands, patch_size, patch_size)` cube per position in row-major
/// raster order, as `f32` — the exhaustive tiling a classifier consumes
/// when predicting a whole scene.
pub fn test_patches(x: &ArrayView3<f32>, patch_size: usize) -> TestPatches {
    let padded = pad_with_zeros(x, patch_size / 2);
    let (rows, cols, _) = padded.dim();
    TestPatches {
        padded,
        patch_size,
        positions_r: rows + 1 - patch_size,
        positions_c: cols + 1 - patch_size,
        index: 0,
    }
}

pub struct TestPatches {
    padded: Array3<f32>,
    patch_size: usize,
    positions_r: usize,
    positions_c: usize,
    index: usize,
}

impl Iterator for TestPatches {
    type Item = Array3<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.positions_r * self.positions_c {
            return None;
        }
        let r = self.index / self.positions_c;
        let c = self.index % self.positions_c;
        self.index += 1;

        let p = self.patch_size;
        let patch = self.padded.slice(s![r..r + p, c..c + p, ..]);
        Some(patch.permuted_axes([2, 0, 1]).to_owned())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.positions_r * self.positions_c - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TestPatches {}
