//! Whole-image inference tiling
//!
//! Tiles a scene into windows, batches them, asks a [`Classifier`] for
//! per-class scores and accumulates them at each window's center pixel.
//! The model itself is a collaborator; only the array plumbing lives
//! here.

use crate::patch::PatchSet;
use crate::window::{count_sliding_window, grouper, windows_of};
use hyperspec_core::{Error, Mask, Result};
use ndarray::{Array2, Array3, ArrayView3, Axis};

/// The training/prediction seam an external model implements.
///
/// `predict_proba` receives a batch of `(h, w, bands)` patch views and
/// returns one row of `n_classes` scores per patch.
pub trait Classifier {
    /// Train on a materialized patch set
    fn fit(&mut self, train: &PatchSet) -> Result<()>;

    /// Per-class scores for a batch of patches, shape `(batch, n_classes)`
    fn predict_proba(&self, batch: &[ArrayView3<'_, f32>]) -> Result<Array2<f32>>;

    /// Number of classes the model scores, background included
    fn n_classes(&self) -> usize;
}

/// Parameters for whole-image prediction
#[derive(Debug, Clone)]
pub struct PredictParams {
    /// Spatial side length of the model's input patches
    pub patch_size: usize,
    /// Window stride; 1 scores every pixel position
    pub test_stride: usize,
    /// Number of patches per `predict_proba` call
    pub batch_size: usize,
}

impl Default for PredictParams {
    fn default() -> Self {
        Self {
            patch_size: 5,
            test_stride: 1,
            batch_size: 64,
        }
    }
}

/// Predict a label map for a whole scene.
///
/// Scores are accumulated per class at the center pixel of every window,
/// then arg-maxed into class labels. When a reference `mask` is given,
/// pixels it marks as background (class 0) are zeroed in the prediction.
pub fn predict_image<C: Classifier>(
    img: &ArrayView3<f32>,
    model: &C,
    params: &PredictParams,
    mask: Option<&Mask>,
) -> Result<Array2<u8>> {
    if params.batch_size == 0 || params.test_stride == 0 {
        return Err(Error::InvalidParameter {
            name: "batch_size/test_stride",
            value: format!("{}/{}", params.batch_size, params.test_stride),
            reason: "must be at least 1".into(),
        });
    }
    let n_classes = model.n_classes();
    if n_classes < 2 {
        return Err(Error::Model(format!(
            "a classifier needs at least 2 classes, got {n_classes}"
        )));
    }

    let (rows, cols, _) = img.dim();
    let shape = (rows, cols);
    let window = (params.patch_size, params.patch_size);
    if count_sliding_window(shape, params.test_stride, window) == 0 {
        return Err(Error::InvalidParameter {
            name: "patch_size",
            value: params.patch_size.to_string(),
            reason: format!("no windows fit a {rows}x{cols} image"),
        });
    }

    let mut probs = Array3::<f32>::zeros((rows, cols, n_classes));
    for batch in grouper(params.batch_size, windows_of(img.view(), params.test_stride, window)) {
        let views: Vec<ArrayView3<f32>> = batch.iter().map(|(view, _)| view.view()).collect();
        let scores = model.predict_proba(&views)?;
        if scores.dim() != (views.len(), n_classes) {
            return Err(Error::Model(format!(
                "expected a ({}, {n_classes}) score array, got {:?}",
                views.len(),
                scores.dim()
            )));
        }
        for ((_, win), row) in batch.iter().zip(scores.axis_iter(Axis(0))) {
            let r = win.row + win.height / 2;
            let c = win.col + win.width / 2;
            for (k, &score) in row.iter().enumerate() {
                probs[[r, c, k]] += score;
            }
        }
    }

    let mut prediction = argmax_classes(&probs);
    if let Some(mask) = mask {
        let (mr, mc, _) = mask.shape();
        if (mr, mc) != (rows, cols) {
            return Err(Error::ShapeMismatch {
                er: rows,
                ec: cols,
                ar: mr,
                ac: mc,
            });
        }
        let gt = mask.get_2d();
        for ((r, c), &v) in gt.indexed_iter() {
            if v == 0 {
                prediction[[r, c]] = 0;
            }
        }
    }
    Ok(prediction)
}

fn argmax_classes(probs: &Array3<f32>) -> Array2<u8> {
    let (rows, cols, _) = probs.dim();
    let mut out = Array2::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut best = 0usize;
            let mut best_score = f32::NEG_INFINITY;
            for (k, &score) in probs.slice(ndarray::s![r, c, ..]).iter().enumerate() {
                if score > best_score {
                    best_score = score;
                    best = k;
                }
            }
            out[[r, c]] = best as u8;
        }
    }
    out
}
