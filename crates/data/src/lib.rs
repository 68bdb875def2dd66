//! # HyperSpec Data
//!
//! Dataset construction for hyperspectral classification: sliding-window
//! generation, ground-truth train/test partitioning, patch extraction,
//! inference tiling and patch augmentation.
//!
//! ## Pipeline
//!
//! 1. [`dataset::get_dataset`] pairs an `HsImage` with its mask's label map
//! 2. [`sample::sample_gt`] partitions the labeled pixels into disjoint
//!    train/test maps (random, fixed-count or spatially disjoint)
//! 3. [`patch::create_patches`] materializes centered patch cubes and labels
//! 4. A [`Classifier`] collaborator trains on the patches;
//!    [`infer::predict_image`] tiles a whole scene back through it

pub mod augment;
pub mod dataset;
pub mod infer;
mod maybe_rayon;
pub mod patch;
pub mod sample;
pub mod window;

pub use infer::{Classifier, PredictParams};
pub use patch::PatchSet;
pub use sample::{SamplingMode, SplitAssignment};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::augment::augment_flips;
    pub use crate::dataset::{MinMaxNormalize, SpectralTransform, get_dataset};
    pub use crate::infer::{Classifier, PredictParams, predict_image};
    pub use crate::patch::{PatchSet, create_patches, pad_with_zeros, test_patches};
    pub use crate::sample::{SamplingMode, SplitAssignment, sample_gt, split_train_val};
    pub use crate::window::{Window, count_sliding_window, grouper, sliding_windows, windows_of};
    pub use hyperspec_core::prelude::*;
}
