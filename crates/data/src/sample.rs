//! Ground-truth train/test partitioning
//!
//! Splits the labeled (nonzero) pixels of a 2D label map into disjoint
//! train and test maps. Three algorithms are available: a uniform random
//! split, a per-class fixed-count split, and a spatially disjoint split
//! that separates the two sets by image row.

use hyperspec_core::{Error, Result};
use ndarray::{Array2, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Seed for the sampling RNG; fixed so splits are reproducible run to run.
pub const SAMPLING_SEED: u64 = 42;

/// How to partition labeled pixels into train and test sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Uniform random split over all labeled pixels, no stratification
    Random,
    /// Independent split per class; class 0 is always excluded
    Fixed,
    /// Spatial split by image row: train keeps the top of each class
    Disjoint,
}

impl FromStr for SamplingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(SamplingMode::Random),
            "fixed" => Ok(SamplingMode::Fixed),
            "disjoint" => Ok(SamplingMode::Disjoint),
            other => Err(Error::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SamplingMode::Random => "random",
            SamplingMode::Fixed => "fixed",
            SamplingMode::Disjoint => "disjoint",
        };
        f.write_str(name)
    }
}

/// A disjoint train/test partition of a label map.
///
/// Both maps have the input's shape; a pixel is nonzero in at most one of
/// the two, and only where the input was nonzero.
#[derive(Debug, Clone)]
pub struct SplitAssignment {
    pub train_gt: Array2<u8>,
    pub test_gt: Array2<u8>,
}

impl SplitAssignment {
    /// Number of labeled pixels in the train map
    pub fn train_count(&self) -> usize {
        self.train_gt.iter().filter(|&&v| v > 0).count()
    }

    /// Number of labeled pixels in the test map
    pub fn test_count(&self) -> usize {
        self.test_gt.iter().filter(|&&v| v > 0).count()
    }
}

/// Resolve a `train_size` parameter against a population of `n` pixels.
///
/// Values above 1 are floored and used as an absolute count; fractions
/// take `floor(train_size * n)`. Both sides of the split must end up
/// non-empty.
fn resolve_count(train_size: f64, n: usize, what: &str) -> Result<usize> {
    if !train_size.is_finite() || train_size <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "train_size",
            value: train_size.to_string(),
            reason: "must be a positive fraction or sample count".into(),
        });
    }
    let count = if train_size > 1.0 {
        train_size.floor() as usize
    } else {
        (train_size * n as f64).floor() as usize
    };
    if count == 0 || count >= n {
        return Err(Error::Sampling(format!(
            "train_size {train_size} leaves an empty split for {what} ({n} labeled pixels)"
        )));
    }
    Ok(count)
}

fn nonzero_classes(gt: &Array2<u8>) -> BTreeSet<u8> {
    gt.iter().copied().filter(|&v| v != 0).collect()
}

fn class_coords(gt: &Array2<u8>, class: u8) -> Vec<(usize, usize)> {
    gt.indexed_iter()
        .filter(|&(_, &v)| v == class)
        .map(|(ix, _)| ix)
        .collect()
}

/// Split the labeled pixels of `gt` into disjoint train and test maps.
///
/// `train_size` is a fraction in `(0, 1)` or, when above 1, an absolute
/// per-split (random) or per-class (fixed) sample count.
pub fn sample_gt(gt: &Array2<u8>, train_size: f64, mode: SamplingMode) -> Result<SplitAssignment> {
    match mode {
        SamplingMode::Random => sample_random(gt, train_size),
        SamplingMode::Fixed => sample_fixed(gt, train_size),
        SamplingMode::Disjoint => sample_disjoint(gt, train_size),
    }
}

/// The recursive split the training wrapper applies: carve a validation
/// set out of an already-sampled train map, keeping 90% for training.
pub fn split_train_val(train_gt: &Array2<u8>, mode: SamplingMode) -> Result<SplitAssignment> {
    sample_gt(train_gt, 0.9, mode)
}

fn sample_random(gt: &Array2<u8>, train_size: f64) -> Result<SplitAssignment> {
    let mut coords: Vec<(usize, usize)> = gt
        .indexed_iter()
        .filter(|&(_, &v)| v != 0)
        .map(|(ix, _)| ix)
        .collect();
    if coords.is_empty() {
        return Err(Error::Sampling("no labeled pixels to sample".into()));
    }
    let n_train = resolve_count(train_size, coords.len(), "the label map")?;

    let mut rng = StdRng::seed_from_u64(SAMPLING_SEED);
    coords.shuffle(&mut rng);

    let mut train_gt = Array2::zeros(gt.dim());
    let mut test_gt = Array2::zeros(gt.dim());
    for &(r, c) in &coords[..n_train] {
        train_gt[[r, c]] = gt[[r, c]];
    }
    for &(r, c) in &coords[n_train..] {
        test_gt[[r, c]] = gt[[r, c]];
    }
    Ok(SplitAssignment { train_gt, test_gt })
}

fn sample_fixed(gt: &Array2<u8>, train_size: f64) -> Result<SplitAssignment> {
    let classes = nonzero_classes(gt);
    if classes.is_empty() {
        return Err(Error::Sampling("no labeled pixels to sample".into()));
    }

    let mut rng = StdRng::seed_from_u64(SAMPLING_SEED);
    let mut train_gt = Array2::zeros(gt.dim());
    let mut test_gt = Array2::zeros(gt.dim());

    for &class in &classes {
        let mut coords = class_coords(gt, class);
        let n_train = resolve_count(train_size, coords.len(), &format!("class {class}"))?;
        coords.shuffle(&mut rng);
        for &(r, c) in &coords[..n_train] {
            train_gt[[r, c]] = class;
        }
        for &(r, c) in &coords[n_train..] {
            test_gt[[r, c]] = class;
        }
    }
    Ok(SplitAssignment { train_gt, test_gt })
}

/// Spatial split: for each class, scan rows top to bottom accumulating
/// the fraction of that class seen so far, and stop at the first row
/// where it exceeds `0.9 * train_size`. The class keeps rows above the
/// stop index in the train map; the test map is the complement among the
/// originally labeled pixels.
fn sample_disjoint(gt: &Array2<u8>, train_size: f64) -> Result<SplitAssignment> {
    if !train_size.is_finite() || train_size <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "train_size",
            value: train_size.to_string(),
            reason: "must be a positive fraction or sample count".into(),
        });
    }
    let train_size = if train_size > 1.0 {
        train_size.floor()
    } else {
        train_size
    };

    let (rows, cols) = gt.dim();
    let mut train_gt = gt.clone();
    let mut test_gt = gt.clone();

    for &class in &nonzero_classes(gt) {
        let row_counts: Vec<usize> = (0..rows)
            .map(|r| (0..cols).filter(|&c| gt[[r, c]] == class).count())
            .collect();
        let total: usize = row_counts.iter().sum();

        // Default to the last row when the threshold is never crossed.
        let mut stop = rows.saturating_sub(1);
        let mut seen = 0usize;
        for r in 0..rows {
            if total == 0 {
                // Nothing of this class yet; skip the row and keep scanning.
                continue;
            }
            let ratio = seen as f64 / total as f64;
            if ratio > 0.9 * train_size {
                stop = r;
                break;
            }
            seen += row_counts[r];
        }

        // Rows stop.. of this class leave the train map.
        for r in stop..rows {
            for c in 0..cols {
                if gt[[r, c]] == class {
                    train_gt[[r, c]] = 0;
                }
            }
        }
    }

    // Test is whatever labeled pixels the train map gave up.
    Zip::from(&mut test_gt).and(&train_gt).for_each(|t, &tr| {
        if tr > 0 {
            *t = 0;
        }
    });
    Ok(SplitAssignment { train_gt, test_gt })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// 12x10 map: class 1 fills rows 0..4, class 2 rows 4..8 in the left
    /// half, rows 8..12 unlabeled except a class-1 block.
    fn make_gt() -> Array2<u8> {
        let mut gt = Array2::zeros((12, 10));
        for r in 0..4 {
            for c in 0..10 {
                gt[[r, c]] = 1;
            }
        }
        for r in 4..8 {
            for c in 0..5 {
                gt[[r, c]] = 2;
            }
        }
        for r in 8..12 {
            for c in 5..10 {
                gt[[r, c]] = 1;
            }
        }
        gt
    }

    /// Two 20-pixel classes plus background.
    fn make_balanced_gt() -> Array2<u8> {
        let mut gt = Array2::zeros((10, 10));
        for i in 0..20 {
            gt[[i / 10, i % 10]] = 1;
            gt[[4 + i / 10, i % 10]] = 2;
        }
        gt
    }

    fn assert_disjoint(gt: &Array2<u8>, split: &SplitAssignment) {
        for ((r, c), &v) in gt.indexed_iter() {
            let tr = split.train_gt[[r, c]];
            let te = split.test_gt[[r, c]];
            assert_eq!(tr * te, 0, "pixel ({r}, {c}) in both splits");
            if tr > 0 {
                assert_eq!(tr, v, "train relabeled pixel ({r}, {c})");
            }
            if te > 0 {
                assert_eq!(te, v, "test relabeled pixel ({r}, {c})");
            }
            if v == 0 {
                assert_eq!(tr, 0);
                assert_eq!(te, 0);
            }
        }
    }

    #[test]
    fn test_random_split_counts() {
        let gt = make_gt();
        let labeled = gt.iter().filter(|&&v| v > 0).count();
        let split = sample_gt(&gt, 0.5, SamplingMode::Random).unwrap();

        assert_disjoint(&gt, &split);
        assert_eq!(split.train_count(), labeled / 2);
        assert_eq!(split.train_count() + split.test_count(), labeled);
    }

    #[test]
    fn test_random_split_reproducible() {
        let gt = make_gt();
        let a = sample_gt(&gt, 0.3, SamplingMode::Random).unwrap();
        let b = sample_gt(&gt, 0.3, SamplingMode::Random).unwrap();
        assert_eq!(a.train_gt, b.train_gt);
        assert_eq!(a.test_gt, b.test_gt);
    }

    #[test]
    fn test_random_absolute_count() {
        let gt = make_gt();
        let split = sample_gt(&gt, 25.0, SamplingMode::Random).unwrap();
        assert_eq!(split.train_count(), 25);
    }

    #[test]
    fn test_fixed_class_balance() {
        let gt = make_balanced_gt();
        let split = sample_gt(&gt, 10.0, SamplingMode::Fixed).unwrap();

        assert_disjoint(&gt, &split);
        for class in [1u8, 2] {
            let train_c = split.train_gt.iter().filter(|&&v| v == class).count();
            let test_c = split.test_gt.iter().filter(|&&v| v == class).count();
            assert_eq!(train_c, 10, "class {class} train");
            assert_eq!(test_c, 10, "class {class} test");
        }
        // Background contributes to neither split.
        assert_eq!(split.train_count() + split.test_count(), 40);
    }

    #[test]
    fn test_fixed_fraction_per_class() {
        let gt = make_balanced_gt();
        let split = sample_gt(&gt, 0.25, SamplingMode::Fixed).unwrap();
        for class in [1u8, 2] {
            let train_c = split.train_gt.iter().filter(|&&v| v == class).count();
            assert_eq!(train_c, 5, "class {class}");
        }
    }

    #[test]
    fn test_fixed_class_too_small() {
        let gt = make_balanced_gt();
        assert!(matches!(
            sample_gt(&gt, 20.0, SamplingMode::Fixed),
            Err(Error::Sampling(_))
        ));
    }

    #[test]
    fn test_disjoint_is_spatial() {
        let gt = make_gt();
        let split = sample_gt(&gt, 0.5, SamplingMode::Disjoint).unwrap();
        assert_disjoint(&gt, &split);

        // Per class, every train row lies above every test row.
        for class in [1u8, 2] {
            let max_train_row = split
                .train_gt
                .indexed_iter()
                .filter(|&(_, &v)| v == class)
                .map(|((r, _), _)| r)
                .max();
            let min_test_row = split
                .test_gt
                .indexed_iter()
                .filter(|&(_, &v)| v == class)
                .map(|((r, _), _)| r)
                .min();
            if let (Some(hi), Some(lo)) = (max_train_row, min_test_row) {
                assert!(hi < lo, "class {class}: train row {hi} not above test row {lo}");
            }
        }
    }

    #[test]
    fn test_disjoint_train_fraction() {
        let gt = make_gt();
        let split = sample_gt(&gt, 0.5, SamplingMode::Disjoint).unwrap();

        // Class 1 has 60 pixels, 10 per labeled row. The scan stops at
        // row 3, the first whose prefix (30/60) exceeds 0.45, so train
        // keeps the 30 pixels of rows 0..3.
        let train_c1 = split.train_gt.iter().filter(|&&v| v == 1).count();
        assert_eq!(train_c1, 30);

        // Class 2 has 20 pixels across rows 4..8; the scan stops at row 6
        // (prefix 10/20), leaving rows 4..6 in train.
        let train_c2 = split.train_gt.iter().filter(|&&v| v == 2).count();
        assert_eq!(train_c2, 10);
    }

    #[test]
    fn test_unsupported_mode() {
        let err = "bogus".parse::<SamplingMode>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedMode(_)));
        assert_eq!(err.to_string(), "unsupported sampling mode: bogus");
    }

    #[test]
    fn test_invalid_train_size() {
        let gt = make_gt();
        for mode in [SamplingMode::Random, SamplingMode::Fixed, SamplingMode::Disjoint] {
            assert!(sample_gt(&gt, 0.0, mode).is_err());
            assert!(sample_gt(&gt, -1.0, mode).is_err());
        }
    }

    #[test]
    fn test_split_train_val() {
        let gt = make_gt();
        let split = sample_gt(&gt, 0.8, SamplingMode::Random).unwrap();
        let val_split = split_train_val(&split.train_gt, SamplingMode::Random).unwrap();

        assert_disjoint(&split.train_gt, &val_split);
        let n = split.train_count();
        assert_eq!(val_split.train_count(), (n as f64 * 0.9).floor() as usize);
    }
}
