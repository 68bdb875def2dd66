//! Patch augmentation

use crate::patch::PatchSet;
use ndarray::{Axis, s};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Randomly flip the first half of a patch set in place.
///
/// Each affected patch is flipped either vertically or horizontally,
/// chosen per patch; the second half of the set is left untouched so the
/// model still sees unmodified samples every epoch.
pub fn augment_flips(patches: &mut PatchSet, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = patches.len();
    for i in 0..n / 2 {
        let mut patch = patches.data.index_axis_mut(Axis(0), i);
        let flipped = if rng.gen_range(0..2) == 0 {
            patch.slice(s![..;-1, .., ..]).to_owned()
        } else {
            patch.slice(s![.., ..;-1, ..]).to_owned()
        };
        patch.assign(&flipped);
    }
}
