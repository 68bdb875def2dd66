//! Conversions between the 2D label map and the 3D binary layer stack

use crate::error::{Error, Result};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};
use std::collections::BTreeSet;

/// Maximum number of layers a stack may hold: layer indices must stay
/// representable as `u8` class values in the projected label map.
pub const MAX_LAYERS: usize = 256;

/// Check that the label values of a 2D map form the contiguous range
/// `0..K` with no gaps, and return `K`.
pub fn contiguous_class_count(map: &ArrayView2<u8>) -> Result<usize> {
    let values: BTreeSet<u8> = map.iter().copied().collect();
    let k = values.len();
    if !values.iter().enumerate().all(|(i, &v)| v as usize == i) {
        return Err(Error::InvalidMask(format!(
            "class values must form 0..{k} without gaps, got {values:?}"
        )));
    }
    Ok(k)
}

/// Whether every cell of a layer is 0 or 1.
pub fn is_binary(layer: &ArrayView2<u8>) -> bool {
    layer.iter().all(|&v| v <= 1)
}

/// Whether a layer's value set is exactly `{0, 1}` (both present).
pub fn is_strict_binary(layer: &ArrayView2<u8>) -> bool {
    is_binary(layer) && layer.iter().any(|&v| v == 0) && layer.iter().any(|&v| v == 1)
}

/// Expand a 2D label map into a stack of binary layers, one per class.
///
/// Layer `k` is the indicator of `map == k`. The map must have contiguous
/// class values `0..K` with `K >= 2`.
pub fn map_to_layers(map: &ArrayView2<u8>) -> Result<Array3<u8>> {
    let k = contiguous_class_count(map)?;
    if k < 2 {
        return Err(Error::InvalidMask(format!(
            "a mask needs at least 2 classes, got {k}"
        )));
    }

    let (rows, cols) = map.dim();
    let mut stack = Array3::zeros((rows, cols, k));
    for (cl, mut layer) in stack.axis_iter_mut(Axis(2)).enumerate() {
        Zip::from(&mut layer)
            .and(map)
            .for_each(|out, &v| *out = u8::from(v as usize == cl));
    }
    Ok(stack)
}

/// Project a layer stack back to a 2D label map.
///
/// Layers are applied in ascending index order, so if a pixel is hot in
/// more than one layer the highest layer index wins. For a canonical
/// one-hot stack this is the exact inverse of [`map_to_layers`].
pub fn layers_to_map(stack: &ArrayView3<u8>) -> Array2<u8> {
    let (rows, cols, _) = stack.dim();
    let mut map = Array2::zeros((rows, cols));
    for (cl, layer) in stack.axis_iter(Axis(2)).enumerate() {
        Zip::from(&mut map).and(&layer).for_each(|out, &v| {
            if v == 1 {
                *out = cl as u8;
            }
        });
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn make_map() -> Array2<u8> {
        array![[0, 0, 1], [1, 2, 2], [0, 1, 2]]
    }

    #[test]
    fn test_round_trip() {
        let map = make_map();
        let stack = map_to_layers(&map.view()).unwrap();
        assert_eq!(stack.dim(), (3, 3, 3));
        assert_eq!(layers_to_map(&stack.view()), map);
    }

    #[test]
    fn test_layers_are_one_hot() {
        let map = make_map();
        let stack = map_to_layers(&map.view()).unwrap();
        assert!(stack.iter().all(|&v| v <= 1));
        let hot = stack.sum_axis(Axis(2));
        assert!(hot.iter().all(|&v| v == 1));
    }

    #[test]
    fn test_rejects_gaps() {
        let map = array![[0, 2], [2, 0]];
        assert!(matches!(
            map_to_layers(&map.view()),
            Err(Error::InvalidMask(_))
        ));
    }

    #[test]
    fn test_rejects_single_class() {
        let map = Array2::<u8>::zeros((4, 4));
        assert!(map_to_layers(&map.view()).is_err());
    }

    #[test]
    fn test_overlap_last_layer_wins() {
        // Pixel (0, 0) is hot in layers 1 and 2.
        let mut stack = Array3::<u8>::zeros((2, 2, 3));
        stack[[0, 0, 1]] = 1;
        stack[[0, 0, 2]] = 1;
        let map = layers_to_map(&stack.view());
        assert_eq!(map[[0, 0]], 2);
    }

    #[test]
    fn test_strict_binary() {
        let ones = Array2::<u8>::ones((2, 2));
        let zeros = Array2::<u8>::zeros((2, 2));
        let mut mixed = zeros.clone();
        mixed[[0, 0]] = 1;

        assert!(is_binary(&ones.view()));
        assert!(!is_strict_binary(&ones.view()));
        assert!(!is_strict_binary(&zeros.view()));
        assert!(is_strict_binary(&mixed.view()));
    }
}
