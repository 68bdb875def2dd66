//! The `Mask` class-label store

use crate::error::{Error, Result};
use crate::io::{self, MaskArray};
use crate::mask::convert::{
    MAX_LAYERS, is_binary, is_strict_binary, layers_to_map, map_to_layers,
};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Per-pixel class labels for a hyperspectral scene.
///
/// A `Mask` owns a stack of binary layers of shape `(rows, cols, classes)`;
/// layer `k` marks the pixels of class `k`. The equivalent 2D label map
/// (values `0..K`) is available through [`Mask::get_2d`], with class `0`
/// conventionally meaning "unlabeled/background".
///
/// Construction validates the invariants (at least 2 layers, every layer
/// binary, contiguous class values for 2D input). Layer-level edits are
/// deliberately permissive and may leave the stack non-canonical; call
/// [`Mask::validate`] to re-check the full set of invariants after editing.
///
/// # Example
///
/// ```ignore
/// use hyperspec_core::Mask;
/// use ndarray::array;
///
/// let map = array![[0u8, 1], [2, 1]];
/// let mask = Mask::from_label_map(&map)?;
/// assert_eq!(mask.n_classes(), 3);
/// assert_eq!(mask.get_2d(), map);
/// ```
#[derive(Debug, Clone)]
pub struct Mask {
    /// Binary layers in `(rows, cols, classes)` order
    data: Array3<u8>,
    /// Optional class descriptions, one entry per layer when present
    label_class: BTreeMap<usize, String>,
}

impl Mask {
    /// Build a mask from a 2D label map.
    ///
    /// The map must carry contiguous class values `0..K` (no gaps) with
    /// `K >= 2`; each class becomes one binary layer.
    pub fn from_label_map(map: &Array2<u8>) -> Result<Self> {
        let data = map_to_layers(&map.view())?;
        Ok(Self {
            data,
            label_class: BTreeMap::new(),
        })
    }

    /// Build a mask from an existing layer stack.
    ///
    /// The stack must have at least 2 and at most 256 layers, and every
    /// layer must be binary. Mutual exclusivity across layers is NOT
    /// enforced here; see [`Mask::validate`].
    pub fn from_layers(stack: Array3<u8>) -> Result<Self> {
        let layers = stack.len_of(Axis(2));
        if layers < 2 {
            return Err(Error::InvalidMask(format!(
                "a mask needs at least 2 layers, got {layers}"
            )));
        }
        if layers > MAX_LAYERS {
            return Err(Error::InvalidMask(format!(
                "a mask may hold at most {MAX_LAYERS} layers, got {layers}"
            )));
        }
        for (k, layer) in stack.axis_iter(Axis(2)).enumerate() {
            if !is_binary(&layer) {
                return Err(Error::InvalidMask(format!("layer {k} is not binary")));
            }
        }
        Ok(Self {
            data: stack,
            label_class: BTreeMap::new(),
        })
    }

    /// Attach class descriptions.
    ///
    /// A description map is accepted only when it has exactly one entry per
    /// layer index `0..K`. Anything else is discarded with a warning while
    /// the layer data is kept.
    pub fn with_labels(mut self, labels: BTreeMap<usize, String>) -> Self {
        self.set_label_class(labels);
        self
    }

    /// Replace the class descriptions, discarding them on arity mismatch.
    pub fn set_label_class(&mut self, labels: BTreeMap<usize, String>) {
        if Self::labels_match(&labels, self.len()) {
            self.label_class = labels;
        } else {
            warn!(
                layers = self.len(),
                entries = labels.len(),
                "class descriptions do not match the layer count, discarding them"
            );
            self.label_class = BTreeMap::new();
        }
    }

    fn labels_match(labels: &BTreeMap<usize, String>, layers: usize) -> bool {
        labels.len() == layers && labels.keys().enumerate().all(|(i, &k)| i == k)
    }

    // Dimensions

    /// Number of layers (classes) in the stack
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Whether the mask holds no layers
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of classes; always equal to the live layer count
    pub fn n_classes(&self) -> usize {
        self.len()
    }

    /// Dimensions as `(rows, cols, layers)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    // Data access

    /// Project the layer stack down to a 2D label map.
    ///
    /// Layers are applied in ascending order: if a pixel is (erroneously)
    /// hot in several layers, the highest layer index wins.
    pub fn get_2d(&self) -> Array2<u8> {
        layers_to_map(&self.data.view())
    }

    /// Borrow the layer stack as a read-only view.
    ///
    /// The mask keeps ownership; callers needing an isolated copy use
    /// [`Mask::to_layers`] instead.
    pub fn layers(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// Clone the layer stack into an owned array.
    pub fn to_layers(&self) -> Array3<u8> {
        self.data.clone()
    }

    /// Consume the mask and return the layer stack.
    pub fn into_layers(self) -> Array3<u8> {
        self.data
    }

    /// Borrow a single binary layer.
    pub fn layer(&self, index: usize) -> Result<ArrayView2<'_, u8>> {
        if index >= self.len() {
            return Err(Error::LayerOutOfBounds {
                index,
                layers: self.len(),
            });
        }
        Ok(self.data.index_axis(Axis(2), index))
    }

    /// Class descriptions, empty unless a matching set was attached.
    pub fn label_class(&self) -> &BTreeMap<usize, String> {
        &self.label_class
    }

    // Layer edits.
    //
    // These are structural edits on the layer axis. They do not re-run the
    // full invariant check and they leave any attached class descriptions
    // stale; callers re-attach descriptions and call `validate()` when the
    // editing session is over.

    /// Remove the layer at `pos`.
    pub fn delete_layer(&mut self, pos: usize) -> Result<()> {
        if pos >= self.len() {
            return Err(Error::LayerOutOfBounds {
                index: pos,
                layers: self.len(),
            });
        }
        let kept: Vec<ArrayView2<u8>> = self
            .data
            .axis_iter(Axis(2))
            .enumerate()
            .filter(|(k, _)| *k != pos)
            .map(|(_, layer)| layer)
            .collect();
        self.data = Self::restack(&kept)?;
        Ok(())
    }

    /// Insert an all-zero layer at `pos`.
    pub fn add_void_layer(&mut self, pos: usize) -> Result<()> {
        let (rows, cols, _) = self.shape();
        self.insert_layer(pos, Array2::zeros((rows, cols)))
    }

    /// Insert a caller-supplied binary layer at `pos`.
    ///
    /// The layer must match the stack's spatial shape and its value set
    /// must be exactly `{0, 1}`.
    pub fn add_completed_layer(&mut self, pos: usize, layer: Array2<u8>) -> Result<()> {
        let (rows, cols, _) = self.shape();
        let (lr, lc) = layer.dim();
        if (lr, lc) != (rows, cols) {
            return Err(Error::ShapeMismatch {
                er: rows,
                ec: cols,
                ar: lr,
                ac: lc,
            });
        }
        if !is_strict_binary(&layer.view()) {
            return Err(Error::InvalidMask(
                "a completed layer must contain exactly the values 0 and 1".into(),
            ));
        }
        self.insert_layer(pos, layer)
    }

    fn insert_layer(&mut self, pos: usize, layer: Array2<u8>) -> Result<()> {
        let layers = self.len();
        if pos > layers {
            return Err(Error::LayerOutOfBounds { index: pos, layers });
        }
        if layers + 1 > MAX_LAYERS {
            return Err(Error::InvalidMask(format!(
                "a mask may hold at most {MAX_LAYERS} layers"
            )));
        }
        let mut views: Vec<ArrayView2<u8>> = self.data.axis_iter(Axis(2)).collect();
        views.insert(pos, layer.view());
        self.data = Self::restack(&views)?;
        Ok(())
    }

    fn restack(views: &[ArrayView2<u8>]) -> Result<Array3<u8>> {
        ndarray::stack(Axis(2), views).map_err(|e| Error::Other(e.to_string()))
    }

    /// Re-check the full set of mask invariants.
    ///
    /// Layer edits are permissive by design; this is the explicit entry
    /// point for callers that need the canonical guarantees back:
    /// at least 2 layers, every layer binary, exactly one hot layer per
    /// pixel, and class descriptions (when present) matching the layer
    /// count.
    pub fn validate(&self) -> Result<()> {
        let layers = self.len();
        if layers < 2 {
            return Err(Error::InvalidMask(format!(
                "a mask needs at least 2 layers, got {layers}"
            )));
        }
        if layers > MAX_LAYERS {
            return Err(Error::InvalidMask(format!(
                "a mask may hold at most {MAX_LAYERS} layers, got {layers}"
            )));
        }
        for (k, layer) in self.data.axis_iter(Axis(2)).enumerate() {
            if !is_binary(&layer) {
                return Err(Error::InvalidMask(format!("layer {k} is not binary")));
            }
        }
        let hot = self.data.map_axis(Axis(2), |pixel| {
            pixel.iter().map(|&v| v as usize).sum::<usize>()
        });
        if let Some(((r, c), &n)) = hot.indexed_iter().find(|&(_, &n)| n != 1) {
            return Err(Error::InvalidMask(format!(
                "pixel ({r}, {c}) is hot in {n} layers, expected exactly 1"
            )));
        }
        if !self.label_class.is_empty() && !Self::labels_match(&self.label_class, layers) {
            return Err(Error::InvalidMask(
                "class descriptions do not match the layer count".into(),
            ));
        }
        Ok(())
    }

    // File I/O

    /// Load a mask from a file, dispatching on the extension.
    ///
    /// `key` selects the dataset/field for keyed containers (`.h5`, `.mat`)
    /// and is ignored by the others. On-disk data is validated the same way
    /// as the in-memory constructors: a bad shape or value set is a hard
    /// error. Class descriptions are never carried across a load.
    pub fn load<P: AsRef<Path>>(path: P, key: Option<&str>) -> Result<Self> {
        match io::read_mask_array(path.as_ref(), key)? {
            MaskArray::TwoD(map) => Self::from_label_map(&map),
            MaskArray::ThreeD(stack) => Self::from_layers(stack),
        }
    }

    /// Save the raw layer stack, dispatching on the extension.
    ///
    /// `.npy`, `.h5` and `.mat` store the 3D stack verbatim (under `key`
    /// where the format needs one). Image formats write layer 0 only as a
    /// grayscale image, which is lossy for a multi-class mask.
    pub fn save<P: AsRef<Path>>(&self, path: P, key: Option<&str>) -> Result<()> {
        io::write_mask_array(path.as_ref(), key, &self.data)
    }

    /// Save the class descriptions to a JSON sidecar file.
    pub fn save_class_info<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.label_class)
            .map_err(|e| Error::Other(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load class descriptions from a JSON sidecar file.
    ///
    /// Follows the same permissive policy as [`Mask::set_label_class`]:
    /// an arity mismatch discards the descriptions with a warning.
    pub fn load_class_info<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        let labels: BTreeMap<usize, String> =
            serde_json::from_str(&json).map_err(|e| Error::Codec(e.to_string()))?;
        self.set_label_class(labels);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn make_map() -> Array2<u8> {
        array![[0, 0, 1, 1], [0, 2, 2, 1], [3, 3, 0, 2]]
    }

    fn make_mask() -> Mask {
        Mask::from_label_map(&make_map()).unwrap()
    }

    fn make_labels(n: usize) -> BTreeMap<usize, String> {
        (0..n).map(|k| (k, format!("class_{k}"))).collect()
    }

    #[test]
    fn test_round_trip() {
        let map = make_map();
        let mask = Mask::from_label_map(&map).unwrap();
        assert_eq!(mask.n_classes(), 4);
        assert_eq!(mask.len(), 4);
        assert_eq!(mask.get_2d(), map);
    }

    #[test]
    fn test_from_layers_validates() {
        let mut stack = Array3::<u8>::zeros((2, 2, 2));
        stack[[0, 0, 1]] = 2;
        assert!(Mask::from_layers(stack).is_err());

        let single = Array3::<u8>::zeros((2, 2, 1));
        assert!(Mask::from_layers(single).is_err());
    }

    #[test]
    fn test_layer_access() {
        let mask = make_mask();
        let layer = mask.layer(2).unwrap();
        assert_eq!(layer[[1, 1]], 1);
        assert_eq!(layer[[0, 0]], 0);
        assert!(matches!(
            mask.layer(4),
            Err(Error::LayerOutOfBounds { index: 4, layers: 4 })
        ));
    }

    #[test]
    fn test_delete_layer() {
        let mut mask = make_mask();
        mask.delete_layer(3).unwrap();
        assert_eq!(mask.n_classes(), 3);
        // Deleting a hot layer leaves those pixels with no hot layer.
        assert!(mask.validate().is_err());
        assert!(mask.delete_layer(7).is_err());
    }

    #[test]
    fn test_add_void_layer() {
        let mut mask = make_mask();
        mask.add_void_layer(2).unwrap();
        assert_eq!(mask.n_classes(), 5);
        assert!(mask.layer(2).unwrap().iter().all(|&v| v == 0));
        // Old layer 2 shifted up by one.
        assert_eq!(mask.layer(3).unwrap()[[1, 1]], 1);
        assert!(mask.add_void_layer(9).is_err());
    }

    #[test]
    fn test_add_completed_layer() {
        let mut mask = make_mask();
        let mut layer = Array2::<u8>::zeros((3, 4));
        layer[[0, 0]] = 1;
        mask.add_completed_layer(4, layer).unwrap();
        assert_eq!(mask.n_classes(), 5);
        assert_eq!(mask.layer(4).unwrap()[[0, 0]], 1);

        // Wrong spatial shape
        let bad_shape = Array2::<u8>::zeros((2, 2));
        assert!(matches!(
            make_mask().add_completed_layer(0, bad_shape),
            Err(Error::ShapeMismatch { .. })
        ));

        // All-zero layer is not strictly binary
        let all_zero = Array2::<u8>::zeros((3, 4));
        assert!(make_mask().add_completed_layer(0, all_zero).is_err());

        // Non-binary values
        let mut bad_values = Array2::<u8>::zeros((3, 4));
        bad_values[[0, 0]] = 3;
        assert!(make_mask().add_completed_layer(0, bad_values).is_err());
    }

    #[test]
    fn test_validate_one_hot() {
        let mask = make_mask();
        assert!(mask.validate().is_ok());

        // A second hot layer at one pixel breaks canonical form but is
        // accepted by from_layers; validate() is what catches it.
        let mut stack = mask.to_layers();
        stack[[0, 0, 1]] = 1;
        let edited = Mask::from_layers(stack).unwrap();
        assert!(edited.validate().is_err());
        // get_2d still projects deterministically: highest layer wins.
        assert_eq!(edited.get_2d()[[0, 0]], 1);
    }

    #[test]
    fn test_label_class_arity() {
        let mask = make_mask().with_labels(make_labels(4));
        assert_eq!(mask.label_class().len(), 4);
        assert_eq!(mask.label_class()[&2], "class_2");

        // Wrong arity is discarded, data kept.
        let mask = make_mask().with_labels(make_labels(3));
        assert!(mask.label_class().is_empty());
        assert_eq!(mask.n_classes(), 4);
    }

    #[test]
    fn test_labels_stale_after_edit() {
        let mut mask = make_mask().with_labels(make_labels(4));
        mask.delete_layer(0).unwrap();
        // Descriptions are stale, not silently rewritten.
        assert_eq!(mask.label_class().len(), 4);
        assert!(mask.validate().is_err());
    }

    #[test]
    fn test_class_info_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.json");

        let mask = make_mask().with_labels(make_labels(4));
        mask.save_class_info(&path).unwrap();

        let mut loaded = make_mask();
        loaded.load_class_info(&path).unwrap();
        assert_eq!(loaded.label_class(), mask.label_class());
    }

    #[test]
    fn test_borrow_vs_clone() {
        let mask = make_mask();
        let mut owned = mask.to_layers();
        owned[[0, 0, 0]] = 0;
        // The store's own data is untouched by edits to the clone.
        assert_eq!(mask.layers()[[0, 0, 0]], 1);
    }
}
