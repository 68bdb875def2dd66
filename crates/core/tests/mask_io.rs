//! Mask file round-trips through the codec registry

use hyperspec_core::{Error, Mask};
use ndarray::array;

fn make_map() -> ndarray::Array2<u8> {
    array![
        [0, 0, 1, 1, 2],
        [0, 3, 3, 1, 2],
        [2, 2, 0, 0, 1],
        [3, 0, 1, 2, 0],
    ]
}

#[test]
fn npy_round_trip_preserves_stack() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mask.npy");

    let mask = Mask::from_label_map(&make_map()).unwrap();
    mask.save(&path, None).unwrap();

    let loaded = Mask::load(&path, None).unwrap();
    assert_eq!(loaded.n_classes(), 4);
    assert_eq!(loaded.get_2d(), make_map());
    assert_eq!(loaded.layers(), mask.layers());
}

#[test]
fn png_load_builds_stack_from_2d() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gt.png");

    hyperspec_core::io::write_label_map(&path, &make_map()).unwrap();

    let mask = Mask::load(&path, None).unwrap();
    assert_eq!(mask.n_classes(), 4);
    assert_eq!(mask.get_2d(), make_map());
}

#[test]
fn load_rejects_non_contiguous_labels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gt.npy");

    // Class 1 missing: 2D validation must fail the load.
    let map = array![[0u8, 2], [2, 0]];
    hyperspec_core::io::write_label_map(&path, &map).unwrap();

    assert!(matches!(
        Mask::load(&path, None),
        Err(Error::InvalidMask(_))
    ));
}

#[test]
fn load_resets_class_descriptions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mask.npy");

    let labels = (0..4).map(|k| (k, format!("class_{k}"))).collect();
    let mask = Mask::from_label_map(&make_map()).unwrap().with_labels(labels);
    mask.save(&path, None).unwrap();

    // Descriptions travel through the sidecar, never the array file.
    let loaded = Mask::load(&path, None).unwrap();
    assert!(loaded.label_class().is_empty());
}

#[test]
fn unknown_extension_fails() {
    assert!(matches!(
        Mask::load("mask.tif", None),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[cfg(feature = "hdf5")]
#[test]
fn h5_round_trip_with_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mask.h5");

    let mask = Mask::from_label_map(&make_map()).unwrap();
    mask.save(&path, Some("mask")).unwrap();

    let loaded = Mask::load(&path, Some("mask")).unwrap();
    assert_eq!(loaded.get_2d(), make_map());
}
