//! Mask data model: 2D label maps and 3D binary layer stacks

pub mod convert;
mod store;

pub use convert::{MAX_LAYERS, layers_to_map, map_to_layers};
pub use store::Mask;
