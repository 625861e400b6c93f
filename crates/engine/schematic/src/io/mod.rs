// Input/Output: voxel file formats

pub mod binvox;
pub mod qb;
pub mod schematic;
pub mod vox;

// Re-export main functions
pub use binvox::{load_binvox, parse_binvox};
pub use qb::{load_qb, parse_qb};
pub use schematic::{load_schematic, parse_schematic};
pub use vox::{load_vox, save_vox, serialize_vox};
