// MagicaVoxel .vox reading and writing

pub mod loader;
pub mod writer;

pub use loader::{load_vox, load_vox_bytes};
pub use writer::{build_vox, save_vox, serialize_vox, VOX_VERSION};
