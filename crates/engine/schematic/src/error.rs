//! Error types for configuration and per-file conversion

use std::path::PathBuf;
use thiserror::Error;

/// Message returned for mesh inputs, which this tool does not voxelize
pub const MESH_REDIRECT_MESSAGE: &str =
    "Voxelization of 3D models (.obj, .fbx) is not done by voxport. \
     Use a dedicated mesh voxelizer such as MeshToVox and convert its .vox output instead";

/// Fatal configuration errors, raised before any file is processed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required option: --input")]
    MissingInput,

    #[error("Missing required option: --output")]
    MissingOutput,

    #[error("--grid-size must be between {min} and {max} (got {value})")]
    GridSize { value: f32, min: f32, max: f32 },

    #[error("--heightmap must be at least 1 (got {0})")]
    HeightMultiplier(i64),

    #[error("--color-limit must be between 0 and 256 (got {0})")]
    ColorLimit(i64),

    #[error("--chunk-size must be between 11 and 256 (got {0})")]
    ChunkSize(i64),

    #[error("Cannot load palette {path}: {reason}")]
    Palette { path: PathBuf, reason: String },

    #[error("Cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-file conversion errors; one of these marks a single input as failed
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Cannot process empty path")]
    EmptyPath,

    #[error("File not found at: {0}")]
    NotFound(PathBuf),

    #[error("File extension not supported: {0}")]
    UnsupportedExtension(PathBuf),

    #[error("{msg} ({0})", msg = MESH_REDIRECT_MESSAGE)]
    MeshFormat(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Vox error: {0}")]
    Vox(String),

    #[error("The color path is invalid: {0}")]
    ColorFileNotFound(PathBuf),

    #[error("Color image is {color_width}x{color_height} but heightmap is {width}x{height}")]
    ColorImageMismatch {
        width: u32,
        height: u32,
        color_width: u32,
        color_height: u32,
    },

    #[error(
        "Model is too big ({width}x{length}x{height}); \
         MagicaVoxel can't support models bigger than {max_width}x{max_length}x{max_height}"
    )]
    GridTooLarge {
        width: u32,
        length: u32,
        height: u32,
        max_width: u32,
        max_length: u32,
        max_height: u32,
    },

    #[error("Converter panicked: {0}")]
    Panicked(String),
}

/// Result type alias for conversion operations that may fail
pub type Result<T> = std::result::Result<T, ConvertError>;
