//! Extension lookup and per-format converters

use crate::config::{ConversionOptions, Settings};
use crate::error::{ConvertError, Result};
use crate::grid::VoxelGrid;
use crate::io::{load_binvox, load_qb, load_schematic, load_vox};
use crate::parser::PointCloudFormat;
use crate::voxelize::{ImageVoxelizer, PointCloudVoxelizer};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Input categories recognized by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PointCloud(PointCloudFormat),
    Image,
    Vox,
    Qubicle,
    Binvox,
    Schematic,
    /// Recognized but always rejected
    Mesh,
}

impl FileKind {
    /// Look up a path's extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let kind = match ext {
            "csv" => FileKind::PointCloud(PointCloudFormat::Csv),
            "ply" => FileKind::PointCloud(PointCloudFormat::Ply),
            "xyz" => FileKind::PointCloud(PointCloudFormat::Xyz),
            "asc" => FileKind::PointCloud(PointCloudFormat::Asc),
            "png" | "tif" | "tiff" => FileKind::Image,
            "vox" => FileKind::Vox,
            "qb" => FileKind::Qubicle,
            "binvox" => FileKind::Binvox,
            "schematic" => FileKind::Schematic,
            "obj" | "fbx" => FileKind::Mesh,
            _ => return None,
        };
        Some(kind)
    }
}

/// One input file with the options its format needs
#[derive(Debug, Clone, PartialEq)]
pub enum Converter {
    PointCloud {
        path: PathBuf,
        format: PointCloudFormat,
        voxelizer: PointCloudVoxelizer,
    },
    Image {
        path: PathBuf,
        voxelizer: ImageVoxelizer,
    },
    Vox(PathBuf),
    Qubicle(PathBuf),
    Binvox(PathBuf),
    /// Pass-through that honors `excavate` like heightmaps do
    Schematic { path: PathBuf, excavate: bool },
}

impl Converter {
    /// Pick the converter for `path`
    ///
    /// Unknown extensions and mesh formats fail here, before any file is read.
    pub fn new(path: &Path, options: &ConversionOptions) -> Result<Self> {
        let kind = FileKind::from_path(path)
            .ok_or_else(|| ConvertError::UnsupportedExtension(path.to_path_buf()))?;
        let path = path.to_path_buf();

        let converter = match kind {
            FileKind::PointCloud(format) => Converter::PointCloud {
                path,
                format,
                voxelizer: PointCloudVoxelizer::from_options(options),
            },
            FileKind::Image => Converter::Image {
                path,
                voxelizer: ImageVoxelizer::from_options(options),
            },
            FileKind::Vox => Converter::Vox(path),
            FileKind::Qubicle => Converter::Qubicle(path),
            FileKind::Binvox => Converter::Binvox(path),
            FileKind::Schematic => Converter::Schematic {
                path,
                excavate: options.excavate,
            },
            FileKind::Mesh => return Err(ConvertError::MeshFormat(path)),
        };
        Ok(converter)
    }

    pub fn path(&self) -> &Path {
        match self {
            Converter::PointCloud { path, .. }
            | Converter::Image { path, .. }
            | Converter::Schematic { path, .. } => path,
            Converter::Vox(path) | Converter::Qubicle(path) | Converter::Binvox(path) => path,
        }
    }

    /// Read the input and build its grid
    pub fn convert(&self, settings: &Settings) -> Result<VoxelGrid> {
        debug!("Converting {} as {}", self.path().display(), self.kind_name());
        match self {
            Converter::PointCloud {
                path,
                format,
                voxelizer,
            } => {
                let samples = format.parse_file(path)?;
                Ok(voxelizer.voxelize(&samples, settings))
            }
            Converter::Image { path, voxelizer } => voxelizer.voxelize_file(path, settings),
            Converter::Vox(path) => load_vox(path, settings),
            Converter::Qubicle(path) => load_qb(path, settings),
            Converter::Binvox(path) => load_binvox(path, settings),
            Converter::Schematic { path, excavate } => {
                let mut grid = load_schematic(path, settings)?;
                if *excavate {
                    let removed = grid.excavate();
                    debug!("Excavated {} interior voxels", removed);
                }
                Ok(grid)
            }
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Converter::PointCloud { .. } => "point cloud",
            Converter::Image { .. } => "heightmap",
            Converter::Vox(_) => "vox",
            Converter::Qubicle(_) => "qubicle",
            Converter::Binvox(_) => "binvox",
            Converter::Schematic { .. } => "schematic",
        }
    }
}
