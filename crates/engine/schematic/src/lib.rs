//! Conversion core for voxport
//!
//! This crate turns spatial data files into MagicaVoxel `.vox` models. Every
//! input goes through the same pipeline: a format-specific converter builds a
//! sparse [`VoxelGrid`], the grid is checked against the world size limits, and
//! the exporter writes it next to its siblings in the output directory.
//!
//! # Features
//!
//! - **Point clouds**: CSV, PLY (ASCII and binary), XYZ and ASC (including ESRI
//!   elevation grids), normalized into the grid with a uniform scale
//! - **Heightmaps**: PNG and TIFF rasters, with an optional color raster
//! - **Legacy voxels**: `.vox`, Qubicle `.qb`, `.binvox` and MCEdit
//!   `.schematic` pass-through
//! - **Color reduction**: median cut quantization to a color limit, or
//!   remapping to a fixed palette image
//! - **Batches**: files and directories converted independently, with
//!   per-file outcomes instead of aborting on the first error
//!
//! # Example
//!
//! ```no_run
//! use schematic::{Batch, ConversionOptions, Settings};
//! use std::path::Path;
//!
//! let batch = Batch::new(ConversionOptions::default(), Settings::default(), Path::new("out"))?;
//! let report = batch.run(&["scans/cloud.csv", "heightmaps"]);
//! println!("all converted: {}", report.success());
//! # Ok::<(), schematic::ConfigError>(())
//! ```

pub mod batch;
pub mod color;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod grid;
pub mod io;
pub mod palette;
pub mod parser;
pub mod sample;
pub mod validate;
pub mod voxelize;

pub use batch::{Batch, BatchReport, FileOutcome};
pub use color::Color;
pub use config::{ConversionOptions, RawOptions, RunConfig, Settings};
pub use dispatch::{Converter, FileKind};
pub use error::{ConfigError, ConvertError, Result};
pub use export::Exporter;
pub use grid::{VoxelCoord, VoxelGrid};
pub use palette::Palette;
pub use parser::PointCloudFormat;
pub use sample::{Sample, SampleSet};
pub use validate::validate;
pub use voxelize::{ImageVoxelizer, PointCloudVoxelizer};
