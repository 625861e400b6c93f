//! Heightmap rasters to voxel grids
//!
//! Each opaque pixel becomes a column standing on the `y = 0` plane. The
//! column height follows the pixel's luma scaled by the height multiplier, so
//! with the default multiplier of 1 the image is a flat layer one voxel thick.

use super::apply_color_limit;
use crate::color::Color;
use crate::config::{ConversionOptions, Settings, MAX_WORLD_HEIGHT};
use crate::error::{ConvertError, Result};
use crate::grid::VoxelGrid;
use crate::palette::{Palette, GRAY_RAMP_LEVELS};
use ::image::{RgbImage, RgbaImage};
use glam::UVec3;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageVoxelizer {
    height_multiplier: u32,
    excavate: bool,
    /// Secondary color raster; only set when color extraction is enabled
    color_path: Option<PathBuf>,
    color_limit: Option<usize>,
}

impl ImageVoxelizer {
    pub fn from_options(options: &ConversionOptions) -> Self {
        Self {
            height_multiplier: options.height_multiplier.max(1),
            excavate: options.excavate,
            color_path: options
                .color_path
                .clone()
                .filter(|_| options.color),
            color_limit: options.effective_color_limit(),
        }
    }

    /// Decode the heightmap (and color raster, if any) and voxelize it
    pub fn voxelize_file(&self, path: &Path, settings: &Settings) -> Result<VoxelGrid> {
        let heightmap = ::image::open(path)?.to_rgba8();

        let colors = match &self.color_path {
            Some(color_path) => {
                if !color_path.is_file() {
                    return Err(ConvertError::ColorFileNotFound(color_path.clone()));
                }
                Some(::image::open(color_path)?.to_rgb8())
            }
            None => None,
        };

        self.voxelize(&heightmap, colors.as_ref(), settings)
    }

    /// Voxelize decoded rasters
    ///
    /// `colors` must match the heightmap's dimensions.
    pub fn voxelize(
        &self,
        heightmap: &RgbaImage,
        colors: Option<&RgbImage>,
        settings: &Settings,
    ) -> Result<VoxelGrid> {
        let (width, height) = heightmap.dimensions();
        if let Some(colors) = colors {
            if colors.dimensions() != (width, height) {
                return Err(ConvertError::ColorImageMismatch {
                    width,
                    height,
                    color_width: colors.width(),
                    color_height: colors.height(),
                });
            }
        }

        let ramp = Palette::gray_ramp(GRAY_RAMP_LEVELS);
        let mut grid = VoxelGrid::from_settings(settings);

        for (x, z, pixel) in heightmap.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                continue;
            }
            let luma = Color::new(r, g, b).luma();
            let color = match colors {
                Some(colors) => Color::from(colors.get_pixel(x, z).0),
                None => ramp.nearest(&Color::gray(luma)),
            };

            for y in 0..self.column_height(luma) {
                grid.insert(UVec3::new(x, y, z), color);
            }
        }
        debug!(
            "Heightmap {}x{} produced {} voxels",
            width,
            height,
            grid.len()
        );

        if self.excavate {
            let removed = grid.excavate();
            debug!("Excavation removed {} interior voxels", removed);
        }
        apply_color_limit(&mut grid, self.color_limit);
        Ok(grid)
    }

    /// `max(1, ceil(luma * multiplier / 255))`
    ///
    /// Columns stop one voxel above the world height limit; taller grids are
    /// rejected by validation anyway.
    fn column_height(&self, luma: u8) -> u32 {
        let scaled = (luma as u64 * self.height_multiplier as u64).div_ceil(255);
        scaled.clamp(1, MAX_WORLD_HEIGHT as u64 + 1) as u32
    }
}
