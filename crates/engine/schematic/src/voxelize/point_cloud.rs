//! Point cloud to voxel grid
//!
//! Samples are normalized into the grid with a single uniform scale taken from
//! the longest axis of their bounding box:
//!
//! ```text
//! longest = max(max - min)            (1 when every sample shares a position)
//! scale   = grid_size / longest
//! coord   = floor((p - min) * scale)  clamped to [0, ceil(grid_size) - 1]
//! ```
//!
//! The longest axis spans `ceil(grid_size)` voxels and the other axes keep the
//! cloud's aspect ratio. When several samples land in one voxel the last one
//! in input order wins.

use super::apply_color_limit;
use crate::config::{ConversionOptions, Settings};
use crate::grid::{VoxelCoord, VoxelGrid};
use crate::sample::SampleSet;
use glam::Vec3;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCloudVoxelizer {
    grid_size: f32,
    color_limit: Option<usize>,
}

impl PointCloudVoxelizer {
    pub fn new(grid_size: f32, color_limit: Option<usize>) -> Self {
        Self {
            grid_size,
            color_limit,
        }
    }

    pub fn from_options(options: &ConversionOptions) -> Self {
        Self::new(options.grid_size, options.effective_color_limit())
    }

    /// Build a grid from the samples, applying the color limit afterwards
    pub fn voxelize(&self, set: &SampleSet, settings: &Settings) -> VoxelGrid {
        let mut grid = VoxelGrid::from_settings(settings);
        let Some((min, max)) = set.bounds() else {
            return grid;
        };

        let quantizer = Quantizer::new(min, max, self.grid_size);
        let mut collisions = 0usize;
        for sample in &set.samples {
            if grid
                .insert(quantizer.coord(sample.position), sample.color)
                .is_some()
            {
                collisions += 1;
            }
        }
        debug!(
            "Voxelized {} samples into {} voxels ({} collisions, scale {:.4})",
            set.len(),
            grid.len(),
            collisions,
            quantizer.scale
        );

        apply_color_limit(&mut grid, self.color_limit);
        grid
    }
}

/// Maps world positions into voxel coordinates
#[derive(Debug, Clone, Copy)]
struct Quantizer {
    min: Vec3,
    scale: f32,
    max_index: f32,
}

impl Quantizer {
    fn new(min: Vec3, max: Vec3, grid_size: f32) -> Self {
        let longest = (max - min).max_element();
        let longest = if longest > 0.0 { longest } else { 1.0 };
        let cells = grid_size.ceil().max(1.0);
        Self {
            min,
            scale: grid_size / longest,
            max_index: cells - 1.0,
        }
    }

    fn coord(&self, position: Vec3) -> VoxelCoord {
        ((position - self.min) * self.scale)
            .floor()
            .clamp(Vec3::ZERO, Vec3::splat(self.max_index))
            .as_uvec3()
    }
}
