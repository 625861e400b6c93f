//! Sample and raster voxelization

pub mod image;
pub mod point_cloud;

pub use self::image::ImageVoxelizer;
pub use self::point_cloud::PointCloudVoxelizer;

use crate::grid::VoxelGrid;
use crate::palette::reduce_grid_colors;
use tracing::debug;

/// Enforce an optional color limit on a freshly built grid
pub(crate) fn apply_color_limit(grid: &mut VoxelGrid, color_limit: Option<usize>) {
    let Some(limit) = color_limit else {
        return;
    };
    let before = grid.distinct_colors().len();
    if before > limit {
        let after = reduce_grid_colors(grid, limit);
        debug!("Color limit {}: {} colors reduced to {}", limit, before, after);
    }
}
