//! World size limits checked before export

use crate::config::{MAX_WORLD_HEIGHT, MAX_WORLD_LENGTH, MAX_WORLD_WIDTH};
use crate::error::{ConvertError, Result};
use crate::grid::VoxelGrid;

/// Reject grids MagicaVoxel can't hold; nothing is clipped
pub fn validate(grid: &VoxelGrid) -> Result<()> {
    check_extent(
        grid.width() as u64,
        grid.height() as u64,
        grid.length() as u64,
    )
}

/// Reject a declared model extent before any of its voxels are expanded
pub fn check_extent(width: u64, height: u64, length: u64) -> Result<()> {
    if width > MAX_WORLD_WIDTH as u64
        || length > MAX_WORLD_LENGTH as u64
        || height > MAX_WORLD_HEIGHT as u64
    {
        let narrow = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);
        return Err(ConvertError::GridTooLarge {
            width: narrow(width),
            length: narrow(length),
            height: narrow(height),
            max_width: MAX_WORLD_WIDTH,
            max_length: MAX_WORLD_LENGTH,
            max_height: MAX_WORLD_HEIGHT,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use glam::UVec3;

    fn grid_with(coord: UVec3) -> VoxelGrid {
        let mut grid = VoxelGrid::new(128);
        grid.insert(coord, Color::WHITE);
        grid
    }

    #[test]
    fn test_limits() {
        assert!(validate(&VoxelGrid::new(128)).is_ok());
        assert!(validate(&grid_with(UVec3::new(1999, 999, 1999))).is_ok());
        assert!(validate(&grid_with(UVec3::new(2000, 0, 0))).is_err());
        assert!(validate(&grid_with(UVec3::new(0, 1000, 0))).is_err());
        assert!(validate(&grid_with(UVec3::new(0, 0, 2000))).is_err());
    }

    #[test]
    fn test_error_reports_dimensions() {
        let err = validate(&grid_with(UVec3::new(2000, 0, 0))).unwrap_err();
        match err {
            ConvertError::GridTooLarge { width, height, .. } => {
                assert_eq!(width, 2001);
                assert_eq!(height, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_extent_limits() {
        assert!(check_extent(2000, 1000, 2000).is_ok());
        assert!(check_extent(2001, 1, 1).is_err());
        match check_extent(u64::MAX, 1, 1) {
            Err(ConvertError::GridTooLarge { width, .. }) => assert_eq!(width, u32::MAX),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
