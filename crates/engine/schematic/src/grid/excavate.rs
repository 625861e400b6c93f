use super::{VoxelCoord, VoxelGrid};
use glam::IVec3;

const FACE_NEIGHBOURS: [IVec3; 6] = [
    IVec3::new(1, 0, 0),
    IVec3::new(-1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, -1),
];

impl VoxelGrid {
    /// Whether all six face-adjacent neighbours of `coord` are occupied
    pub fn is_enclosed(&self, coord: VoxelCoord) -> bool {
        let pos = coord.as_ivec3();
        FACE_NEIGHBOURS.iter().all(|dir| {
            let n = pos + *dir;
            n.min_element() >= 0 && self.contains(n.as_uvec3())
        })
    }

    /// Remove every voxel that has no face exposed to air
    ///
    /// Enclosure is decided on the grid as it was before the pass, so removing one
    /// interior voxel never exposes (and removes) another. Returns the number of
    /// voxels dropped. The bounding dimensions are unchanged since a voxel on the
    /// maximum face of an axis always has an empty neighbour beyond it.
    pub fn excavate(&mut self) -> usize {
        let interior: Vec<VoxelCoord> = self
            .iter()
            .map(|(c, _)| c)
            .filter(|c| self.is_enclosed(*c))
            .collect();

        for coord in &interior {
            self.remove(*coord);
        }
        interior.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::color::Color;
    use crate::grid::VoxelGrid;
    use glam::UVec3;

    fn solid_cube(size: u32) -> VoxelGrid {
        let mut grid = VoxelGrid::new(16);
        for x in 0..size {
            for y in 0..size {
                for z in 0..size {
                    grid.insert(UVec3::new(x, y, z), Color::WHITE);
                }
            }
        }
        grid
    }

    #[test]
    fn test_excavate_hollows_cube() {
        let mut grid = solid_cube(3);
        assert_eq!(grid.excavate(), 1);
        assert_eq!(grid.len(), 26);
        assert!(!grid.contains(UVec3::ONE));
        assert_eq!(grid.dimensions(), UVec3::splat(3));
    }

    #[test]
    fn test_excavate_does_not_cascade() {
        let mut grid = solid_cube(5);
        // 3x3x3 interior block is enclosed in the original grid
        assert_eq!(grid.excavate(), 27);
        assert_eq!(grid.len(), 125 - 27);
    }

    #[test]
    fn test_boundary_voxels_survive() {
        let mut grid = VoxelGrid::new(16);
        grid.insert(UVec3::ZERO, Color::WHITE);
        grid.insert(UVec3::X, Color::WHITE);
        assert_eq!(grid.excavate(), 0);
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_is_enclosed_at_origin() {
        let grid = solid_cube(2);
        assert!(!grid.is_enclosed(UVec3::ZERO));
    }
}
