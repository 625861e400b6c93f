//! Sparse voxel grid
//!
//! The grid is the intermediate representation every converter produces and the
//! exporter consumes. Voxels are stored in cubic chunks keyed by chunk index;
//! chunks only exist to bound model sizes at export and to keep iteration local.
//! The `y` axis is vertical.

mod excavate;

use crate::color::Color;
use crate::config::Settings;
use glam::UVec3;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Integer voxel position, all components non-negative
pub type VoxelCoord = UVec3;

/// One cubic storage partition of a [`VoxelGrid`]
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    origin: UVec3,
    voxels: HashMap<VoxelCoord, Color>,
}

impl Chunk {
    fn new(origin: UVec3) -> Self {
        Self {
            origin,
            voxels: HashMap::new(),
        }
    }

    /// Grid coordinate of the chunk's minimum corner
    pub fn origin(&self) -> UVec3 {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Voxels of this chunk in grid coordinates, unordered
    pub fn iter(&self) -> impl Iterator<Item = (VoxelCoord, Color)> + '_ {
        self.voxels.iter().map(|(c, color)| (*c, *color))
    }

    /// Voxels ordered by (x, y, z)
    pub fn sorted_voxels(&self) -> Vec<(VoxelCoord, Color)> {
        let mut voxels: Vec<_> = self.iter().collect();
        voxels.sort_by_key(|(c, _)| c.to_array());
        voxels
    }

    /// Tight bounds (min, max inclusive) of the occupied voxels
    pub fn bounds(&self) -> Option<(UVec3, UVec3)> {
        let mut iter = self.voxels.keys();
        let first = *iter.next()?;
        Some(iter.fold((first, first), |(min, max), c| (min.min(*c), max.max(*c))))
    }
}

/// Sparse mapping from voxel coordinate to color
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    chunk_size: u32,
    chunks: BTreeMap<[u32; 3], Chunk>,
    len: usize,
    max: Option<UVec3>,
}

impl VoxelGrid {
    /// Create an empty grid with the given chunk edge length
    pub fn new(chunk_size: u32) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunks: BTreeMap::new(),
            len: 0,
            max: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.chunk_size)
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    fn chunk_key(&self, coord: VoxelCoord) -> [u32; 3] {
        (coord / self.chunk_size).to_array()
    }

    /// Set the color at `coord`, returning the color it replaced
    ///
    /// Later writes win: a second insert at an occupied coordinate overwrites it.
    pub fn insert(&mut self, coord: VoxelCoord, color: Color) -> Option<Color> {
        let key = self.chunk_key(coord);
        let chunk_size = self.chunk_size;
        let chunk = self
            .chunks
            .entry(key)
            .or_insert_with(|| Chunk::new(UVec3::from_array(key) * chunk_size));
        let previous = chunk.voxels.insert(coord, color);
        if previous.is_none() {
            self.len += 1;
            self.max = Some(self.max.map_or(coord, |m| m.max(coord)));
        }
        previous
    }

    pub fn get(&self, coord: VoxelCoord) -> Option<Color> {
        self.chunks
            .get(&self.chunk_key(coord))
            .and_then(|chunk| chunk.voxels.get(&coord).copied())
    }

    pub fn contains(&self, coord: VoxelCoord) -> bool {
        self.get(coord).is_some()
    }

    pub fn remove(&mut self, coord: VoxelCoord) -> Option<Color> {
        let key = self.chunk_key(coord);
        let chunk = self.chunks.get_mut(&key)?;
        let removed = chunk.voxels.remove(&coord)?;
        if chunk.is_empty() {
            self.chunks.remove(&key);
        }
        self.len -= 1;
        if let Some(max) = self.max {
            if coord.x == max.x || coord.y == max.y || coord.z == max.z {
                self.recompute_bounds();
            }
        }
        Some(removed)
    }

    fn recompute_bounds(&mut self) {
        self.max = self
            .chunks
            .values()
            .filter_map(Chunk::bounds)
            .map(|(_, max)| max)
            .reduce(|a, b| a.max(b));
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extent along x: maximum x + 1, or 0 when empty
    pub fn width(&self) -> u32 {
        self.dimensions().x
    }

    /// Extent along y (vertical): maximum y + 1, or 0 when empty
    pub fn height(&self) -> u32 {
        self.dimensions().y
    }

    /// Extent along z: maximum z + 1, or 0 when empty
    pub fn length(&self) -> u32 {
        self.dimensions().z
    }

    /// (width, height, length)
    pub fn dimensions(&self) -> UVec3 {
        self.max.map_or(UVec3::ZERO, |m| m + UVec3::ONE)
    }

    /// Non-empty chunks in chunk-index order
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// All voxels, grouped by chunk
    pub fn iter(&self) -> impl Iterator<Item = (VoxelCoord, Color)> + '_ {
        self.chunks.values().flat_map(Chunk::iter)
    }

    /// All voxels ordered by (x, y, z)
    pub fn sorted_voxels(&self) -> Vec<(VoxelCoord, Color)> {
        let mut voxels: Vec<_> = self.iter().collect();
        voxels.sort_by_key(|(c, _)| c.to_array());
        voxels
    }

    pub fn distinct_colors(&self) -> BTreeSet<Color> {
        self.iter().map(|(_, color)| color).collect()
    }

    /// Replace every voxel color with `f(color)`
    pub fn map_colors<F>(&mut self, mut f: F)
    where
        F: FnMut(Color) -> Color,
    {
        for chunk in self.chunks.values_mut() {
            for color in chunk.voxels.values_mut() {
                *color = f(*color);
            }
        }
    }
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_grid() {
        let grid = VoxelGrid::new(16);
        assert!(grid.is_empty());
        assert_eq!(grid.dimensions(), UVec3::ZERO);
        assert_eq!(grid.chunk_count(), 0);
    }

    #[test]
    fn test_dimensions_are_max_plus_one() {
        let mut grid = VoxelGrid::new(16);
        grid.insert(UVec3::new(3, 0, 1), Color::WHITE);
        grid.insert(UVec3::new(0, 7, 0), Color::WHITE);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 8);
        assert_eq!(grid.length(), 2);
    }

    #[test]
    fn test_last_write_wins() {
        let mut grid = VoxelGrid::new(16);
        let c = UVec3::new(1, 1, 1);
        assert_eq!(grid.insert(c, Color::WHITE), None);
        assert_eq!(grid.insert(c, Color::BLACK), Some(Color::WHITE));
        assert_eq!(grid.get(c), Some(Color::BLACK));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_chunk_partitioning() {
        let mut grid = VoxelGrid::new(11);
        grid.insert(UVec3::new(0, 0, 0), Color::WHITE);
        grid.insert(UVec3::new(10, 10, 10), Color::WHITE);
        grid.insert(UVec3::new(11, 0, 0), Color::WHITE);
        grid.insert(UVec3::new(0, 0, 22), Color::WHITE);
        assert_eq!(grid.chunk_count(), 3);

        let origins: Vec<UVec3> = grid.chunks().map(Chunk::origin).collect();
        assert_eq!(
            origins,
            vec![UVec3::new(0, 0, 0), UVec3::new(0, 0, 22), UVec3::new(11, 0, 0)]
        );
    }

    #[test]
    fn test_remove_updates_bounds() {
        let mut grid = VoxelGrid::new(16);
        grid.insert(UVec3::new(1, 0, 0), Color::WHITE);
        grid.insert(UVec3::new(40, 2, 3), Color::WHITE);
        assert_eq!(grid.width(), 41);

        assert_eq!(grid.remove(UVec3::new(40, 2, 3)), Some(Color::WHITE));
        assert_eq!(grid.dimensions(), UVec3::new(2, 1, 1));
        assert_eq!(grid.chunk_count(), 1);

        grid.remove(UVec3::new(1, 0, 0));
        assert!(grid.is_empty());
        assert_eq!(grid.dimensions(), UVec3::ZERO);
    }

    #[test]
    fn test_map_colors_and_distinct() {
        let mut grid = VoxelGrid::new(16);
        grid.insert(UVec3::new(0, 0, 0), Color::new(10, 0, 0));
        grid.insert(UVec3::new(1, 0, 0), Color::new(20, 0, 0));
        assert_eq!(grid.distinct_colors().len(), 2);

        grid.map_colors(|_| Color::WHITE);
        assert_eq!(grid.distinct_colors().len(), 1);
    }

    #[test]
    fn test_sorted_voxels() {
        let mut grid = VoxelGrid::new(16);
        grid.insert(UVec3::new(20, 0, 0), Color::WHITE);
        grid.insert(UVec3::new(0, 1, 0), Color::BLACK);
        grid.insert(UVec3::new(0, 0, 5), Color::BLACK);
        let coords: Vec<UVec3> = grid.sorted_voxels().into_iter().map(|(c, _)| c).collect();
        assert_eq!(
            coords,
            vec![UVec3::new(0, 0, 5), UVec3::new(0, 1, 0), UVec3::new(20, 0, 0)]
        );
    }
}
