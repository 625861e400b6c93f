//! Color palettes: fixed output palettes, the heightmap gray ramp, and
//! nearest-color remapping

pub mod quantizer;

pub use quantizer::{quantize_colors, reduce_grid_colors};

use crate::color::Color;
use crate::grid::VoxelGrid;
use std::collections::HashMap;
use std::path::Path;

/// Most colors a `.vox` palette can address (index 0 is reserved for air)
pub const MAX_VOX_COLORS: usize = 255;

/// Number of gray levels in the default heightmap palette
pub const GRAY_RAMP_LEVELS: usize = 32;

/// Ordered list of colors
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    /// Evenly spaced grays from black to white
    pub fn gray_ramp(levels: usize) -> Self {
        let levels = levels.clamp(2, 256);
        let colors = (0..levels)
            .map(|i| Color::gray(((i * 255 + (levels - 1) / 2) / (levels - 1)) as u8))
            .collect();
        Self { colors }
    }

    /// Load a palette from an image: pixels in row-major order, duplicates
    /// dropped, at most [`MAX_VOX_COLORS`] entries
    pub fn from_image_path(path: &Path) -> Result<Self, String> {
        let img = image::open(path)
            .map_err(|e| format!("Failed to open image at {}: {}", path.display(), e))?
            .to_rgb8();

        let mut colors: Vec<Color> = Vec::new();
        for pixel in img.pixels() {
            let color = Color::from(pixel.0);
            if !colors.contains(&color) {
                colors.push(color);
            }
            if colors.len() == MAX_VOX_COLORS {
                break;
            }
        }

        if colors.is_empty() {
            return Err(format!("Palette image {} has no pixels", path.display()));
        }
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of the palette entry closest to `color` (0 for an empty palette)
    pub fn nearest_index(&self, color: &Color) -> usize {
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| p.distance_squared(color))
            .map_or(0, |(i, _)| i)
    }

    /// Palette entry closest to `color`, or the color itself for an empty palette
    pub fn nearest(&self, color: &Color) -> Color {
        self.colors
            .get(self.nearest_index(color))
            .copied()
            .unwrap_or(*color)
    }

    /// Replace every voxel color with its nearest palette entry
    pub fn remap_grid(&self, grid: &mut VoxelGrid) {
        if self.colors.is_empty() {
            return;
        }
        let mut cache: HashMap<Color, Color> = HashMap::new();
        grid.map_colors(|c| *cache.entry(c).or_insert_with(|| self.nearest(&c)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    #[test]
    fn test_palette_nearest() {
        let palette = Palette::new(vec![
            Color::new(255, 0, 0),
            Color::new(0, 255, 0),
            Color::new(0, 0, 255),
        ]);

        assert_eq!(palette.nearest_index(&Color::new(230, 25, 25)), 0);
        assert_eq!(palette.nearest_index(&Color::new(25, 230, 25)), 1);
        assert_eq!(palette.nearest_index(&Color::new(25, 25, 230)), 2);
        assert_eq!(palette.nearest(&Color::new(1, 1, 200)), Color::new(0, 0, 255));
    }

    #[test]
    fn test_empty_palette() {
        let palette = Palette::default();
        assert_eq!(palette.nearest_index(&Color::WHITE), 0);
        assert_eq!(palette.nearest(&Color::WHITE), Color::WHITE);
    }

    #[test]
    fn test_gray_ramp() {
        let ramp = Palette::gray_ramp(GRAY_RAMP_LEVELS);
        assert_eq!(ramp.len(), 32);
        assert_eq!(ramp.colors()[0], Color::BLACK);
        assert_eq!(ramp.colors()[31], Color::WHITE);
        assert_eq!(ramp.nearest(&Color::gray(250)), Color::WHITE);
    }

    #[test]
    fn test_remap_grid() {
        let palette = Palette::new(vec![Color::BLACK, Color::WHITE]);
        let mut grid = VoxelGrid::new(16);
        grid.insert(UVec3::ZERO, Color::gray(30));
        grid.insert(UVec3::X, Color::gray(220));
        palette.remap_grid(&mut grid);
        assert_eq!(grid.get(UVec3::ZERO), Some(Color::BLACK));
        assert_eq!(grid.get(UVec3::X), Some(Color::WHITE));
    }

    #[test]
    fn test_from_image_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.png");
        let mut img = image::RgbImage::new(3, 1);
        img.put_pixel(0, 0, image::Rgb([10, 20, 30]));
        img.put_pixel(1, 0, image::Rgb([10, 20, 30]));
        img.put_pixel(2, 0, image::Rgb([200, 0, 0]));
        img.save(&path).unwrap();

        let palette = Palette::from_image_path(&path).unwrap();
        assert_eq!(
            palette.colors(),
            &[Color::new(10, 20, 30), Color::new(200, 0, 0)]
        );
    }

    #[test]
    fn test_from_missing_image() {
        assert!(Palette::from_image_path(Path::new("/nonexistent/palette.png")).is_err());
    }
}
