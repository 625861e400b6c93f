//! Output palette remapping and `.vox` persistence

use crate::error::{ConfigError, Result};
use crate::grid::VoxelGrid;
use crate::io::save_vox;
use crate::palette::Palette;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes validated grids into the output directory
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    palette: Option<Palette>,
}

impl Exporter {
    /// Create the output directory and load the fixed palette, if any
    pub fn new(
        output_dir: &Path,
        palette_path: Option<&Path>,
    ) -> std::result::Result<Self, ConfigError> {
        std::fs::create_dir_all(output_dir).map_err(|source| ConfigError::OutputDirectory {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let palette = palette_path
            .map(|path| {
                Palette::from_image_path(path).map_err(|reason| ConfigError::Palette {
                    path: path.to_path_buf(),
                    reason,
                })
            })
            .transpose()?;
        if let Some(palette) = &palette {
            info!("Loaded palette with {} colors", palette.len());
        }

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            palette,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// `<output_dir>/<input stem>.vox`
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
        name.push(".vox");
        self.output_dir.join(name)
    }

    /// Remap to the fixed palette (if any) and write the grid
    pub fn export(&self, input: &Path, mut grid: VoxelGrid) -> Result<PathBuf> {
        if let Some(palette) = &self.palette {
            palette.remap_grid(&mut grid);
        }
        let path = self.output_path(input);
        save_vox(&path, &grid, self.palette.as_ref())?;
        info!("[DONE] {} -> {}", input.display(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::config::Settings;
    use crate::io::load_vox;
    use glam::UVec3;

    #[test]
    fn test_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), None).unwrap();
        assert_eq!(
            exporter.output_path(Path::new("/data/scan.v2.csv")),
            dir.path().join("scan.v2.vox")
        );
    }

    #[test]
    fn test_creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        Exporter::new(&out, None).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn test_missing_palette_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Exporter::new(dir.path(), Some(&dir.path().join("missing.png"))).unwrap_err();
        assert!(matches!(err, ConfigError::Palette { .. }));
    }

    #[test]
    fn test_export_with_palette() {
        let dir = tempfile::tempdir().unwrap();
        let palette_path = dir.path().join("palette.png");
        let mut img = image::RgbImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgb([0, 0, 0]));
        img.put_pixel(1, 0, image::Rgb([250, 250, 250]));
        img.save(&palette_path).unwrap();

        let exporter = Exporter::new(dir.path(), Some(&palette_path)).unwrap();
        let mut grid = VoxelGrid::new(16);
        grid.insert(UVec3::ZERO, Color::gray(20));
        grid.insert(UVec3::X, Color::gray(200));

        let path = exporter.export(Path::new("input.png"), grid).unwrap();
        let loaded = load_vox(&path, &Settings::default()).unwrap();
        assert_eq!(loaded.get(UVec3::ZERO), Some(Color::BLACK));
        assert_eq!(loaded.get(UVec3::X), Some(Color::gray(250)));
    }
}
