//! Run configuration
//!
//! Everything here is built once from command line input and is read-only for
//! the rest of the run. Components receive `&ConversionOptions` / `&Settings`
//! instead of consulting process-wide state.

use crate::error::ConfigError;
use std::path::PathBuf;
use tracing::info;

/// Largest model width (x) MagicaVoxel accepts
pub const MAX_WORLD_WIDTH: u32 = 2000;
/// Largest model length (z) MagicaVoxel accepts
pub const MAX_WORLD_LENGTH: u32 = 2000;
/// Largest model height (y) MagicaVoxel accepts
pub const MAX_WORLD_HEIGHT: u32 = 1000;

pub const MIN_GRID_SIZE: f32 = 10.0;
pub const DEFAULT_GRID_SIZE: f32 = 10.0;

pub const MAX_COLOR_LIMIT: u16 = 256;
pub const DEFAULT_COLOR_LIMIT: u16 = 256;

pub const MIN_CHUNK_SIZE: u32 = 11;
pub const MAX_CHUNK_SIZE: u32 = 256;
pub const DEFAULT_CHUNK_SIZE: u32 = 128;

pub const DEFAULT_HEIGHT_MULTIPLIER: u32 = 1;

/// Separator between entries of the `--input` list
pub const INPUT_SEPARATOR: char = ';';

/// Options that shape how each input file is converted
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Point cloud normalization scale: the longest bounding-box axis spans this many voxels
    pub grid_size: f32,
    /// Maximum number of distinct colors in the output (0 disables the limit)
    pub color_limit: u16,
    /// Drop voxels whose six neighbours are all occupied (heightmaps)
    pub excavate: bool,
    /// Take heightmap colors from the secondary color image
    pub color: bool,
    /// Secondary color image for heightmaps
    pub color_path: Option<PathBuf>,
    /// Fixed output palette image
    pub palette_path: Option<PathBuf>,
    /// Column height multiplier for heightmaps
    pub height_multiplier: u32,
    /// Skip the color-limit reduction step
    pub disable_quantization: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            color_limit: DEFAULT_COLOR_LIMIT,
            excavate: false,
            color: false,
            color_path: None,
            palette_path: None,
            height_multiplier: DEFAULT_HEIGHT_MULTIPLIER,
            disable_quantization: false,
        }
    }
}

impl ConversionOptions {
    /// Color limit to enforce, or `None` when reduction is disabled
    pub fn effective_color_limit(&self) -> Option<usize> {
        if self.disable_quantization || self.color_limit == 0 {
            None
        } else {
            Some(self.color_limit as usize)
        }
    }
}

/// Process-wide settings, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Edge length of the grid's storage chunks; also the largest exported model size
    pub chunk_size: u32,
    /// Extra diagnostics
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            debug: false,
        }
    }
}

/// Raw numeric values as they come from the command line, before range checks
#[derive(Debug, Clone, PartialEq)]
pub struct RawOptions {
    pub grid_size: f32,
    pub color_limit: i64,
    pub chunk_size: i64,
    pub height_multiplier: i64,
    pub excavate: bool,
    pub color: bool,
    pub color_path: Option<PathBuf>,
    pub palette_path: Option<PathBuf>,
    pub debug: bool,
    pub disable_quantization: bool,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            color_limit: DEFAULT_COLOR_LIMIT as i64,
            chunk_size: DEFAULT_CHUNK_SIZE as i64,
            height_multiplier: DEFAULT_HEIGHT_MULTIPLIER as i64,
            excavate: false,
            color: false,
            color_path: None,
            palette_path: None,
            debug: false,
            disable_quantization: false,
        }
    }
}

/// Validated configuration for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub inputs: Vec<String>,
    pub output_dir: PathBuf,
    pub options: ConversionOptions,
    pub settings: Settings,
}

impl RunConfig {
    /// Validate raw command line values
    ///
    /// `input` is the `;`-separated path list. Every range check happens here, so
    /// an invalid run is rejected before any file is touched.
    pub fn new(
        input: Option<&str>,
        output: Option<PathBuf>,
        raw: RawOptions,
    ) -> Result<Self, ConfigError> {
        let input = input.ok_or(ConfigError::MissingInput)?;
        let output_dir = output.ok_or(ConfigError::MissingOutput)?;

        let grid_size = validate_grid_size(raw.grid_size)?;
        let color_limit = validate_color_limit(raw.color_limit)?;
        let chunk_size = validate_chunk_size(raw.chunk_size)?;
        let height_multiplier = validate_height_multiplier(raw.height_multiplier)?;

        Ok(Self {
            inputs: split_inputs(input),
            output_dir,
            options: ConversionOptions {
                grid_size,
                color_limit,
                excavate: raw.excavate,
                color: raw.color,
                color_path: raw.color_path,
                palette_path: raw.palette_path,
                height_multiplier,
                disable_quantization: raw.disable_quantization,
            },
            settings: Settings {
                chunk_size,
                debug: raw.debug,
            },
        })
    }

    /// Log the paths and every option that differs from its default
    pub fn log_summary(&self) {
        let options = &self.options;
        info!("Specified input path: {}", self.inputs.join(";"));
        info!("Specified output path: {}", self.output_dir.display());
        if let Some(path) = &options.color_path {
            info!("Specified input color file: {}", path.display());
        }
        if let Some(path) = &options.palette_path {
            info!("Specified palette file: {}", path.display());
        }
        if options.color_limit != DEFAULT_COLOR_LIMIT {
            info!("Specified color limit: {}", options.color_limit);
        }
        if (options.grid_size - DEFAULT_GRID_SIZE).abs() > 0.0001 {
            info!("Specified grid size: {}", options.grid_size);
        }
        if self.settings.chunk_size != DEFAULT_CHUNK_SIZE {
            info!("Specified chunk size: {}", self.settings.chunk_size);
        }
        if options.excavate {
            info!("Enabled option: excavate");
        }
        if options.color {
            info!("Enabled option: color");
        }
        if options.height_multiplier != DEFAULT_HEIGHT_MULTIPLIER {
            info!("Enabled option: heightmap (value={})", options.height_multiplier);
        }
        if self.settings.debug {
            info!("Enabled option: debug");
        }
        if options.disable_quantization {
            info!("Enabled option: disable-quantization");
        }
    }
}

/// Split the `--input` list, keeping empty entries so they are reported per path
pub fn split_inputs(input: &str) -> Vec<String> {
    input
        .split(INPUT_SEPARATOR)
        .map(|s| s.trim().to_string())
        .collect()
}

pub fn validate_grid_size(value: f32) -> Result<f32, ConfigError> {
    let max = MAX_WORLD_LENGTH as f32;
    if !(MIN_GRID_SIZE..=max).contains(&value) {
        return Err(ConfigError::GridSize {
            value,
            min: MIN_GRID_SIZE,
            max,
        });
    }
    Ok(value)
}

pub fn validate_color_limit(value: i64) -> Result<u16, ConfigError> {
    if !(0..=MAX_COLOR_LIMIT as i64).contains(&value) {
        return Err(ConfigError::ColorLimit(value));
    }
    Ok(value as u16)
}

pub fn validate_chunk_size(value: i64) -> Result<u32, ConfigError> {
    if !(MIN_CHUNK_SIZE as i64..=MAX_CHUNK_SIZE as i64).contains(&value) {
        return Err(ConfigError::ChunkSize(value));
    }
    Ok(value as u32)
}

pub fn validate_height_multiplier(value: i64) -> Result<u32, ConfigError> {
    if value < 1 || value > u32::MAX as i64 {
        return Err(ConfigError::HeightMultiplier(value));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(raw: RawOptions) -> Result<RunConfig, ConfigError> {
        RunConfig::new(Some("a.csv"), Some(PathBuf::from("out")), raw)
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = build(RawOptions::default()).unwrap();
        assert_eq!(config.options, ConversionOptions::default());
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.inputs, vec!["a.csv".to_string()]);
    }

    #[test]
    fn test_missing_input_and_output() {
        let err = RunConfig::new(None, Some(PathBuf::from("out")), RawOptions::default());
        assert!(matches!(err, Err(ConfigError::MissingInput)));

        let err = RunConfig::new(Some("a.csv"), None, RawOptions::default());
        assert!(matches!(err, Err(ConfigError::MissingOutput)));
    }

    #[test]
    fn test_grid_size_bounds() {
        assert!(validate_grid_size(10.0).is_ok());
        assert!(validate_grid_size(2000.0).is_ok());
        assert!(validate_grid_size(9.999).is_err());
        assert!(validate_grid_size(2000.5).is_err());
        assert!(validate_grid_size(f32::NAN).is_err());
    }

    #[test]
    fn test_color_limit_bounds() {
        assert_eq!(validate_color_limit(0).unwrap(), 0);
        assert_eq!(validate_color_limit(256).unwrap(), 256);
        assert!(validate_color_limit(257).is_err());
        assert!(validate_color_limit(-1).is_err());
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert!(validate_chunk_size(10).is_err());
        assert_eq!(validate_chunk_size(11).unwrap(), 11);
        assert_eq!(validate_chunk_size(256).unwrap(), 256);
        assert!(validate_chunk_size(257).is_err());
    }

    #[test]
    fn test_height_multiplier_bounds() {
        assert!(validate_height_multiplier(0).is_err());
        assert_eq!(validate_height_multiplier(1).unwrap(), 1);
    }

    #[test]
    fn test_invalid_value_rejects_whole_run() {
        let raw = RawOptions {
            chunk_size: 10,
            ..RawOptions::default()
        };
        assert!(matches!(build(raw), Err(ConfigError::ChunkSize(10))));
    }

    #[test]
    fn test_split_inputs_keeps_empty_entries() {
        assert_eq!(
            split_inputs("a.csv;;dir "),
            vec!["a.csv".to_string(), String::new(), "dir".to_string()]
        );
    }

    #[test]
    fn test_effective_color_limit() {
        let mut options = ConversionOptions::default();
        assert_eq!(options.effective_color_limit(), Some(256));
        options.color_limit = 0;
        assert_eq!(options.effective_color_limit(), None);
        options.color_limit = 16;
        options.disable_quantization = true;
        assert_eq!(options.effective_color_limit(), None);
    }
}
