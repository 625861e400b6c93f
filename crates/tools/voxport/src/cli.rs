//! Command line arguments
//!
//! Several options keep their historical two-letter single-dash spellings
//! (`-cl 64`, `-gs=20`). clap reads `-cl` as the short flags `-c -l`, so those
//! spellings are rewritten to the long forms by [`normalize_args`] before parsing.

use clap::Parser;
use schematic::config::{
    RawOptions, DEFAULT_CHUNK_SIZE, DEFAULT_COLOR_LIMIT, DEFAULT_GRID_SIZE,
    DEFAULT_HEIGHT_MULTIPLIER,
};
use std::ffi::OsString;
use std::path::PathBuf;

/// Two-letter single-dash aliases and the long options they stand for
const LEGACY_FLAGS: [(&str, &str); 6] = [
    ("-cm", "--color-from-file"),
    ("-cl", "--color-limit"),
    ("-cs", "--chunk-size"),
    ("-hm", "--heightmap"),
    ("-gs", "--grid-size"),
    ("-dq", "--disable-quantization"),
];

#[derive(Parser, Debug)]
#[command(name = "voxport")]
#[command(
    version,
    about = "Convert point clouds, heightmaps and legacy voxel files to MagicaVoxel .vox"
)]
pub struct Cli {
    /// Input files or directories, separated by ';'
    #[arg(short, long, value_name = "PATHS")]
    pub input: Option<String>,

    /// Output directory (created if missing)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Take heightmap colors from the --color-from-file image
    #[arg(short, long)]
    pub color: bool,

    /// Color image for heightmaps (alias -cm)
    #[arg(long, value_name = "PATH")]
    pub color_from_file: Option<PathBuf>,

    /// Maximum number of colors in the output, 0-256 (alias -cl)
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_COLOR_LIMIT as i64,
        allow_negative_numbers = true,
    )]
    pub color_limit: i64,

    /// Storage chunk edge length, 11-256 (alias -cs)
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_CHUNK_SIZE as i64,
        allow_negative_numbers = true,
    )]
    pub chunk_size: i64,

    /// Drop voxels that have no face exposed to air
    #[arg(short, long)]
    pub excavate: bool,

    /// Height multiplier for heightmaps, at least 1 (alias -hm)
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_HEIGHT_MULTIPLIER as i64,
        allow_negative_numbers = true,
    )]
    pub heightmap: i64,

    /// Fixed output palette image
    #[arg(short, long, value_name = "PATH")]
    pub palette: Option<PathBuf>,

    /// Point cloud scale: the longest axis spans this many voxels, 10-2000 (alias -gs)
    #[arg(
        long,
        value_name = "SIZE",
        default_value_t = DEFAULT_GRID_SIZE,
        allow_negative_numbers = true,
    )]
    pub grid_size: f32,

    /// Verbose diagnostics
    #[arg(short, long)]
    pub debug: bool,

    /// Skip the color limit reduction (alias -dq)
    #[arg(long)]
    pub disable_quantization: bool,
}

impl Cli {
    /// Parse process arguments after rewriting legacy flags
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Numeric values are passed through unchecked; `RunConfig::new` validates them
    pub fn raw_options(&self) -> RawOptions {
        RawOptions {
            grid_size: self.grid_size,
            color_limit: self.color_limit,
            chunk_size: self.chunk_size,
            height_multiplier: self.heightmap,
            excavate: self.excavate,
            color: self.color,
            color_path: self.color_from_file.clone(),
            palette_path: self.palette.clone(),
            debug: self.debug,
            disable_quantization: self.disable_quantization,
        }
    }
}

/// Rewrite `-cl 64` / `-cl=64` style arguments to their long forms
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some(s) => normalize_arg(s).map(OsString::from).unwrap_or(arg),
            None => arg,
        })
        .collect()
}

fn normalize_arg(arg: &str) -> Option<String> {
    let (flag, value) = match arg.split_once('=') {
        Some((flag, value)) => (flag, Some(value)),
        None => (arg, None),
    };
    let (_, long) = LEGACY_FLAGS.iter().find(|(short, _)| *short == flag)?;
    Some(match value {
        Some(value) => format!("{}={}", long, value),
        None => long.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["voxport", "-i", "a.csv", "-o", "out"]).unwrap();
        assert_eq!(cli.input.as_deref(), Some("a.csv"));
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert_eq!(cli.raw_options(), RawOptions::default());
    }

    #[test]
    fn test_legacy_flags() {
        let cli = parse(&[
            "voxport", "-i", "a.png", "-o", "out", "-cm", "colors.png", "-cl=64", "-cs", "32",
            "-hm", "5", "-gs", "20.5", "-dq", "-c", "-e", "-d",
        ])
        .unwrap();
        assert_eq!(cli.color_from_file, Some(PathBuf::from("colors.png")));
        assert_eq!(cli.color_limit, 64);
        assert_eq!(cli.chunk_size, 32);
        assert_eq!(cli.heightmap, 5);
        assert_eq!(cli.grid_size, 20.5);
        assert!(cli.disable_quantization);
        assert!(cli.color);
        assert!(cli.excavate);
        assert!(cli.debug);
    }

    #[test]
    fn test_long_flags() {
        let cli = parse(&[
            "voxport",
            "--input=a.csv;b.ply",
            "--output",
            "out",
            "--palette",
            "pal.png",
            "--color-limit",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.input.as_deref(), Some("a.csv;b.ply"));
        assert_eq!(cli.palette, Some(PathBuf::from("pal.png")));
        assert_eq!(cli.color_limit, 0);
    }

    #[test]
    fn test_out_of_range_values_reach_validation() {
        let cli = parse(&["voxport", "-i", "a", "-o", "b", "-cl", "-5", "-gs", "9.999"]).unwrap();
        assert_eq!(cli.color_limit, -5);
        assert_eq!(cli.grid_size, 9.999);
    }

    #[test]
    fn test_unparsable_number_is_rejected() {
        assert!(parse(&["voxport", "-i", "a", "-o", "b", "-cl", "many"]).is_err());
        assert!(parse(&["voxport", "-i", "a", "-o", "b", "--grid-size", "ten"]).is_err());
    }

    #[test]
    fn test_missing_paths_are_left_to_validation() {
        let cli = parse(&["voxport"]).unwrap();
        assert!(cli.input.is_none());
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_normalize_leaves_other_args() {
        let args = normalize_args(["voxport", "-c", "-cl", "-clx", "--cl=3", "a-cl"]);
        assert_eq!(
            args,
            ["voxport", "-c", "--color-limit", "-clx", "--cl=3", "a-cl"]
                .map(OsString::from)
                .to_vec()
        );
    }
}
