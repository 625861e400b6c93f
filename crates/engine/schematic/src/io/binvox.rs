//! binvox reading
//!
//! ```text
//! #binvox 1
//! dim D H W
//! translate tx ty tz
//! scale s
//! data
//! <(value, count) byte pairs>
//! ```
//!
//! Voxels are stored in `x * W * H + z * W + y` order with `y` running fastest.
//! binvox carries occupancy only, so every voxel gets the same light gray.

use crate::color::Color;
use crate::config::Settings;
use crate::error::{ConvertError, Result};
use crate::grid::VoxelGrid;
use crate::validate::check_extent;
use glam::UVec3;
use std::path::Path;
use tracing::debug;

/// Color given to every occupied binvox voxel
pub const BINVOX_COLOR: Color = Color::gray(200);

pub fn load_binvox(path: &Path, settings: &Settings) -> Result<VoxelGrid> {
    let bytes = std::fs::read(path)?;
    parse_binvox(&bytes, settings)
}

pub fn parse_binvox(bytes: &[u8], settings: &Settings) -> Result<VoxelGrid> {
    let (dims, body) = parse_header(bytes)?;
    let [depth, height, width] = dims;
    // depth runs along grid x, width along y and height along z
    check_extent(depth as u64, width as u64, height as u64)?;
    let total = depth as u64 * height as u64 * width as u64;

    let mut grid = VoxelGrid::from_settings(settings);
    let mut index: u64 = 0;
    for pair in body.chunks_exact(2) {
        let (value, count) = (pair[0], pair[1] as u64);
        let end = (index + count).min(total);
        if value != 0 {
            for i in index..end {
                let x = i / (width as u64 * height as u64);
                let z = (i / width as u64) % height as u64;
                let y = i % width as u64;
                grid.insert(UVec3::new(x as u32, y as u32, z as u32), BINVOX_COLOR);
            }
        }
        index = end;
        if index >= total {
            break;
        }
    }

    if index < total {
        return Err(ConvertError::Parse(format!(
            "binvox data ends after {} of {} voxels",
            index, total
        )));
    }
    debug!(
        "[BINVOX Loading] {}x{}x{} grid, {} occupied",
        depth,
        height,
        width,
        grid.len()
    );
    Ok(grid)
}

/// Read the text header, returning `dim` and the run-length body
fn parse_header(bytes: &[u8]) -> Result<([u32; 3], &[u8])> {
    let mut offset = 0;

    let magic = next_line(bytes, &mut offset)?;
    if !magic.starts_with("#binvox") {
        return Err(ConvertError::Parse(format!(
            "Not a binvox file (header '{}')",
            magic
        )));
    }

    let mut dims = None;
    loop {
        let line = next_line(bytes, &mut offset)?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("dim") => {
                let values: Vec<u32> = tokens.filter_map(|t| t.parse().ok()).collect();
                match values.as_slice() {
                    [d, h, w] => dims = Some([*d, *h, *w]),
                    _ => {
                        return Err(ConvertError::Parse(format!(
                            "Invalid binvox dimensions '{}'",
                            line
                        )))
                    }
                }
            }
            Some("data") => break,
            // translate and scale only place the model in the source scene
            _ => {}
        }
    }

    let dims = dims.ok_or_else(|| ConvertError::Parse("binvox header has no 'dim'".to_string()))?;
    Ok((dims, &bytes[offset..]))
}

fn next_line<'a>(bytes: &'a [u8], offset: &mut usize) -> Result<&'a str> {
    let rest = &bytes[*offset..];
    let end = rest
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| ConvertError::Parse("binvox header ends before 'data'".to_string()))?;
    *offset += end + 1;
    std::str::from_utf8(&rest[..end])
        .map(str::trim)
        .map_err(|_| ConvertError::Parse("binvox header is not text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binvox(dims: [u32; 3], runs: &[(u8, u8)]) -> Vec<u8> {
        let mut out = format!(
            "#binvox 1\ndim {} {} {}\ntranslate 0 0 0\nscale 1\ndata\n",
            dims[0], dims[1], dims[2]
        )
        .into_bytes();
        for (value, count) in runs {
            out.push(*value);
            out.push(*count);
        }
        out
    }

    #[test]
    fn test_index_order() {
        // 2x2x2: indices 0..8, only index 1 (y = 1) and index 6 (x = 1, z = 1) set
        let data = binvox([2, 2, 2], &[(0, 1), (1, 1), (0, 4), (1, 1), (0, 1)]);
        let grid = parse_binvox(&data, &Settings::default()).unwrap();
        assert_eq!(grid.len(), 2);
        assert!(grid.contains(UVec3::new(0, 1, 0)));
        assert!(grid.contains(UVec3::new(1, 0, 1)));
        assert_eq!(grid.get(UVec3::new(0, 1, 0)), Some(BINVOX_COLOR));
    }

    #[test]
    fn test_full_cube() {
        let data = binvox([3, 3, 3], &[(1, 27)]);
        let grid = parse_binvox(&data, &Settings::default()).unwrap();
        assert_eq!(grid.len(), 27);
        assert_eq!(grid.dimensions(), UVec3::splat(3));
    }

    #[test]
    fn test_truncated_body() {
        let data = binvox([2, 2, 2], &[(1, 3)]);
        assert!(parse_binvox(&data, &Settings::default()).is_err());
    }

    #[test]
    fn test_bad_magic() {
        let err = parse_binvox(b"#vox 1\ndata\n", &Settings::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Parse(_)));
    }

    #[test]
    fn test_missing_dim() {
        assert!(parse_binvox(b"#binvox 1\ndata\n", &Settings::default()).is_err());
    }

    #[test]
    fn test_dimensions_beyond_world_limits() {
        // A single run keeps the fixture small; the header alone is rejected
        let data = binvox([2, 2, 1001], &[(1, 255)]);
        assert!(matches!(
            parse_binvox(&data, &Settings::default()),
            Err(ConvertError::GridTooLarge { height: 1001, .. })
        ));

        let data = binvox([2001, 1, 1], &[(1, 255)]);
        assert!(matches!(
            parse_binvox(&data, &Settings::default()),
            Err(ConvertError::GridTooLarge { width: 2001, .. })
        ));
    }
}
