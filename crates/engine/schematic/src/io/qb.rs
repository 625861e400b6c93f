//! Qubicle binary (`.qb`) reading
//!
//! A file is a 24 byte header followed by one or more matrices. Each matrix
//! carries its name, size, signed position and `size.x * size.y * size.z`
//! packed colors, optionally run-length encoded per z slice. Colors with zero
//! alpha are empty. Qubicle is y-up like the grid, so axes map directly.

use crate::color::Color;
use crate::config::Settings;
use crate::error::{ConvertError, Result};
use crate::grid::VoxelGrid;
use crate::validate::check_extent;
use glam::{I64Vec3, IVec3, UVec3};
use std::path::Path;
use tracing::debug;

/// Run of repeated colors in compressed data
const CODE_FLAG: u32 = 2;
/// End of a z slice in compressed data
const NEXT_SLICE_FLAG: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorFormat {
    Rgba,
    Bgra,
}

#[derive(Debug, Clone, Copy)]
struct Header {
    color_format: ColorFormat,
    compressed: bool,
    matrix_count: u32,
}

pub fn load_qb(path: &Path, settings: &Settings) -> Result<VoxelGrid> {
    let bytes = std::fs::read(path)?;
    parse_qb(&bytes, settings)
}

/// Parse Qubicle bytes; matrix positions are honored and axes with negative
/// coordinates are shifted to start at 0
///
/// The union of all declared matrix boxes must fit the world limits, checked
/// before each matrix is expanded.
pub fn parse_qb(bytes: &[u8], settings: &Settings) -> Result<VoxelGrid> {
    let mut reader = QbReader::new(bytes);
    let header = reader.header()?;

    let mut bounds = (I64Vec3::ZERO, I64Vec3::ZERO);
    let mut voxels: Vec<(IVec3, Color)> = Vec::new();
    for _ in 0..header.matrix_count {
        reader.matrix(&header, &mut bounds, &mut voxels)?;
    }
    debug!(
        "[QB Loading] {} matrices, {} voxels",
        header.matrix_count,
        voxels.len()
    );

    let min = voxels
        .iter()
        .fold(IVec3::ZERO, |min, (pos, _)| min.min(*pos));
    let mut grid = VoxelGrid::from_settings(settings);
    for (pos, color) in voxels {
        grid.insert((pos - min).as_uvec3(), color);
    }
    Ok(grid)
}

struct QbReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> QbReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset + len;
        let slice = self.data.get(self.offset..end).ok_or_else(|| {
            ConvertError::Parse(format!(
                "Truncated .qb data: needed {} bytes at offset {}, file has {}",
                len,
                self.offset,
                self.data.len()
            ))
        })?;
        self.offset = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(self.u32()? as i32)
    }

    fn header(&mut self) -> Result<Header> {
        let _version = self.take(4)?;
        let color_format = match self.u32()? {
            0 => ColorFormat::Rgba,
            1 => ColorFormat::Bgra,
            other => {
                return Err(ConvertError::Parse(format!(
                    "Unknown .qb color format {}",
                    other
                )))
            }
        };
        // z-axis orientation and visibility mask encoding don't change occupancy
        let _z_axis = self.u32()?;
        let compressed = self.u32()? != 0;
        let _visibility_mask = self.u32()?;
        let matrix_count = self.u32()?;

        Ok(Header {
            color_format,
            compressed,
            matrix_count,
        })
    }

    fn matrix(
        &mut self,
        header: &Header,
        bounds: &mut (I64Vec3, I64Vec3),
        voxels: &mut Vec<(IVec3, Color)>,
    ) -> Result<()> {
        let name_len = self.u8()? as usize;
        let name = String::from_utf8_lossy(self.take(name_len)?).into_owned();
        let size = UVec3::new(self.u32()?, self.u32()?, self.u32()?);
        let position = IVec3::new(self.i32()?, self.i32()?, self.i32()?);

        let lo = position.as_i64vec3();
        bounds.0 = bounds.0.min(lo);
        bounds.1 = bounds.1.max(lo + size.as_i64vec3());
        let extent = (bounds.1 - bounds.0).as_u64vec3();
        check_extent(extent.x, extent.y, extent.z)?;
        debug!("[QB Loading] matrix '{}' size {} at {}", name, size, position);

        let mut emit = |local: UVec3, value: u32| {
            if let Some(color) = decode_color(value, header.color_format) {
                voxels.push((position + local.as_ivec3(), color));
            }
        };

        if !header.compressed {
            for z in 0..size.z {
                for y in 0..size.y {
                    for x in 0..size.x {
                        let value = self.u32()?;
                        emit(UVec3::new(x, y, z), value);
                    }
                }
            }
            return Ok(());
        }

        let slice_len = size.x as u64 * size.y as u64;
        for z in 0..size.z {
            let mut index: u64 = 0;
            loop {
                let data = self.u32()?;
                if data == NEXT_SLICE_FLAG {
                    break;
                }
                let (count, value) = if data == CODE_FLAG {
                    (self.u32()? as u64, self.u32()?)
                } else {
                    (1, data)
                };
                if index + count > slice_len {
                    return Err(ConvertError::Parse(format!(
                        "Compressed run overflows slice {} of matrix '{}'",
                        z, name
                    )));
                }
                for i in index..index + count {
                    let x = (i % size.x as u64) as u32;
                    let y = (i / size.x as u64) as u32;
                    emit(UVec3::new(x, y, z), value);
                }
                index += count;
            }
        }
        Ok(())
    }
}

/// Color of a packed voxel, or `None` when it is empty
fn decode_color(value: u32, format: ColorFormat) -> Option<Color> {
    let [c0, c1, c2, alpha] = value.to_le_bytes();
    if alpha == 0 {
        return None;
    }
    Some(match format {
        ColorFormat::Rgba => Color::new(c0, c1, c2),
        ColorFormat::Bgra => Color::new(c2, c1, c0),
    })
}
