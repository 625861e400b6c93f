//! MCEdit `.schematic` reading
//!
//! A schematic is a gzip compressed NBT compound with `Width` (x), `Height`
//! (y) and `Length` (z) shorts and a `Blocks` byte array indexed as
//! `(y * Length + z) * Width + x`. An optional `AddBlocks` nibble array holds
//! the upper four bits of block ids above 255 and `Data` the per-block
//! metadata. Block 0 is air. Minecraft is y-up like the grid.

use crate::color::Color;
use crate::config::Settings;
use crate::error::{ConvertError, Result};
use crate::grid::VoxelGrid;
use crate::validate::check_extent;
use glam::UVec3;
use quartz_nbt::io::{read_nbt, Flavor};
use quartz_nbt::NbtCompound;
use std::path::Path;
use tracing::debug;

/// Color for block ids without a table entry
pub const UNKNOWN_BLOCK_COLOR: Color = Color::gray(128);

const AIR: u16 = 0;
const WOOL: u16 = 35;

pub fn load_schematic(path: &Path, settings: &Settings) -> Result<VoxelGrid> {
    let bytes = std::fs::read(path)?;
    parse_schematic(&bytes, settings)
}

/// Parse gzip compressed schematic bytes into a grid
pub fn parse_schematic(bytes: &[u8], settings: &Settings) -> Result<VoxelGrid> {
    let (root, _name) = read_nbt(&mut &bytes[..], Flavor::GzCompressed)
        .map_err(|e| ConvertError::Parse(format!("Invalid schematic NBT: {}", e)))?;

    let width = dimension(&root, "Width")?;
    let height = dimension(&root, "Height")?;
    let length = dimension(&root, "Length")?;
    check_extent(width as u64, height as u64, length as u64)?;

    let blocks = byte_array(&root, "Blocks")?;
    let total = width * height * length;
    if blocks.len() < total {
        return Err(ConvertError::Parse(format!(
            "Schematic has {} blocks but declares {}x{}x{}",
            blocks.len(),
            width,
            height,
            length
        )));
    }
    let add_blocks = optional_byte_array(&root, "AddBlocks")?;
    let data = optional_byte_array(&root, "Data")?;

    let mut grid = VoxelGrid::from_settings(settings);
    for (index, &low) in blocks[..total].iter().enumerate() {
        let id = block_id(low, add_blocks, index);
        if id == AIR {
            continue;
        }
        let x = index % width;
        let z = (index / width) % length;
        let y = index / (width * length);
        let meta = data.get(index).copied().unwrap_or(0) & 0x0F;
        grid.insert(UVec3::new(x as u32, y as u32, z as u32), block_color(id, meta));
    }

    debug!(
        "[SCHEMATIC Loading] {}x{}x{} blocks, {} solid",
        width,
        height,
        length,
        grid.len()
    );
    Ok(grid)
}

fn byte_array<'a>(root: &'a NbtCompound, key: &str) -> Result<&'a [u8]> {
    root.get::<_, &[u8]>(key)
        .map_err(|e| ConvertError::Parse(format!("Schematic field '{}': {}", key, e)))
}

fn optional_byte_array<'a>(root: &'a NbtCompound, key: &str) -> Result<&'a [u8]> {
    if root.contains_key(key) {
        byte_array(root, key)
    } else {
        Ok(&[])
    }
}

fn dimension(root: &NbtCompound, key: &str) -> Result<usize> {
    let value = root
        .get::<_, i16>(key)
        .map_err(|e| ConvertError::Parse(format!("Schematic field '{}': {}", key, e)))?;
    usize::try_from(value)
        .map_err(|_| ConvertError::Parse(format!("Schematic '{}' is negative ({})", key, value)))
}

/// Block id with its `AddBlocks` nibble; even indices use the low nibble
fn block_id(low: u8, add_blocks: &[u8], index: usize) -> u16 {
    let high = match add_blocks.get(index >> 1) {
        Some(&add) if index & 1 == 0 => add & 0x0F,
        Some(&add) => add >> 4,
        None => 0,
    };
    ((high as u16) << 8) | low as u16
}

/// Approximate color of a classic block id
pub fn block_color(id: u16, meta: u8) -> Color {
    match id {
        1 => Color::new(125, 125, 125),       // stone
        2 => Color::new(95, 159, 53),         // grass
        3 => Color::new(134, 96, 67),         // dirt
        4 => Color::new(122, 122, 122),       // cobblestone
        5 => Color::new(157, 128, 79),        // planks
        7 => Color::new(84, 84, 84),          // bedrock
        8 | 9 => Color::new(47, 67, 244),     // water
        10 | 11 => Color::new(207, 92, 20),   // lava
        12 => Color::new(219, 211, 160),      // sand
        13 => Color::new(136, 126, 126),      // gravel
        14..=16 => Color::new(143, 140, 125), // ores
        17 => Color::new(102, 81, 51),        // log
        18 => Color::new(60, 120, 35),        // leaves
        20 => Color::new(218, 240, 244),      // glass
        24 => Color::new(216, 203, 155),      // sandstone
        WOOL => wool_color(meta),
        41 => Color::new(249, 236, 79),       // gold
        42 => Color::new(219, 219, 219),      // iron
        45 => Color::new(150, 97, 83),        // brick
        49 => Color::new(20, 18, 29),         // obsidian
        78 | 80 => Color::new(240, 251, 251), // snow
        79 => Color::new(125, 173, 255),      // ice
        82 => Color::new(158, 164, 176),      // clay
        87 => Color::new(111, 54, 52),        // netherrack
        89 => Color::new(249, 212, 156),      // glowstone
        98 => Color::new(122, 121, 122),      // stone bricks
        _ => UNKNOWN_BLOCK_COLOR,
    }
}

fn wool_color(meta: u8) -> Color {
    const WOOL_COLORS: [(u8, u8, u8); 16] = [
        (233, 236, 236),
        (240, 118, 19),
        (189, 68, 179),
        (58, 175, 217),
        (248, 197, 39),
        (112, 185, 25),
        (237, 141, 172),
        (62, 68, 71),
        (142, 142, 134),
        (21, 137, 145),
        (121, 42, 172),
        (53, 57, 157),
        (114, 71, 40),
        (84, 109, 27),
        (160, 39, 34),
        (20, 21, 25),
    ];
    let (r, g, b) = WOOL_COLORS[(meta & 0x0F) as usize];
    Color::new(r, g, b)
}
