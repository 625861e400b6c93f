//! MagicaVoxel `.vox` export
//!
//! The grid is turned into a [`DotVoxData`] and serialized by `dot_vox`:
//!
//! ```text
//! VOX 150
//! MAIN
//!   SIZE, XYZI          one pair per non-empty grid chunk
//!   nTRN 0 -> nGRP 1    scene root
//!     nTRN 2+2m -> nSHP 3+2m -> model m
//!   RGBA                256 entries, entry k is color index k + 1
//!   LAYR 0
//! ```
//!
//! Grid `(x, y, z)` becomes vox `(x, z, y)` since vox files are z-up. Each
//! model covers the tight bounds of its chunk and is placed by the `_t`
//! translation of its transform node, which MagicaVoxel treats as the model
//! center (`min + size / 2`).

use crate::color::Color;
use crate::error::Result;
use crate::grid::{Chunk, VoxelGrid};
use crate::palette::{quantize_colors, Palette, MAX_VOX_COLORS};
use dot_vox::{Dict, DotVoxData, Frame, Layer, Model, SceneNode, ShapeModel, Size, Voxel};
use glam::UVec3;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub const VOX_VERSION: u32 = 150;

const ROOT_GROUP_ID: u32 = 1;
const PALETTE_ENTRIES: usize = 256;

/// Build the `.vox` document for a grid
///
/// With a fixed palette every voxel uses its nearest palette entry. Otherwise
/// the grid's own colors are used, reduced to 255 when there are more.
pub fn build_vox(grid: &VoxelGrid, palette: Option<&Palette>) -> DotVoxData {
    let palette = match palette {
        Some(fixed) if !fixed.is_empty() => {
            Palette::new(fixed.colors().iter().take(MAX_VOX_COLORS).copied().collect())
        }
        _ => quantize_colors(&grid.distinct_colors(), MAX_VOX_COLORS),
    };

    let mut indices = HashMap::new();
    let placed: Vec<(UVec3, Model)> = grid
        .chunks()
        .filter_map(|chunk| chunk_model(chunk, &palette, &mut indices))
        .collect();

    let scenes = scene_graph(&placed);
    DotVoxData {
        version: VOX_VERSION,
        index_map: Vec::new(),
        models: placed.into_iter().map(|(_, model)| model).collect(),
        palette: vox_palette(&palette),
        materials: Vec::new(),
        scenes,
        layers: vec![Layer {
            attributes: Dict::new(),
        }],
    }
}

/// Serialize the grid into a complete `.vox` file
pub fn serialize_vox(grid: &VoxelGrid, palette: Option<&Palette>) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    build_vox(grid, palette).write_vox(&mut bytes)?;
    Ok(bytes)
}

/// Serialize the grid and write it to `path` in one call
pub fn save_vox(path: &Path, grid: &VoxelGrid, palette: Option<&Palette>) -> Result<()> {
    let bytes = serialize_vox(grid, palette)?;
    std::fs::write(path, &bytes)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// A chunk's voxels relative to its tight minimum corner, with that corner in vox axes
fn chunk_model(
    chunk: &Chunk,
    palette: &Palette,
    indices: &mut HashMap<Color, u8>,
) -> Option<(UVec3, Model)> {
    let (min, max) = chunk.bounds()?;
    let to_vox = |v: UVec3| UVec3::new(v.x, v.z, v.y);

    let voxels = chunk
        .sorted_voxels()
        .into_iter()
        .map(|(coord, color)| {
            let local = to_vox(coord - min);
            // 0-based palette index; dot_vox stores it as index + 1
            let i = *indices
                .entry(color)
                .or_insert_with(|| palette.nearest_index(&color) as u8);
            Voxel {
                x: local.x as u8,
                y: local.y as u8,
                z: local.z as u8,
                i,
            }
        })
        .collect();

    let size = to_vox(max - min + UVec3::ONE);
    let model = Model {
        size: Size {
            x: size.x,
            y: size.y,
            z: size.z,
        },
        voxels,
    };
    Some((to_vox(min), model))
}

fn scene_graph(placed: &[(UVec3, Model)]) -> Vec<SceneNode> {
    let mut scenes = vec![
        SceneNode::Transform {
            attributes: Dict::new(),
            frames: vec![Frame::default()],
            child: ROOT_GROUP_ID,
            layer_id: u32::MAX,
        },
        SceneNode::Group {
            attributes: Dict::new(),
            children: (0..placed.len() as u32).map(|m| 2 + 2 * m).collect(),
        },
    ];

    for (m, (min, model)) in placed.iter().enumerate() {
        let size = UVec3::new(model.size.x, model.size.y, model.size.z);
        let center = *min + size / 2;
        let mut frame = Dict::new();
        frame.insert(
            "_t".to_string(),
            format!("{} {} {}", center.x, center.y, center.z),
        );

        let transform_id = 2 + 2 * m as u32;
        scenes.push(SceneNode::Transform {
            attributes: Dict::new(),
            frames: vec![Frame::new(frame)],
            child: transform_id + 1,
            layer_id: 0,
        });
        scenes.push(SceneNode::Shape {
            attributes: Dict::new(),
            models: vec![ShapeModel {
                model_id: m as u32,
                attributes: Dict::new(),
            }],
        });
    }
    scenes
}

/// All 256 RGBA slots; unused ones are opaque black
fn vox_palette(palette: &Palette) -> Vec<dot_vox::Color> {
    (0..PALETTE_ENTRIES)
        .map(|k| {
            let color = palette.colors().get(k).copied().unwrap_or(Color::BLACK);
            dot_vox::Color {
                r: color.r,
                g: color.g,
                b: color.b,
                a: 255,
            }
        })
        .collect()
}
