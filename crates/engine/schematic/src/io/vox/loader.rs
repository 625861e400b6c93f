use crate::color::Color;
use crate::config::Settings;
use crate::error::{ConvertError, Result};
use crate::grid::VoxelGrid;
use dot_vox::{DotVoxData, SceneNode};
use glam::{IVec3, UVec3};
use std::path::Path;
use tracing::{debug, warn};

/// Scene graphs nested deeper than this are treated as corrupt
const MAX_SCENE_DEPTH: usize = 64;

/// Load a `.vox` file into a grid
pub fn load_vox(path: &Path, settings: &Settings) -> Result<VoxelGrid> {
    let bytes = std::fs::read(path)?;
    load_vox_bytes(&bytes, settings)
}

/// Parse `.vox` bytes into a grid
///
/// Every model instance of the scene graph is placed at its accumulated
/// translation (rotations are ignored), vox `(x, y, z)` becomes grid
/// `(x, z, y)` and axes with negative coordinates are shifted to start at 0.
pub fn load_vox_bytes(bytes: &[u8], settings: &Settings) -> Result<VoxelGrid> {
    let data = dot_vox::load_bytes(bytes)
        .map_err(|e| ConvertError::Vox(format!("Failed to parse .vox file: {}", e)))?;

    if data.models.is_empty() {
        return Err(ConvertError::Vox("No models found in .vox file".to_string()));
    }

    let instances = model_instances(&data)?;
    debug!(
        "[VOX Loading] {} models, {} instances",
        data.models.len(),
        instances.len()
    );

    // World positions in grid axes, before shifting
    let mut voxels: Vec<(IVec3, Color)> = Vec::new();
    for (model_id, translation) in instances {
        let Some(model) = data.models.get(model_id) else {
            warn!("Shape references missing model {}", model_id);
            continue;
        };
        let size = IVec3::new(model.size.x as i32, model.size.y as i32, model.size.z as i32);
        let origin = translation - size / 2;

        for voxel in &model.voxels {
            let color = data
                .palette
                .get(voxel.i as usize)
                .map(|c| Color::new(c.r, c.g, c.b))
                .unwrap_or(Color::WHITE);
            let world = origin + IVec3::new(voxel.x as i32, voxel.y as i32, voxel.z as i32);
            voxels.push((IVec3::new(world.x, world.z, world.y), color));
        }
    }

    let min = voxels
        .iter()
        .fold(IVec3::ZERO, |min, (pos, _)| min.min(*pos));
    let mut grid = VoxelGrid::from_settings(settings);
    for (pos, color) in voxels {
        grid.insert((pos - min).as_uvec3(), color);
    }
    Ok(grid)
}

/// (model id, translation in vox axes) for every shape reachable from the root
///
/// Files without a scene graph place each model once at a translation of half
/// its size, i.e. with its minimum corner at the origin.
fn model_instances(data: &DotVoxData) -> Result<Vec<(usize, IVec3)>> {
    if data.scenes.is_empty() {
        return Ok(data
            .models
            .iter()
            .enumerate()
            .map(|(id, model)| {
                let size = UVec3::new(model.size.x, model.size.y, model.size.z).as_ivec3();
                (id, size / 2)
            })
            .collect());
    }

    let mut instances = Vec::new();
    visit_node(data, 0, IVec3::ZERO, 0, &mut instances)?;
    Ok(instances)
}

fn visit_node(
    data: &DotVoxData,
    node: u32,
    translation: IVec3,
    depth: usize,
    instances: &mut Vec<(usize, IVec3)>,
) -> Result<()> {
    if depth >= MAX_SCENE_DEPTH {
        return Err(ConvertError::Vox(format!(
            "Scene graph deeper than {} nodes",
            MAX_SCENE_DEPTH
        )));
    }

    let Some(scene_node) = data.scenes.get(node as usize) else {
        return Err(ConvertError::Vox(format!("Missing scene node {}", node)));
    };

    match scene_node {
        SceneNode::Transform { frames, child, .. } => {
            let offset = frames
                .first()
                .and_then(|frame| frame.attributes.get("_t"))
                .map(|t| parse_translation(t))
                .transpose()?
                .unwrap_or(IVec3::ZERO);
            visit_node(data, *child, translation + offset, depth + 1, instances)
        }
        SceneNode::Group { children, .. } => {
            for child in children {
                visit_node(data, *child, translation, depth + 1, instances)?;
            }
            Ok(())
        }
        SceneNode::Shape { models, .. } => {
            for shape in models {
                instances.push((shape.model_id as usize, translation));
            }
            Ok(())
        }
    }
}

fn parse_translation(value: &str) -> Result<IVec3> {
    let parts: Vec<i32> = value
        .split_whitespace()
        .map(|p| p.parse::<i32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| ConvertError::Vox(format!("Invalid translation '{}'", value)))?;
    match parts.as_slice() {
        [x, y, z] => Ok(IVec3::new(*x, *y, *z)),
        _ => Err(ConvertError::Vox(format!("Invalid translation '{}'", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::vox::serialize_vox;

    #[test]
    fn test_parse_translation() {
        assert_eq!(parse_translation("1 -2 30").unwrap(), IVec3::new(1, -2, 30));
        assert!(parse_translation("1 2").is_err());
        assert!(parse_translation("a b c").is_err());
    }

    #[test]
    fn test_invalid_bytes() {
        let err = load_vox_bytes(b"not a vox file", &Settings::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Vox(_)));
    }

    #[test]
    fn test_roundtrip_multiple_chunks() {
        let settings = Settings {
            chunk_size: 16,
            debug: false,
        };
        let mut grid = VoxelGrid::from_settings(&settings);
        grid.insert(UVec3::new(3, 0, 1), Color::new(255, 0, 0));
        grid.insert(UVec3::new(20, 5, 2), Color::new(0, 255, 0));
        grid.insert(UVec3::new(21, 17, 40), Color::new(0, 0, 255));
        grid.insert(UVec3::new(4, 1, 1), Color::new(255, 0, 0));

        let loaded = load_vox_bytes(&serialize_vox(&grid, None).unwrap(), &settings).unwrap();
        assert_eq!(loaded.sorted_voxels(), grid.sorted_voxels());
        assert_eq!(loaded.dimensions(), grid.dimensions());
    }

    #[test]
    fn test_odd_sized_models_roundtrip() {
        let mut grid = VoxelGrid::new(128);
        for x in 5..10 {
            for y in 0..3 {
                grid.insert(UVec3::new(x, y, 7), Color::gray((x * 20) as u8));
            }
        }
        let bytes = serialize_vox(&grid, None).unwrap();
        let loaded = load_vox_bytes(&bytes, &Settings::default()).unwrap();
        assert_eq!(loaded.sorted_voxels(), grid.sorted_voxels());
    }
}
