//! Median cut color reduction

use super::Palette;
use crate::color::Color;
use crate::grid::VoxelGrid;
use std::collections::BTreeSet;
use tracing::debug;

/// Color bucket for the median cut algorithm
#[derive(Debug, Clone)]
struct ColorBucket {
    colors: Vec<Color>,
}

impl ColorBucket {
    fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    fn len(&self) -> usize {
        self.colors.len()
    }

    /// Average color of the bucket
    fn average_color(&self) -> Color {
        if self.colors.is_empty() {
            return Color::BLACK;
        }

        let mut sum = [0u64; 3];
        for color in &self.colors {
            sum[0] += color.r as u64;
            sum[1] += color.g as u64;
            sum[2] += color.b as u64;
        }

        let count = self.colors.len() as u64;
        let avg = |s: u64| ((s + count / 2) / count) as u8;
        Color::new(avg(sum[0]), avg(sum[1]), avg(sum[2]))
    }

    /// Channel (0 = r, 1 = g, 2 = b) with the largest range, and that range
    fn largest_range_channel(&self) -> (usize, u8) {
        let mut mins = [u8::MAX; 3];
        let mut maxs = [u8::MIN; 3];

        for color in &self.colors {
            for (i, v) in color.to_array().into_iter().enumerate() {
                mins[i] = mins[i].min(v);
                maxs[i] = maxs[i].max(v);
            }
        }

        (0..3)
            .map(|i| (i, maxs[i].saturating_sub(mins[i])))
            .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    /// Split the bucket along the median of the largest range channel
    fn split(&mut self) -> Option<ColorBucket> {
        if self.colors.len() < 2 {
            return None;
        }

        let (channel, _) = self.largest_range_channel();
        self.colors.sort_by_key(|c| c.to_array()[channel]);

        let mid = self.colors.len() / 2;
        let right = self.colors.split_off(mid);
        Some(ColorBucket::new(right))
    }
}

/// Reduce `colors` to a palette of at most `max_colors` entries
///
/// Each distinct color counts once. When there are already few enough distinct
/// colors they are returned unchanged (sorted).
pub fn quantize_colors(colors: &BTreeSet<Color>, max_colors: usize) -> Palette {
    let max_colors = max_colors.clamp(1, 256);

    if colors.len() <= max_colors {
        return Palette::new(colors.iter().copied().collect());
    }

    let mut buckets = vec![ColorBucket::new(colors.iter().copied().collect())];

    while buckets.len() < max_colors {
        // Split the bucket with the widest channel range; ties go to the fuller one
        let Some(idx) = buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.len() > 1)
            .max_by_key(|(_, b)| (b.largest_range_channel().1, b.len()))
            .map(|(i, _)| i)
        else {
            break;
        };

        match buckets[idx].split() {
            Some(new_bucket) => buckets.push(new_bucket),
            None => break,
        }
    }

    let mut entries: Vec<Color> = buckets.iter().map(ColorBucket::average_color).collect();
    entries.sort();
    entries.dedup();
    Palette::new(entries)
}

/// Remap the grid so it uses at most `max_colors` distinct colors
///
/// Returns the number of distinct colors afterwards.
pub fn reduce_grid_colors(grid: &mut VoxelGrid, max_colors: usize) -> usize {
    let colors = grid.distinct_colors();
    if colors.len() <= max_colors {
        return colors.len();
    }

    let palette = quantize_colors(&colors, max_colors);
    debug!(
        "Reducing {} colors to a palette of {}",
        colors.len(),
        palette.len()
    );
    palette.remap_grid(grid);
    grid.distinct_colors().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    fn set(colors: &[Color]) -> BTreeSet<Color> {
        colors.iter().copied().collect()
    }

    #[test]
    fn test_bucket_average() {
        let bucket = ColorBucket::new(vec![
            Color::new(255, 0, 0),
            Color::new(0, 255, 0),
            Color::new(0, 0, 255),
        ]);
        assert_eq!(bucket.average_color(), Color::new(85, 85, 85));
    }

    #[test]
    fn test_largest_range_channel() {
        let bucket = ColorBucket::new(vec![Color::new(10, 0, 50), Color::new(20, 200, 60)]);
        assert_eq!(bucket.largest_range_channel(), (1, 200));
    }

    #[test]
    fn test_quantize_colors() {
        let colors = set(&[
            Color::new(255, 0, 0),
            Color::new(230, 25, 25),
            Color::new(0, 255, 0),
            Color::new(25, 230, 25),
            Color::new(0, 0, 255),
            Color::new(25, 25, 230),
        ]);

        let palette = quantize_colors(&colors, 3);
        assert_eq!(palette.len(), 3);

        // Nearby reds share an entry, green lands elsewhere
        let red = palette.nearest(&Color::new(255, 0, 0));
        assert_eq!(red, palette.nearest(&Color::new(230, 25, 25)));
        assert_ne!(red, palette.nearest(&Color::new(0, 255, 0)));
    }

    #[test]
    fn test_quantize_keeps_small_sets() {
        let colors = set(&[Color::gray(5), Color::gray(1)]);
        let palette = quantize_colors(&colors, 256);
        assert_eq!(palette.colors(), &[Color::gray(1), Color::gray(5)]);
    }

    #[test]
    fn test_quantize_empty() {
        assert!(quantize_colors(&BTreeSet::new(), 256).is_empty());
    }

    #[test]
    fn test_reduce_grid_colors_respects_limit() {
        let mut grid = VoxelGrid::new(32);
        for i in 0..200u32 {
            let color = Color::new(i as u8, (i * 7 % 256) as u8, (255 - i) as u8);
            grid.insert(UVec3::new(i, 0, 0), color);
        }
        assert_eq!(grid.distinct_colors().len(), 200);

        for limit in [1, 2, 17, 64, 199] {
            let mut copy = grid.clone();
            let count = reduce_grid_colors(&mut copy, limit);
            assert!(count <= limit, "{} colors for limit {}", count, limit);
            assert_eq!(copy.len(), 200);
        }
    }
}
