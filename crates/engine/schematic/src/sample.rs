//! Spatial samples produced by point cloud parsers

use crate::color::Color;
use glam::Vec3;

/// A single colored point in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: Vec3,
    pub color: Color,
}

impl Sample {
    pub fn new(position: Vec3, color: Color) -> Self {
        Self { position, color }
    }
}

/// Parser output: the accepted samples in input order and how many records were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    pub samples: Vec<Sample>,
    pub skipped: usize,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a sample, or count it as skipped when its position is not finite
    pub fn push(&mut self, sample: Sample) {
        if sample.position.is_finite() {
            self.samples.push(sample);
        } else {
            self.skipped += 1;
        }
    }

    /// Count one malformed record
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Axis-aligned bounds (min, max) of all sample positions
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = self.samples.first()?.position;
        Some(
            self.samples
                .iter()
                .fold((first, first), |(min, max), s| {
                    (min.min(s.position), max.max(s.position))
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_positions_are_skipped() {
        let mut set = SampleSet::new();
        set.push(Sample::new(Vec3::ONE, Color::WHITE));
        set.push(Sample::new(Vec3::new(f32::NAN, 0.0, 0.0), Color::WHITE));
        set.push(Sample::new(Vec3::new(0.0, f32::INFINITY, 0.0), Color::WHITE));
        assert_eq!(set.len(), 1);
        assert_eq!(set.skipped, 2);
    }

    #[test]
    fn test_bounds() {
        let mut set = SampleSet::new();
        assert_eq!(set.bounds(), None);
        set.push(Sample::new(Vec3::new(1.0, -2.0, 3.0), Color::WHITE));
        set.push(Sample::new(Vec3::new(-1.0, 5.0, 0.0), Color::WHITE));
        assert_eq!(
            set.bounds(),
            Some((Vec3::new(-1.0, -2.0, 0.0), Vec3::new(1.0, 5.0, 3.0)))
        );
    }
}
