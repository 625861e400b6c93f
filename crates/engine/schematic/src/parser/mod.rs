//! Point cloud parsers
//!
//! Every parser turns a text or binary point cloud into a [`SampleSet`]. Records
//! that do not meet a format's minimum requirements are dropped and counted in
//! [`SampleSet::skipped`] instead of failing the file; only structural problems
//! (a corrupt PLY header, an unreadable file) are errors.

pub mod csv;
pub mod ply;
pub mod xyz;

use crate::error::Result;
use crate::sample::SampleSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Supported point cloud encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointCloudFormat {
    Csv,
    Ply,
    Xyz,
    Asc,
}

impl PointCloudFormat {
    /// Parse a point cloud from any buffered reader
    pub fn parse<R: BufRead>(self, reader: R) -> Result<SampleSet> {
        match self {
            PointCloudFormat::Csv => csv::parse(reader),
            PointCloudFormat::Ply => ply::parse(reader),
            PointCloudFormat::Xyz => xyz::parse(reader),
            PointCloudFormat::Asc => xyz::parse_asc(reader),
        }
    }

    pub fn parse_file(self, path: &Path) -> Result<SampleSet> {
        let reader = BufReader::new(File::open(path)?);
        let set = self.parse(reader)?;
        debug!(
            "{:?} parser read {} samples from {} ({} records skipped)",
            self,
            set.len(),
            path.display(),
            set.skipped
        );
        Ok(set)
    }
}

/// Lines of a text stream without their line endings
///
/// A line that is not valid UTF-8 comes back as `Ok(None)` so callers can count
/// it as a malformed record; only read failures are errors.
pub(crate) fn text_lines<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = io::Result<Option<String>>> {
    reader.split(b'\n').map(|line| {
        line.map(|mut bytes| {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            String::from_utf8(bytes).ok()
        })
    })
}
