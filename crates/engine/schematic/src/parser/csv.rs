//! CSV point clouds
//!
//! Each record holds at least 15 numeric fields: normalized color channels in
//! fields 7-9 and the position in fields 11-13. Shorter records and records with
//! any non-numeric field are skipped.

use crate::color::Color;
use crate::error::{ConvertError, Result};
use crate::sample::{Sample, SampleSet};
use ::csv::{ReaderBuilder, StringRecord, Trim};
use glam::Vec3;
use std::io::Read;

/// Minimum number of fields in a usable record
pub const MIN_FIELDS: usize = 15;

const COLOR_FIELDS: [usize; 3] = [7, 8, 9];
const POSITION_FIELDS: [usize; 3] = [11, 12, 13];

pub fn parse<R: Read>(reader: R) -> Result<SampleSet> {
    let mut records = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut set = SampleSet::new();
    for record in records.records() {
        match record {
            Ok(record) => match parse_record(&record) {
                Some(sample) => set.push(sample),
                None => set.skip(),
            },
            Err(e) if e.is_io_error() => return Err(ConvertError::Parse(e.to_string())),
            // Invalid UTF-8 and similar record-level problems
            Err(_) => set.skip(),
        }
    }
    Ok(set)
}

fn parse_record(record: &StringRecord) -> Option<Sample> {
    if record.len() < MIN_FIELDS {
        return None;
    }

    let mut values = Vec::with_capacity(record.len());
    for field in record.iter() {
        let value: f32 = field.replace(' ', "").parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        values.push(value);
    }

    let [r, g, b] = COLOR_FIELDS.map(|i| values[i]);
    let [x, y, z] = POSITION_FIELDS.map(|i| values[i]);
    Some(Sample::new(Vec3::new(x, y, z), Color::from_unit(r, g, b)))
}
