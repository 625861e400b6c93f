//! Plain-text point lists (`.xyz`, `.asc`) and ESRI ASCII elevation grids
//!
//! A point line holds `x y z` optionally followed by `r g b` in the 0-255 range,
//! separated by whitespace, commas or semicolons. `#` and `//` lines are comments.

use crate::color::Color;
use crate::error::{ConvertError, Result};
use crate::parser::text_lines;
use crate::sample::{Sample, SampleSet};
use glam::Vec3;
use std::collections::HashMap;
use std::io::{self, BufRead};

/// ESRI grids wider or taller than this are rejected as corrupt
const MAX_GRID_EXTENT: f64 = u32::MAX as f64;

pub fn parse<R: BufRead>(reader: R) -> Result<SampleSet> {
    let mut set = SampleSet::new();
    for line in text_lines(reader) {
        match line? {
            Some(line) => read_point_line(&line, &mut set),
            None => set.skip(),
        }
    }
    Ok(set)
}

/// `.asc` files are either point lists or ESRI ASCII grids (`ncols` header)
pub fn parse_asc<R: BufRead>(reader: R) -> Result<SampleSet> {
    let mut lines = text_lines(reader);
    let mut set = SampleSet::new();

    // The first non-blank line decides the layout
    let first = loop {
        match lines.next().transpose()? {
            None => return Ok(set),
            Some(None) => set.skip(),
            Some(Some(line)) if line.trim().is_empty() => {}
            Some(Some(line)) => break line,
        }
    };

    if first_token_is(&first, "ncols") {
        return parse_esri_grid(std::iter::once(Ok(Some(first))).chain(lines), set);
    }
    read_point_line(&first, &mut set);
    for line in lines {
        match line? {
            Some(line) => read_point_line(&line, &mut set),
            None => set.skip(),
        }
    }
    Ok(set)
}

fn first_token_is(line: &str, key: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|t| t.eq_ignore_ascii_case(key))
}

fn is_comment(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with("//")
}

fn read_point_line(line: &str, set: &mut SampleSet) {
    let line = line.trim();
    if is_comment(line) {
        return;
    }
    match parse_point(line) {
        Some(sample) => set.push(sample),
        None => set.skip(),
    }
}

fn parse_point(line: &str) -> Option<Sample> {
    let fields: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|s| !s.is_empty())
        .collect();
    if fields.len() < 3 {
        return None;
    }

    let number = |i: usize| fields[i].parse::<f32>().ok().filter(|v| v.is_finite());
    let position = Vec3::new(number(0)?, number(1)?, number(2)?);
    let color = if fields.len() >= 6 {
        Color::from_byte_range(number(3)?, number(4)?, number(5)?)
    } else {
        Color::WHITE
    };
    Some(Sample::new(position, color))
}

/// Read an ESRI ASCII grid: every cell becomes a sample at (col, elevation, row)
fn parse_esri_grid<I>(mut lines: I, mut set: SampleSet) -> Result<SampleSet>
where
    I: Iterator<Item = io::Result<Option<String>>>,
{
    let mut header: HashMap<String, f64> = HashMap::new();

    // Header lines are `key value` pairs with a non-numeric key
    let mut first_row = None;
    for line in lines.by_ref() {
        let line = line?
            .ok_or_else(|| ConvertError::Parse("ASC grid header is not valid text".to_string()))?;
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };
        if key.parse::<f64>().is_ok() {
            first_row = Some(line);
            break;
        }
        let value = tokens.next().and_then(|v| v.parse::<f64>().ok()).ok_or_else(|| {
            ConvertError::Parse(format!("invalid ASC header line '{}'", line.trim()))
        })?;
        header.insert(key.to_ascii_lowercase(), value);
    }

    let get = |key: &str| {
        header
            .get(key)
            .copied()
            .ok_or_else(|| ConvertError::Parse(format!("ASC grid header is missing '{}'", key)))
    };
    let cols = grid_extent("ncols", get("ncols")?)?;
    let rows = grid_extent("nrows", get("nrows")?)?;
    let cell_size = get("cellsize")? as f32;
    let nodata = header.get("nodata_value").copied();

    let total = cols.checked_mul(rows).ok_or_else(|| {
        ConvertError::Parse(format!("ASC grid of {}x{} cells is too large", cols, rows))
    })?;
    let mut index = 0usize;
    let rows_iter = first_row.map(|line| Ok(Some(line))).into_iter().chain(lines);
    'cells: for line in rows_iter {
        let Some(line) = line? else {
            set.skip();
            continue;
        };
        for token in line.split_whitespace() {
            if index >= total {
                break 'cells;
            }
            let (row, col) = (index / cols, index % cols);
            index += 1;

            let Ok(value) = token.parse::<f64>() else {
                set.skip();
                continue;
            };
            if nodata.is_some_and(|n| (value - n).abs() < f64::EPSILON) {
                continue;
            }
            let position = Vec3::new(col as f32 * cell_size, value as f32, row as f32 * cell_size);
            set.push(Sample::new(position, Color::WHITE));
        }
    }
    Ok(set)
}

/// `ncols` / `nrows` must be whole, non-negative and representable
fn grid_extent(key: &str, value: f64) -> Result<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > MAX_GRID_EXTENT {
        return Err(ConvertError::Parse(format!(
            "ASC grid '{}' must be a whole number of cells (got {})",
            key, value
        )));
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xyz_points() {
        let data = "\
# exported cloud
1 2 3
4,5,6,255,0,0

7;8;9;0;128;300
1 2
a b c
";
        let set = parse(data.as_bytes()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.skipped, 2);
        assert_eq!(set.samples[0].color, Color::WHITE);
        assert_eq!(set.samples[1].color, Color::new(255, 0, 0));
        assert_eq!(set.samples[2].color, Color::new(0, 128, 255));
        assert_eq!(set.samples[2].position, Vec3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_asc_point_list() {
        let data = "// cloudcompare\n0.5 0.5 0.5 10 20 30\n";
        let set = parse_asc(data.as_bytes()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.samples[0].color, Color::new(10, 20, 30));
    }

    #[test]
    fn test_asc_esri_grid() {
        let data = "\
ncols 3
nrows 2
xllcorner 100.0
yllcorner 200.0
cellsize 2
NODATA_value -9999
1 2 3
4 -9999 x
";
        let set = parse_asc(data.as_bytes()).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.skipped, 1);
        assert_eq!(set.samples[0].position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(set.samples[2].position, Vec3::new(4.0, 3.0, 0.0));
        assert_eq!(set.samples[3].position, Vec3::new(0.0, 4.0, 2.0));
    }

    #[test]
    fn test_asc_grid_without_size_is_an_error() {
        let data = "ncols 3\nnrows 2\n1 2 3\n";
        assert!(parse_asc(data.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_asc() {
        let set = parse_asc("\n\n".as_bytes()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let data: &[u8] = b"1 2 3\n4 5 \xff\n7 8 9\n";
        let set = parse(data).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.skipped, 1);
        assert_eq!(set.samples[1].position, Vec3::new(7.0, 8.0, 9.0));

        let set = parse_asc(data).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.skipped, 1);
    }

    #[test]
    fn test_asc_grid_extent_overflow_is_an_error() {
        let data = "ncols 1e20\nnrows 1e20\ncellsize 1\n1 2 3\n";
        assert!(matches!(parse_asc(data.as_bytes()), Err(ConvertError::Parse(_))));

        let data = "ncols 4294967295\nnrows 4294967295\ncellsize 1\n1 2 3\n";
        let set = parse_asc(data.as_bytes()).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_asc_grid_extent_must_be_whole() {
        for header in ["ncols 2.5\nnrows 2", "ncols -3\nnrows 2", "ncols 3\nnrows nan"] {
            let data = format!("{}\ncellsize 1\n1 2 3\n", header);
            assert!(parse_asc(data.as_bytes()).is_err(), "{}", header);
        }
    }
}
