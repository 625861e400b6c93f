//! PLY point clouds (ascii, binary little endian, binary big endian)
//!
//! Only the `vertex` element is read. It needs `x`, `y` and `z`; colors come
//! from `red`/`green`/`blue` (or the `r`/`g`/`b` and `diffuse_*` spellings) and
//! default to white. Elements before `vertex` are skipped.
//!
//! Header lines and binary records are decoded with `nom`.

use crate::color::Color;
use crate::error::{ConvertError, Result};
use crate::parser::text_lines;
use crate::sample::{Sample, SampleSet};
use glam::Vec3;
use nom::branch::alt;
use nom::bytes::complete::{take, take_till1};
use nom::character::complete::space0;
use nom::combinator::{all_consuming, map, map_opt, map_res, verify};
use nom::error::{Error, ErrorKind};
use nom::number::complete as number;
use nom::number::Endianness;
use nom::sequence::{preceded, terminated};
use nom::{IResult, Parser};
use std::io::{BufRead, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    Binary(Endianness),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "int8" => ScalarType::I8,
            "uchar" | "uint8" => ScalarType::U8,
            "short" | "int16" => ScalarType::I16,
            "ushort" | "uint16" => ScalarType::U16,
            "int" | "int32" => ScalarType::I32,
            "uint" | "uint32" => ScalarType::U32,
            "float" | "float32" => ScalarType::F32,
            "double" | "float64" => ScalarType::F64,
            _ => return None,
        })
    }

    fn size(self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    fn decode(self, input: &[u8], endian: Endianness) -> IResult<&[u8], f64> {
        match self {
            ScalarType::I8 => widen(number::i8(input)),
            ScalarType::U8 => widen(number::u8(input)),
            ScalarType::I16 => widen(number::i16(endian)(input)),
            ScalarType::U16 => widen(number::u16(endian)(input)),
            ScalarType::I32 => widen(number::i32(endian)(input)),
            ScalarType::U32 => widen(number::u32(endian)(input)),
            ScalarType::F32 => widen(number::f32(endian)(input)),
            ScalarType::F64 => number::f64(endian)(input),
        }
    }
}

fn widen<T: Into<f64>>(result: IResult<&[u8], T>) -> IResult<&[u8], f64> {
    result.map(|(rest, value)| (rest, value.into()))
}

#[derive(Debug, Clone, PartialEq)]
enum Property {
    Scalar {
        name: String,
        ty: ScalarType,
    },
    List {
        name: String,
        count: ScalarType,
        item: ScalarType,
    },
}

impl Property {
    fn name(&self) -> &str {
        match self {
            Property::Scalar { name, .. } | Property::List { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq)]
struct Header {
    encoding: Encoding,
    elements: Vec<Element>,
}

/// One line of the header after the `ply` magic
#[derive(Debug, Clone, PartialEq)]
enum HeaderLine<'a> {
    Format(&'a str),
    Element(&'a str, usize),
    Property(Property),
    Ignored,
    End,
}

/// Positions of the properties we need inside a vertex record
#[derive(Debug, Clone, Copy)]
struct VertexLayout {
    position: [usize; 3],
    color: Option<([usize; 3], bool)>,
}

impl VertexLayout {
    fn from_element(element: &Element) -> Result<Self> {
        let find = |names: &[&str]| {
            element
                .properties
                .iter()
                .position(|p| {
                    matches!(p, Property::Scalar { .. }) && names.iter().any(|n| *n == p.name())
                })
        };

        let position = match (find(&["x"]), find(&["y"]), find(&["z"])) {
            (Some(x), Some(y), Some(z)) => [x, y, z],
            _ => {
                return Err(ConvertError::Parse(
                    "PLY vertex element has no x/y/z properties".to_string(),
                ))
            }
        };

        let color = match (
            find(&["red", "r", "diffuse_red"]),
            find(&["green", "g", "diffuse_green"]),
            find(&["blue", "b", "diffuse_blue"]),
        ) {
            (Some(r), Some(g), Some(b)) => {
                let is_float = matches!(
                    element.properties[r],
                    Property::Scalar { ty, .. } if ty.is_float()
                );
                Some(([r, g, b], is_float))
            }
            _ => None,
        };

        Ok(Self { position, color })
    }

    fn sample(&self, values: &[f64]) -> Option<Sample> {
        let [x, y, z] = self.position.map(|i| values[i] as f32);
        let color = match self.color {
            Some(([r, g, b], true)) => {
                Color::from_unit(values[r] as f32, values[g] as f32, values[b] as f32)
            }
            Some(([r, g, b], false)) => {
                Color::from_byte_range(values[r] as f32, values[g] as f32, values[b] as f32)
            }
            None => Color::WHITE,
        };
        let position = Vec3::new(x, y, z);
        position.is_finite().then(|| Sample::new(position, color))
    }
}

pub fn parse<R: BufRead>(mut reader: R) -> Result<SampleSet> {
    let header = read_header(&mut reader)?;

    let Some(vertex_index) = header.elements.iter().position(|e| e.name == "vertex") else {
        return Ok(SampleSet::new());
    };
    let vertex = &header.elements[vertex_index];
    let layout = VertexLayout::from_element(vertex)?;
    let preceding = &header.elements[..vertex_index];

    match header.encoding {
        Encoding::Ascii => Ok(ascii_body(reader, preceding, vertex, &layout)?),
        Encoding::Binary(endian) => {
            let mut body = Vec::new();
            reader.read_to_end(&mut body)?;
            Ok(binary_body(&body, endian, preceding, vertex, &layout))
        }
    }
}

/// One vertex per line; lines that do not decode are counted as skipped
fn ascii_body<R: BufRead>(
    reader: R,
    preceding: &[Element],
    vertex: &Element,
    layout: &VertexLayout,
) -> std::io::Result<SampleSet> {
    let mut set = SampleSet::new();
    let mut lines = text_lines(reader);

    let skipped_records = preceding
        .iter()
        .fold(0usize, |total, e| total.saturating_add(e.count));
    for _ in 0..skipped_records {
        if lines.next().transpose()?.is_none() {
            set.skipped += vertex.count;
            return Ok(set);
        }
    }

    for read in 0..vertex.count {
        let Some(line) = lines.next().transpose()? else {
            set.skipped += vertex.count - read;
            break;
        };
        let sample = line
            .and_then(|line| ascii_values(&line, &vertex.properties))
            .and_then(|values| layout.sample(&values));
        match sample {
            Some(sample) => set.push(sample),
            None => set.skip(),
        }
    }
    Ok(set)
}

/// A body that ends early loses the remaining vertices, nothing more
fn binary_body(
    body: &[u8],
    endian: Endianness,
    preceding: &[Element],
    vertex: &Element,
    layout: &VertexLayout,
) -> SampleSet {
    let mut set = SampleSet::new();
    let mut input = body;

    for element in preceding {
        for _ in 0..element.count {
            match binary_record(input, &element.properties, endian) {
                Ok((rest, _)) => input = rest,
                Err(_) => {
                    set.skipped += vertex.count;
                    return set;
                }
            }
        }
    }

    for read in 0..vertex.count {
        match binary_record(input, &vertex.properties, endian) {
            Ok((rest, values)) => {
                input = rest;
                match layout.sample(&values) {
                    Some(sample) => set.push(sample),
                    None => set.skip(),
                }
            }
            Err(_) => {
                set.skipped += vertex.count - read;
                break;
            }
        }
    }
    set
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<Header> {
    let mut lines = text_lines(reader);
    let mut next_line = || -> Result<Option<String>> {
        match lines.next().transpose()? {
            None => Ok(None),
            Some(None) => Err(ConvertError::Parse("PLY header is not valid text".to_string())),
            Some(Some(line)) => Ok(Some(line.trim().to_string())),
        }
    };

    if next_line()?.as_deref() != Some("ply") {
        return Err(ConvertError::Parse("missing PLY magic".to_string()));
    }

    let mut encoding = None;
    let mut elements: Vec<Element> = Vec::new();

    loop {
        let Some(line) = next_line()? else {
            return Err(ConvertError::Parse("PLY header has no end_header".to_string()));
        };
        if line.is_empty() {
            continue;
        }
        let (_, parsed) = all_consuming(header_line)
            .parse(line.as_str())
            .map_err(|_| ConvertError::Parse(format!("unexpected PLY header line '{}'", line)))?;

        match parsed {
            HeaderLine::End => break,
            HeaderLine::Ignored => {}
            HeaderLine::Format(format) => {
                encoding = Some(match format {
                    "ascii" => Encoding::Ascii,
                    "binary_little_endian" => Encoding::Binary(Endianness::Little),
                    "binary_big_endian" => Encoding::Binary(Endianness::Big),
                    other => {
                        return Err(ConvertError::Parse(format!(
                            "unknown PLY format '{}'",
                            other
                        )))
                    }
                });
            }
            HeaderLine::Element(name, count) => elements.push(Element {
                name: name.to_string(),
                count,
                properties: Vec::new(),
            }),
            HeaderLine::Property(property) => {
                elements
                    .last_mut()
                    .ok_or_else(|| {
                        ConvertError::Parse("PLY property before any element".to_string())
                    })?
                    .properties
                    .push(property);
            }
        }
    }

    let encoding =
        encoding.ok_or_else(|| ConvertError::Parse("PLY header has no format".to_string()))?;
    Ok(Header { encoding, elements })
}

fn word(input: &str) -> IResult<&str, &str> {
    preceded(space0, take_till1(|c: char| c.is_whitespace())).parse(input)
}

fn scalar_type(input: &str) -> IResult<&str, ScalarType> {
    map_opt(word, ScalarType::from_name).parse(input)
}

fn property(input: &str) -> IResult<&str, Property> {
    let list = preceded(
        verify(word, |w: &str| w == "list"),
        (scalar_type, scalar_type, word),
    );
    alt((
        map(list, |(count, item, name)| Property::List {
            name: name.to_string(),
            count,
            item,
        }),
        map((scalar_type, word), |(ty, name)| Property::Scalar {
            name: name.to_string(),
            ty,
        }),
    ))
    .parse(input)
}

fn header_line(input: &str) -> IResult<&str, HeaderLine<'_>> {
    let (rest, keyword) = word(input)?;
    match keyword {
        "end_header" => Ok((rest, HeaderLine::End)),
        "comment" | "obj_info" => Ok(("", HeaderLine::Ignored)),
        "format" => map(terminated(word, word), HeaderLine::Format).parse(rest),
        "element" => map((word, map_res(word, str::parse::<usize>)), |(name, count)| {
            HeaderLine::Element(name, count)
        })
        .parse(rest),
        "property" => map(property, HeaderLine::Property).parse(rest),
        _ => Err(nom::Err::Error(Error::new(input, ErrorKind::Tag))),
    }
}

/// One value per property; lists are consumed and reported as 0
fn ascii_values(line: &str, properties: &[Property]) -> Option<Vec<f64>> {
    let mut tokens = line.split_whitespace();
    let mut values = Vec::with_capacity(properties.len());
    for property in properties {
        match property {
            Property::Scalar { .. } => values.push(tokens.next()?.parse().ok()?),
            Property::List { .. } => {
                let count: usize = tokens.next()?.parse().ok()?;
                for _ in 0..count {
                    tokens.next()?;
                }
                values.push(0.0);
            }
        }
    }
    Some(values)
}

fn binary_record<'a>(
    mut input: &'a [u8],
    properties: &[Property],
    endian: Endianness,
) -> IResult<&'a [u8], Vec<f64>> {
    let mut values = Vec::with_capacity(properties.len());
    for property in properties {
        match property {
            Property::Scalar { ty, .. } => {
                let (rest, value) = ty.decode(input, endian)?;
                values.push(value);
                input = rest;
            }
            Property::List { count, item, .. } => {
                let (rest, n) = count.decode(input, endian)?;
                let len = (n.max(0.0) as usize).saturating_mul(item.size());
                let (rest, _) = skip_bytes(rest, len)?;
                values.push(0.0);
                input = rest;
            }
        }
    }
    Ok((input, values))
}

fn skip_bytes(input: &[u8], len: usize) -> IResult<&[u8], &[u8]> {
    take(len).parse(input)
}
