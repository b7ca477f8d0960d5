//! Font metadata (`.met`) parsing
//!
//! Layout (little-endian):
//!
//! ```text
//! i32        font pixel size
//! [u16; 128] font name, UTF-16, NUL padded
//! u32        glyph count
//! records    glyph count x 16 bytes:
//!              u16 codepoint, u16 width, u32 data offset, u32 data size, u32 reserved
//! ```

use log::{debug, trace};
use std::io::{self, Read};

use super::FontError;
use crate::constants::{FONT_NAME_BYTES, GLYPH_RECORD_SIZE};

/// One glyph of a bitmap font
///
/// The UV rectangle is only meaningful once the atlas has been built.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Glyph {
    pub codepoint: u16,
    /// Bitmap width in pixels (height is the font size)
    pub width: u16,
    /// Start of the run-length data in the `.fnt` blob
    pub data_offset: u32,
    /// Length of the run-length data in bytes
    pub data_size: u32,
    pub u0: f32,
    pub u1: f32,
    pub v0: f32,
    pub v1: f32,
}

/// Codepoint -> glyph index table
///
/// Dense over `0..=max_codepoint`; absent codepoints hold `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphLookup {
    slots: Vec<Option<u32>>,
}

impl GlyphLookup {
    /// Build the table from a glyph list
    ///
    /// When a codepoint appears twice the later glyph wins.
    pub fn build(glyphs: &[Glyph]) -> Self {
        let Some(max_codepoint) = glyphs.iter().map(|g| g.codepoint).max() else {
            return Self::default();
        };

        let mut slots = vec![None; max_codepoint as usize + 1];
        for (index, glyph) in glyphs.iter().enumerate() {
            slots[glyph.codepoint as usize] = Some(index as u32);
        }

        Self { slots }
    }

    /// Glyph index for an exact codepoint
    pub fn get(&self, codepoint: u32) -> Option<usize> {
        self.slots
            .get(codepoint as usize)
            .copied()
            .flatten()
            .map(|i| i as usize)
    }

    /// Table length (`max_codepoint + 1`, or 0 when empty)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Parsed metadata stream
#[derive(Debug, Clone)]
pub struct FontMetadata {
    /// Font pixel height, shared by all glyphs
    pub size: u32,
    pub name: String,
    pub glyphs: Vec<Glyph>,
    pub lookup: GlyphLookup,
}

/// Read exactly `buf.len()` bytes, naming the field on failure
///
/// `field` is only evaluated when the read fails.
fn read_field<R, F>(reader: &mut R, buf: &mut [u8], field: F) -> Result<(), FontError>
where
    R: Read + ?Sized,
    F: FnOnce() -> String,
{
    reader.read_exact(buf).map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            FontError::Truncated { field: field() }
        } else {
            FontError::Io {
                context: format!("reading {}", field()),
                source,
            }
        }
    })
}

/// Decode a fixed-width UTF-16LE name, stopping at the first NUL
fn decode_name(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

fn parse_glyph(record: &[u8; GLYPH_RECORD_SIZE]) -> Glyph {
    Glyph {
        codepoint: u16::from_le_bytes([record[0], record[1]]),
        width: u16::from_le_bytes([record[2], record[3]]),
        data_offset: u32::from_le_bytes([record[4], record[5], record[6], record[7]]),
        data_size: u32::from_le_bytes([record[8], record[9], record[10], record[11]]),
        // record[12..16] is reserved
        ..Glyph::default()
    }
}

/// Parse a metadata stream
pub fn read_metadata<R: Read + ?Sized>(reader: &mut R) -> Result<FontMetadata, FontError> {
    let mut word = [0u8; 4];

    read_field(reader, &mut word, || "font size".to_string())?;
    let size = i32::from_le_bytes(word);
    if size < 0 {
        return Err(FontError::InvalidSize(size));
    }

    let mut raw_name = [0u8; FONT_NAME_BYTES];
    read_field(reader, &mut raw_name, || "font name".to_string())?;
    let name = decode_name(&raw_name);

    read_field(reader, &mut word, || "glyph count".to_string())?;
    let count = u32::from_le_bytes(word);
    debug!("Font '{}': size {}, {} glyphs", name, size, count);

    // Count comes from the file; don't trust it for preallocation
    let mut glyphs = Vec::with_capacity((count as usize).min(0x1_0000));
    let mut record = [0u8; GLYPH_RECORD_SIZE];
    for i in 0..count {
        read_field(reader, &mut record, || format!("glyph record {}", i))?;
        let glyph = parse_glyph(&record);
        trace!(
            "Glyph U+{:04X}: width {}, data {}+{}",
            glyph.codepoint,
            glyph.width,
            glyph.data_offset,
            glyph.data_size
        );
        glyphs.push(glyph);
    }

    let lookup = GlyphLookup::build(&glyphs);

    Ok(FontMetadata {
        size: size as u32,
        name,
        glyphs,
        lookup,
    })
}

/// Serialize metadata in `.met` layout
///
/// Names longer than 128 UTF-16 units are truncated.
pub fn write_metadata(size: i32, name: &str, glyphs: &[Glyph]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + FONT_NAME_BYTES + glyphs.len() * GLYPH_RECORD_SIZE);
    out.extend_from_slice(&size.to_le_bytes());

    let mut raw_name = [0u8; FONT_NAME_BYTES];
    for (slot, unit) in raw_name.chunks_exact_mut(2).zip(name.encode_utf16()) {
        slot.copy_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&raw_name);

    out.extend_from_slice(&(glyphs.len() as u32).to_le_bytes());
    for glyph in glyphs {
        out.extend_from_slice(&glyph.codepoint.to_le_bytes());
        out.extend_from_slice(&glyph.width.to_le_bytes());
        out.extend_from_slice(&glyph.data_offset.to_le_bytes());
        out.extend_from_slice(&glyph.data_size.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
    }
    out
}
