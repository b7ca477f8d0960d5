//! Run-length glyph mask decoding
//!
//! Glyph bitmaps are stored as alternating runs of "off" and "on" pixels,
//! starting with "off". Each run length is one byte; the byte `0xFF` is an
//! escape and the real length follows as a little-endian `u16`.
//! Decoding stops once `width * height` pixels have been produced.

use thiserror::Error;

use super::metadata::Glyph;
use crate::constants::{PIXEL_OFF, PIXEL_ON, RUN_ESCAPE};

/// Glyph bitmap decode failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("glyph data ended after {produced} of {expected} pixels")]
    Exhausted { produced: usize, expected: usize },
    #[error("glyph data {offset}+{size} is outside the {blob_len} byte bitmap file")]
    OutOfBounds { offset: u32, size: u32, blob_len: usize },
}

/// Slice of the bitmap blob holding one glyph's run data
pub fn glyph_data<'a>(blob: &'a [u8], glyph: &Glyph) -> Result<&'a [u8], DecodeError> {
    let start = glyph.data_offset as usize;
    start
        .checked_add(glyph.data_size as usize)
        .and_then(|end| blob.get(start..end))
        .ok_or(DecodeError::OutOfBounds {
            offset: glyph.data_offset,
            size: glyph.data_size,
            blob_len: blob.len(),
        })
}

/// Decode one glyph into a row-major 8-bit alpha bitmap
///
/// Reads never leave `data`; running out of input before the bitmap is
/// full is an error.
pub fn decode_glyph(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, DecodeError> {
    let expected = width as usize * height as usize;
    let mut bitmap = vec![PIXEL_OFF; expected];

    let mut bytes = data.iter().copied();
    let mut pos = 0usize;
    let mut fill = false;

    while pos < expected {
        let exhausted = DecodeError::Exhausted {
            produced: pos,
            expected,
        };

        let count = match bytes.next() {
            Some(RUN_ESCAPE) => {
                let lo = bytes.next().ok_or_else(|| exhausted.clone())?;
                let hi = bytes.next().ok_or(exhausted)?;
                u16::from_le_bytes([lo, hi]) as usize
            }
            Some(count) => count as usize,
            None => return Err(exhausted),
        };

        // Overshooting runs only fill what is left
        let count = count.min(expected - pos);
        if fill {
            bitmap[pos..pos + count].fill(PIXEL_ON);
        }

        pos += count;
        fill = !fill;
    }

    Ok(bitmap)
}

/// Copy a decoded bitmap into a larger buffer at `(x, y)`
///
/// `stride` is the destination row length in bytes.
pub fn blit(bitmap: &[u8], width: usize, dest: &mut [u8], stride: usize, x: usize, y: usize) {
    if width == 0 {
        return;
    }
    for (row, src) in bitmap.chunks_exact(width).enumerate() {
        let start = (y + row) * stride + x;
        dest[start..start + width].copy_from_slice(src);
    }
}
