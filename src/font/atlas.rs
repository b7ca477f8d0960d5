//! Glyph atlas
//!
//! Packs every glyph of a bitmap font into a single greyscale texture:
//! pack rectangles, decode each glyph's run-length mask into the shared
//! pixel buffer, compute UVs, then upload once.

use log::{debug, info, warn};

use super::decoder::{blit, decode_glyph, glyph_data};
use super::metadata::Glyph;
use super::packer::pack_glyphs;
use super::FontError;
use crate::gpu::{PixelFormat, TextureDesc, TextureId, TextureSink, WrapMode};

/// Uploaded atlas texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasTexture {
    pub id: TextureId,
    /// Texture width
    pub width: u32,
    /// Texture height
    pub height: u32,
}

/// Outcome of an atlas build
#[derive(Debug, Clone)]
pub struct Atlas {
    pub texture: AtlasTexture,
    /// Glyph indices with no atlas cell (pack overflow or bad bitmap data)
    pub skipped: Vec<usize>,
}

/// Build and upload the atlas for a font
///
/// Fills in the UV rectangle of every glyph that made it into the atlas.
/// Glyphs that do not fit or whose bitmap data is broken are skipped with a
/// warning; only the upload itself can fail.
pub fn build_atlas(
    glyphs: &mut [Glyph],
    font_size: u32,
    blob: &[u8],
    sink: &mut dyn TextureSink,
) -> Result<Atlas, FontError> {
    let packing = pack_glyphs(glyphs, font_size);

    let atlas_width = packing.width;
    // Keep a valid texture even when nothing was packed
    let atlas_height = packing.height.max(1);

    info!("Atlas texture: {}x{}", atlas_width, atlas_height);

    // Create atlas pixel data (R8), fully transparent
    let stride = atlas_width as usize;
    let mut atlas_data = vec![0u8; stride * atlas_height as usize];

    let u_scale = 1.0 / atlas_width as f32;
    let v_scale = 1.0 / atlas_height as f32;

    let mut skipped: Vec<usize> = packing.unpacked().map(|r| r.id).collect();

    for rect in packing.rects.iter().filter(|r| r.packed) {
        let glyph = &mut glyphs[rect.id];

        let bitmap = match glyph_data(blob, glyph)
            .and_then(|data| decode_glyph(data, glyph.width as u32, font_size))
        {
            Ok(bitmap) => bitmap,
            Err(e) => {
                warn!("Glyph U+{:04X} skipped: {}", glyph.codepoint, e);
                skipped.push(rect.id);
                continue;
            }
        };

        blit(
            &bitmap,
            glyph.width as usize,
            &mut atlas_data,
            stride,
            rect.x as usize,
            rect.y as usize,
        );

        glyph.u0 = rect.x as f32 * u_scale;
        glyph.u1 = (rect.x + rect.width) as f32 * u_scale;
        glyph.v0 = rect.y as f32 * v_scale;
        glyph.v1 = (rect.y + rect.height) as f32 * v_scale;
    }
    skipped.sort_unstable();

    let desc = TextureDesc {
        width: atlas_width,
        height: atlas_height,
        mip_levels: 1,
        format: PixelFormat::R8,
        wrap: WrapMode::ClampToEdge,
    };
    let id = sink.create(&desc, &atlas_data)?;

    debug!(
        "Glyph atlas uploaded: {} glyphs, {} skipped",
        glyphs.len() - skipped.len(),
        skipped.len()
    );

    Ok(Atlas {
        texture: AtlasTexture {
            id,
            width: atlas_width,
            height: atlas_height,
        },
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::CpuTextureSink;

    /// Glyph whose mask is fully "on"
    fn solid_glyph(codepoint: u16, width: u16, size: u32, blob: &mut Vec<u8>) -> Glyph {
        let offset = blob.len() as u32;
        let pixels = width as u32 * size;
        blob.push(0);
        blob.push(0xFF);
        blob.extend_from_slice(&(pixels as u16).to_le_bytes());
        Glyph {
            codepoint,
            width,
            data_offset: offset,
            data_size: 4,
            ..Glyph::default()
        }
    }

    #[test]
    fn test_build_atlas_uvs_map_to_pixels() {
        let size = 10;
        let mut blob = Vec::new();
        let mut glyphs = vec![
            solid_glyph(b'A' as u16, 6, size, &mut blob),
            solid_glyph(b'B' as u16, 9, size, &mut blob),
            solid_glyph(b'C' as u16, 3, size, &mut blob),
        ];

        let mut sink = CpuTextureSink::new();
        let atlas = build_atlas(&mut glyphs, size, &blob, &mut sink).unwrap();
        assert!(atlas.skipped.is_empty());
        assert_eq!(atlas.texture.width, 512);
        assert_eq!(atlas.texture.height, size + 2);

        let tex = sink.get(atlas.texture.id).unwrap();
        assert_eq!(tex.desc.format, PixelFormat::R8);
        assert_eq!(tex.desc.wrap, WrapMode::ClampToEdge);

        let w = atlas.texture.width as f32;
        let h = atlas.texture.height as f32;
        for glyph in &glyphs {
            assert!(glyph.u1 > glyph.u0);
            assert!(glyph.v1 > glyph.v0);

            let x = (glyph.u0 * w).round() as usize;
            let y = (glyph.v0 * h).round() as usize;
            assert_eq!(((glyph.u1 - glyph.u0) * w).round() as u16, glyph.width + 2);
            assert_eq!(((glyph.v1 - glyph.v0) * h).round() as u32, size + 2);

            // Glyph pixels are on, padding column stays clear
            let row = y * w as usize;
            assert_eq!(tex.pixels[row + x], 255);
            assert_eq!(tex.pixels[row + x + glyph.width as usize - 1], 255);
            assert_eq!(tex.pixels[row + x + glyph.width as usize], 0);
            let last_row = (y + size as usize - 1) * w as usize;
            assert_eq!(tex.pixels[last_row + x], 255);
            assert_eq!(tex.pixels[last_row + w as usize + x], 0);
        }
    }

    #[test]
    fn test_build_atlas_skips_bad_bitmap() {
        let size = 4;
        let mut blob = Vec::new();
        let good = solid_glyph(1, 2, size, &mut blob);
        let broken = Glyph {
            codepoint: 2,
            width: 2,
            data_offset: 100,
            data_size: 4,
            ..Glyph::default()
        };
        let mut glyphs = vec![good, broken];

        let mut sink = CpuTextureSink::new();
        let atlas = build_atlas(&mut glyphs, size, &blob, &mut sink).unwrap();
        assert_eq!(atlas.skipped, vec![1]);
        assert!(glyphs[0].u1 > 0.0);
        assert_eq!(glyphs[1].u1, 0.0);
    }

    #[test]
    fn test_build_atlas_empty_font() {
        let mut sink = CpuTextureSink::new();
        let atlas = build_atlas(&mut [], 12, &[], &mut sink).unwrap();
        assert_eq!(atlas.texture.width, 512);
        assert_eq!(atlas.texture.height, 1);
        assert!(sink.get(atlas.texture.id).unwrap().pixels.iter().all(|&p| p == 0));
    }
}
