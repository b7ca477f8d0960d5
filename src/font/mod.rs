//! Bitmap font loading and glyph atlas management
//!
//! Handles:
//! - `.met` metadata parsing (glyph table, codepoint lookup)
//! - `.fnt` run-length glyph mask decoding
//! - Skyline packing into a single atlas texture
//! - Atlas upload and per-glyph UVs

pub mod atlas;
pub mod decoder;
pub mod metadata;
pub mod packer;

pub use atlas::{build_atlas, Atlas, AtlasTexture};
pub use decoder::{decode_glyph, DecodeError};
pub use metadata::{read_metadata, Glyph, GlyphLookup};
pub use packer::{choose_atlas_width, pack_glyphs, PackRect, SkylinePacker};

use log::{debug, info, warn};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::constants::{FONT_BITMAP_EXT, FONT_METADATA_EXT};
use crate::fs::{FileMode, FileSystem};
use crate::gpu::{TextureError, TextureSink};

/// Font loading failure
///
/// Any of these aborts loading the font.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("font data truncated while reading {field}")]
    Truncated { field: String },
    #[error("invalid font size {0}")]
    InvalidSize(i32),
    #[error("I/O error {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("atlas upload failed: {0}")]
    Upload(#[from] TextureError),
}

/// Bitmap font with its atlas texture
#[derive(Debug)]
pub struct Font {
    /// Path without extension, used for reloads
    base_path: String,
    name: String,
    /// Pixel height of every glyph
    size: u32,
    glyphs: Vec<Glyph>,
    lookup: GlyphLookup,
    /// Per-glyph flag: true if the glyph has no atlas cell
    skipped: Vec<bool>,
    atlas: Option<AtlasTexture>,
}

impl Font {
    /// Load `<base_path>.met` and `<base_path>.fnt`, then build the atlas
    pub fn load_from_file(
        fs: &dyn FileSystem,
        sink: &mut dyn TextureSink,
        base_path: &str,
    ) -> Result<Self, FontError> {
        let met_path = PathBuf::from(format!("{}.{}", base_path, FONT_METADATA_EXT));
        let fnt_path = PathBuf::from(format!("{}.{}", base_path, FONT_BITMAP_EXT));

        let meta = {
            let mut stream = fs.open(&met_path, FileMode::Read).map_err(|source| FontError::Io {
                context: format!("opening {}", met_path.display()),
                source,
            })?;
            read_metadata(&mut stream)?
        };

        // The bitmap blob is read in full and dropped once the atlas is uploaded
        let blob = {
            let mut stream = fs.open(&fnt_path, FileMode::Read).map_err(|source| FontError::Io {
                context: format!("opening {}", fnt_path.display()),
                source,
            })?;
            stream.read_all().map_err(|source| FontError::Io {
                context: format!("reading {}", fnt_path.display()),
                source,
            })?
        };

        // Every glyph's run-length data must lie inside the blob
        let required = meta
            .glyphs
            .iter()
            .map(|g| g.data_offset as u64 + g.data_size as u64)
            .max()
            .unwrap_or(0);
        if (blob.len() as u64) < required {
            warn!(
                "{} is {} bytes, glyph table needs {}",
                fnt_path.display(),
                blob.len(),
                required
            );
            return Err(FontError::Truncated {
                field: fnt_path.display().to_string(),
            });
        }

        let mut glyphs = meta.glyphs;
        let atlas = build_atlas(&mut glyphs, meta.size, &blob, sink)?;

        let mut skipped = vec![false; glyphs.len()];
        for &index in &atlas.skipped {
            skipped[index] = true;
        }

        info!(
            "Font loaded: '{}' ({}px, {} glyphs, atlas {}x{})",
            meta.name,
            meta.size,
            glyphs.len(),
            atlas.texture.width,
            atlas.texture.height
        );

        Ok(Self {
            base_path: base_path.to_string(),
            name: meta.name,
            size: meta.size,
            glyphs,
            lookup: meta.lookup,
            skipped,
            atlas: Some(atlas.texture),
        })
    }

    /// Reload from the same files and replace the atlas
    ///
    /// On failure the current font is left untouched.
    pub fn reload(&mut self, fs: &dyn FileSystem, sink: &mut dyn TextureSink) -> Result<(), FontError> {
        let fresh = Self::load_from_file(fs, sink, &self.base_path)?;
        self.destroy(sink);
        *self = fresh;
        debug!("Font '{}' reloaded", self.name);
        Ok(())
    }

    /// Release the atlas texture
    pub fn destroy(&mut self, sink: &mut dyn TextureSink) {
        if let Some(atlas) = self.atlas.take() {
            sink.destroy(atlas.id);
        }
    }

    /// Glyph for an exact codepoint; never substitutes
    pub fn find_glyph_no_fallback(&self, codepoint: u32) -> Option<&Glyph> {
        self.lookup.get(codepoint).map(|i| &self.glyphs[i])
    }

    /// Glyph for `codepoint`, or for `fallback` if the font lacks it
    pub fn find_glyph(&self, codepoint: u32, fallback: u32) -> Option<&Glyph> {
        self.find_glyph_no_fallback(codepoint)
            .or_else(|| self.find_glyph_no_fallback(fallback))
    }

    /// True if the glyph exists and has an atlas cell
    pub fn is_packed(&self, codepoint: u32) -> bool {
        self.lookup
            .get(codepoint)
            .is_some_and(|i| !self.skipped[i])
    }

    /// Glyphs without an atlas cell
    pub fn skipped_glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs
            .iter()
            .zip(&self.skipped)
            .filter(|(_, skipped)| **skipped)
            .map(|(glyph, _)| glyph)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Font pixel size (glyph height)
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Atlas texture, `None` after `destroy`
    pub fn atlas(&self) -> Option<&AtlasTexture> {
        self.atlas.as_ref()
    }
}
