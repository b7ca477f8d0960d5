//! GPU texture upload
//!
//! Handles:
//! - Texture sink abstraction (create / destroy)
//! - OpenGL ES upload (glow)
//! - CPU-side sink for tooling and tests

pub mod gl;

pub use gl::GlTextureSink;

use log::debug;
use std::collections::HashMap;
use thiserror::Error;

/// Opaque handle of an uploaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Pixel formats understood by texture sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single channel, 8 bits
    R8,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    ClampToEdge,
}

/// Texture creation parameters
///
/// Only single-level textures are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub format: PixelFormat,
    pub wrap: WrapMode,
}

impl TextureDesc {
    /// Number of bytes the base level occupies
    pub fn byte_len(&self) -> usize {
        match self.format {
            PixelFormat::R8 => self.width as usize * self.height as usize,
        }
    }
}

/// Texture upload failure
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("pixel data is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("invalid texture size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("unsupported mip level count {0}")]
    MipLevels(u32),
    #[error("failed to create texture: {0}")]
    Create(String),
}

/// Destination for texture uploads
pub trait TextureSink {
    /// Upload pixel data as a new texture (blocking)
    fn create(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<TextureId, TextureError>;

    /// Release a texture created by this sink
    fn destroy(&mut self, id: TextureId);
}

/// Validate pixel data against a descriptor
pub(crate) fn check_upload(desc: &TextureDesc, pixels: &[u8]) -> Result<(), TextureError> {
    if desc.width == 0 || desc.height == 0 {
        return Err(TextureError::InvalidSize {
            width: desc.width,
            height: desc.height,
        });
    }
    if desc.mip_levels != 1 {
        return Err(TextureError::MipLevels(desc.mip_levels));
    }
    if pixels.len() != desc.byte_len() {
        return Err(TextureError::SizeMismatch {
            expected: desc.byte_len(),
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Texture kept in CPU memory
#[derive(Debug, Clone)]
pub struct CpuTexture {
    pub desc: TextureDesc,
    pub pixels: Vec<u8>,
}

/// Texture sink that keeps uploads in memory
///
/// Used by the CLI (atlas dumps) and by tests.
#[derive(Debug, Default)]
pub struct CpuTextureSink {
    textures: HashMap<TextureId, CpuTexture>,
    next_id: u32,
    destroyed: Vec<TextureId>,
}

impl CpuTextureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TextureId) -> Option<&CpuTexture> {
        self.textures.get(&id)
    }

    /// Number of live textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Textures released so far, in release order
    pub fn destroyed(&self) -> &[TextureId] {
        &self.destroyed
    }
}

impl TextureSink for CpuTextureSink {
    fn create(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<TextureId, TextureError> {
        check_upload(desc, pixels)?;

        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(
            id,
            CpuTexture {
                desc: *desc,
                pixels: pixels.to_vec(),
            },
        );
        debug!("CPU texture {:?} created: {}x{}", id, desc.width, desc.height);
        Ok(id)
    }

    fn destroy(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_some() {
            self.destroyed.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r8(width: u32, height: u32) -> TextureDesc {
        TextureDesc {
            width,
            height,
            mip_levels: 1,
            format: PixelFormat::R8,
            wrap: WrapMode::ClampToEdge,
        }
    }

    #[test]
    fn test_cpu_sink_create_destroy() {
        let mut sink = CpuTextureSink::new();
        let id = sink.create(&r8(4, 2), &[0u8; 8]).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.get(id).unwrap().desc.width, 4);

        sink.destroy(id);
        assert!(sink.is_empty());
        assert_eq!(sink.destroyed(), &[id]);
    }

    #[test]
    fn test_cpu_sink_rejects_bad_size() {
        let mut sink = CpuTextureSink::new();
        assert!(matches!(
            sink.create(&r8(4, 2), &[0u8; 7]),
            Err(TextureError::SizeMismatch { expected: 8, actual: 7 })
        ));
        assert!(matches!(
            sink.create(&r8(0, 2), &[]),
            Err(TextureError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_cpu_sink_rejects_mip_chain() {
        let mut sink = CpuTextureSink::new();
        let desc = TextureDesc {
            mip_levels: 4,
            ..r8(4, 2)
        };
        assert!(matches!(
            sink.create(&desc, &[0u8; 8]),
            Err(TextureError::MipLevels(4))
        ));
        assert!(sink.is_empty());
    }
}
