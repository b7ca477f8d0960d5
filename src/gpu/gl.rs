//! OpenGL ES texture sink

use glow::HasContext;
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;

use super::{check_upload, PixelFormat, TextureDesc, TextureError, TextureId, TextureSink, WrapMode};

/// Uploads textures through a glow context
///
/// The context must be current on the calling thread.
pub struct GlTextureSink {
    gl: Rc<glow::Context>,
    textures: HashMap<TextureId, glow::Texture>,
    next_id: u32,
}

impl GlTextureSink {
    pub fn new(gl: Rc<glow::Context>) -> Self {
        Self {
            gl,
            textures: HashMap::new(),
            next_id: 0,
        }
    }
}

impl TextureSink for GlTextureSink {
    fn create(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<TextureId, TextureError> {
        check_upload(desc, pixels)?;

        let (internal_format, format) = match desc.format {
            PixelFormat::R8 => (glow::R8, glow::RED),
        };
        let wrap = match desc.wrap {
            WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        };

        let gl = &self.gl;
        let texture = unsafe {
            let tex = gl.create_texture().map_err(TextureError::Create)?;

            gl.bind_texture(glow::TEXTURE_2D, Some(tex));

            // Rows of R8 data are tightly packed
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal_format as i32,
                desc.width as i32,
                desc.height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );

            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap as i32);

            // Swizzle: R -> A (treat as coverage)
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_SWIZZLE_A, glow::RED as i32);

            gl.bind_texture(glow::TEXTURE_2D, None);

            tex
        };

        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(id, texture);

        debug!(
            "GL texture {:?} uploaded: {}x{} {:?}",
            id, desc.width, desc.height, desc.format
        );
        Ok(id)
    }

    fn destroy(&mut self, id: TextureId) {
        if let Some(tex) = self.textures.remove(&id) {
            unsafe {
                self.gl.delete_texture(tex);
            }
        }
    }
}
