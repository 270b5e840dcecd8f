//! Graphics context seam for texture upload.
//!
//! Texture loading talks to the GPU only through [`GraphicsContext`], which
//! receives the target handle explicitly on every call instead of relying on
//! an implicitly bound texture. The renderer crate implements it on wgpu;
//! [`MockContext`] keeps everything in memory for tests and headless tools.

use std::collections::HashMap;

use crate::error::GpuError;

/// Opaque identifier of a texture object owned by a [`GraphicsContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Texture coordinate wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// Texel filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Sampler state attached to a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SamplerParams {
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
}

impl SamplerParams {
    /// Repeat on both axes, linear minification and magnification.
    pub const REPEAT_LINEAR: Self = Self {
        wrap_s: WrapMode::Repeat,
        wrap_t: WrapMode::Repeat,
        min_filter: FilterMode::Linear,
        mag_filter: FilterMode::Linear,
    };
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self::REPEAT_LINEAR
    }
}

/// Number of bytes a tightly packed RGB8 image of this size occupies.
pub fn rgb8_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// Minimal set of texture operations the asset loaders need.
pub trait GraphicsContext {
    /// Allocate a new texture object with no defined content.
    fn create_texture(&mut self) -> TextureHandle;

    /// Replace the sampler state of `handle`.
    fn set_sampler(&mut self, handle: TextureHandle, params: SamplerParams) -> Result<(), GpuError>;

    /// Upload a tightly packed, bottom-row-first RGB8 image into `handle`.
    fn upload_rgb8(
        &mut self,
        handle: TextureHandle,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), GpuError>;

    /// Release a texture. Unknown handles are ignored.
    fn delete_texture(&mut self, handle: TextureHandle);

    /// Name of the backend (for logs).
    fn backend_name(&self) -> &'static str;
}

/// Validate an RGB8 upload before touching any texture storage.
pub fn check_rgb8_upload(width: u32, height: u32, pixels: &[u8]) -> Result<(), GpuError> {
    if width == 0 || height == 0 {
        return Err(GpuError::InvalidDimensions { width, height });
    }
    let expected = rgb8_len(width, height);
    if pixels.len() != expected {
        return Err(GpuError::SizeMismatch {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Reject images wider or taller than the backend's texture size limit.
pub fn check_texture_extent(width: u32, height: u32, max_dimension: u32) -> Result<(), GpuError> {
    if width > max_dimension || height > max_dimension {
        return Err(GpuError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// In-memory texture: `None` image until something is uploaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MockTexture {
    pub sampler: Option<SamplerParams>,
    pub image: Option<MockImage>,
}

/// Uploaded RGB8 pixels, row 0 first.
#[derive(Clone, Debug, PartialEq)]
pub struct MockImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl MockImage {
    /// RGB of the texel at (`x`, `row`), row 0 being the first uploaded row.
    pub fn texel(&self, x: u32, row: u32) -> Option<[u8; 3]> {
        if x >= self.width || row >= self.height {
            return None;
        }
        let i = (row as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }
}

/// Graphics context that stores textures in memory.
#[derive(Debug, Default)]
pub struct MockContext {
    textures: HashMap<TextureHandle, MockTexture>,
    next_id: u32,
    created: usize,
    max_dimension: Option<u32>,
}

impl MockContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that rejects uploads larger than `max_dimension` on either axis.
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: Some(max_dimension),
            ..Self::default()
        }
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&MockTexture> {
        self.textures.get(&handle)
    }

    /// Number of live textures.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Total number of `create_texture` calls so far.
    pub fn created_textures(&self) -> usize {
        self.created
    }

    fn texture_mut(&mut self, handle: TextureHandle) -> Result<&mut MockTexture, GpuError> {
        self.textures
            .get_mut(&handle)
            .ok_or(GpuError::UnknownTexture(handle))
    }
}

impl GraphicsContext for MockContext {
    fn create_texture(&mut self) -> TextureHandle {
        // Handle 0 is never issued.
        self.next_id += 1;
        self.created += 1;
        let handle = TextureHandle(self.next_id);
        self.textures.insert(handle, MockTexture::default());
        handle
    }

    fn set_sampler(&mut self, handle: TextureHandle, params: SamplerParams) -> Result<(), GpuError> {
        self.texture_mut(handle)?.sampler = Some(params);
        Ok(())
    }

    fn upload_rgb8(
        &mut self,
        handle: TextureHandle,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), GpuError> {
        check_rgb8_upload(width, height, pixels)?;
        if let Some(max) = self.max_dimension {
            check_texture_extent(width, height, max)?;
        }
        self.texture_mut(handle)?.image = Some(MockImage {
            width,
            height,
            pixels: pixels.to_vec(),
        });
        Ok(())
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }

    fn backend_name(&self) -> &'static str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_distinct_and_nonzero() {
        let mut ctx = MockContext::new();
        let a = ctx.create_texture();
        let b = ctx.create_texture();
        assert_ne!(a, b);
        assert_ne!(a.0, 0);
        assert_eq!(ctx.live_textures(), 2);
    }

    #[test]
    fn upload_checks_size() {
        let mut ctx = MockContext::new();
        let tex = ctx.create_texture();
        let err = ctx.upload_rgb8(tex, 2, 2, &[0; 11]).unwrap_err();
        assert!(matches!(err, GpuError::SizeMismatch { expected: 12, actual: 11, .. }));
        assert!(ctx.texture(tex).unwrap().image.is_none());

        ctx.upload_rgb8(tex, 2, 2, &[7; 12]).unwrap();
        let image = ctx.texture(tex).unwrap().image.as_ref().unwrap();
        assert_eq!(image.texel(1, 1), Some([7, 7, 7]));
        assert_eq!(image.texel(2, 0), None);
    }

    #[test]
    fn zero_sized_upload_is_rejected() {
        let mut ctx = MockContext::new();
        let tex = ctx.create_texture();
        assert!(matches!(
            ctx.upload_rgb8(tex, 0, 4, &[]),
            Err(GpuError::InvalidDimensions { width: 0, height: 4 })
        ));
    }

    #[test]
    fn upload_over_size_limit_is_rejected() {
        assert!(check_texture_extent(8192, 8192, 8192).is_ok());
        assert!(matches!(
            check_texture_extent(20000, 2000, 8192),
            Err(GpuError::InvalidDimensions { width: 20000, height: 2000 })
        ));

        let mut ctx = MockContext::with_max_dimension(2);
        let tex = ctx.create_texture();
        assert!(matches!(
            ctx.upload_rgb8(tex, 1, 3, &[0; 9]),
            Err(GpuError::InvalidDimensions { width: 1, height: 3 })
        ));
        assert!(ctx.texture(tex).unwrap().image.is_none());
        ctx.upload_rgb8(tex, 2, 2, &[0; 12]).unwrap();
    }

    #[test]
    fn unknown_handle_is_an_error() {
        let mut ctx = MockContext::new();
        let err = ctx
            .set_sampler(TextureHandle(42), SamplerParams::default())
            .unwrap_err();
        assert!(matches!(err, GpuError::UnknownTexture(TextureHandle(42))));
    }

    #[test]
    fn delete_releases_texture() {
        let mut ctx = MockContext::new();
        let tex = ctx.create_texture();
        ctx.delete_texture(tex);
        assert_eq!(ctx.live_textures(), 0);
        assert_eq!(ctx.created_textures(), 1);
        ctx.delete_texture(tex);
    }
}
