//! Texture decoding and upload.
//! Images are flipped on decode so row 0 is the visual bottom row, matching
//! OBJ texture coordinates (v = 0 at the bottom).

use std::path::Path;

use crate::error::TextureError;
use crate::gpu::{GraphicsContext, SamplerParams, TextureHandle};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Channel count of the source file before conversion.
    pub source_channels: u8,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgb8,
}

impl TextureData {
    /// Create a new texture with given dimensions and RGB8 format.
    pub fn new_rgb8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 3) as usize,
            "Data size doesn't match RGB8 format"
        );
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgb8,
            source_channels: 3,
        }
    }

    /// Decode an image file, flip it vertically and convert it to RGB8.
    pub fn load_flipped<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        log::debug!("Decoding texture from {:?}", path);

        let img = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let source_channels = img.color().channel_count();

        let rgb = img.flipv().to_rgb8();
        let (width, height) = rgb.dimensions();
        let data = rgb.into_raw();

        log::info!(
            "Decoded texture {:?}: {}x{}, {} source channels",
            path,
            width,
            height,
            source_channels
        );

        Ok(Self {
            source_channels,
            ..Self::new_rgb8(width, height, data)
        })
    }

    /// Fallback texture: white/gray checkerboard with 8px cells.
    pub fn checkerboard(size: u32) -> Self {
        let mut data = Vec::with_capacity((size * size * 3) as usize);

        for y in 0..size {
            for x in 0..size {
                let checker = ((x / 8) + (y / 8)) % 2;
                if checker == 0 {
                    data.extend_from_slice(&[255, 255, 255]);
                } else {
                    data.extend_from_slice(&[128, 128, 128]);
                }
            }
        }

        Self::new_rgb8(size, size, data)
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgb8 => 3,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = (self.width * self.height * self.bytes_per_pixel()) as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }

    /// Apply the default sampler and upload the pixels into `handle`.
    pub fn upload_into<C: GraphicsContext + ?Sized>(
        &self,
        ctx: &mut C,
        handle: TextureHandle,
    ) -> Result<(), TextureError> {
        ctx.set_sampler(handle, SamplerParams::REPEAT_LINEAR)?;
        ctx.upload_rgb8(handle, self.width, self.height, &self.data)?;
        Ok(())
    }
}

/// Side of the checkerboard used by [`load_texture_or_fallback`].
pub const FALLBACK_TEXTURE_SIZE: u32 = 64;

/// Load a texture, always returning a freshly allocated handle.
///
/// The texture object is created before decoding. If decoding or upload
/// fails a diagnostic is logged and the handle is still returned, with
/// undefined content.
pub fn load_texture<C, P>(ctx: &mut C, path: P) -> TextureHandle
where
    C: GraphicsContext + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let handle = ctx.create_texture();
    match TextureData::load_flipped(path).and_then(|tex| tex.upload_into(ctx, handle)) {
        Ok(()) => log::info!(
            "Texture {:?} uploaded from {:?} ({})",
            handle,
            path,
            ctx.backend_name()
        ),
        Err(e @ TextureError::Decode { .. }) => log::error!("{e}"),
        Err(e) => log::error!("Texture {:?} from {}: {e}", handle, path.display()),
    }
    handle
}

/// Load a texture, allocating only when decoding succeeds.
pub fn try_load_texture<C, P>(ctx: &mut C, path: P) -> Result<TextureHandle, TextureError>
where
    C: GraphicsContext + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let tex = TextureData::load_flipped(path)?;
    let handle = ctx.create_texture();
    if let Err(e) = tex.upload_into(ctx, handle) {
        ctx.delete_texture(handle);
        return Err(e);
    }
    log::info!(
        "Texture {:?} uploaded from {:?} ({})",
        handle,
        path,
        ctx.backend_name()
    );
    Ok(handle)
}

/// Load a texture, uploading a checkerboard into the handle when the file
/// cannot be decoded.
pub fn load_texture_or_fallback<C, P>(ctx: &mut C, path: P) -> TextureHandle
where
    C: GraphicsContext + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let handle = ctx.create_texture();
    let tex = match TextureData::load_flipped(path) {
        Ok(tex) => tex,
        Err(e) => {
            log::error!("{e}; using checkerboard fallback");
            TextureData::checkerboard(FALLBACK_TEXTURE_SIZE)
        }
    };
    if let Err(e) = tex.upload_into(ctx, handle) {
        log::error!("Texture {:?} from {:?}: {}", handle, path, e);
    }
    handle
}
