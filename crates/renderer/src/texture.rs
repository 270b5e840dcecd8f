//! wgpu-backed texture objects addressed by [`TextureHandle`].

use std::collections::HashMap;

use asset::gpu::{self, FilterMode, GraphicsContext, SamplerParams, WrapMode};
use asset::{GpuError, TextureHandle};
use wgpu::{
    AddressMode, BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, Device, Extent3d, Queue, Sampler, SamplerBindingType, SamplerDescriptor,
    ShaderStages, Texture, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureView, TextureViewDimension,
};

/// Colour textures are stored as linear RGBA8, sampled as the stored
/// values; wgpu has no 3-channel format.
pub const COLOR_TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// A texture with its view, sampler and the bind group used when drawing.
pub struct GpuTexture {
    pub texture: Texture,
    pub view: TextureView,
    pub sampler: Sampler,
    pub bind_group: BindGroup,
}

/// Owns every texture created through [`WgpuContext`].
pub struct TextureStore {
    layout: BindGroupLayout,
    textures: HashMap<TextureHandle, GpuTexture>,
    next_id: u32,
}

impl TextureStore {
    pub fn new(device: &Device) -> Self {
        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Texture BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        Self {
            layout,
            textures: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn layout(&self) -> &BindGroupLayout {
        &self.layout
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Borrow the store together with the device/queue as a [`GraphicsContext`].
    pub fn context<'a>(&'a mut self, device: &'a Device, queue: &'a Queue) -> WgpuContext<'a> {
        WgpuContext {
            device,
            queue,
            store: self,
        }
    }
}

/// [`GraphicsContext`] implementation writing into a [`TextureStore`].
pub struct WgpuContext<'a> {
    device: &'a Device,
    queue: &'a Queue,
    store: &'a mut TextureStore,
}

impl WgpuContext<'_> {
    fn bind_group(&self, view: &TextureView, sampler: &Sampler) -> BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture BG"),
            layout: &self.store.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn allocate(&self, width: u32, height: u32) -> (Texture, TextureView) {
        let texture = self.device.create_texture(&TextureDescriptor {
            label: Some("Color texture"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: COLOR_TEXTURE_FORMAT,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}

impl GraphicsContext for WgpuContext<'_> {
    fn create_texture(&mut self) -> TextureHandle {
        self.store.next_id += 1;
        let handle = TextureHandle(self.store.next_id);

        // 1x1 storage until something is uploaded.
        let (texture, view) = self.allocate(1, 1);
        let sampler = self
            .device
            .create_sampler(&sampler_descriptor(SamplerParams::default()));
        let bind_group = self.bind_group(&view, &sampler);
        self.store.textures.insert(
            handle,
            GpuTexture {
                texture,
                view,
                sampler,
                bind_group,
            },
        );
        handle
    }

    fn set_sampler(&mut self, handle: TextureHandle, params: SamplerParams) -> Result<(), GpuError> {
        let sampler = self.device.create_sampler(&sampler_descriptor(params));
        let view = &self
            .store
            .textures
            .get(&handle)
            .ok_or(GpuError::UnknownTexture(handle))?
            .view;
        let bind_group = self.bind_group(view, &sampler);

        let entry = self
            .store
            .textures
            .get_mut(&handle)
            .ok_or(GpuError::UnknownTexture(handle))?;
        entry.sampler = sampler;
        entry.bind_group = bind_group;
        Ok(())
    }

    fn upload_rgb8(
        &mut self,
        handle: TextureHandle,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), GpuError> {
        gpu::check_rgb8_upload(width, height, pixels)?;
        gpu::check_texture_extent(
            width,
            height,
            self.device.limits().max_texture_dimension_2d,
        )?;
        if !self.store.textures.contains_key(&handle) {
            return Err(GpuError::UnknownTexture(handle));
        }

        let (texture, view) = self.allocate(width, height);
        let rgba = rgb_to_rgba(pixels);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let sampler = &self.store.textures[&handle].sampler;
        let bind_group = self.bind_group(&view, sampler);
        let entry = self
            .store
            .textures
            .get_mut(&handle)
            .ok_or(GpuError::UnknownTexture(handle))?;
        entry.texture.destroy();
        entry.texture = texture;
        entry.view = view;
        entry.bind_group = bind_group;
        Ok(())
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        if let Some(entry) = self.store.textures.remove(&handle) {
            entry.texture.destroy();
        }
    }

    fn backend_name(&self) -> &'static str {
        "wgpu"
    }
}

fn address_mode(mode: WrapMode) -> AddressMode {
    match mode {
        WrapMode::Repeat => AddressMode::Repeat,
        WrapMode::MirroredRepeat => AddressMode::MirrorRepeat,
        WrapMode::ClampToEdge => AddressMode::ClampToEdge,
    }
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

/// Translate sampler state. No mipmaps are generated, so the mip filter is unused.
pub fn sampler_descriptor(params: SamplerParams) -> SamplerDescriptor<'static> {
    SamplerDescriptor {
        label: Some("Color sampler"),
        address_mode_u: address_mode(params.wrap_s),
        address_mode_v: address_mode(params.wrap_t),
        mag_filter: filter_mode(params.mag_filter),
        min_filter: filter_mode(params.min_filter),
        ..Default::default()
    }
}

/// Expand tightly packed RGB8 to opaque RGBA8.
pub fn rgb_to_rgba(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(3)
        .flat_map(|p| [p[0], p[1], p[2], 255])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_expands_to_opaque_rgba() {
        assert_eq!(
            rgb_to_rgba(&[1, 2, 3, 4, 5, 6]),
            vec![1, 2, 3, 255, 4, 5, 6, 255]
        );
    }

    #[test]
    fn color_textures_are_not_srgb() {
        assert!(!COLOR_TEXTURE_FORMAT.is_srgb());
        assert_eq!(COLOR_TEXTURE_FORMAT.block_copy_size(None), Some(4));
    }

    #[test]
    fn upload_beyond_device_limit_is_rejected() {
        let max = wgpu::Limits::downlevel_webgl2_defaults().max_texture_dimension_2d;
        assert!(gpu::check_texture_extent(max, 1, max).is_ok());
        assert!(matches!(
            gpu::check_texture_extent(max + 1, 1, max),
            Err(GpuError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn repeat_linear_maps_to_wgpu() {
        let desc = sampler_descriptor(SamplerParams::REPEAT_LINEAR);
        assert_eq!(desc.address_mode_u, AddressMode::Repeat);
        assert_eq!(desc.address_mode_v, AddressMode::Repeat);
        assert_eq!(desc.mag_filter, wgpu::FilterMode::Linear);
        assert_eq!(desc.min_filter, wgpu::FilterMode::Linear);
    }

    #[test]
    fn clamp_nearest_maps_to_wgpu() {
        let desc = sampler_descriptor(SamplerParams {
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::MirroredRepeat,
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
        });
        assert_eq!(desc.address_mode_u, AddressMode::ClampToEdge);
        assert_eq!(desc.address_mode_v, AddressMode::MirrorRepeat);
        assert_eq!(desc.mag_filter, wgpu::FilterMode::Nearest);
    }
}
