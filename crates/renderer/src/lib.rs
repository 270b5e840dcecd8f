//! Renderer: wgpu init + depth + textured disco scene under three spotlights.
//! wgpu = 26.x, winit = 0.30.x

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use asset::{GraphicsContext, TextureHandle};
use bytemuck::{Pod, Zeroable};
use corelib::{Mat4, camera::Camera, lights::LightRig, lights::SpotLight};
use wgpu::{
    BindGroup, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BlendState, Buffer,
    BufferBindingType, BufferSize, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, ShaderModuleDescriptor,
    ShaderSource, ShaderStages, StoreOp, Surface, SurfaceConfiguration, SurfaceError,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, VertexState, util::DeviceExt,
};

use winit::{dpi::PhysicalSize, window::Window};

pub mod mesh;
pub mod texture;

use mesh::{GpuMesh, MESH_VERTEX_LAYOUT};
use texture::TextureStore;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.3,
    g: 0.4,
    b: 0.5,
    a: 1.0,
};

/// Scene objects as (label, mesh file, texture file), drawn in this order.
pub const SCENE_ASSETS: [(&str, &str, &str); 3] = [
    ("floor", "floor.obj", "floor.jpg"),
    ("bucket", "bucket.obj", "bucket.jpg"),
    ("timmy", "timmy.obj", "timmy.png"),
];

/// Start-up options for [`GpuState::new`].
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub backends: wgpu::Backends,
    pub assets_dir: PathBuf,
    /// Upload a checkerboard instead of leaving a failed texture unpopulated.
    pub fallback_textures: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            assets_dir: PathBuf::from("assets"),
            fallback_textures: false,
        }
    }
}

/// One spotlight as laid out in the shader (5 x vec4).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SpotLightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    /// cos(cut-off), constant, linear, quadratic.
    pub params: [f32; 4],
}

impl From<&SpotLight> for SpotLightUniform {
    fn from(light: &SpotLight) -> Self {
        Self {
            position: light.position.extend(1.0).to_array(),
            direction: light.direction.extend(0.0).to_array(),
            ambient: light.ambient.extend(1.0).to_array(),
            diffuse: light.diffuse.extend(1.0).to_array(),
            params: [light.cut_off, light.constant, light.linear, light.quadratic],
        }
    }
}

/// Scene UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub lights: [SpotLightUniform; 3],
}

impl SceneUniform {
    pub fn new(camera: &Camera, model: Mat4, lights: &[SpotLight; 3]) -> Self {
        Self {
            projection: camera.proj().to_cols_array_2d(),
            view: camera.view().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            lights: lights.each_ref().map(SpotLightUniform::from),
        }
    }
}

/// A mesh drawn with one texture.
pub struct SceneObject {
    pub mesh: GpuMesh,
    pub texture: TextureHandle,
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    /// Non-sRGB view of the swapchain texture the pipeline renders into.
    view_format: TextureFormat,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline & scene
    pipeline: RenderPipeline,
    textures: TextureStore,
    objects: Vec<SceneObject>,

    // Uniforms
    scene_bg: BindGroup,
    scene_buf: Buffer,
    camera: Camera,
    rig: LightRig,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window> and load the scene assets.
    pub async fn new(window: Arc<Window>, config: &RenderConfig) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("DiscoParty Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("request_device failed")?;

        // Surface format: shader output is written as-is, no sRGB encode.
        let caps = surface.get_capabilities(&adapter);
        let (surface_format, view_format) = pick_surface_format(&caps.formats)
            .context("Surface reports no supported formats")?;
        log::info!("Surface format {surface_format:?}, rendering through {view_format:?}");

        let max_dim = device.limits().max_texture_dimension_2d;
        let (width, height) = clamp_surface_size(width, height, max_dim);
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: if view_format == surface_format {
                vec![]
            } else {
                vec![view_format]
            },
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Scene WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        // ==== Scene BGL/BG ====
        let scene_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Scene BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: BufferSize::new(std::mem::size_of::<SceneUniform>() as u64),
                },
                count: None,
            }],
        });

        let camera = Camera::disco(width as f32 / height as f32);
        let rig = LightRig::disco();
        let scene_init = SceneUniform::new(&camera, Mat4::IDENTITY, &rig.lights());
        let scene_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene UBO"),
            contents: bytemuck::bytes_of(&scene_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene BG"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buf.as_entire_binding(),
            }],
        });

        let mut textures = TextureStore::new(&device);

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Scene PipelineLayout"),
            bind_group_layouts: &[&scene_bgl, textures.layout()],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MESH_VERTEX_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: view_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ==== Assets ====
        let objects = {
            let mut ctx = textures.context(&device, &queue);
            load_scene_objects(&device, &mut ctx, config)
        };

        Ok(Self {
            surface,
            surface_config,
            view_format,
            device,
            queue,
            pipeline,
            textures,
            objects,
            scene_bg,
            scene_buf,
            camera,
            rig,
            depth_view,
            width,
            height,
        })
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        let max_dim = self.device.limits().max_texture_dimension_2d;
        (self.width, self.height) = clamp_surface_size(width, height, max_dim);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
        self.camera = self
            .camera
            .with_aspect(self.width as f32 / self.height as f32);
    }

    /// Render one frame: rotate lights + clear + draw every scene object.
    pub fn render(&mut self) -> Result<(), SurfaceError> {
        let scene = SceneUniform::new(&self.camera, Mat4::IDENTITY, &self.rig.lights());
        self.queue
            .write_buffer(&self.scene_buf, 0, bytemuck::bytes_of(&scene));

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor {
            format: Some(self.view_format),
            ..Default::default()
        });

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.scene_bg, &[]);
            for object in &self.objects {
                let Some(texture) = self.textures.get(object.texture) else {
                    continue;
                };
                rpass.set_bind_group(1, &texture.bind_group, &[]);
                object.mesh.draw(&mut rpass);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();

        self.rig.advance();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }

    /// Release scene buffers and textures.
    pub fn shutdown(&mut self) {
        let mut ctx = self.textures.context(&self.device, &self.queue);
        for mut object in self.objects.drain(..) {
            object.mesh.release();
            ctx.delete_texture(object.texture);
        }
        log::info!("Released scene resources ({} textures left)", self.textures.len());
    }
}

/// Load every entry of [`SCENE_ASSETS`] from `config.assets_dir`.
/// Missing or broken files degrade to empty meshes / unpopulated textures.
fn load_scene_objects(
    device: &Device,
    ctx: &mut dyn GraphicsContext,
    config: &RenderConfig,
) -> Vec<SceneObject> {
    log::info!(
        "Loading scene assets from {:?} ({} backend)",
        config.assets_dir,
        ctx.backend_name()
    );
    SCENE_ASSETS
        .iter()
        .map(|&(label, mesh_file, texture_file)| {
            let data = asset::load_mesh(config.assets_dir.join(mesh_file));
            let mesh = GpuMesh::upload(device, label, &data);

            let texture_path = config.assets_dir.join(texture_file);
            let texture = if config.fallback_textures {
                asset::load_texture_or_fallback(&mut *ctx, &texture_path)
            } else {
                asset::load_texture(&mut *ctx, &texture_path)
            };

            SceneObject { mesh, texture }
        })
        .collect()
}

/// Pick the swapchain format and the non-sRGB format to render through.
/// A non-sRGB surface format is preferred; otherwise the first format is used
/// with its sRGB suffix stripped for the view.
pub fn pick_surface_format(formats: &[TextureFormat]) -> Option<(TextureFormat, TextureFormat)> {
    let surface = formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())?;
    Some((surface, surface.remove_srgb_suffix()))
}

/// Keep surface dimensions within `1..=max_dimension`.
pub fn clamp_surface_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    (
        width.clamp(1, max_dimension),
        height.clamp(1, max_dimension),
    )
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::vec3;

    #[test]
    fn scene_uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SpotLightUniform>(), 80);
        assert_eq!(std::mem::size_of::<SceneUniform>(), 3 * 64 + 3 * 80);
        assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
    }

    #[test]
    fn spotlight_uniform_packs_params() {
        let light = SpotLight::rig_light(vec3(1.0, -2.0, 3.0), vec3(0.0, 1.0, 0.0));
        let u = SpotLightUniform::from(&light);
        assert_eq!(u.position, [0.0, 200.0, 0.0, 1.0]);
        assert_eq!(u.direction, [1.0, -2.0, 3.0, 0.0]);
        assert_eq!(u.diffuse, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(u.params[1], 1.0);
        assert_eq!(u.params[2], 0.000035);
    }

    #[test]
    fn scene_uniform_follows_rig() {
        let camera = Camera::disco(4.0 / 3.0);
        let mut rig = LightRig::disco();
        let before = SceneUniform::new(&camera, Mat4::IDENTITY, &rig.lights());
        rig.advance();
        let after = SceneUniform::new(&camera, Mat4::IDENTITY, &rig.lights());
        assert_eq!(before.view, after.view);
        assert_ne!(before.lights[0].direction, after.lights[0].direction);
        assert_eq!(before.model, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn surface_format_prefers_non_srgb() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(
            pick_surface_format(&formats),
            Some((TextureFormat::Bgra8Unorm, TextureFormat::Bgra8Unorm))
        );
    }

    #[test]
    fn srgb_only_surface_renders_through_linear_view() {
        assert_eq!(
            pick_surface_format(&[TextureFormat::Rgba8UnormSrgb]),
            Some((TextureFormat::Rgba8UnormSrgb, TextureFormat::Rgba8Unorm))
        );
        assert_eq!(pick_surface_format(&[]), None);
    }

    #[test]
    fn surface_size_is_clamped_to_device_limit() {
        assert_eq!(clamp_surface_size(0, 600, 2048), (1, 600));
        assert_eq!(clamp_surface_size(4096, 9000, 2048), (2048, 2048));
        assert_eq!(clamp_surface_size(1024, 768, 2048), (1024, 768));
    }

    #[test]
    fn scene_assets_pair_meshes_with_textures() {
        let labels: Vec<&str> = SCENE_ASSETS.iter().map(|a| a.0).collect();
        assert_eq!(labels, vec!["floor", "bucket", "timmy"]);
        assert!(SCENE_ASSETS.iter().all(|a| a.1.ends_with(".obj")));
    }
}
