//! Asset loading: OBJ meshes into interleaved vertex buffers, images into
//! GPU textures through a [`gpu::GraphicsContext`].

pub mod error;
pub mod gpu;
pub mod mesh;
pub mod obj;
pub mod texture;

pub use error::{GpuError, MeshError, TextureError};
pub use gpu::{GraphicsContext, MockContext, SamplerParams, TextureHandle};
pub use mesh::{FLOATS_PER_VERTEX, InterleavedMesh, MeshVertex};
pub use obj::{load_mesh, load_shapes, try_load_first_shape};
pub use texture::{TextureData, load_texture, load_texture_or_fallback, try_load_texture};
