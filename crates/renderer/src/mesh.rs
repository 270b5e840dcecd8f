//! Interleaved mesh upload and drawing.

use asset::FLOATS_PER_VERTEX;
use wgpu::{Buffer, BufferUsages, Device, RenderPass, VertexBufferLayout, VertexStepMode, util::DeviceExt};

/// `[px, py, pz, nx, ny, nz, u, v]` per vertex.
pub const MESH_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
};

/// Non-indexed triangle list resident on the GPU.
pub struct GpuMesh {
    pub label: String,
    buffer: Option<Buffer>,
    vertex_count: u32,
}

impl GpuMesh {
    /// Upload interleaved floats. An empty slice produces a mesh that draws nothing.
    pub fn upload(device: &Device, label: &str, data: &[f32]) -> Self {
        let vertex_count = vertex_count(data);
        if vertex_count == 0 {
            log::warn!("Mesh '{}' has no vertices; it will not be drawn", label);
            return Self {
                label: label.to_owned(),
                buffer: None,
                vertex_count: 0,
            };
        }

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: BufferUsages::VERTEX,
        });
        log::info!("Uploaded mesh '{}': {} vertices", label, vertex_count);

        Self {
            label: label.to_owned(),
            buffer: Some(buffer),
            vertex_count,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Record the draw call. Pipeline and bind groups must already be set.
    pub fn draw(&self, rpass: &mut RenderPass<'_>) {
        if let Some(buffer) = &self.buffer {
            rpass.set_vertex_buffer(0, buffer.slice(..));
            rpass.draw(0..self.vertex_count, 0..1);
        }
    }

    pub fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.vertex_count = 0;
    }
}

/// Number of whole vertices in an interleaved buffer.
pub fn vertex_count(data: &[f32]) -> u32 {
    u32::try_from(data.len() / FLOATS_PER_VERTEX).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_record() {
        assert_eq!(MESH_VERTEX_LAYOUT.array_stride, 32);
        let offsets: Vec<u64> = MESH_VERTEX_LAYOUT
            .attributes
            .iter()
            .map(|a| a.offset)
            .collect();
        assert_eq!(offsets, vec![0, 12, 24]);
    }

    #[test]
    fn vertex_count_counts_whole_records() {
        assert_eq!(vertex_count(&[]), 0);
        assert_eq!(vertex_count(&[0.0; 24]), 3);
        assert_eq!(vertex_count(&[0.0; 30]), 3);
    }
}
