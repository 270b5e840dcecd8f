//! CPU-side mesh representation used by loaders.

/// Floats per interleaved record: position(3) + normal(3) + uv(2).
pub const FLOATS_PER_VERTEX: usize = 8;

/// Normal substituted when a corner carries no normal index.
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Texture coordinate substituted when a corner carries no uv index.
pub const DEFAULT_UV: [f32; 2] = [0.0, 0.0];

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Decode one 8-float record. Panics if `record` is shorter than a record.
    pub fn from_record(record: &[f32]) -> Self {
        Self {
            position: [record[0], record[1], record[2]],
            normal: [record[3], record[4], record[5]],
            uv: [record[6], record[7]],
        }
    }

    pub fn to_record(&self) -> [f32; FLOATS_PER_VERTEX] {
        let [px, py, pz] = self.position;
        let [nx, ny, nz] = self.normal;
        let [u, v] = self.uv;
        [px, py, pz, nx, ny, nz, u, v]
    }
}

/// Flat, non-indexed triangle list stored as interleaved
/// `[px, py, pz, nx, ny, nz, u, v]` records in corner order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterleavedMesh {
    pub name: String,
    pub data: Vec<f32>,
}

impl InterleavedMesh {
    pub fn new(name: impl Into<String>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Number of corners (records) in the buffer.
    pub fn vertex_count(&self) -> usize {
        self.data.len() / FLOATS_PER_VERTEX
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the buffer holds whole triangles made of whole records.
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
            && self.data.len() % FLOATS_PER_VERTEX == 0
            && self.vertex_count() % 3 == 0
    }

    pub fn vertices(&self) -> impl Iterator<Item = MeshVertex> + '_ {
        self.data
            .chunks_exact(FLOATS_PER_VERTEX)
            .map(MeshVertex::from_record)
    }

    pub fn push(&mut self, vertex: MeshVertex) {
        self.data.extend_from_slice(&vertex.to_record());
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}
