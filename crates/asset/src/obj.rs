//! Minimal OBJ parser supporting positions, normals, texture coordinates and
//! `o`/`g` shape groups. Polygons are fan-triangulated while parsing.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::error::MeshError;
use crate::mesh::{DEFAULT_NORMAL, DEFAULT_UV, FLOATS_PER_VERTEX, InterleavedMesh, MeshVertex};

/// One polygon corner: resolved 0-based attribute indices.
/// `normal`/`texcoord` are `None` when the face element omits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CornerIndex {
    pub position: usize,
    pub normal: Option<usize>,
    pub texcoord: Option<usize>,
}

/// Named polygon group. `corners.len()` is always a multiple of 3.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    pub name: String,
    pub corners: Vec<CornerIndex>,
}

/// Parsed OBJ file: shared attribute arrays plus the shapes indexing them.
/// Every index held by a shape is in range for its attribute array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjModel {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    shapes: Vec<Shape>,
}

impl ObjModel {
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn texcoords(&self) -> &[[f32; 2]] {
        &self.texcoords
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn first_shape(&self) -> Option<&Shape> {
        self.shapes.first()
    }

    /// Expand a shape into a flat interleaved buffer, one record per corner
    /// in corner order. Missing normals/uvs fall back to the defaults.
    pub fn interleave(&self, shape: &Shape) -> InterleavedMesh {
        let capacity = shape.corners.len() * FLOATS_PER_VERTEX;
        let mut mesh = InterleavedMesh::new(shape.name.clone(), Vec::with_capacity(capacity));
        for corner in &shape.corners {
            let position = self.positions[corner.position];
            let normal = corner
                .normal
                .map(|i| self.normals[i])
                .unwrap_or(DEFAULT_NORMAL);
            let uv = corner
                .texcoord
                .map(|i| self.texcoords[i])
                .unwrap_or(DEFAULT_UV);
            mesh.push(MeshVertex::new(position, normal, uv));
        }
        mesh
    }
}

/// Parse an OBJ file from a path.
pub fn parse_obj_from_path(path: impl AsRef<Path>) -> Result<ObjModel, MeshError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obj_from_reader(BufReader::new(file))
}

/// Parse an OBJ model from a [`BufRead`] implementation.
pub fn parse_obj_from_reader<R: BufRead>(reader: R) -> Result<ObjModel, MeshError> {
    parse_obj(reader)
}

/// Convenience helper to parse an OBJ string literal.
pub fn parse_obj_from_str(contents: &str) -> Result<ObjModel, MeshError> {
    parse_obj(io::Cursor::new(contents))
}

/// Load the first shape of an OBJ file as an interleaved triangle list.
/// Any further shapes in the file are not part of the result.
pub fn try_load_first_shape(path: impl AsRef<Path>) -> Result<InterleavedMesh, MeshError> {
    let model = parse_obj_from_path(path)?;
    let shape = model.first_shape().ok_or(MeshError::NoShapes)?;
    Ok(model.interleave(shape))
}

/// Load every shape of an OBJ file as a named interleaved sub-mesh.
pub fn load_shapes(path: impl AsRef<Path>) -> Result<Vec<InterleavedMesh>, MeshError> {
    let model = parse_obj_from_path(path)?;
    if model.shapes.is_empty() {
        return Err(MeshError::NoShapes);
    }
    Ok(model.shapes.iter().map(|s| model.interleave(s)).collect())
}

/// Load the first shape of an OBJ file as raw interleaved floats.
///
/// Never fails: on any error a diagnostic is logged and an empty buffer is
/// returned, so callers must check for emptiness before uploading.
pub fn load_mesh(path: impl AsRef<Path>) -> Vec<f32> {
    let path = path.as_ref();
    match try_load_first_shape(path) {
        Ok(mesh) => {
            log::info!(
                "Loaded mesh {:?} from {:?}: {} vertices",
                mesh.name,
                path,
                mesh.vertex_count()
            );
            mesh.into_data()
        }
        Err(e) => {
            log::error!("OBJ load error for {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn parse_obj<R: BufRead>(mut reader: R) -> Result<ObjModel, MeshError> {
    let mut model = ObjModel::default();
    let mut current = Shape::default();
    let mut buf = Vec::new();

    // Lines are read as bytes: exporters write comments and names in
    // legacy encodings, which decode lossily instead of failing the file.
    for line_no in 0.. {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| MeshError::parse(line_no, format!("read failed: {e}")))?;
        if read == 0 {
            break;
        }
        if buf.trim_ascii_start().starts_with(b"#") {
            continue;
        }
        let line = String::from_utf8_lossy(&buf);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                model.positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = match parts.next() {
                    Some(token) => parse_f32(Some(token), line_no, "v coordinate")?,
                    None => 0.0,
                };
                model.texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                model.normals.push([nx, ny, nz]);
            }
            "o" | "g" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                if !current.corners.is_empty() {
                    model.shapes.push(std::mem::take(&mut current));
                }
                current.name = name;
            }
            "f" => {
                let mut face: Vec<CornerIndex> = Vec::new();
                for part in parts {
                    face.push(parse_face_vertex(
                        part,
                        model.positions.len(),
                        model.texcoords.len(),
                        model.normals.len(),
                        line_no,
                    )?);
                }

                if face.len() < 3 {
                    log::warn!(
                        "Skipping degenerate face with {} corners on line {}",
                        face.len(),
                        line_no + 1
                    );
                    continue;
                }
                // Triangulate fan
                for tri in 1..(face.len() - 1) {
                    current.corners.push(face[0]);
                    current.corners.push(face[tri]);
                    current.corners.push(face[tri + 1]);
                }
            }
            _ => {
                // Ignore other directives (s/usemtl/mtllib/l/p/etc.)
            }
        }
    }

    if !current.corners.is_empty() {
        model.shapes.push(current);
    }

    Ok(model)
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> Result<f32, MeshError> {
    let token = value.ok_or_else(|| MeshError::parse(line_no, format!("Missing {what}")))?;
    token
        .parse::<f32>()
        .map_err(|e| MeshError::parse(line_no, format!("Failed to parse {what} '{token}': {e}")))
}

fn parse_face_vertex(
    token: &str,
    pos_count: usize,
    tex_count: usize,
    norm_count: usize,
    line_no: usize,
) -> Result<CornerIndex, MeshError> {
    let mut split = token.split('/');
    let pos = split
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MeshError::parse(line_no, format!("Malformed face element '{token}'")))?;
    let position = resolve_index(pos, pos_count, line_no)?;

    let texcoord = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, tex_count, line_no)?),
        _ => None,
    };

    let normal = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, norm_count, line_no)?),
        _ => None,
    };

    Ok(CornerIndex {
        position,
        normal,
        texcoord,
    })
}

fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize, MeshError> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| MeshError::parse(line_no, format!("Invalid index '{token}'")))?;
    if raw == 0 {
        return Err(MeshError::parse(line_no, "OBJ indices are 1-based; found 0"));
    }

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };

    if idx < 0 || idx as usize >= len {
        return Err(MeshError::parse(
            line_no,
            format!("OBJ index {raw} resolved out of bounds (len={len})"),
        ));
    }

    Ok(idx as usize)
}
