use glam::DVec3;

use crate::error::{ConvertError, Result};

/// A mesh vertex. Position only; equal positions are never merged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn to_dvec3(self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Vertex {
    fn from(p: [f64; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

/// Three vertex indices plus an optional face normal carried over from the source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub indices: [u32; 3],
    pub normal: Option<[f64; 3]>,
}

impl Triangle {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self {
            indices: [a, b, c],
            normal: None,
        }
    }

    pub fn with_normal(indices: [u32; 3], normal: [f64; 3]) -> Self {
        Self {
            indices,
            normal: Some(normal),
        }
    }
}

/// The canonical, format-agnostic triangle mesh.
///
/// Codecs build meshes through `push_vertex` / `push_triangle` and are
/// responsible for only referencing vertices that already exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    name: Option<String>,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            name: None,
            vertices: Vec::with_capacity(vertices),
            triangles: Vec::with_capacity(triangles),
        }
    }

    /// Build a mesh from raw parts, checking every triangle index.
    pub fn from_parts(vertices: Vec<Vertex>, triangles: Vec<Triangle>) -> Result<Self> {
        let count = vertices.len();
        for (i, tri) in triangles.iter().enumerate() {
            if let Some(&bad) = tri.indices.iter().find(|&&idx| idx as usize >= count) {
                return Err(ConvertError::MalformedInput(format!(
                    "triangle {i} references vertex {bad} but only {count} vertices exist"
                )));
            }
        }
        Ok(Self {
            name: None,
            vertices,
            triangles,
        })
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the mesh contains no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    pub fn triangle(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let idx = self.vertices.len() as u32;
        self.vertices.push(vertex);
        idx
    }

    pub fn push_triangle(&mut self, triangle: Triangle) {
        debug_assert!(
            triangle
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
        );
        self.triangles.push(triangle);
    }

    /// Translate every vertex by `offset`. Topology is untouched.
    pub fn translate(&mut self, offset: [f64; 3]) {
        for v in &mut self.vertices {
            v.x += offset[0];
            v.y += offset[1];
            v.z += offset[2];
        }
    }

    /// Positions of the three corners of a triangle.
    pub fn corners(&self, triangle: &Triangle) -> [Vertex; 3] {
        triangle.indices.map(|i| self.vertices[i as usize])
    }

    /// The stored normal if it is usable, otherwise one derived from the winding.
    pub fn resolved_normal(&self, triangle: &Triangle) -> [f64; 3] {
        if let Some(n) = triangle.normal {
            let stored = DVec3::from_array(n);
            if stored.is_finite() && stored.length_squared() > f64::EPSILON {
                return n;
            }
        }
        let [a, b, c] = self.corners(triangle).map(Vertex::to_dvec3);
        face_normal(a, b, c)
    }
}

/// Unit normal of the counter-clockwise triangle `a, b, c`; zero when degenerate.
pub fn face_normal(a: DVec3, b: DVec3, c: DVec3) -> [f64; 3] {
    (b - a).cross(c - a).normalize_or_zero().to_array()
}
