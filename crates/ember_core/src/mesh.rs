//! Triangle mesh geometry handed to the renderer.
//!
//! Meshes are built by the host (file loaders, scene authoring tools) and are
//! read-only once they reach the renderer.

use ember_math::{BoundingBox, Vec2, Vec3};

use crate::error::{SceneError, SceneResult};

/// A mesh vertex: position plus shading normal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// A triangle referencing three vertices of its mesh, with per-vertex UVs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Triangle {
    pub indices: [u32; 3],
    pub uvs: [Vec2; 3],
}

impl Triangle {
    pub fn new(indices: [u32; 3]) -> Self {
        Self {
            indices,
            uvs: [Vec2::ZERO, Vec2::X, Vec2::Y],
        }
    }

    pub fn with_uvs(indices: [u32; 3], uvs: [Vec2; 3]) -> Self {
        Self { indices, uvs }
    }
}

/// Indexed triangle mesh.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    bounds: BoundingBox,
}

impl Mesh {
    /// Create a mesh, checking that every triangle index is in range.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        triangles: Vec<Triangle>,
    ) -> SceneResult<Self> {
        let name = name.into();

        let Some(bounds) = BoundingBox::from_points(vertices.iter().map(|v| v.position)) else {
            return Err(SceneError::EmptyMesh(name));
        };
        if triangles.is_empty() {
            return Err(SceneError::EmptyMesh(name));
        }

        for (i, triangle) in triangles.iter().enumerate() {
            if let Some(&index) = triangle
                .indices
                .iter()
                .find(|&&index| index as usize >= vertices.len())
            {
                return Err(SceneError::InvalidTriangle {
                    mesh: name,
                    triangle: i,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }

        Ok(Self {
            name,
            vertices,
            triangles,
            bounds,
        })
    }

    /// Create a mesh from bare positions and index triples, computing smooth
    /// vertex normals by averaging the counter-clockwise face normals.
    pub fn from_positions(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        indices: Vec<[u32; 3]>,
    ) -> SceneResult<Self> {
        let mut normals = vec![Vec3::ZERO; positions.len()];

        for face in &indices {
            let [i0, i1, i2] = face.map(|i| i as usize);
            if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
                // Mesh::new reports the bad index below.
                continue;
            }
            let face_normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        let vertices = positions
            .into_iter()
            .zip(normals)
            .map(|(position, normal)| Vertex::new(position, normal.try_normalize().unwrap_or(Vec3::Y)))
            .collect();
        let triangles = indices.into_iter().map(Triangle::new).collect();

        Self::new(name, vertices, triangles)
    }

    /// A single quad centered at `center` spanning `center ± half_u ± half_v`.
    ///
    /// The face normal is `half_u × half_v`.
    pub fn quad(name: impl Into<String>, center: Vec3, half_u: Vec3, half_v: Vec3) -> SceneResult<Self> {
        let mut vertices = Vec::with_capacity(4);
        let mut triangles = Vec::with_capacity(2);
        push_quad(&mut vertices, &mut triangles, center, half_u, half_v);
        Self::new(name, vertices, triangles)
    }

    /// An axis-aligned box with outward-facing flat normals.
    pub fn cuboid(name: impl Into<String>, min: Vec3, max: Vec3) -> SceneResult<Self> {
        let bounds = BoundingBox::new(min, max);
        let c = bounds.center();
        let h = bounds.extent() * 0.5;
        let (hx, hy, hz) = (Vec3::X * h.x, Vec3::Y * h.y, Vec3::Z * h.z);

        let faces = [
            (c + hx, hy, hz),
            (c - hx, hz, hy),
            (c + hy, hz, hx),
            (c - hy, hx, hz),
            (c + hz, hx, hy),
            (c - hz, hy, hx),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut triangles = Vec::with_capacity(12);
        for (center, u, v) in faces {
            push_quad(&mut vertices, &mut triangles, center, u, v);
        }
        Self::new(name, vertices, triangles)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Bounding box of all vertex positions.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// The three vertices of triangle `index`.
    #[inline]
    pub fn triangle_vertices(&self, index: usize) -> [&Vertex; 3] {
        let [a, b, c] = self.triangles[index].indices;
        [
            &self.vertices[a as usize],
            &self.vertices[b as usize],
            &self.vertices[c as usize],
        ]
    }
}

fn push_quad(
    vertices: &mut Vec<Vertex>,
    triangles: &mut Vec<Triangle>,
    center: Vec3,
    half_u: Vec3,
    half_v: Vec3,
) {
    let normal = half_u.cross(half_v).try_normalize().unwrap_or(Vec3::Y);
    let base = vertices.len() as u32;

    for corner in [
        center - half_u - half_v,
        center + half_u - half_v,
        center + half_u + half_v,
        center - half_u + half_v,
    ] {
        vertices.push(Vertex::new(corner, normal));
    }

    triangles.push(Triangle::with_uvs(
        [base, base + 1, base + 2],
        [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)],
    ));
    triangles.push(Triangle::with_uvs(
        [base, base + 2, base + 3],
        [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_creation() {
        let mesh = Mesh::from_positions(
            "tri",
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
        )
        .unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        // Counter-clockwise in XY faces +Z.
        for v in mesh.vertices() {
            assert!((v.normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_invalid_index_rejected() {
        let err = Mesh::from_positions("bad", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 7]])
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidTriangle { index: 7, .. }));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let err = Mesh::new("empty", vec![], vec![]).unwrap_err();
        assert!(matches!(err, SceneError::EmptyMesh(_)));
    }

    #[test]
    fn test_quad_normal() {
        let quad = Mesh::quad("floor", Vec3::ZERO, Vec3::Z, Vec3::X).unwrap();
        assert_eq!(quad.triangle_count(), 2);
        assert!(quad.vertices().iter().all(|v| (v.normal - Vec3::Y).length() < 1e-6));
    }

    #[test]
    fn test_cuboid_outward_normals() {
        let cube = Mesh::cuboid("box", Vec3::splat(-1.0), Vec3::splat(1.0)).unwrap();
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.vertex_count(), 24);

        let center = cube.bounds().center();
        for i in 0..cube.triangle_count() {
            let [a, b, c] = cube.triangle_vertices(i);
            let face_center = (a.position + b.position + c.position) / 3.0;
            assert!(a.normal.dot(face_center - center) > 0.0);
        }
    }

    #[test]
    fn test_bounds_computation() {
        let mesh = Mesh::from_positions(
            "tri",
            vec![
                Vec3::new(-1.0, -2.0, -3.0),
                Vec3::new(4.0, 5.0, 6.0),
                Vec3::new(0.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();

        assert_eq!(mesh.bounds().min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.bounds().max, Vec3::new(4.0, 5.0, 6.0));
    }
}
