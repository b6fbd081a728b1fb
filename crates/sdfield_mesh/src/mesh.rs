//! Indexed triangle meshes.

use anyhow::{Result, bail};
use nalgebra::{Point3, Vector3};

/// A mesh of triangles sharing a list of vertex positions.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleMesh {
    positions: Vec<Point3<f64>>,
    triangles: Vec<[usize; 3]>,
}

/// An axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisAlignedBox {
    lower_corner: Point3<f64>,
    upper_corner: Point3<f64>,
}

impl TriangleMesh {
    /// Creates a mesh with the given vertex positions and triangles, where each
    /// triangle holds the indices of its three vertices.
    ///
    /// # Errors
    /// Returns an error if any position is non-finite or any triangle refers
    /// to a vertex that does not exist.
    pub fn new(positions: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        if let Some(idx) = positions
            .iter()
            .position(|position| !position.iter().all(|coord| coord.is_finite()))
        {
            bail!("Vertex {idx} of triangle mesh has non-finite position");
        }
        if let Some(triangle) = triangles
            .iter()
            .find(|triangle| triangle.iter().any(|&idx| idx >= positions.len()))
        {
            bail!(
                "Triangle {triangle:?} refers to missing vertex (mesh has {} vertices)",
                positions.len()
            );
        }
        Ok(Self {
            positions,
            triangles,
        })
    }

    pub fn empty() -> Self {
        Self {
            positions: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn n_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn has_triangles(&self) -> bool {
        !self.triangles.is_empty()
    }

    /// Iterates over the vertex positions of each triangle.
    pub fn triangle_vertices(&self) -> impl Iterator<Item = [&Point3<f64>; 3]> + '_ {
        self.triangles
            .iter()
            .map(|&[i, j, k]| [&self.positions[i], &self.positions[j], &self.positions[k]])
    }

    /// The smallest axis-aligned box containing all vertices, or [`None`] if
    /// the mesh has no vertices.
    pub fn bounding_box(&self) -> Option<AxisAlignedBox> {
        AxisAlignedBox::enclosing(&self.positions)
    }

    /// Extents of the bounding box along each axis (zero for a mesh without
    /// vertices).
    pub fn extents(&self) -> [f64; 3] {
        self.bounding_box()
            .map_or([0.0; 3], |aabb| aabb.extents().into())
    }

    /// Appends the vertices and triangles of the other mesh to this mesh.
    pub fn merge_with(&mut self, other: &Self) {
        let offset = self.positions.len();
        self.positions.extend_from_slice(&other.positions);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|&[i, j, k]| [i + offset, j + offset, k + offset]),
        );
    }

    /// Moves every vertex by the given displacement.
    pub fn translate(&mut self, displacement: &Vector3<f64>) {
        for position in &mut self.positions {
            *position += displacement;
        }
    }

    /// Applies the given function to every vertex position.
    pub fn transform_positions(&mut self, transform: impl Fn(&Point3<f64>) -> Point3<f64>) {
        for position in &mut self.positions {
            *position = transform(position);
        }
    }
}

impl AxisAlignedBox {
    pub fn new(lower_corner: Point3<f64>, upper_corner: Point3<f64>) -> Self {
        Self {
            lower_corner,
            upper_corner,
        }
    }

    /// The smallest box containing all the given points, or [`None`] if there
    /// are no points.
    pub fn enclosing(points: &[Point3<f64>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (lower_corner, upper_corner) =
            rest.iter()
                .fold((*first, *first), |(lower, upper), point| {
                    (lower.inf(point), upper.sup(point))
                });
        Some(Self::new(lower_corner, upper_corner))
    }

    pub fn lower_corner(&self) -> &Point3<f64> {
        &self.lower_corner
    }

    pub fn upper_corner(&self) -> &Point3<f64> {
        &self.upper_corner
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.lower_corner, &self.upper_corner)
    }

    pub fn extents(&self) -> Vector3<f64> {
        self.upper_corner - self.lower_corner
    }
}
