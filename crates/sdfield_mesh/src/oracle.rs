//! Signed distances to closed triangle meshes.

use crate::{
    mesh::TriangleMesh,
    query::{ray_crosses_triangle, squared_distance_to_triangle},
};
use anyhow::{Result, bail};
use nalgebra::{Point3, Vector3};
use sdfield::{DistanceSampler, SamplingFailure};

/// Computes signed distances from points to the surface of a closed triangle
/// mesh, positive inside the mesh and negative outside.
///
/// The magnitude is the exact distance to the nearest triangle. Whether a
/// point is inside is decided by casting rays in three skewed directions and
/// taking the majority of the crossing-parity votes, which tolerates rays
/// grazing edges and small holes.
#[derive(Clone, Debug)]
pub struct MeshDistanceOracle {
    mesh: TriangleMesh,
}

/// Ray directions chosen to avoid being parallel to the faces and edges of
/// typical axis-aligned geometry.
const RAY_DIRECTIONS: [[f64; 3]; 3] = [
    [1.0, 0.371_390_676, 0.194_028_631],
    [-0.271_293_485, 1.0, 0.421_912_763],
    [0.327_133_912, -0.183_674_251, 1.0],
];

impl MeshDistanceOracle {
    /// # Errors
    /// Returns an error if the mesh has no triangles.
    pub fn new(mesh: TriangleMesh) -> Result<Self> {
        if !mesh.has_triangles() {
            bail!("Can not compute distances to a mesh without triangles");
        }
        Ok(Self { mesh })
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// Distance from the point to the closest point on the mesh surface.
    pub fn unsigned_distance(&self, point: &Point3<f64>) -> f64 {
        self.mesh
            .triangle_vertices()
            .map(|[a, b, c]| squared_distance_to_triangle(point, a, b, c))
            .fold(f64::INFINITY, f64::min)
            .sqrt()
    }

    /// Whether the point lies inside the mesh.
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        let inside_votes = RAY_DIRECTIONS
            .iter()
            .filter(|&&direction| self.has_odd_crossings(point, &Vector3::from(direction)))
            .count();
        2 * inside_votes > RAY_DIRECTIONS.len()
    }

    fn has_odd_crossings(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> bool {
        self.mesh
            .triangle_vertices()
            .filter(|[a, b, c]| ray_crosses_triangle(origin, direction, a, b, c))
            .count()
            % 2
            == 1
    }
}

impl DistanceSampler for MeshDistanceOracle {
    fn signed_distance(&self, point: &Point3<f64>) -> Result<f64, SamplingFailure> {
        let distance = self.unsigned_distance(point);
        if !distance.is_finite() {
            return Err(SamplingFailure::new(format!(
                "distance to mesh evaluated to {distance}"
            )));
        }
        Ok(if self.contains(point) {
            distance
        } else {
            -distance
        })
    }
}
