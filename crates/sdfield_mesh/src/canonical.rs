//! Placement of meshes in a canonical frame around the origin.

use crate::mesh::TriangleMesh;
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

/// How a mesh is positioned before a signed distance field is sampled around
/// it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeshCentering {
    /// Use the mesh as it is.
    None,
    /// Rotate the mesh into its principal-axis frame, then center its
    /// bounding box on the origin.
    #[default]
    PrincipalAxes,
}

impl MeshCentering {
    /// [`Self::PrincipalAxes`] if the mesh should be centered, otherwise
    /// [`Self::None`].
    pub fn from_center_mesh(center_mesh: bool) -> Self {
        if center_mesh {
            Self::PrincipalAxes
        } else {
            Self::None
        }
    }

    pub fn apply(self, mesh: &TriangleMesh) -> TriangleMesh {
        match self {
            Self::None => mesh.clone(),
            Self::PrincipalAxes => centered_on_principal_axes(mesh),
        }
    }
}

/// Returns a copy of the mesh translated so that the center of its bounding
/// box lies at the origin.
pub fn centered(mesh: &TriangleMesh) -> TriangleMesh {
    let mut centered = mesh.clone();
    if let Some(aabb) = mesh.bounding_box() {
        centered.translate(&-aabb.center().coords);
    }
    centered
}

/// Returns a copy of the mesh rotated so that its principal axes, ordered
/// from largest to smallest extent, coincide with the x-, y- and z-axes, and
/// then translated so that its bounding box is centered on the origin.
///
/// The principal axes are the eigenvectors of the covariance matrix of the
/// vertex positions. The resulting frame is right-handed.
pub fn centered_on_principal_axes(mesh: &TriangleMesh) -> TriangleMesh {
    let Some(rotation) = principal_axes_rotation(mesh.positions()) else {
        return centered(mesh);
    };
    let mut rotated = mesh.clone();
    rotated.transform_positions(|position| Point3::from(rotation * position.coords));
    centered(&rotated)
}

/// Computes the rotation taking world axes into the principal-axis frame of
/// the points, with rows ordered by decreasing extent along each axis.
fn principal_axes_rotation(points: &[Point3<f64>]) -> Option<Matrix3<f64>> {
    if points.len() < 2 {
        return None;
    }

    let n_points = points.len() as f64;
    let mean = points
        .iter()
        .fold(Vector3::zeros(), |sum, point| sum + point.coords)
        / n_points;

    let covariance = points.iter().fold(Matrix3::zeros(), |sum, point| {
        let offset = point.coords - mean;
        sum + offset * offset.transpose()
    }) / n_points;

    let eigen = SymmetricEigen::new(covariance);

    let mut axes: Vec<(Vector3<f64>, f64)> = eigen
        .eigenvectors
        .column_iter()
        .map(|axis| {
            let axis = axis.normalize();
            let (min, max) = points.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(min, max), point| {
                    let projection = axis.dot(&point.coords);
                    (min.min(projection), max.max(projection))
                },
            );
            (axis, max - min)
        })
        .collect();

    if axes.iter().any(|(axis, _)| !axis.iter().all(|c| c.is_finite())) {
        return None;
    }

    axes.sort_by(|(_, a), (_, b)| b.total_cmp(a));

    let x_axis = axes[0].0;
    let y_axis = axes[1].0;
    let z_axis = x_axis.cross(&y_axis);

    Some(Matrix3::from_rows(&[
        x_axis.transpose(),
        y_axis.transpose(),
        z_axis.transpose(),
    ]))
}
