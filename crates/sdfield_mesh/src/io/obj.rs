//! Input of mesh data in Wavefront OBJ format.

use crate::mesh::TriangleMesh;
use anyhow::{Result, bail};
use nalgebra::Point3;
use std::path::Path;
use tobj::{GPU_LOAD_OPTIONS, Mesh as ObjMesh};

/// Reads the Wavefront OBJ file at the given path. If the file contains
/// multiple models, their meshes are merged into a single mesh. Polygonal
/// faces are triangulated and materials are ignored.
///
/// # Errors
/// Returns an error if the file can not be found or loaded as a mesh.
pub fn read_mesh_from_obj_file(obj_file_path: impl AsRef<Path>) -> Result<TriangleMesh> {
    let obj_file_path = obj_file_path.as_ref();

    let (models, _) = tobj::load_obj(obj_file_path, &GPU_LOAD_OPTIONS)?;

    if models.is_empty() {
        bail!("File {} does not contain any meshes", obj_file_path.display());
    }

    let mut mesh = TriangleMesh::empty();
    for model in models {
        mesh.merge_with(&create_mesh_from_tobj_mesh(&model.mesh)?);
    }
    Ok(mesh)
}

fn create_mesh_from_tobj_mesh(mesh: &ObjMesh) -> Result<TriangleMesh> {
    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|xyz| Point3::new(f64::from(xyz[0]), f64::from(xyz[1]), f64::from(xyz[2])))
        .collect();

    let triangles = mesh
        .indices
        .chunks_exact(3)
        .map(|ijk| [ijk[0] as usize, ijk[1] as usize, ijk[2] as usize])
        .collect();

    TriangleMesh::new(positions, triangles)
}
