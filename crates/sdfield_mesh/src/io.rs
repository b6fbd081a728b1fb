//! Input of mesh data.

#[cfg(feature = "obj")]
pub mod obj;
#[cfg(feature = "ply")]
pub mod ply;

use crate::mesh::TriangleMesh;
use anyhow::{Context, Result, anyhow, bail};
use sdfield_log::with_trace_logging;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriangleMeshFileFormat {
    Obj,
    Ply,
}

impl TriangleMeshFileFormat {
    /// Tries to determine the triangle mesh file format of the given path.
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let Some(extension) = file_path.extension() else {
            bail!(
                "Missing extension for triangle mesh file {}",
                file_path.display()
            );
        };
        match &*extension.to_string_lossy().to_lowercase() {
            "obj" => Ok(Self::Obj),
            "ply" => Ok(Self::Ply),
            other => Err(anyhow!(
                "Unsupported triangle mesh file format {other} for triangle mesh file {}",
                file_path.display()
            )),
        }
    }
}

/// Reads the mesh in the file at the given path, using the format implied by
/// the file extension. All meshes in the file are merged into one.
///
/// # Errors
/// Returns an error if the format is unsupported or the file can not be read
/// as a mesh.
pub fn read_mesh_from_file(file_path: impl AsRef<Path>) -> Result<TriangleMesh> {
    let file_path = file_path.as_ref();
    let format = TriangleMeshFileFormat::from_path(file_path)?;

    let mesh = with_trace_logging!("Parsing {:?} mesh file", format; {
        match format {
            #[cfg(feature = "obj")]
            TriangleMeshFileFormat::Obj => obj::read_mesh_from_obj_file(file_path),
            #[cfg(feature = "ply")]
            TriangleMeshFileFormat::Ply => ply::read_mesh_from_ply_file(file_path),
            #[allow(unreachable_patterns)]
            format => Err(anyhow!(
                "Support for {format:?} files is not enabled in this build"
            )),
        }
    })
    .with_context(|| format!("Failed to read mesh from {}", file_path.display()))?;

    sdfield_log::debug!(
        "Read mesh with {} vertices and {} triangles from {}",
        mesh.n_vertices(),
        mesh.n_triangles(),
        file_path.display()
    );

    Ok(mesh)
}
