//! Input of mesh data in Polygon File Format.

use crate::mesh::TriangleMesh;
use anyhow::{Context, Result, anyhow, bail};
use nalgebra::Point3;
use ply_rs::{
    parser::Parser,
    ply::{DefaultElement, Property, PropertyAccess},
};
use std::{fs::File, io::BufReader, path::Path};

#[derive(Clone, Debug, Default)]
struct PlyVertex {
    position: [Option<f64>; 3],
}

#[derive(Clone, Debug, Default)]
struct PlyFace {
    vertex_indices: Vec<i64>,
}

/// Reads the PLY (Polygon File Format, also called Stanford Triangle Format)
/// file at the given path. Polygonal faces are split into triangle fans, and
/// vertex properties other than the position are ignored, as are elements
/// other than vertices and faces.
///
/// # Errors
/// Returns an error if the file can not be found or loaded as a mesh.
pub fn read_mesh_from_ply_file(ply_file_path: impl AsRef<Path>) -> Result<TriangleMesh> {
    let ply_file_path = ply_file_path.as_ref();

    let vertex_parser = Parser::<PlyVertex>::new();
    let face_parser = Parser::<PlyFace>::new();
    let other_element_parser = Parser::<DefaultElement>::new();

    let mut file_reader = BufReader::new(File::open(ply_file_path)?);

    let header = vertex_parser.read_header(&mut file_reader)?;

    let mut vertex_list = Vec::new();
    let mut face_list = Vec::new();

    for element in header.elements.values() {
        match element.name.as_str() {
            "vertex" => {
                vertex_list =
                    vertex_parser.read_payload_for_element(&mut file_reader, element, &header)?;
            }
            "face" => {
                face_list =
                    face_parser.read_payload_for_element(&mut file_reader, element, &header)?;
            }
            _ => {
                other_element_parser.read_payload_for_element(
                    &mut file_reader,
                    element,
                    &header,
                )?;
            }
        }
    }

    convert_ply_vertices_and_faces_to_mesh(&vertex_list, &face_list)
        .with_context(|| format!("Invalid mesh in {}", ply_file_path.display()))
}

fn convert_ply_vertices_and_faces_to_mesh(
    vertex_list: &[PlyVertex],
    face_list: &[PlyFace],
) -> Result<TriangleMesh> {
    let positions = vertex_list
        .iter()
        .enumerate()
        .map(|(idx, vertex)| match vertex.position {
            [Some(x), Some(y), Some(z)] => Ok(Point3::new(x, y, z)),
            _ => Err(anyhow!("vertex {idx} is missing a position coordinate")),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut triangles = Vec::with_capacity(face_list.len());
    for (face_idx, face) in face_list.iter().enumerate() {
        let indices = face
            .vertex_indices
            .iter()
            .map(|&idx| usize::try_from(idx))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("face {face_idx} has a negative vertex index"))?;

        if indices.len() < 3 {
            bail!(
                "face {face_idx} has only {} vertex indices",
                indices.len()
            );
        }
        for pair in indices[1..].windows(2) {
            triangles.push([indices[0], pair[0], pair[1]]);
        }
    }

    TriangleMesh::new(positions, triangles)
}

impl PropertyAccess for PlyVertex {
    fn new() -> Self {
        Self::default()
    }

    fn set_property(&mut self, property_name: String, property: Property) {
        let component = match property_name.as_str() {
            "x" => 0,
            "y" => 1,
            "z" => 2,
            _ => return,
        };
        self.position[component] = match property {
            Property::Float(value) => Some(f64::from(value)),
            Property::Double(value) => Some(value),
            Property::Char(value) => Some(f64::from(value)),
            Property::UChar(value) => Some(f64::from(value)),
            Property::Short(value) => Some(f64::from(value)),
            Property::UShort(value) => Some(f64::from(value)),
            Property::Int(value) => Some(f64::from(value)),
            Property::UInt(value) => Some(f64::from(value)),
            _ => None,
        };
    }
}

impl PropertyAccess for PlyFace {
    fn new() -> Self {
        Self::default()
    }

    fn set_property(&mut self, property_name: String, property: Property) {
        if !matches!(property_name.as_str(), "vertex_index" | "vertex_indices") {
            return;
        }
        self.vertex_indices = match property {
            Property::ListChar(indices) => indices.into_iter().map(i64::from).collect(),
            Property::ListUChar(indices) => indices.into_iter().map(i64::from).collect(),
            Property::ListShort(indices) => indices.into_iter().map(i64::from).collect(),
            Property::ListUShort(indices) => indices.into_iter().map(i64::from).collect(),
            Property::ListInt(indices) => indices.into_iter().map(i64::from).collect(),
            Property::ListUInt(indices) => indices.into_iter().map(i64::from).collect(),
            _ => Vec::new(),
        };
    }
}
