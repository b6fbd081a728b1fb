//! Colored point clouds for visualizing sampled fields.

use crate::volume::SignedDistanceVolume;
use anyhow::Context;
use nalgebra::Point3;
use std::{io::Write, path::Path};

/// A sample point with a color reflecting its signed distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColoredPoint {
    pub position: Point3<f64>,
    pub color: [u8; 3],
}

/// Which samples to include in a point cloud.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointFilter {
    #[default]
    All,
    InsideOnly,
    OutsideOnly,
}

const INSIDE_COLOR: [u8; 3] = [255, 0, 0];
const OUTSIDE_COLOR: [u8; 3] = [0, 0, 255];
const SURFACE_COLOR: [u8; 3] = [255, 255, 255];

impl PointFilter {
    fn accepts(self, value: f64) -> bool {
        match self {
            Self::All => true,
            Self::InsideOnly => value < 0.0,
            Self::OutsideOnly => value >= 0.0,
        }
    }
}

/// Creates a point for every sample accepted by the filter. Samples inside
/// the surface are red and samples outside are blue, both fading toward white
/// as they approach the surface.
pub fn colored_point_cloud(
    volume: &SignedDistanceVolume,
    filter: PointFilter,
) -> Vec<ColoredPoint> {
    let (min_value, max_value) = volume.value_range();
    let max_magnitude = min_value.abs().max(max_value.abs());
    let indexer = volume.geometry().indexer();

    indexer
        .indices_in_generation_order()
        .zip(volume.points())
        .filter_map(|(indices, position)| {
            let value = volume.values()[indexer.linear_idx(indices)];
            filter.accepts(value).then(|| ColoredPoint {
                position: *position,
                color: color_for_value(value, max_magnitude),
            })
        })
        .collect()
}

fn color_for_value(value: f64, max_magnitude: f64) -> [u8; 3] {
    let weight = if max_magnitude > 0.0 {
        (value.abs() / max_magnitude).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let target = if value < 0.0 {
        INSIDE_COLOR
    } else {
        OUTSIDE_COLOR
    };
    let mut color = [0; 3];
    for ((channel, surface), target) in color.iter_mut().zip(SURFACE_COLOR).zip(target) {
        let blended = f64::from(surface) * (1.0 - weight) + f64::from(target) * weight;
        *channel = blended.round() as u8;
    }
    color
}

/// Writes the points as an ASCII PLY file with a vertex element holding
/// position and color.
///
/// # Errors
/// Returns an error if the file can not be written.
pub fn write_ascii_ply(
    points: &[ColoredPoint],
    output_file_path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let output_file_path = output_file_path.as_ref();
    sdfield_io::write_with_buffered_writer(output_file_path, |writer| {
        writeln!(writer, "ply")?;
        writeln!(writer, "format ascii 1.0")?;
        writeln!(writer, "element vertex {}", points.len())?;
        for property in ["x", "y", "z"] {
            writeln!(writer, "property double {property}")?;
        }
        for property in ["red", "green", "blue"] {
            writeln!(writer, "property uchar {property}")?;
        }
        writeln!(writer, "end_header")?;
        for ColoredPoint { position, color } in points {
            writeln!(
                writer,
                "{} {} {} {} {} {}",
                position.x, position.y, position.z, color[0], color[1], color[2]
            )?;
        }
        Ok(())
    })
    .with_context(|| format!("Failed to write point cloud to {}", output_file_path.display()))
}
