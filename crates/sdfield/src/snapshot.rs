//! Persistence of signed distance volumes.

use crate::{
    error::{Result, SdfError},
    grid::GridGeometry,
    volume::SignedDistanceVolume,
};
use anyhow::Context;
use nalgebra::Point3;
use sdfield_log::{debug, warn, with_trace_logging};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version written into every new snapshot. Snapshots with any other version
/// are rejected on load.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Self-contained record of a [`SignedDistanceVolume`].
///
/// The field names are shared with external tools consuming the snapshots.
/// `sdf_array` is indexed as `[i][j][k]` (x, y, z grid indices), while
/// `sdf_points` lists the sample points with x varying fastest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedDistanceSnapshot {
    pub format_version: u32,
    pub resolution: usize,
    pub padding: f64,
    pub sdf_point_spacing: f64,
    pub sdf_array: Vec<Vec<Vec<f64>>>,
    pub sdf_points: Vec<[f64; 3]>,
    pub sdf_origin: [f64; 3],
}

/// Encoding used for snapshot files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// Compact binary encoding.
    #[default]
    Binary,
    /// Human-readable RON text.
    Ron,
}

impl SignedDistanceSnapshot {
    /// Captures every value, point and grid parameter of the volume.
    pub fn save(volume: &SignedDistanceVolume) -> Self {
        let origin = volume.origin();
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            resolution: volume.resolution(),
            padding: volume.padding(),
            sdf_point_spacing: volume.spacing(),
            sdf_array: volume.to_nested_array(),
            sdf_points: volume.points().iter().map(|p| [p.x, p.y, p.z]).collect(),
            sdf_origin: [origin.x, origin.y, origin.z],
        }
    }

    /// Reconstructs the volume the snapshot was taken of. Nothing is
    /// recomputed; values and points are used as stored.
    ///
    /// # Errors
    /// Returns [`SdfError::Serialization`] if the snapshot has an unsupported
    /// version, invalid grid parameters, arrays of the wrong size or
    /// non-finite numbers.
    pub fn load(&self) -> Result<SignedDistanceVolume> {
        self.validate()?;

        let resolution = self.resolution;
        let origin = Point3::from(self.sdf_origin);
        let side_length = side_length_for_origin(&origin, self.sdf_point_spacing, resolution);
        let geometry = GridGeometry::from_parts(
            resolution,
            self.padding,
            side_length,
            origin,
            self.sdf_point_spacing,
        );
        let indexer = geometry.indexer();

        let mut values = vec![0.0; indexer.point_count()];
        for (i, plane) in self.sdf_array.iter().enumerate() {
            for (j, row) in plane.iter().enumerate() {
                for (k, &value) in row.iter().enumerate() {
                    values[indexer.linear_idx([i, j, k])] = value;
                }
            }
        }

        let points = self.sdf_points.iter().copied().map(Point3::from).collect();

        Ok(SignedDistanceVolume::from_validated_parts(
            geometry, values, points,
        ))
    }

    /// # Errors
    /// Returns [`SdfError::Serialization`] if encoding fails.
    pub fn encode(&self, format: SnapshotFormat) -> Result<Vec<u8>> {
        match format {
            SnapshotFormat::Binary => postcard::to_allocvec(self).map_err(|err| {
                SdfError::serialization(format!("could not encode snapshot: {err}"))
            }),
            SnapshotFormat::Ron => ron::ser::to_string(self)
                .map(String::into_bytes)
                .map_err(|err| {
                    SdfError::serialization(format!("could not encode snapshot: {err}"))
                }),
        }
    }

    /// # Errors
    /// Returns [`SdfError::Serialization`] if the bytes are not a snapshot in
    /// the given format. The decoded snapshot is not validated; see
    /// [`Self::load`].
    pub fn decode(bytes: &[u8], format: SnapshotFormat) -> Result<Self> {
        match format {
            SnapshotFormat::Binary => postcard::from_bytes(bytes).map_err(|err| {
                SdfError::serialization(format!("could not decode snapshot: {err}"))
            }),
            SnapshotFormat::Ron => {
                let text = std::str::from_utf8(bytes).map_err(|err| {
                    SdfError::serialization(format!("snapshot text is not UTF-8: {err}"))
                })?;
                ron::from_str(text).map_err(|err| {
                    SdfError::serialization(format!("could not decode snapshot: {err}"))
                })
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(SdfError::serialization(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_FORMAT_VERSION})",
                self.format_version
            )));
        }

        let resolution = self.resolution;
        if resolution < 2 {
            return Err(SdfError::serialization(format!(
                "resolution must be at least 2 (got {resolution})"
            )));
        }
        if !self.sdf_point_spacing.is_finite() || self.sdf_point_spacing <= 0.0 {
            return Err(SdfError::serialization(format!(
                "point spacing must be finite and positive (got {})",
                self.sdf_point_spacing
            )));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(SdfError::serialization(format!(
                "padding must be finite and non-negative (got {})",
                self.padding
            )));
        }
        if self.sdf_origin.iter().any(|coord| !coord.is_finite()) {
            return Err(SdfError::serialization("origin has non-finite coordinates"));
        }

        let has_expected_shape = self.sdf_array.len() == resolution
            && self.sdf_array.iter().all(|plane| {
                plane.len() == resolution && plane.iter().all(|row| row.len() == resolution)
            });
        if !has_expected_shape {
            return Err(SdfError::serialization(format!(
                "value array does not have dimensions {resolution}x{resolution}x{resolution}"
            )));
        }

        let point_count = resolution
            .checked_pow(3)
            .ok_or_else(|| SdfError::serialization("resolution is too large"))?;
        if self.sdf_points.len() != point_count {
            return Err(SdfError::serialization(format!(
                "expected {point_count} sample points, found {}",
                self.sdf_points.len()
            )));
        }

        if self.sdf_array.iter().flatten().flatten().any(|v| !v.is_finite()) {
            return Err(SdfError::serialization("value array has non-finite values"));
        }
        if self.sdf_points.iter().flatten().any(|c| !c.is_finite()) {
            return Err(SdfError::serialization(
                "sample points have non-finite coordinates",
            ));
        }

        Ok(())
    }
}

impl SnapshotFormat {
    /// Picks RON for paths with the `ron` extension and the binary encoding
    /// for everything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Self::Ron,
            _ => Self::Binary,
        }
    }
}

impl SignedDistanceVolume {
    pub fn to_snapshot(&self) -> SignedDistanceSnapshot {
        SignedDistanceSnapshot::save(self)
    }

    /// # Errors
    /// See [`SignedDistanceSnapshot::load`].
    pub fn from_snapshot(snapshot: &SignedDistanceSnapshot) -> Result<Self> {
        snapshot.load()
    }
}

/// Writes a snapshot of the volume to the given path, creating any missing
/// directories. The encoding follows from the file extension.
///
/// # Errors
/// Returns an error if encoding or writing fails.
pub fn write_snapshot_file(
    volume: &SignedDistanceVolume,
    output_file_path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let output_file_path = output_file_path.as_ref();
    let format = SnapshotFormat::from_path(output_file_path);

    let bytes = with_trace_logging!("Encoding {:?} signed distance snapshot", format; {
        volume.to_snapshot().encode(format)
    })?;
    sdfield_io::save_data_as_binary(output_file_path, &bytes).with_context(|| {
        format!(
            "Failed to write signed distance snapshot to {}",
            output_file_path.display()
        )
    })?;

    debug!(
        "Wrote {format:?} signed distance snapshot to {}",
        output_file_path.display()
    );
    Ok(())
}

/// Reads the snapshot at the given path and reconstructs the volume.
///
/// # Errors
/// Returns an error if the file can not be read, decoded or validated.
pub fn read_snapshot_file(file_path: impl AsRef<Path>) -> anyhow::Result<SignedDistanceVolume> {
    let file_path = file_path.as_ref();
    let format = SnapshotFormat::from_path(file_path);

    let bytes = sdfield_io::read_data_from_binary(file_path).with_context(|| {
        format!(
            "Failed to read signed distance snapshot from {}",
            file_path.display()
        )
    })?;

    let volume = with_trace_logging!("Decoding {:?} signed distance snapshot", format; {
        SignedDistanceSnapshot::decode(&bytes, format).and_then(|snapshot| snapshot.load())
    })
    .with_context(|| format!("Invalid signed distance snapshot {}", file_path.display()))?;

    debug!(
        "Read {format:?} signed distance snapshot with resolution {} from {}",
        volume.resolution(),
        file_path.display()
    );
    Ok(volume)
}

/// A generated grid is centered on the origin, so its side length is exactly
/// twice the distance from the origin corner to the center. Other grids fall
/// back to the side length implied by the spacing.
fn side_length_for_origin(origin: &Point3<f64>, spacing: f64, resolution: usize) -> f64 {
    let spacing_side_length = spacing * (resolution - 1) as f64;
    let mirrored_side_length = -2.0 * origin.x;
    let tolerance = 1e-6 * spacing_side_length.max(1.0);

    let is_centered = origin.y == origin.x
        && origin.z == origin.x
        && (mirrored_side_length - spacing_side_length).abs() <= tolerance;

    if is_centered {
        mirrored_side_length
    } else {
        warn!(
            "Snapshot origin ({}, {}, {}) is not consistent with spacing {spacing} and \
             resolution {resolution}",
            origin.x,
            origin.y,
            origin.z,
        );
        spacing_side_length
    }
}
