//! Signed distance values sampled on a cubic grid.

use crate::{
    error::{Result, SdfError},
    grid::{GridConfig, GridGeometry},
    sampling::{DistanceSampler, SamplingExecution, sample_signed_distances},
};
use nalgebra::Point3;
use sdfield_log::{debug, with_timing_info_logging};

/// A fully populated grid of signed distances together with the sample points
/// they were evaluated at.
///
/// Values are negative inside the surface and positive outside. The value for
/// the sample at grid indices `[i, j, k]` is stored at the flat index
/// `geometry.indexer().linear_idx([i, j, k])`, which is also the index of the
/// corresponding sample point.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedDistanceVolume {
    geometry: GridGeometry,
    values: Vec<f64>,
    points: Vec<Point3<f64>>,
}

/// Borrowed view of the data needed to query a volume from outside.
#[derive(Clone, Copy, Debug)]
pub struct VolumeProperties<'a> {
    pub values: &'a [f64],
    pub origin: &'a Point3<f64>,
    pub spacing: f64,
    pub resolution: usize,
}

impl SignedDistanceVolume {
    /// Assembles a volume from sample points and the distances a
    /// [`DistanceSampler`] reported for them. The distance list must follow
    /// the point order, and its values are negated so that the stored field is
    /// negative inside.
    ///
    /// # Errors
    /// Returns [`SdfError::InvalidConfiguration`] if the number of points does
    /// not match the grid, or [`SdfError::ComputationFailure`] if the number of
    /// distances does not.
    pub fn build(
        geometry: GridGeometry,
        points: Vec<Point3<f64>>,
        oracle_distances: &[f64],
    ) -> Result<Self> {
        let indexer = geometry.indexer();
        let point_count = indexer.point_count();

        if points.len() != point_count {
            return Err(SdfError::invalid_configuration(format!(
                "expected {point_count} sample points for resolution {}, got {}",
                geometry.resolution(),
                points.len()
            )));
        }
        if oracle_distances.len() != point_count {
            return Err(SdfError::ComputationFailure {
                message: format!(
                    "expected {point_count} distances, sampler produced {}",
                    oracle_distances.len()
                ),
                source: None,
            });
        }

        let mut values = vec![0.0; point_count];
        for (indices, distance) in indexer
            .indices_in_generation_order()
            .zip(oracle_distances)
        {
            values[indexer.linear_idx(indices)] = -distance;
        }

        Ok(Self {
            geometry,
            values,
            points,
        })
    }

    /// Lays out a grid around a mesh with the given extents, samples the
    /// signed distance at every grid point and assembles the volume.
    ///
    /// # Errors
    /// See [`GridGeometry::from_mesh_extents`], [`sample_signed_distances`]
    /// and [`Self::build`].
    pub fn generate(
        config: &GridConfig,
        mesh_extents: &[f64; 3],
        sampler: &impl DistanceSampler,
        execution: SamplingExecution<'_>,
    ) -> Result<Self> {
        let geometry = GridGeometry::from_mesh_extents(mesh_extents, config)?;
        let points = geometry.sample_points();

        debug!(
            "Sampling signed distances on {res}x{res}x{res} grid (side length {}, spacing {})",
            geometry.side_length(),
            geometry.spacing(),
            res = geometry.resolution()
        );

        let distances = with_timing_info_logging!(
            "Sampling {} signed distances", points.len(); {
            sample_signed_distances(sampler, &points, execution)
        })?;

        Self::build(geometry, points, &distances)
    }

    /// Wraps data that has already been validated for consistency with the
    /// geometry.
    pub(crate) fn from_validated_parts(
        geometry: GridGeometry,
        values: Vec<f64>,
        points: Vec<Point3<f64>>,
    ) -> Self {
        Self {
            geometry,
            values,
            points,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn resolution(&self) -> usize {
        self.geometry.resolution()
    }

    pub fn padding(&self) -> f64 {
        self.geometry.padding()
    }

    pub fn side_length(&self) -> f64 {
        self.geometry.side_length()
    }

    pub fn origin(&self) -> &Point3<f64> {
        self.geometry.origin()
    }

    pub fn spacing(&self) -> f64 {
        self.geometry.spacing()
    }

    /// All stored values in flat index order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// All sample points in flat index order.
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn point(&self, idx: usize) -> Option<&Point3<f64>> {
        self.points.get(idx)
    }

    /// The stored value at the given grid indices, or [`None`] if any index
    /// is outside the grid.
    pub fn value(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        let resolution = self.resolution();
        if i >= resolution || j >= resolution || k >= resolution {
            return None;
        }
        Some(self.values[self.geometry.indexer().linear_idx([i, j, k])])
    }

    pub fn properties(&self) -> VolumeProperties<'_> {
        VolumeProperties {
            values: &self.values,
            origin: self.geometry.origin(),
            spacing: self.geometry.spacing(),
            resolution: self.geometry.resolution(),
        }
    }

    /// Smallest and largest stored value.
    pub fn value_range(&self) -> (f64, f64) {
        self.values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &value| {
                (min.min(value), max.max(value))
            })
    }

    /// Number of samples lying strictly inside the surface.
    pub fn inside_sample_count(&self) -> usize {
        self.values.iter().filter(|&&value| value < 0.0).count()
    }

    /// Copies the values into a nested array indexed as `[i][j][k]`.
    pub fn to_nested_array(&self) -> Vec<Vec<Vec<f64>>> {
        let resolution = self.resolution();
        let indexer = self.geometry.indexer();
        (0..resolution)
            .map(|i| {
                (0..resolution)
                    .map(|j| {
                        (0..resolution)
                            .map(|k| self.values[indexer.linear_idx([i, j, k])])
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::SamplerFn;

    fn unit_cube_geometry(resolution: usize) -> GridGeometry {
        GridGeometry::from_mesh_extents(&[1.0; 3], &GridConfig::new(resolution, 0.02)).unwrap()
    }

    #[test]
    fn should_negate_oracle_distances() {
        let geometry = unit_cube_geometry(2);
        let points = geometry.sample_points();
        let distances: Vec<f64> = (0..8).map(|i| i as f64).collect();

        let volume = SignedDistanceVolume::build(geometry, points, &distances).unwrap();

        for (value, distance) in volume.values().iter().zip(&distances) {
            assert_eq!(*value, -distance);
        }
    }

    #[test]
    fn should_store_value_of_each_point_at_its_grid_indices() {
        let geometry = unit_cube_geometry(4);
        let sampler = SamplerFn(|p: &Point3<f64>| p.x + 10.0 * p.y + 100.0 * p.z);

        let volume = SignedDistanceVolume::generate(
            &GridConfig::new(4, 0.02),
            &[1.0; 3],
            &sampler,
            SamplingExecution::Serial,
        )
        .unwrap();

        assert_eq!(volume.geometry(), &geometry);
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    let point = geometry.sample_point([i, j, k]);
                    let expected = -(point.x + 10.0 * point.y + 100.0 * point.z);
                    assert_eq!(volume.value(i, j, k), Some(expected));
                }
            }
        }
    }

    #[test]
    fn should_reject_wrong_number_of_distances() {
        let geometry = unit_cube_geometry(3);
        let points = geometry.sample_points();
        let result = SignedDistanceVolume::build(geometry, points, &[0.0; 26]);
        assert!(matches!(result, Err(SdfError::ComputationFailure { .. })));
    }

    #[test]
    fn should_reject_wrong_number_of_points() {
        let geometry = unit_cube_geometry(3);
        let result = SignedDistanceVolume::build(geometry, Vec::new(), &[0.0; 27]);
        assert!(matches!(result, Err(SdfError::InvalidConfiguration(_))));
    }

    #[test]
    fn should_return_none_for_indices_outside_grid() {
        let geometry = unit_cube_geometry(3);
        let points = geometry.sample_points();
        let volume = SignedDistanceVolume::build(geometry, points, &[0.0; 27]).unwrap();

        assert!(volume.value(2, 2, 2).is_some());
        assert!(volume.value(3, 0, 0).is_none());
        assert!(volume.value(0, 3, 0).is_none());
        assert!(volume.value(0, 0, 3).is_none());
    }

    #[test]
    fn should_lay_out_nested_array_by_grid_indices() {
        let volume = SignedDistanceVolume::generate(
            &GridConfig::new(3, 0.5),
            &[1.0; 3],
            &SamplerFn(|p: &Point3<f64>| p.x - 2.0 * p.z),
            SamplingExecution::Serial,
        )
        .unwrap();

        let nested = volume.to_nested_array();
        assert_eq!(nested.len(), 3);
        for (i, plane) in nested.iter().enumerate() {
            for (j, row) in plane.iter().enumerate() {
                for (k, value) in row.iter().enumerate() {
                    assert_eq!(Some(*value), volume.value(i, j, k));
                }
            }
        }
    }

    #[test]
    fn should_summarize_values() {
        let geometry = unit_cube_geometry(2);
        let points = geometry.sample_points();
        let distances = [1.0, -2.0, 0.5, 0.0, -0.25, 3.0, -1.0, 0.0];
        let volume = SignedDistanceVolume::build(geometry, points, &distances).unwrap();

        assert_eq!(volume.value_range(), (-3.0, 2.0));
        assert_eq!(volume.inside_sample_count(), 3);
    }

    #[test]
    fn should_expose_properties() {
        let geometry = unit_cube_geometry(2);
        let points = geometry.sample_points();
        let volume = SignedDistanceVolume::build(geometry, points, &[0.0; 8]).unwrap();
        let properties = volume.properties();

        assert_eq!(properties.values.len(), 8);
        assert_eq!(properties.origin, geometry.origin());
        assert_eq!(properties.spacing, geometry.spacing());
        assert_eq!(properties.resolution, 2);
    }
}
