//! Geometry of the uniform cubic sampling grid.

use crate::error::{Result, SdfError};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Parameters controlling the size and density of the sampling grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of sample points along each axis of the cube.
    pub resolution: usize,
    /// Margin added on each side of the largest mesh extent.
    pub padding: f64,
    /// Upper limit on the total number of sample points (`resolution³`).
    pub max_point_count: usize,
}

/// Placement and spacing of a cubic grid of `R×R×R` sample points centered on
/// the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    resolution: usize,
    padding: f64,
    side_length: f64,
    origin: Point3<f64>,
    spacing: f64,
}

/// Maps between 3D grid indices and the flat index used for both the order of
/// generated sample points and the storage of sampled values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridIndexer {
    resolution: usize,
}

impl GridConfig {
    pub const DEFAULT_RESOLUTION: usize = 32;
    pub const DEFAULT_PADDING: f64 = 0.02;
    pub const DEFAULT_MAX_POINT_COUNT: usize = 128 * 128 * 128;

    pub fn new(resolution: usize, padding: f64) -> Self {
        Self {
            resolution,
            padding,
            ..Self::default()
        }
    }

    /// Number of sample points the grid will hold, or [`None`] if it does not
    /// fit in a `usize`.
    pub fn point_count(&self) -> Option<usize> {
        self.resolution.checked_pow(3)
    }

    /// # Errors
    /// Returns [`SdfError::InvalidConfiguration`] if the resolution is below
    /// two, the padding is negative or non-finite, or the number of sample
    /// points exceeds the point budget.
    pub fn validate(&self) -> Result<()> {
        if self.resolution < 2 {
            return Err(SdfError::invalid_configuration(format!(
                "grid resolution must be at least 2 (got {})",
                self.resolution
            )));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(SdfError::invalid_configuration(format!(
                "grid padding must be finite and non-negative (got {})",
                self.padding
            )));
        }
        match self.point_count() {
            Some(count) if count <= self.max_point_count => Ok(()),
            _ => Err(SdfError::invalid_configuration(format!(
                "grid resolution {} exceeds the budget of {} sample points",
                self.resolution, self.max_point_count
            ))),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: Self::DEFAULT_RESOLUTION,
            padding: Self::DEFAULT_PADDING,
            max_point_count: Self::DEFAULT_MAX_POINT_COUNT,
        }
    }
}

impl GridGeometry {
    /// Derives the grid enclosing a mesh with the given axis-aligned extents.
    /// The cube side length is the largest extent plus twice the padding, and
    /// the cube is centered on the origin.
    ///
    /// # Errors
    /// Returns [`SdfError::InvalidConfiguration`] if the configuration is
    /// invalid, any extent is negative or non-finite, or the resulting cube
    /// has no volume.
    pub fn from_mesh_extents(extents: &[f64; 3], config: &GridConfig) -> Result<Self> {
        config.validate()?;

        if let Some(extent) = extents.iter().find(|e| !e.is_finite() || **e < 0.0) {
            return Err(SdfError::invalid_configuration(format!(
                "mesh extents must be finite and non-negative (got {extent})"
            )));
        }

        let max_extent = extents.iter().copied().fold(0.0, f64::max);
        let side_length = max_extent + 2.0 * config.padding;

        if side_length <= 0.0 {
            return Err(SdfError::invalid_configuration(
                "grid side length is zero; a flat mesh needs positive padding",
            ));
        }

        let half_length = 0.5 * side_length;

        Ok(Self {
            resolution: config.resolution,
            padding: config.padding,
            side_length,
            origin: Point3::new(-half_length, -half_length, -half_length),
            spacing: side_length / (config.resolution - 1) as f64,
        })
    }

    /// Reassembles a geometry from persisted parameters without deriving
    /// anything from mesh extents.
    pub(crate) fn from_parts(
        resolution: usize,
        padding: f64,
        side_length: f64,
        origin: Point3<f64>,
        spacing: f64,
    ) -> Self {
        Self {
            resolution,
            padding,
            side_length,
            origin,
            spacing,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn side_length(&self) -> f64 {
        self.side_length
    }

    /// The corner of the cube with the smallest coordinates.
    pub fn origin(&self) -> &Point3<f64> {
        &self.origin
    }

    /// Distance between neighboring sample points along an axis.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn point_count(&self) -> usize {
        self.indexer().point_count()
    }

    pub fn indexer(&self) -> GridIndexer {
        GridIndexer::new(self.resolution)
    }

    /// Coordinate of sample `idx` along the given axis. Both cube faces are
    /// sampled, and the last sample lies exactly on the far face.
    ///
    /// # Panics
    /// If `axis` is not 0, 1 or 2.
    pub fn axis_coordinate(&self, axis: usize, idx: usize) -> f64 {
        if idx + 1 == self.resolution {
            self.origin[axis] + self.side_length
        } else {
            self.origin[axis] + idx as f64 * self.spacing
        }
    }

    pub fn sample_point(&self, [i, j, k]: [usize; 3]) -> Point3<f64> {
        Point3::new(
            self.axis_coordinate(0, i),
            self.axis_coordinate(1, j),
            self.axis_coordinate(2, k),
        )
    }

    /// All sample points, with x varying fastest and z slowest. Point `n` of
    /// the returned list sits at the grid indices `indexer().grid_indices(n)`.
    pub fn sample_points(&self) -> Vec<Point3<f64>> {
        let indexer = self.indexer();
        let mut points = vec![Point3::origin(); indexer.point_count()];
        for indices in indexer.indices_in_generation_order() {
            points[indexer.linear_idx(indices)] = self.sample_point(indices);
        }
        points
    }
}

impl GridIndexer {
    pub const fn new(resolution: usize) -> Self {
        Self { resolution }
    }

    pub const fn resolution(&self) -> usize {
        self.resolution
    }

    pub const fn point_count(&self) -> usize {
        self.resolution * self.resolution * self.resolution
    }

    pub const fn linear_idx(&self, [i, j, k]: [usize; 3]) -> usize {
        i + self.resolution * (j + self.resolution * k)
    }

    pub const fn grid_indices(&self, linear_idx: usize) -> [usize; 3] {
        let i = linear_idx % self.resolution;
        let jk = linear_idx / self.resolution;
        [i, jk % self.resolution, jk / self.resolution]
    }

    /// Iterates over all grid indices with z in the outer loop and x in the
    /// inner loop.
    pub fn indices_in_generation_order(&self) -> impl Iterator<Item = [usize; 3]> + use<> {
        let resolution = self.resolution;
        (0..resolution).flat_map(move |k| {
            (0..resolution).flat_map(move |j| (0..resolution).map(move |i| [i, j, k]))
        })
    }
}
