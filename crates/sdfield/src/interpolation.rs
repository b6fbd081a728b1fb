//! Trilinear interpolation of sampled signed distances.

use crate::{error::OutOfBounds, volume::SignedDistanceVolume};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Value returned by [`Interpolator::interpolate_or_sentinel`] for points
/// outside the interpolation region.
pub const OUT_OF_BOUNDS_SENTINEL: f64 = -1.0;

/// Determines which points are considered to lie inside the region where the
/// field can be interpolated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsPolicy {
    /// A point is rejected when its base cell index along any axis is zero or
    /// at least `R - 1`. This excludes the lowest layer of cells in addition
    /// to everything at or beyond the far faces.
    #[default]
    Compatible,
    /// Every point within the cube, including the faces, is accepted. Points
    /// on the far faces use the last cell.
    FullGrid,
}

/// Answers signed distance queries at arbitrary points by trilinear
/// interpolation of the eight surrounding grid values.
#[derive(Clone, Copy, Debug)]
pub struct Interpolator<'a> {
    volume: &'a SignedDistanceVolume,
    policy: BoundsPolicy,
}

/// How far, in units of grid spacing, a point may lie outside the cube and
/// still be treated as lying on its face under [`BoundsPolicy::FullGrid`].
const FACE_TOLERANCE: f64 = 1e-9;

/// How close, in units of grid spacing, a coordinate must be to a grid plane
/// to be treated as lying exactly on it.
const GRID_NODE_TOLERANCE: f64 = 1e-9;

/// The grid cell containing a query point and the fractional position of the
/// point within it.
#[derive(Clone, Copy, Debug)]
struct Cell {
    base: [usize; 3],
    offsets: [f64; 3],
}

impl<'a> Interpolator<'a> {
    pub fn new(volume: &'a SignedDistanceVolume, policy: BoundsPolicy) -> Self {
        Self { volume, policy }
    }

    pub fn policy(&self) -> BoundsPolicy {
        self.policy
    }

    /// Computes the interpolated signed distance at the given point.
    ///
    /// # Errors
    /// Returns [`OutOfBounds`] if the point lies outside the region accepted
    /// by the bounds policy.
    pub fn interpolate(&self, point: &Point3<f64>) -> Result<f64, OutOfBounds> {
        let cell = self.locate(point).ok_or(OutOfBounds { point: *point })?;
        let corners = self.corner_values(cell.base);
        Ok(trilinear(&corners, cell.offsets))
    }

    /// Like [`Self::interpolate`], but returns [`OUT_OF_BOUNDS_SENTINEL`] for
    /// points outside the interpolation region. Note that the sentinel is
    /// also a valid distance value.
    pub fn interpolate_or_sentinel(&self, point: &Point3<f64>) -> f64 {
        self.interpolate(point).unwrap_or(OUT_OF_BOUNDS_SENTINEL)
    }

    /// Interpolates at each of the given points, in order.
    pub fn interpolate_many(&self, points: &[Point3<f64>]) -> Vec<Result<f64, OutOfBounds>> {
        points.iter().map(|point| self.interpolate(point)).collect()
    }

    /// Computes the gradient of the interpolated field at the given point.
    ///
    /// # Errors
    /// Returns [`OutOfBounds`] if the point lies outside the region accepted
    /// by the bounds policy.
    pub fn gradient(&self, point: &Point3<f64>) -> Result<Vector3<f64>, OutOfBounds> {
        let cell = self.locate(point).ok_or(OutOfBounds { point: *point })?;
        let c = self.corner_values(cell.base);
        let [tx, ty, tz] = cell.offsets;
        let inverse_spacing = self.volume.spacing().recip();

        let dx = bilinear(
            [c[1] - c[0], c[3] - c[2], c[5] - c[4], c[7] - c[6]],
            ty,
            tz,
        );
        let dy = bilinear(
            [c[2] - c[0], c[3] - c[1], c[6] - c[4], c[7] - c[5]],
            tx,
            tz,
        );
        let dz = bilinear(
            [c[4] - c[0], c[5] - c[1], c[6] - c[2], c[7] - c[3]],
            tx,
            ty,
        );

        Ok(Vector3::new(dx, dy, dz) * inverse_spacing)
    }

    fn locate(&self, point: &Point3<f64>) -> Option<Cell> {
        let origin = self.volume.origin();
        let spacing = self.volume.spacing();
        let max_idx = (self.volume.resolution() - 1) as f64;

        let mut base = [0; 3];
        let mut offsets = [0.0; 3];

        for axis in 0..3 {
            let mut fractional_idx = (point[axis] - origin[axis]) / spacing;
            if !fractional_idx.is_finite() {
                return None;
            }
            let nearest_idx = fractional_idx.round();
            let on_grid_plane = (fractional_idx - nearest_idx).abs() <= GRID_NODE_TOLERANCE;
            if on_grid_plane {
                fractional_idx = nearest_idx;
            }
            let floored_idx = fractional_idx.floor();

            let idx = match self.policy {
                BoundsPolicy::Compatible => {
                    if floored_idx <= 0.0 || floored_idx >= max_idx {
                        return None;
                    }
                    floored_idx
                }
                BoundsPolicy::FullGrid => {
                    if fractional_idx < -FACE_TOLERANCE
                        || fractional_idx > max_idx + FACE_TOLERANCE
                    {
                        return None;
                    }
                    floored_idx.clamp(0.0, max_idx - 1.0)
                }
            };
            let offset = if on_grid_plane {
                fractional_idx - idx
            } else {
                let corner_coord = idx * spacing + origin[axis];
                ((point[axis] - corner_coord) / spacing).clamp(0.0, 1.0)
            };

            base[axis] = idx as usize;
            offsets[axis] = offset;
        }

        Some(Cell { base, offsets })
    }

    /// Values at the eight corners of the cell, with the corner at offset
    /// `(di, dj, dk)` stored at `di + 2*dj + 4*dk`.
    fn corner_values(&self, [i, j, k]: [usize; 3]) -> [f64; 8] {
        let values = self.volume.values();
        let indexer = self.volume.geometry().indexer();
        let mut corners = [0.0; 8];
        for (n, corner) in corners.iter_mut().enumerate() {
            let indices = [i + (n & 1), j + ((n >> 1) & 1), k + ((n >> 2) & 1)];
            *corner = values[indexer.linear_idx(indices)];
        }
        corners
    }
}

impl SignedDistanceVolume {
    pub fn interpolator(&self, policy: BoundsPolicy) -> Interpolator<'_> {
        Interpolator::new(self, policy)
    }

    /// Interpolates the field at the given point using
    /// [`BoundsPolicy::Compatible`].
    ///
    /// # Errors
    /// Returns [`OutOfBounds`] if the point lies outside the interpolation
    /// region.
    pub fn interpolate(&self, point: &Point3<f64>) -> Result<f64, OutOfBounds> {
        self.interpolator(BoundsPolicy::default()).interpolate(point)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

fn bilinear([c00, c10, c01, c11]: [f64; 4], s: f64, t: f64) -> f64 {
    lerp(lerp(c00, c10, s), lerp(c01, c11, s), t)
}

/// Blends along x first, then y, then z.
fn trilinear(c: &[f64; 8], [tx, ty, tz]: [f64; 3]) -> f64 {
    let c00 = lerp(c[0], c[1], tx);
    let c10 = lerp(c[2], c[3], tx);
    let c01 = lerp(c[4], c[5], tx);
    let c11 = lerp(c[6], c[7], tx);

    let c0 = lerp(c00, c10, ty);
    let c1 = lerp(c01, c11, ty);

    lerp(c0, c1, tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grid::GridConfig,
        sampling::{SamplerFn, SamplingExecution},
    };
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    /// Grid with origin (-2, -2, -2), unit spacing and resolution 5.
    fn integer_grid_volume(field: impl Fn(&Point3<f64>) -> f64 + Sync) -> SignedDistanceVolume {
        SignedDistanceVolume::generate(
            &GridConfig::new(5, 1.0),
            &[2.0; 3],
            &SamplerFn(|p: &Point3<f64>| -field(p)),
            SamplingExecution::Serial,
        )
        .unwrap()
    }

    fn linear_field(p: &Point3<f64>) -> f64 {
        0.5 * p.x - 1.5 * p.y + 2.0 * p.z + 0.25
    }

    #[test]
    fn should_reproduce_linear_field_exactly() {
        let volume = integer_grid_volume(linear_field);
        let point = Point3::new(0.3, -0.7, 1.2);

        assert_abs_diff_eq!(
            volume.interpolate(&point).unwrap(),
            linear_field(&point),
            epsilon = 1e-12
        );
    }

    #[test]
    fn should_compute_constant_gradient_of_linear_field() {
        let volume = integer_grid_volume(linear_field);
        let gradient = volume
            .interpolator(BoundsPolicy::Compatible)
            .gradient(&Point3::new(0.4, 0.1, -0.6))
            .unwrap();

        assert_abs_diff_eq!(gradient, Vector3::new(0.5, -1.5, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn should_interpolate_bilinear_product_term() {
        let field = |p: &Point3<f64>| p.x * p.y * p.z;
        let volume = integer_grid_volume(field);
        let point = Point3::new(0.25, 0.5, 0.75);

        assert_abs_diff_eq!(
            volume.interpolate(&point).unwrap(),
            field(&point),
            epsilon = 1e-12
        );
    }

    #[test]
    fn should_reject_point_in_lowest_cell_layer_in_compatible_mode() {
        let volume = integer_grid_volume(linear_field);
        let interpolator = volume.interpolator(BoundsPolicy::Compatible);

        assert!(interpolator.interpolate(volume.origin()).is_err());
        assert!(
            interpolator
                .interpolate(&Point3::new(-1.5, 0.0, 0.0))
                .is_err()
        );
        assert!(interpolator.interpolate(&Point3::new(-0.5, 0.0, 0.0)).is_ok());
    }

    #[test]
    fn should_reject_far_faces_and_beyond_in_compatible_mode() {
        let volume = integer_grid_volume(linear_field);
        let interpolator = volume.interpolator(BoundsPolicy::Compatible);

        assert!(interpolator.interpolate(&Point3::new(2.0, 0.0, 0.0)).is_err());
        assert!(interpolator.interpolate(&Point3::new(0.0, 0.0, 7.0)).is_err());
        assert!(interpolator.interpolate(&Point3::new(1.5, 1.5, 1.5)).is_ok());
    }

    #[test]
    fn should_accept_whole_cube_in_full_grid_mode() {
        let volume = integer_grid_volume(linear_field);
        let interpolator = volume.interpolator(BoundsPolicy::FullGrid);

        for point in [
            Point3::new(-2.0, -2.0, -2.0),
            Point3::new(-1.5, 0.0, 0.0),
            Point3::new(2.0, 2.0, 2.0),
            Point3::new(2.0, -2.0, 0.3),
        ] {
            assert_abs_diff_eq!(
                interpolator.interpolate(&point).unwrap(),
                linear_field(&point),
                epsilon = 1e-12
            );
        }

        assert!(
            interpolator
                .interpolate(&Point3::new(2.0 + 1e-6, 0.0, 0.0))
                .is_err()
        );
        assert!(
            interpolator
                .interpolate(&Point3::new(0.0, -2.0 - 1e-6, 0.0))
                .is_err()
        );
    }

    #[test]
    fn should_return_sentinel_for_out_of_bounds_points() {
        let volume = integer_grid_volume(|_| 5.0);
        let interpolator = volume.interpolator(BoundsPolicy::Compatible);

        assert_eq!(
            interpolator.interpolate_or_sentinel(&Point3::new(-3.0, 0.0, 0.0)),
            OUT_OF_BOUNDS_SENTINEL
        );
        assert_eq!(
            interpolator.interpolate_or_sentinel(&Point3::new(0.0, 0.0, 0.0)),
            5.0
        );
    }

    #[test]
    fn should_reject_non_finite_points() {
        let volume = integer_grid_volume(linear_field);
        for policy in [BoundsPolicy::Compatible, BoundsPolicy::FullGrid] {
            let interpolator = volume.interpolator(policy);
            assert!(
                interpolator
                    .interpolate(&Point3::new(f64::NAN, 0.0, 0.0))
                    .is_err()
            );
            assert!(
                interpolator
                    .interpolate(&Point3::new(0.0, f64::INFINITY, 0.0))
                    .is_err()
            );
        }
    }

    #[test]
    fn should_carry_point_in_out_of_bounds_error() {
        let volume = integer_grid_volume(linear_field);
        let point = Point3::new(10.0, 0.0, 0.0);
        assert_eq!(volume.interpolate(&point), Err(OutOfBounds { point }));
    }

    #[test]
    fn should_answer_batch_queries_in_order() {
        let volume = integer_grid_volume(linear_field);
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(-5.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let results = volume
            .interpolator(BoundsPolicy::Compatible)
            .interpolate_many(&points);

        assert_eq!(results.len(), 3);
        assert_abs_diff_eq!(*results[0].as_ref().unwrap(), 0.25, epsilon = 1e-12);
        assert!(results[1].is_err());
        assert_abs_diff_eq!(
            *results[2].as_ref().unwrap(),
            linear_field(&points[2]),
            epsilon = 1e-12
        );
    }

    /// Grid whose spacing is not a power of two, so node coordinates carry
    /// rounding error.
    fn non_dyadic_volume(resolution: usize, padding: f64, extent: f64) -> SignedDistanceVolume {
        SignedDistanceVolume::generate(
            &GridConfig::new(resolution, padding),
            &[extent, 0.6 * extent, 0.3 * extent],
            &SamplerFn(|p: &Point3<f64>| (p.x * 1.3).sin() + p.y * p.z - 0.1),
            SamplingExecution::Serial,
        )
        .unwrap()
    }

    #[test]
    fn should_return_stored_value_at_every_grid_node_of_non_dyadic_grids() {
        for resolution in [4, 7, 13] {
            for padding in [0.02, 0.013, 0.3] {
                for extent in [0.7, 2.3] {
                    let volume = non_dyadic_volume(resolution, padding, extent);
                    let compatible = volume.interpolator(BoundsPolicy::Compatible);
                    let full_grid = volume.interpolator(BoundsPolicy::FullGrid);

                    for indices in volume.geometry().indexer().indices_in_generation_order() {
                        let [i, j, k] = indices;
                        let point = volume.geometry().sample_point(indices);
                        let stored = volume.value(i, j, k).unwrap();

                        assert_eq!(full_grid.interpolate(&point), Ok(stored));

                        let interior = indices.iter().all(|&idx| idx > 0 && idx + 1 < resolution);
                        if interior {
                            assert_eq!(compatible.interpolate(&point), Ok(stored));
                        } else {
                            assert!(compatible.interpolate(&point).is_err());
                        }
                    }
                }
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn interpolation_matches_grid_values_at_nodes_of_non_dyadic_grid(
            i in 1_usize..6,
            j in 1_usize..6,
            k in 1_usize..6,
        ) {
            let volume = non_dyadic_volume(7, 0.02, 2.3);
            let point = volume.geometry().sample_point([i, j, k]);
            let interpolated = volume.interpolate(&point).unwrap();
            prop_assert_eq!(Some(interpolated), volume.value(i, j, k));
        }

        #[test]
        fn interpolation_matches_grid_values_at_interior_grid_points(
            i in 1_usize..4,
            j in 1_usize..4,
            k in 1_usize..4,
        ) {
            let volume = integer_grid_volume(|p| (p.x * 1.3).sin() + p.y * p.z);
            let point = volume.geometry().sample_point([i, j, k]);
            let interpolated = volume.interpolate(&point).unwrap();
            prop_assert_eq!(Some(interpolated), volume.value(i, j, k));
        }

        #[test]
        fn interpolation_stays_within_corner_value_range(
            x in -0.99..1.99_f64,
            y in -0.99..1.99_f64,
            z in -0.99..1.99_f64,
        ) {
            let volume = integer_grid_volume(|p| (p.x * 1.3).sin() + p.y * p.z);
            let value = volume.interpolate(&Point3::new(x, y, z)).unwrap();
            let (min, max) = volume.value_range();
            prop_assert!(value >= min - 1e-12 && value <= max + 1e-12);
        }
    }
}
