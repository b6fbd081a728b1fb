//! Dense signed distance fields sampled on uniform cubic grids.
//!
//! A [`SignedDistanceVolume`] is generated by laying out a cube of
//! `R×R×R` sample points around a shape, evaluating a [`DistanceSampler`] at
//! every point and storing the negated distances, so that the stored field is
//! negative inside the shape. Volumes can be queried at arbitrary points with
//! an [`Interpolator`] and persisted as a [`SignedDistanceSnapshot`].

pub mod config;
pub mod error;
pub mod grid;
pub mod interpolation;
pub mod point_cloud;
pub mod sampling;
pub mod snapshot;
pub mod volume;

pub use config::GenerationConfig;
pub use error::{OutOfBounds, SdfError};
pub use grid::{GridConfig, GridGeometry, GridIndexer};
pub use interpolation::{BoundsPolicy, Interpolator, OUT_OF_BOUNDS_SENTINEL};
pub use sampling::{
    DistanceSampler, SamplerFn, SamplingExecution, SamplingFailure, SamplingThreadPool,
};
pub use snapshot::{
    SignedDistanceSnapshot, SnapshotFormat, read_snapshot_file, write_snapshot_file,
};
pub use volume::{SignedDistanceVolume, VolumeProperties};
