//! Evaluation of signed distances at grid sample points.

use crate::error::{Result, SdfError};
use nalgebra::Point3;
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use std::num::NonZeroUsize;
use thiserror::Error;

/// Something that can report the signed distance from a point to a surface.
///
/// Implementations use the convention that distances are positive for points
/// inside the surface and negative for points outside it. Samplers are shared
/// between worker threads and must not rely on mutable state.
pub trait DistanceSampler: Sync {
    /// # Errors
    /// Returns [`SamplingFailure`] if the distance can not be evaluated at the
    /// given point.
    fn signed_distance(&self, point: &Point3<f64>) -> std::result::Result<f64, SamplingFailure>;
}

/// Adapts an infallible closure into a [`DistanceSampler`].
#[derive(Clone, Copy, Debug)]
pub struct SamplerFn<F>(pub F);

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct SamplingFailure {
    reason: String,
}

/// How a batch of sample points is evaluated.
#[derive(Clone, Copy, Debug)]
pub enum SamplingExecution<'a> {
    Serial,
    Parallel(&'a SamplingThreadPool),
}

/// A dedicated `rayon` pool for evaluating sample points.
#[derive(Debug)]
pub struct SamplingThreadPool {
    pool: ThreadPool,
    n_threads: NonZeroUsize,
}

impl<F> DistanceSampler for SamplerFn<F>
where
    F: Fn(&Point3<f64>) -> f64 + Sync,
{
    fn signed_distance(&self, point: &Point3<f64>) -> std::result::Result<f64, SamplingFailure> {
        Ok((self.0)(point))
    }
}

impl SamplingFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl<'a> SamplingExecution<'a> {
    /// Samples on the given pool if there is one, otherwise serially.
    pub fn from_thread_pool(thread_pool: Option<&'a SamplingThreadPool>) -> Self {
        thread_pool.map_or(Self::Serial, Self::Parallel)
    }
}

impl SamplingThreadPool {
    /// # Errors
    /// Returns [`SdfError::InvalidConfiguration`] if the pool can not be
    /// created.
    pub fn new(n_threads: NonZeroUsize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads.get())
            .thread_name(|idx| format!("sdfield-sampler-{idx}"))
            .build()
            .map_err(|err| {
                SdfError::invalid_configuration(format!(
                    "could not create pool of {n_threads} sampling threads: {err}"
                ))
            })?;

        Ok(Self { pool, n_threads })
    }

    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    pub fn n_threads(&self) -> NonZeroUsize {
        self.n_threads
    }
}

/// Evaluates the sampler at every point and returns the distances in point
/// order. The output does not depend on how the work is scheduled.
///
/// # Errors
/// Returns [`SdfError::ComputationFailure`] if the sampler fails or produces
/// a non-finite distance for any point. No partial results are returned.
pub fn sample_signed_distances(
    sampler: &impl DistanceSampler,
    points: &[Point3<f64>],
    execution: SamplingExecution<'_>,
) -> Result<Vec<f64>> {
    match execution {
        SamplingExecution::Serial => points
            .iter()
            .enumerate()
            .map(|(idx, point)| evaluate(sampler, idx, point))
            .collect(),
        SamplingExecution::Parallel(thread_pool) => thread_pool.pool().install(|| {
            points
                .par_iter()
                .enumerate()
                .map(|(idx, point)| evaluate(sampler, idx, point))
                .collect()
        }),
    }
}

fn evaluate(sampler: &impl DistanceSampler, idx: usize, point: &Point3<f64>) -> Result<f64> {
    match sampler.signed_distance(point) {
        Ok(distance) if distance.is_finite() => Ok(distance),
        Ok(distance) => Err(SdfError::ComputationFailure {
            message: format!(
                "sampler returned {distance} for point {idx} at ({}, {}, {})",
                point.x, point.y, point.z
            ),
            source: None,
        }),
        Err(failure) => Err(SdfError::ComputationFailure {
            message: format!(
                "sampler failed for point {idx} at ({}, {}, {})",
                point.x, point.y, point.z
            ),
            source: Some(failure),
        }),
    }
}
