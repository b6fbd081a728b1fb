//! Errors for signed distance field generation, persistence and queries.

use crate::sampling::SamplingFailure;
use nalgebra::Point3;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SdfError>;

#[derive(Debug, Error)]
pub enum SdfError {
    /// The grid or sampling parameters can not be used. Detected before any
    /// sampling takes place.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The distance sampler could not evaluate the field. No volume is
    /// produced.
    #[error("Signed distance computation failed: {message}")]
    ComputationFailure {
        message: String,
        #[source]
        source: Option<SamplingFailure>,
    },

    /// A snapshot could not be encoded, decoded or reconstructed into a
    /// volume.
    #[error("Invalid signed distance snapshot: {0}")]
    Serialization(String),
}

/// Returned by interpolation queries for points outside the region where the
/// field can be interpolated.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
#[error(
    "Point ({}, {}, {}) is outside the interpolation region of the signed distance field",
    .point.x,
    .point.y,
    .point.z
)]
pub struct OutOfBounds {
    pub point: Point3<f64>,
}

impl SdfError {
    pub(crate) fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}
