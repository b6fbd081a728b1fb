//! Configuration for signed distance field generation.

use crate::{
    error::Result,
    grid::GridConfig,
    interpolation::BoundsPolicy,
    sampling::SamplingThreadPool,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{num::NonZeroUsize, path::Path, thread};

/// Configuration parameters for generating and querying signed distance
/// fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Size and density of the sampling grid.
    pub grid: GridConfig,
    /// Number of threads used for sampling. When not specified, the available
    /// parallelism of the system is used. A single thread samples serially.
    pub n_worker_threads: Option<NonZeroUsize>,
    /// Which query points interpolation accepts when answering queries
    /// against generated fields.
    pub bounds_policy: BoundsPolicy,
    /// Whether to move the mesh into its canonical frame centered on the
    /// origin before sampling.
    pub center_mesh: bool,
}

impl GenerationConfig {
    /// Parses the configuration from the RON file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file can not be read or parsed, or if the
    /// parsed configuration is invalid.
    pub fn from_ron_file(file_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file_path = file_path.as_ref();
        let config: Self = sdfield_io::parse_ron_file(file_path)?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", file_path.display()))?;
        Ok(config)
    }

    /// Writes the configuration as RON to the given path.
    ///
    /// # Errors
    /// Returns an error if the file can not be written.
    pub fn write_ron_file(&self, output_file_path: impl AsRef<Path>) -> anyhow::Result<()> {
        sdfield_io::write_ron_file(self, output_file_path)
    }

    /// # Errors
    /// Returns [`crate::SdfError::InvalidConfiguration`] if the grid
    /// configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()
    }

    /// The number of sampling threads to use, resolving an unspecified count
    /// to the available parallelism.
    pub fn resolved_n_worker_threads(&self) -> NonZeroUsize {
        self.n_worker_threads.unwrap_or_else(|| {
            thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
        })
    }

    /// Creates the thread pool for sampling, or [`None`] if sampling should
    /// be done on the calling thread.
    ///
    /// # Errors
    /// Returns [`crate::SdfError::InvalidConfiguration`] if the pool can not
    /// be created.
    pub fn create_sampling_thread_pool(&self) -> Result<Option<SamplingThreadPool>> {
        let n_threads = self.resolved_n_worker_threads();
        if n_threads.get() == 1 {
            Ok(None)
        } else {
            SamplingThreadPool::new(n_threads).map(Some)
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            n_worker_threads: None,
            bounds_policy: BoundsPolicy::default(),
            center_mesh: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_use_documented_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.grid.resolution, 32);
        assert_eq!(config.grid.padding, 0.02);
        assert_eq!(config.grid.max_point_count, 128 * 128 * 128);
        assert_eq!(config.n_worker_threads, None);
        assert_eq!(config.bounds_policy, BoundsPolicy::Compatible);
        assert!(config.center_mesh);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_fill_in_missing_fields_with_defaults() {
        let config: GenerationConfig =
            ron::from_str("(grid: (resolution: 16), bounds_policy: FullGrid)").unwrap();

        assert_eq!(config.grid.resolution, 16);
        assert_eq!(config.grid.padding, GridConfig::DEFAULT_PADDING);
        assert_eq!(config.bounds_policy, BoundsPolicy::FullGrid);
        assert!(config.center_mesh);
    }

    #[test]
    fn should_round_trip_through_ron_file() {
        let path = std::env::temp_dir()
            .join(format!("sdfield_config_test_{}", std::process::id()))
            .join("config.ron");
        let config = GenerationConfig {
            n_worker_threads: NonZeroUsize::new(3),
            center_mesh: false,
            ..GenerationConfig::default()
        };

        config.write_ron_file(&path).unwrap();
        assert_eq!(GenerationConfig::from_ron_file(&path).unwrap(), config);
    }

    #[test]
    fn should_reject_invalid_grid_in_file() {
        let path = std::env::temp_dir()
            .join(format!("sdfield_config_test_{}", std::process::id()))
            .join("invalid.ron");
        sdfield_io::write_text_file("(grid: (resolution: 1))", &path).unwrap();

        assert!(GenerationConfig::from_ron_file(&path).is_err());
    }

    #[test]
    fn should_sample_serially_with_one_thread() {
        let config = GenerationConfig {
            n_worker_threads: NonZeroUsize::new(1),
            ..GenerationConfig::default()
        };
        assert!(config.create_sampling_thread_pool().unwrap().is_none());
    }

    #[test]
    fn should_create_pool_with_requested_thread_count() {
        let config = GenerationConfig {
            n_worker_threads: NonZeroUsize::new(2),
            ..GenerationConfig::default()
        };
        let pool = config.create_sampling_thread_pool().unwrap().unwrap();
        assert_eq!(pool.n_threads().get(), 2);
    }
}
