//! Implementations of the command-line subcommands.

use anyhow::{Result, bail};
use nalgebra::Point3;
use sdfield::{
    BoundsPolicy, GenerationConfig, SamplingExecution, SignedDistanceVolume,
    point_cloud::{self, PointFilter},
    read_snapshot_file, write_snapshot_file,
};
use sdfield_log::{info, with_timing_info_logging};
use sdfield_mesh::{MeshCentering, MeshDistanceOracle, io::read_mesh_from_file};
use std::path::Path;

#[derive(Clone, Copy, Debug)]
pub struct QueryOptions {
    pub bounds_policy: BoundsPolicy,
    pub sentinel: bool,
    pub gradient: bool,
}

/// Parses the configuration file if one is given, otherwise returns the
/// default configuration.
pub fn load_config(config_file_path: Option<&Path>) -> Result<GenerationConfig> {
    match config_file_path {
        Some(file_path) => GenerationConfig::from_ron_file(file_path),
        None => Ok(GenerationConfig::default()),
    }
}

/// The `--full-grid` flag takes precedence over the policy in the
/// configuration.
pub fn resolve_bounds_policy(config: &GenerationConfig, full_grid: bool) -> BoundsPolicy {
    if full_grid {
        BoundsPolicy::FullGrid
    } else {
        config.bounds_policy
    }
}

pub fn generate(mesh_path: &Path, output_path: &Path, config: &GenerationConfig) -> Result<()> {
    config.validate()?;

    info!(
        "Generating {res}x{res}x{res} signed distance field with padding {} for {}",
        config.grid.padding,
        mesh_path.display(),
        res = config.grid.resolution
    );

    let mesh = read_mesh_from_file(mesh_path)?;
    let mesh = MeshCentering::from_center_mesh(config.center_mesh).apply(&mesh);
    let oracle = MeshDistanceOracle::new(mesh)?;

    let thread_pool = config.create_sampling_thread_pool()?;
    info!(
        "Sampling with {} thread(s)",
        thread_pool.as_ref().map_or(1, |pool| pool.n_threads().get())
    );

    let volume = with_timing_info_logging!(
        "Generating signed distance field for {}", mesh_path.display(); {
        SignedDistanceVolume::generate(
            &config.grid,
            &oracle.mesh().extents(),
            &oracle,
            SamplingExecution::from_thread_pool(thread_pool.as_ref()),
        )
    })?;

    write_snapshot_file(&volume, output_path)?;

    info!(
        "Wrote signed distance field with {} inside samples to {}",
        volume.inside_sample_count(),
        output_path.display()
    );
    Ok(())
}

pub fn query(snapshot_path: &Path, point: &Point3<f64>, options: &QueryOptions) -> Result<()> {
    let volume = read_snapshot_file(snapshot_path)?;

    let interpolator = volume.interpolator(options.bounds_policy);

    if options.sentinel {
        println!("{}", interpolator.interpolate_or_sentinel(point));
        return Ok(());
    }

    println!("{}", interpolator.interpolate(point)?);

    if options.gradient {
        let gradient = interpolator.gradient(point)?;
        println!("{} {} {}", gradient.x, gradient.y, gradient.z);
    }
    Ok(())
}

pub fn info(snapshot_path: &Path) -> Result<()> {
    let volume = read_snapshot_file(snapshot_path)?;
    let origin = volume.origin();
    let (min_value, max_value) = volume.value_range();

    println!("resolution:     {}", volume.resolution());
    println!("padding:        {}", volume.padding());
    println!("side length:    {}", volume.side_length());
    println!("spacing:        {}", volume.spacing());
    println!("origin:         ({}, {}, {})", origin.x, origin.y, origin.z);
    println!("value range:    [{min_value}, {max_value}]");
    println!(
        "inside samples: {} of {}",
        volume.inside_sample_count(),
        volume.values().len()
    );
    Ok(())
}

pub fn export_points(snapshot_path: &Path, output_path: &Path, filter: PointFilter) -> Result<()> {
    let volume = read_snapshot_file(snapshot_path)?;
    let points = point_cloud::colored_point_cloud(&volume, filter);
    point_cloud::write_ascii_ply(&points, output_path)?;

    info!(
        "Wrote {} points to {}",
        points.len(),
        output_path.display()
    );
    Ok(())
}

pub fn generate_config(output_path: &Path, force_overwrite: bool) -> Result<()> {
    if !force_overwrite && output_path.exists() {
        bail!("File {} already exists", output_path.display());
    }
    GenerationConfig::default().write_ron_file(output_path)
}
