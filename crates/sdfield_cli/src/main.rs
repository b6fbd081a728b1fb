mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sdfield::point_cloud::PointFilter;
use std::{num::NonZeroUsize, path::PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "sdfield",
    about = "Generate and query signed distance fields of triangle meshes",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sample the signed distance field of a mesh and write it to a snapshot
    /// file (RON if the output has the `.ron` extension, binary otherwise)
    Generate {
        /// Path to the OBJ or PLY mesh file
        mesh: PathBuf,
        /// Number of sample points along each axis of the grid
        resolution: usize,
        /// Margin added on each side of the largest mesh extent
        padding: f64,
        /// Path where the snapshot should be written
        output: PathBuf,
        /// Path to RON configuration file to use for the remaining settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of sampling threads (defaults to the available parallelism)
        #[arg(short, long)]
        threads: Option<NonZeroUsize>,
        /// Maximum number of grid points to allow
        #[arg(long)]
        max_points: Option<usize>,
        /// Use the mesh as it is instead of centering it in its principal-axis
        /// frame
        #[arg(long)]
        no_centering: bool,
    },
    /// Interpolate the signed distance at a point
    Query {
        /// Path to the snapshot file
        snapshot: PathBuf,
        #[arg(allow_hyphen_values = true)]
        x: f64,
        #[arg(allow_hyphen_values = true)]
        y: f64,
        #[arg(allow_hyphen_values = true)]
        z: f64,
        /// Path to RON configuration file providing the default bounds policy
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Accept every point inside the grid cube, including its faces
        #[arg(long)]
        full_grid: bool,
        /// Print -1 for points outside the grid instead of failing
        #[arg(long)]
        sentinel: bool,
        /// Also print the gradient of the field at the point
        #[arg(long)]
        gradient: bool,
    },
    /// Print a summary of a snapshot
    Info {
        /// Path to the snapshot file
        snapshot: PathBuf,
    },
    /// Write the sample points of a snapshot as a colored PLY point cloud
    ExportPoints {
        /// Path to the snapshot file
        snapshot: PathBuf,
        /// Path where the PLY file should be written
        output: PathBuf,
        /// Only include points inside the surface
        #[arg(long, conflicts_with = "outside_only")]
        inside_only: bool,
        /// Only include points outside the surface
        #[arg(long)]
        outside_only: bool,
    },
    /// Generate the default RON configuration file
    GenerateConfig {
        /// Path where the file should be written
        output_path: PathBuf,
        /// Overwrite any existing file at the given path
        #[arg(short, long)]
        force_overwrite: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            mesh,
            resolution,
            padding,
            output,
            config,
            threads,
            max_points,
            no_centering,
        } => {
            let mut config = commands::load_config(config.as_deref())?;
            config.grid.resolution = resolution;
            config.grid.padding = padding;
            if let Some(threads) = threads {
                config.n_worker_threads = Some(threads);
            }
            if let Some(max_points) = max_points {
                config.grid.max_point_count = max_points;
            }
            if no_centering {
                config.center_mesh = false;
            }
            commands::generate(&mesh, &output, &config)
        }
        Command::Query {
            snapshot,
            x,
            y,
            z,
            config,
            full_grid,
            sentinel,
            gradient,
        } => {
            let config = commands::load_config(config.as_deref())?;
            commands::query(
                &snapshot,
                &nalgebra::Point3::new(x, y, z),
                &commands::QueryOptions {
                    bounds_policy: commands::resolve_bounds_policy(&config, full_grid),
                    sentinel,
                    gradient,
                },
            )
        }
        Command::Info { snapshot } => commands::info(&snapshot),
        Command::ExportPoints {
            snapshot,
            output,
            inside_only,
            outside_only,
        } => {
            let filter = if inside_only {
                PointFilter::InsideOnly
            } else if outside_only {
                PointFilter::OutsideOnly
            } else {
                PointFilter::All
            };
            commands::export_points(&snapshot, &output, filter)
        }
        Command::GenerateConfig {
            output_path,
            force_overwrite,
        } => commands::generate_config(&output_path, force_overwrite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn should_parse_generate_arguments() {
        let cli = Cli::try_parse_from([
            "sdfield", "generate", "bunny.obj", "64", "0.05", "bunny.sdf", "--threads", "4",
        ])
        .unwrap();

        match cli.command {
            Command::Generate {
                mesh,
                resolution,
                padding,
                threads,
                no_centering,
                ..
            } => {
                assert_eq!(mesh, PathBuf::from("bunny.obj"));
                assert_eq!(resolution, 64);
                assert_eq!(padding, 0.05);
                assert_eq!(threads, NonZeroUsize::new(4));
                assert!(!no_centering);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn should_reject_missing_generate_arguments() {
        assert!(Cli::try_parse_from(["sdfield", "generate", "bunny.obj", "64"]).is_err());
        assert!(
            Cli::try_parse_from(["sdfield", "generate", "bunny.obj", "many", "0.1", "out"])
                .is_err()
        );
    }

    #[test]
    fn should_parse_negative_query_coordinates() {
        let cli =
            Cli::try_parse_from(["sdfield", "query", "field.sdf", "-0.5", "0.25", "-1"]).unwrap();
        match cli.command {
            Command::Query { x, y, z, .. } => assert_eq!([x, y, z], [-0.5, 0.25, -1.0]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn should_parse_query_config_option() {
        let cli = Cli::try_parse_from([
            "sdfield", "query", "field.sdf", "0", "0", "0", "--config", "sdfield.ron",
        ])
        .unwrap();
        match cli.command {
            Command::Query {
                config, full_grid, ..
            } => {
                assert_eq!(config, Some(PathBuf::from("sdfield.ron")));
                assert!(!full_grid);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
