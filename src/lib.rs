//! Command line front end: reads the station and route files, builds the
//! network and writes the cell-to-cell travel time matrix.

pub mod cli;
pub mod config;
mod progress;
mod signal;
mod trace;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use transgrid_core::prelude::*;

pub use cli::Args;
pub use config::{load_config, resolve_config};
pub use progress::ProgressLog;
pub use trace::initialize_tracer;

/// Runs the whole pipeline, stopping early on Ctrl-C
pub fn run(args: &Args) -> Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    signal::cancel_on_ctrl_c(Arc::clone(&cancel))?;
    run_with_cancel(args, cancel)
}

/// Runs the whole pipeline, stopping before the next source cell once
/// `cancel` is set. Nothing is written for a cancelled run.
pub fn run_with_cancel(args: &Args, cancel: Arc<AtomicBool>) -> Result<()> {
    let started = Instant::now();
    let config = resolve_config(args)?;

    let stations = load_stations(&args.stations)
        .with_context(|| format!("Failed to load stations from '{}'", args.stations.display()))?;
    let routes = load_routes(&args.routes)
        .with_context(|| format!("Failed to load routes from '{}'", args.routes.display()))?;

    let graph = build_graph(&config, &stations, &routes).context("Failed to build the network")?;

    let progress = ProgressLog::new();
    let matrix = ShortestPathEngine::new(&graph)
        .with_threads(config.threads)
        .with_cancellation(cancel)
        .with_progress(|done, total| {
            progress.update(done, total);
        })
        .compute()
        .context("Travel time computation did not finish")?;

    write_matrix(&args.output, &matrix)
        .with_context(|| format!("Failed to write matrix to '{}'", args.output.display()))?;
    info!("Saved {0}x{0} matrix to {1}", matrix.size(), args.output.display());

    if !args.no_meta {
        let meta_path = meta_path(&args.output);
        let meta = MatrixMeta::from_grid(graph.grid()).context("Failed to describe the grid")?;
        write_matrix_meta(&meta_path, &meta)
            .with_context(|| format!("Failed to write metadata to '{}'", meta_path.display()))?;
        info!("Saved grid description to {}", meta_path.display());
    }

    info!("Finished in {:.1?}", started.elapsed());
    Ok(())
}

/// `<output>.meta.json`, next to the matrix
pub fn meta_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".meta.json");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_path_keeps_matrix_name() {
        assert_eq!(
            meta_path(Path::new("out/distance_matrix.npy")),
            PathBuf::from("out/distance_matrix.npy.meta.json")
        );
    }
}
