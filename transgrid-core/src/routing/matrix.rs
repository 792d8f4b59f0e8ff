//! All-pairs cell travel times

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::{debug, info};
use rayon::prelude::*;

use super::dijkstra::{SearchSpace, cell_distances_into};
use crate::{Error, Minutes, TransitGraph};

/// Square, row-major matrix of travel times between cells.
///
/// Entry `[source][target]` is in minutes, with `f64::INFINITY` for targets
/// that cannot be reached.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    data: Vec<Minutes>,
}

impl DistanceMatrix {
    /// Wraps row-major data of a `size × size` matrix
    ///
    /// # Errors
    ///
    /// Returns [`Error::MatrixFormat`] if the data length does not match
    pub fn from_vec(size: usize, data: Vec<Minutes>) -> Result<Self, Error> {
        let expected = size
            .checked_mul(size)
            .ok_or_else(|| Error::MatrixFormat(format!("matrix size {size} overflows")))?;
        if data.len() != expected {
            return Err(Error::MatrixFormat(format!(
                "expected {expected} values for a {size}x{size} matrix, got {}",
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    /// Number of rows, equal to the number of columns
    pub fn size(&self) -> usize {
        self.size
    }

    /// # Panics
    ///
    /// If either index is out of range
    pub fn get(&self, source: usize, target: usize) -> Minutes {
        assert!(target < self.size, "target {target} out of range");
        self.data[source * self.size + target]
    }

    pub fn row(&self, source: usize) -> &[Minutes] {
        &self.data[source * self.size..(source + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Minutes]> {
        self.data.chunks_exact(self.size.max(1))
    }

    pub fn as_slice(&self) -> &[Minutes] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<Minutes> {
        self.data
    }
}

/// Zero-filled matrix storage, failing instead of aborting when memory is short
fn allocate_matrix(len: usize) -> Result<Vec<Minutes>, Error> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|e| {
        Error::InvalidConfig(format!("cannot allocate a matrix of {len} values: {e}"))
    })?;
    data.resize(len, 0.0);
    Ok(data)
}

type ProgressFn<'a> = dyn Fn(usize, usize) + Send + Sync + 'a;

/// Runs one shortest-path search per cell and collects the cell-to-cell
/// distances.
///
/// Searches run in parallel on rayon, each filling its own matrix row.
pub struct ShortestPathEngine<'a> {
    graph: &'a TransitGraph,
    progress: Option<Box<ProgressFn<'a>>>,
    cancel: Option<Arc<AtomicBool>>,
    threads: Option<usize>,
}

impl<'a> ShortestPathEngine<'a> {
    pub fn new(graph: &'a TransitGraph) -> Self {
        Self {
            graph,
            progress: None,
            cancel: None,
            threads: None,
        }
    }

    /// Called with `(completed, total)` after each finished source cell,
    /// possibly from several threads at once
    #[must_use]
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'a,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Stops the computation before the next source once the flag is set
    #[must_use]
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Uses a dedicated pool of `threads` workers instead of the global one
    #[must_use]
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads.filter(|&n| n > 0);
        self
    }

    /// Computes the full matrix
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if cancellation was requested, and
    /// [`Error::InvalidConfig`] if the matrix would not fit in memory
    pub fn compute(&self) -> Result<DistanceMatrix, Error> {
        let size = self.graph.cell_count();
        let len = size.checked_mul(size).ok_or_else(|| {
            Error::InvalidConfig(format!("{size} cells give a matrix too large to hold"))
        })?;

        info!(
            "Computing travel times from {size} cells over {} nodes and {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );

        let mut data = allocate_matrix(len)?;
        match self.threads {
            Some(threads) => {
                debug!("Using a dedicated pool of {threads} threads");
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                pool.install(|| self.fill_rows(&mut data, size))?;
            }
            None => self.fill_rows(&mut data, size)?,
        }

        info!("Travel time matrix complete");
        DistanceMatrix::from_vec(size, data)
    }

    fn fill_rows(&self, data: &mut [Minutes], size: usize) -> Result<(), Error> {
        let node_count = self.graph.node_count();
        let completed = AtomicUsize::new(0);

        data.par_chunks_mut(size).enumerate().try_for_each_init(
            || SearchSpace::new(node_count),
            |space, (source, row)| {
                if self.is_cancelled() {
                    return Err(Error::Cancelled);
                }

                cell_distances_into(self.graph, source, space, row);

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(progress) = &self.progress {
                    progress(done, size);
                }
                Ok(())
            },
        )
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
