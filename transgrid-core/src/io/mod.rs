//! Persisting the travel time matrix

mod atomic;
pub mod meta;
pub mod npy;

pub use meta::{MatrixMeta, write_matrix_meta};
pub use npy::{read_matrix, read_matrix_size, write_matrix};
