//! Core data types and I/O operations.

pub mod loaders;

pub use loaders::{Dataset, LoaderError, Reading};
