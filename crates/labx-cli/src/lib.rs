//! Library side of the `labx` command line.

pub mod batch;
pub mod config;
pub mod logging;
