//! Command implementations for mirror-cli

pub mod run;

pub use run::{RunOptions, run_forever, run_once, synchronizer};
