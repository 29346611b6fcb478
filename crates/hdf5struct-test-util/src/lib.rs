//! Scratch HDF5 files for tests.
//!
//! Each fixture is written to its own temporary directory which is removed when the [`Fixture`]
//! is dropped.
pub mod fixtures;

pub use {
    fixtures::{Fixture, eeg::*, empty::*, noisy_parameters::*},
    std::path::{Path, PathBuf},
    testresult::TestResult,
};
