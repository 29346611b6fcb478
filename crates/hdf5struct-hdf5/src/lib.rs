//! Accessors over HDF5 group/dataset trees.
//!
//! Three views are provided:
//! - [`Hdf5Structure`] lists and reads top level entries and can write new datasets.
//! - [`Hdf5Groups`] is a read-only view of the groups below the root or below a sub-path.
//! - [`FixedPathGroups`] is a [`Hdf5Groups`] at a fixed sub-path that also reads one named field
//!   when it is opened, e.g. the `noisyParameters` output of the PREP pipeline.
//!
//! Entries are either returned lazily as a [`LazyEntry`] borrowing the open file, or forced into
//! an owned [`Node`](hdf5struct_node::prelude::Node).
use derive_more::Display;

pub(crate) mod dataset;
mod decode;
pub(crate) mod entries;
pub mod error;
pub(crate) mod file;
pub(crate) mod groups;
pub(crate) mod lazy;
pub(crate) mod write;

pub use {
    dataset::{DatasetInfo, LazyDataset},
    entries::Hdf5Structure,
    error::{Error, Result},
    file::{MIN_LIBRARY_VERSION, OpenMode, ensure_library},
    groups::{FixedPathGroups, Hdf5Groups},
    lazy::{LazyEntry, LazyGroup},
};

/// Whether an entry is an interior node or a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EntryKind {
    #[display("group")]
    Group,
    #[display("dataset")]
    Dataset,
}

// File extensions we recognize as hdf5 files. MATLAB saves HDF5 based `.mat` files since v7.3
const POSSIBLE_HDF5_EXTENSIONS_CASE_INSENSITIVE: [&str; 4] = ["h5", "hdf5", "hdf", "mat"];

pub fn path_has_hdf5_extension(path: &std::path::Path) -> bool {
    let Some(extension) = path.extension() else {
        return false;
    };

    POSSIBLE_HDF5_EXTENSIONS_CASE_INSENSITIVE
        .iter()
        .any(|possible_extension| extension.eq_ignore_ascii_case(possible_extension))
}
