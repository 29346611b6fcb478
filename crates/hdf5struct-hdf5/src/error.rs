use std::path::{Path, PathBuf};

use hdf5struct_node::prelude::DataClass;
use thiserror::Error;

use crate::EntryKind;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors from opening, reading or writing an HDF5 file.
///
/// Every variant raised after a file is open carries the file path and the key that was being
/// accessed. A key that simply doesn't exist is not an error, lookups return `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HDF5 library is unavailable: found version {found}, need at least {required}")]
    LibraryUnavailable { found: String, required: String },
    #[error("Failed opening {}: {source}", path.display())]
    Open { path: PathBuf, source: hdf5::Error },
    #[error("Failed closing {}: {source}", path.display())]
    Close { path: PathBuf, source: hdf5::Error },
    #[error("{}: failed accessing '{key}': {source}", path.display())]
    Access {
        path: PathBuf,
        key: String,
        source: hdf5::Error,
    },
    #[error("{}: no entry named '{key}'", path.display())]
    NotFound { path: PathBuf, key: String },
    #[error("{}: '{key}' is a {found}, expected a {expected}", path.display())]
    WrongKind {
        path: PathBuf,
        key: String,
        expected: EntryKind,
        found: EntryKind,
    },
    #[error("{}: '{key}' is neither a group nor a dataset", path.display())]
    UnsupportedObject { path: PathBuf, key: String },
    #[error("{}: '{key}' holds {class} data, cannot read it as {requested}", path.display())]
    TypeMismatch {
        path: PathBuf,
        key: String,
        class: DataClass,
        requested: DataClass,
    },
    #[error("{}: cannot write {class} data to '{key}'", path.display())]
    UnsupportedValue {
        path: PathBuf,
        key: String,
        class: DataClass,
    },
    #[error("{}: '{key}' is not a valid dataset path", path.display())]
    InvalidPath { path: PathBuf, key: String },
}

impl Error {
    /// The key this error is about, if it concerns a specific entry
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::LibraryUnavailable { .. } | Self::Open { .. } | Self::Close { .. } => None,
            Self::Access { key, .. }
            | Self::NotFound { key, .. }
            | Self::WrongKind { key, .. }
            | Self::UnsupportedObject { key, .. }
            | Self::TypeMismatch { key, .. }
            | Self::UnsupportedValue { key, .. }
            | Self::InvalidPath { key, .. } => Some(key),
        }
    }
}

/// Annotates raw library errors with the file and key they occurred at
pub(crate) trait ResultExt<T> {
    fn at(self, path: &Path, key: &str) -> Result<T>;
}

impl<T> ResultExt<T> for hdf5::Result<T> {
    fn at(self, path: &Path, key: &str) -> Result<T> {
        self.map_err(|source| Error::Access {
            path: path.to_path_buf(),
            key: key.to_owned(),
            source,
        })
    }
}
