use std::path::Path;

use derive_more::Display;

use crate::error::{Error, Result};

/// Oldest HDF5 release providing the link and group info API the accessors rely on
pub const MIN_LIBRARY_VERSION: (u8, u8, u8) = (1, 8, 0);

/// How an accessor opens its file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum OpenMode {
    #[display("read-only")]
    ReadOnly,
    /// Open an existing file for reading and writing
    #[default]
    #[display("read/write")]
    ReadWrite,
    /// Create a new file, truncating any existing one
    #[display("create")]
    Create,
}

/// Check that a usable HDF5 library is linked.
///
/// # Errors
///
/// [`Error::LibraryUnavailable`] if the library is older than [`MIN_LIBRARY_VERSION`].
pub fn ensure_library() -> Result<()> {
    check_version(hdf5::library_version())
}

fn check_version(found: (u8, u8, u8)) -> Result<()> {
    if found < MIN_LIBRARY_VERSION {
        let fmt = |(major, minor, micro): (u8, u8, u8)| format!("{major}.{minor}.{micro}");
        return Err(Error::LibraryUnavailable {
            found: fmt(found),
            required: fmt(MIN_LIBRARY_VERSION),
        });
    }
    Ok(())
}

pub(crate) fn open_file(path: &Path, mode: OpenMode) -> Result<hdf5::File> {
    ensure_library()?;
    let file = match mode {
        OpenMode::ReadOnly => hdf5::File::open(path),
        OpenMode::ReadWrite => hdf5::File::open_rw(path),
        OpenMode::Create => hdf5::File::create(path),
    }
    .map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Opened {} ({mode})", path.display());
    Ok(file)
}

pub(crate) fn close_file(path: &Path, file: hdf5::File) -> Result<()> {
    file.close().map_err(|source| Error::Close {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Closed {}", path.display());
    Ok(())
}
