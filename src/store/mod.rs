// SPDX-License-Identifier: Apache-2.0

//! File system access for trash operations.
//!
//! Every component that touches the file system does so through a [`Store`] it is given, so the
//! same logic runs against the real file system ([`OsStore`]) or an in-memory tree
//! ([`MemoryStore`]).
//!
//! [`MemoryStore`] and [`Fault`] are part of the public API so that consumers can test their own
//! code against a [`Store`], including failures part way through an operation.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::trace;

use crate::error::{Error, Result};

mod memory;

pub use memory::{Fault, MemoryStore};

/// The file system primitives used by trash operations.
///
/// Every error names the path it concerns.
pub trait Store {
    /// Returns `true` if anything, including a dangling symbolic link, exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory, following a symbolic link.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns `true` if `path` itself is a symbolic link.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Create the directory at `path`, its parent must exist.
    ///
    /// # Errors
    ///
    /// If the directory can't be created, including when something exists at `path`.
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Create the directory at `path` and any missing parents. Succeeds if it already exists.
    ///
    /// # Errors
    ///
    /// If a directory can't be created or a parent is not a directory.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Move the entry at `from` to `to`.
    ///
    /// # Errors
    ///
    /// If the entry can't be moved.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Remove the file or symbolic link at `path`.
    ///
    /// # Errors
    ///
    /// If nothing is at `path`, it's a directory, or it can't be removed.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Remove the entry at `path`, including everything below it if it's a directory.
    ///
    /// # Errors
    ///
    /// If nothing is at `path` or something can't be removed.
    fn remove_all(&self, path: &Path) -> Result<()>;

    /// Read the entire file at `path` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// If the file can't be read or isn't valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create a new file at `path` holding `contents`.
    ///
    /// # Errors
    ///
    /// If something already exists at `path` or the file can't be written.
    fn write_new(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Get the modification time of `path` in seconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// If `path` can't be inspected.
    fn modified(&self, path: &Path) -> Result<i64>;

    /// Get the id of the device `path` resides on, without following a symbolic link.
    ///
    /// # Errors
    ///
    /// If `path` can't be inspected.
    fn device(&self, path: &Path) -> Result<u64>;

    /// List the names of the entries in the directory at `path`.
    ///
    /// # Errors
    ///
    /// If `path` isn't a readable directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<OsString>>;

    /// Sum the sizes, in bytes, of every non-directory entry at or below `path`.
    ///
    /// # Errors
    ///
    /// If any entry can't be inspected.
    fn tree_size(&self, path: &Path) -> Result<u64>;
}

impl<S: Store + ?Sized> Store for &S {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        (**self).is_symlink(path)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        (**self).create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (**self).create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        (**self).rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        (**self).remove_file(path)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        (**self).remove_all(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        (**self).read_to_string(path)
    }

    fn write_new(&self, path: &Path, contents: &[u8]) -> Result<()> {
        (**self).write_new(path, contents)
    }

    fn modified(&self, path: &Path) -> Result<i64> {
        (**self).modified(path)
    }

    fn device(&self, path: &Path) -> Result<u64> {
        (**self).device(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<OsString>> {
        (**self).read_dir(path)
    }

    fn tree_size(&self, path: &Path) -> Result<u64> {
        (**self).tree_size(path)
    }
}

/// Struct implementing [`Store`] on the real file system.
///
/// Directories are created private to the user (mode `0700`) on Unix.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsStore;

impl OsStore {
    /// Get a [`fs::DirBuilder`] for private directories.
    fn dir_builder(recursive: bool) -> fs::DirBuilder {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(recursive);

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        builder
    }
}

impl Store for OsStore {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.is_symlink()
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        trace!("create directory {}", path.display());
        Self::dir_builder(false).create(path).map_err(|err| Error::io(path, &err))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return Ok(());
        }

        trace!("create directories up to {}", path.display());
        Self::dir_builder(true).create(path).map_err(|err| Error::io(path, &err))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        trace!("move {} to {}", from.display(), to.display());
        fs::rename(from, to).map_err(|err| {
            Error::io(from, &err).with_tip(&format!("moving to {}", to.display()))
        })
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        trace!("remove {}", path.display());
        fs::remove_file(path).map_err(|err| Error::io(path, &err))
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        trace!("remove {} and its contents", path.display());
        let metadata = fs::symlink_metadata(path).map_err(|err| Error::io(path, &err))?;
        let result =
            if metadata.is_dir() { fs::remove_dir_all(path) } else { fs::remove_file(path) };
        result.map_err(|err| Error::io(path, &err))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|err| Error::io(path, &err))
    }

    fn write_new(&self, path: &Path, contents: &[u8]) -> Result<()> {
        trace!("write {}", path.display());
        let write = || -> io::Result<()> {
            let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;
            file.write_all(contents)?;
            file.sync_all()
        };

        write().map_err(|err| Error::io(path, &err))
    }

    fn modified(&self, path: &Path) -> Result<i64> {
        let modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(|err| Error::io(path, &err))?;
        Ok(DateTime::<Utc>::from(modified).timestamp())
    }

    #[cfg(unix)]
    fn device(&self, path: &Path) -> Result<u64> {
        use std::os::unix::fs::MetadataExt;

        let metadata = fs::symlink_metadata(path).map_err(|err| Error::io(path, &err))?;
        Ok(metadata.dev())
    }

    #[cfg(not(unix))]
    fn device(&self, path: &Path) -> Result<u64> {
        fs::symlink_metadata(path).map_err(|err| Error::io(path, &err))?;
        Ok(0)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<OsString>> {
        let entries = fs::read_dir(path).map_err(|err| Error::io(path, &err))?;
        entries
            .map(|entry| entry.map(|entry| entry.file_name()).map_err(|err| Error::io(path, &err)))
            .collect()
    }

    fn tree_size(&self, path: &Path) -> Result<u64> {
        let mut size: u64 = 0;
        for entry in walkdir::WalkDir::new(path).follow_root_links(false) {
            let entry = entry.map_err(|err| walk_error(path, &err))?;
            if entry.file_type().is_dir() {
                continue;
            }

            let metadata = entry.metadata().map_err(|err| walk_error(entry.path(), &err))?;
            size = size.saturating_add(metadata.len());
        }

        Ok(size)
    }
}

/// Convert a [`walkdir::Error`] into an [`Error`], falling back to `path` if the error has none.
fn walk_error(path: &Path, err: &walkdir::Error) -> Error {
    let kind = err.io_error().map_or(io::ErrorKind::Other, io::Error::kind);
    Error::new(err.path().unwrap_or(path), kind.into())
}
