// SPDX-License-Identifier: Apache-2.0

//! The `directorysizes` cache of the sizes of trashed directories.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::error::{ErrorKind, Result};
use crate::store::Store;

use super::escape::{escape, unescape};
use super::info::TrashInfoRecord;
use super::locate::TrashLocation;

/// The suffix of the temporary file an update is written to.
const TEMPORARY_SUFFIX: &str = ".tmp";

/// Struct representing one line of the `directorysizes` cache.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirectorySizeEntry {
    /// The total size, in bytes, of the files in the directory.
    size: u64,

    /// The modification time of the directory's `.trashinfo` record.
    mtime: i64,

    /// Where the directory was recycled from.
    path: PathBuf,
}

impl DirectorySizeEntry {
    /// Create a new [`DirectorySizeEntry`].
    pub fn new<P: Into<PathBuf>>(size: u64, mtime: i64, path: P) -> Self {
        Self { size, mtime, path: path.into() }
    }

    /// Get the total size, in bytes, of the files in the directory.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Get the modification time of the directory's `.trashinfo` record in seconds since the Unix
    /// epoch.
    pub fn mtime(&self) -> i64 {
        self.mtime
    }

    /// Get the path the directory was recycled from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Compute the cache entry for the trashed directory called `name` in `location`.
///
/// The size is that of the trashed copy, the entry is keyed by the path in `record`.
///
/// # Errors
///
/// If the trashed directory can't be walked.
pub fn record_directory<S: Store>(
    store: &S,
    location: &TrashLocation,
    name: &OsStr,
    record: &TrashInfoRecord,
) -> Result<DirectorySizeEntry> {
    let size = store.tree_size(&location.file_path(name))?;
    Ok(DirectorySizeEntry::new(size, record.info_modified(), record.path()))
}

/// Load the entries of the cache in `location`.
///
/// A missing cache is empty. Parsing stops at the first line that isn't a valid entry.
///
/// # Errors
///
/// If the cache exists but can't be read.
pub fn load<S: Store>(store: &S, location: &TrashLocation) -> Result<Vec<DirectorySizeEntry>> {
    let path = location.sizes_file();
    let contents = match store.read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::Io(std::io::ErrorKind::NotFound) => {
            return Ok(vec![]);
        },
        Err(err) => return Err(err),
    };

    let mut entries = vec![];
    for (index, line) in contents.lines().enumerate() {
        let Some(entry) = parse_line(line) else {
            debug!("ignoring {} from line {}", path.display(), index + 1);
            break;
        };

        entries.push(entry);
    }

    Ok(entries)
}

/// Replace the cache in `location` by `entries`.
///
/// The entries are written to a temporary file first, which is then moved over the cache. If this
/// fails at any point the previous cache is left intact.
///
/// # Errors
///
/// If the temporary file can't be written or moved.
pub fn update<S: Store>(
    store: &S,
    location: &TrashLocation,
    entries: &[DirectorySizeEntry],
) -> Result<()> {
    let path = location.sizes_file();
    let mut temporary = OsString::from(path.as_os_str());
    temporary.push(TEMPORARY_SUFFIX);
    let temporary = PathBuf::from(temporary);

    if store.exists(&temporary) {
        trace!("removing stale {}", temporary.display());
        store.remove_file(&temporary)?;
    }

    let contents: String = entries
        .iter()
        .map(|entry| format!("{} {} {}\n", entry.size, entry.mtime, escape(&entry.path)))
        .collect();

    store.write_new(&temporary, contents.as_bytes())?;
    store.rename(&temporary, &path)
}

/// Parse one `<size> <mtime> <escaped path>` line.
fn parse_line(line: &str) -> Option<DirectorySizeEntry> {
    let mut fields = line.splitn(3, ' ');
    let size = fields.next()?.parse().ok()?;
    let mtime = fields.next()?.parse().ok()?;
    let path = unescape(fields.next()?)?;
    Some(DirectorySizeEntry { size, mtime, path })
}


/// Tests for the [`load`] function.
#[cfg(test)]
mod test_load {
    use crate::store::MemoryStore;

    use super::{DirectorySizeEntry, TrashLocation, load};

    #[test]
    fn missing_cache() -> crate::Result<()> {
        let store = MemoryStore::new();

        assert!(load(&store, &TrashLocation::new("/trash"))?.is_empty());

        Ok(())
    }

    #[test]
    fn entries() -> crate::Result<()> {
        let store = MemoryStore::new();
        store.add_file("/trash/directorysizes", b"100 10 /a\n4096 1700000000 /home/my%20dir\n")?;

        let entries = load(&store, &TrashLocation::new("/trash"))?;

        assert_eq!(
            entries,
            vec![
                DirectorySizeEntry::new(100, 10, "/a"),
                DirectorySizeEntry::new(4096, 1_700_000_000, "/home/my dir"),
            ]
        );

        Ok(())
    }

    #[test]
    fn stops_at_bad_escape() -> crate::Result<()> {
        let store = MemoryStore::new();
        store.add_file("/trash/directorysizes", b"100 10 /a\n1 2 /b%zz\n3 4 /c\n")?;

        let entries = load(&store, &TrashLocation::new("/trash"))?;
        assert_eq!(entries, vec![DirectorySizeEntry::new(100, 10, "/a")]);

        Ok(())
    }

    #[test]
    fn stops_at_bad_fields() -> crate::Result<()> {
        for contents in ["100 10 /a\nx 2 /b\n", "100 10 /a\n1 y /b\n", "100 10 /a\n1 2\n"] {
            let store = MemoryStore::new();
            store.add_file("/trash/directorysizes", contents.as_bytes())?;

            let entries = load(&store, &TrashLocation::new("/trash"))?;
            assert_eq!(entries, vec![DirectorySizeEntry::new(100, 10, "/a")], "{contents:?}");
        }

        Ok(())
    }
}
