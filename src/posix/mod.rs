// SPDX-License-Identifier: Apache-2.0

//! The freedesktop.org trash, kept in `files/` and `info/` directories.
//!
//! A [`PosixTrash`] operates on one trash directory, the home trash or the trash of another
//! device, which [`locate::resolve`] picks for a path. Every trashed item `files/<name>` has a
//! `.trashinfo` record `info/<name>.trashinfo` saying where it came from and when it was recycled.
//! The sizes of trashed directories may be cached in a `directorysizes` file, see [`sizes`].

use std::ffi::{OsStr, OsString};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use log::{trace, warn};

use crate::RecycleBin;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::store::Store;

pub mod escape;
pub mod info;
pub mod locate;
pub mod name;
pub mod sizes;

pub use info::TrashInfoRecord;
pub use locate::TrashLocation;
pub use sizes::DirectorySizeEntry;

/// Struct representing an item in the trash.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrashedItem {
    /// The name of the item in the trash.
    name: OsString,

    /// Where the item was recycled from.
    original_path: PathBuf,

    /// When the item was recycled, in local time.
    deletion_date: NaiveDateTime,
}

impl TrashedItem {
    /// Get the name of the item in the trash.
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Get the path the item was recycled from.
    pub fn original_path(&self) -> &Path {
        &self.original_path
    }

    /// Get the (local) time the item was recycled.
    pub fn deletion_date(&self) -> NaiveDateTime {
        self.deletion_date
    }
}

/// Enum representing half of a trashed item whose other half is missing.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Orphan {
    /// An item in `files/` without a `.trashinfo` record.
    Body(OsString),

    /// A `.trashinfo` record in `info/` without an item.
    Record(OsString),
}

/// Struct implementing [`RecycleBin`] on a freedesktop.org trash directory.
#[derive(Debug)]
pub struct PosixTrash<S: Store> {
    /// The file system the trash lives on.
    store: S,

    /// The trash directory operated on.
    location: TrashLocation,
}

impl<S: Store> PosixTrash<S> {
    /// Create a new [`PosixTrash`] for an already resolved `location`.
    pub fn new(store: S, location: TrashLocation) -> Self {
        Self { store, location }
    }

    /// Create a new [`PosixTrash`] for the user's home trash, creating it if necessary.
    ///
    /// # Errors
    ///
    /// If the home trash can't be found or created.
    pub fn home(store: S, env: &Environment) -> Result<Self> {
        let location = locate::home_trash(&store, env)?;
        Ok(Self::new(store, location))
    }

    /// Create a new [`PosixTrash`] for the trash that must hold `path`, creating it if necessary.
    ///
    /// # Errors
    ///
    /// If the trash can't be found or created, or is unsafe to use.
    pub fn for_location(store: S, env: &Environment, path: &Path) -> Result<Self> {
        let location = locate::resolve(&store, env, path)?;
        Ok(Self::new(store, location))
    }

    /// Get the trash directory this [`PosixTrash`] operates on.
    pub fn location(&self) -> &TrashLocation {
        &self.location
    }

    /// Move the entry at `path` into the trash, recording `deleted` as the time of deletion.
    ///
    /// # Errors
    ///
    /// If `path` has no file name, can't be moved into the trash, or can't be recorded. In the
    /// last case the entry stays in the trash without a record, see [`PosixTrash::orphans`].
    pub fn recycle_at(&self, path: &Path, deleted: NaiveDateTime) -> Result<OsString> {
        let original = std::path::absolute(path).map_err(|err| Error::io(path, &err))?;
        let Some(candidate) = original.file_name() else {
            return Err(Error::new(path, io::ErrorKind::InvalidInput.into())
                .with_tip("cannot recycle a path without a file name"));
        };

        self.store.create_dir_all(&self.location.files_dir()).map_err(Error::into_location)?;
        let name = name::uniquify(&self.store, &self.location, candidate);

        self.store.rename(&original, &self.location.file_path(&name))?;
        if let Err(err) = info::write(&self.store, &self.location, &name, &original, deleted) {
            warn!(
                "{} was moved to the trash as {} but could not be recorded",
                original.display(),
                name.display()
            );
            return Err(err);
        }

        trace!("recycled {} as {}", original.display(), name.display());
        Ok(name)
    }

    /// Read the `.trashinfo` record of the trashed item called `name`.
    ///
    /// # Errors
    ///
    /// If the record can't be read or is malformed.
    pub fn info(&self, name: &OsStr) -> Result<TrashInfoRecord> {
        TrashLocation::check_name(name)?;
        info::read(&self.store, &self.location, name)
    }

    /// List every item in the trash that has a record, sorted by name.
    ///
    /// # Errors
    ///
    /// If the trash can't be read or a record is malformed.
    pub fn list(&self) -> Result<Vec<TrashedItem>> {
        let mut items = vec![];
        for name in self.record_names()? {
            let record = self.info(&name)?;
            items.push(TrashedItem {
                original_path: record.path().to_owned(),
                deletion_date: record.deletion_date(),
                name,
            });
        }

        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    /// Find every item without a record and every record without an item.
    ///
    /// # Errors
    ///
    /// If the trash can't be read.
    pub fn orphans(&self) -> Result<Vec<Orphan>> {
        let bodies = self.store.read_dir(&self.location.files_dir())?;
        let records = self.record_names()?;

        let lone_bodies = bodies.iter().filter(|body| !records.contains(body)).cloned();
        let lone_records = records.iter().filter(|record| !bodies.contains(record)).cloned();

        let mut orphans: Vec<Orphan> =
            lone_bodies.map(Orphan::Body).chain(lone_records.map(Orphan::Record)).collect();

        orphans.sort();
        Ok(orphans)
    }

    /// Erase the half of a trashed item that's left over, as found by [`PosixTrash::orphans`].
    ///
    /// # Errors
    ///
    /// If the leftover can't be removed.
    pub fn repair(&self, orphan: &Orphan) -> Result<()> {
        match orphan {
            Orphan::Body(name) => {
                TrashLocation::check_name(name)?;
                self.store.remove_all(&self.location.file_path(name))
            },
            Orphan::Record(name) => {
                TrashLocation::check_name(name)?;
                self.store.remove_file(&self.location.info_path(name))
            },
        }
    }

    /// Record the size of the trashed item called `name` in the `directorysizes` cache, if it's a
    /// directory and not a symbolic link, replacing any entry for the same original path.
    ///
    /// # Errors
    ///
    /// If the item's record can't be read, its size can't be computed, or the cache can't be
    /// updated.
    pub fn track_directory(&self, name: &OsStr) -> Result<Option<DirectorySizeEntry>> {
        TrashLocation::check_name(name)?;
        let body = self.location.file_path(name);
        if !self.store.is_dir(&body) || self.store.is_symlink(&body) {
            return Ok(None);
        }

        let record = self.info(name)?;
        let entry = sizes::record_directory(&self.store, &self.location, name, &record)?;

        let mut entries = sizes::load(&self.store, &self.location)?;
        entries.retain(|existing| existing.path() != entry.path());
        entries.push(entry.clone());
        sizes::update(&self.store, &self.location, &entries)?;

        Ok(Some(entry))
    }

    /// Drop the entry for `original_path` from the `directorysizes` cache.
    ///
    /// Returns `true` if there was an entry to drop.
    ///
    /// # Errors
    ///
    /// If the cache can't be read or updated.
    pub fn untrack(&self, original_path: &Path) -> Result<bool> {
        let mut entries = sizes::load(&self.store, &self.location)?;
        let count = entries.len();
        entries.retain(|entry| entry.path() != original_path);
        if entries.len() == count {
            return Ok(false);
        }

        sizes::update(&self.store, &self.location, &entries)?;
        Ok(true)
    }

    /// Get the entries of the `directorysizes` cache.
    ///
    /// # Errors
    ///
    /// If the cache can't be read.
    pub fn directory_sizes(&self) -> Result<Vec<DirectorySizeEntry>> {
        sizes::load(&self.store, &self.location)
    }

    /// Remove the `directorysizes` cache.
    ///
    /// # Errors
    ///
    /// If the cache exists but can't be removed.
    pub fn clear_directory_sizes(&self) -> Result<()> {
        let path = self.location.sizes_file();
        if self.store.exists(&path) {
            self.store.remove_file(&path)?;
        }

        Ok(())
    }

    /// Get the names of the items that have a record in `info/`.
    fn record_names(&self) -> Result<Vec<OsString>> {
        let names = self.store.read_dir(&self.location.info_dir())?;
        Ok(names
            .iter()
            .filter_map(|name| name.as_bytes().strip_suffix(locate::INFO_EXTENSION.as_bytes()))
            .map(|name| OsStr::from_bytes(name).to_owned())
            .collect())
    }
}

impl<S: Store> RecycleBin for PosixTrash<S> {
    fn recycle(&self, path: &Path) -> Result<OsString> {
        self.recycle_at(path, Local::now().naive_local())
    }

    fn restore(&self, name: &OsStr) -> Result<()> {
        let record = self.info(name)?;
        let original = record.path();
        if self.store.exists(original) {
            return Err(Error::new(original, io::ErrorKind::AlreadyExists.into())
                .with_tip(&format!("restoring {}", name.display())));
        }

        self.store.rename(&self.location.file_path(name), original)?;
        self.store.remove_file(&self.location.info_path(name))?;

        trace!("restored {} to {}", name.display(), original.display());
        Ok(())
    }

    fn remove(&self, name: &OsStr) -> Result<()> {
        TrashLocation::check_name(name)?;
        self.store.remove_all(&self.location.file_path(name))?;
        self.store.remove_file(&self.location.info_path(name))?;

        trace!("removed {} for good", name.display());
        Ok(())
    }

    fn empty(&self) -> Result<()> {
        for dir in [self.location.files_dir(), self.location.info_dir()] {
            if self.store.exists(&dir) {
                self.store.remove_all(&dir)?;
            }

            self.store.create_dir_all(&dir)?;
        }

        trace!("emptied {}", self.location.root().display());
        Ok(())
    }
}
