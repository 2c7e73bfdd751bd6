// SPDX-License-Identifier: Apache-2.0

//! Finding the trash directory that governs a path.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Component, Path, PathBuf};

use log::trace;

use crate::env::Environment;
use crate::error::{Error, ErrorKind, Result};
use crate::store::Store;

/// The name of the directory holding trashed items.
const FILES_DIR: &str = "files";

/// The name of the directory holding `.trashinfo` records.
const INFO_DIR: &str = "info";

/// The name of the directory size cache file.
const SIZES_FILE: &str = "directorysizes";

/// The extension of trash info records.
pub const INFO_EXTENSION: &str = ".trashinfo";

/// The name of a shared trash directory at the root of a device.
const SHARED_TRASH: &str = ".Trash";

/// Struct representing a trash directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrashLocation {
    /// The root of the trash directory.
    root: PathBuf,
}

impl TrashLocation {
    /// Create a new [`TrashLocation`] rooted at `root`. Nothing is created on disk.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Get the root of the trash directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the directory holding trashed items.
    pub fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }

    /// Get the directory holding `.trashinfo` records.
    pub fn info_dir(&self) -> PathBuf {
        self.root.join(INFO_DIR)
    }

    /// Get the path of the directory size cache.
    pub fn sizes_file(&self) -> PathBuf {
        self.root.join(SIZES_FILE)
    }

    /// Check that `name` can only refer to an entry directly inside this trash, that is it's a
    /// single normal path component.
    ///
    /// # Errors
    ///
    /// If `name` is empty, absolute, `.`, `..`, or has more than one component
    /// ([`io::ErrorKind::InvalidInput`]).
    pub fn check_name(name: &OsStr) -> Result<()> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(single)), None) if single == name => Ok(()),
            _ => Err(Error::new(name, io::ErrorKind::InvalidInput.into())
                .with_tip("not the name of an item in the trash")),
        }
    }

    /// Get the path of the trashed item called `name`.
    pub fn file_path(&self, name: &OsStr) -> PathBuf {
        self.files_dir().join(name)
    }

    /// Get the path of the `.trashinfo` record for the trashed item called `name`.
    pub fn info_path(&self, name: &OsStr) -> PathBuf {
        let mut file_name = name.to_owned();
        file_name.push(INFO_EXTENSION);
        self.info_dir().join(file_name)
    }
}

/// Resolve the trash directory that must hold `path` if it's recycled, creating it if necessary.
///
/// # Errors
///
/// If a shared device trash directory is a symbolic link ([`ErrorKind::Security`]) or a trash
/// directory can't be created ([`ErrorKind::Location`]).
pub fn resolve<S: Store>(store: &S, env: &Environment, path: &Path) -> Result<TrashLocation> {
    match device_root(store, env, path)? {
        Some(root) => device_trash(store, &root, env.uid()),
        None => home_trash(store, env),
    }
}

/// Resolve the home trash directory, creating it if necessary.
///
/// # Errors
///
/// If the data directory is unknown or the trash directory can't be created.
pub fn home_trash<S: Store>(store: &S, env: &Environment) -> Result<TrashLocation> {
    let root = env.home_trash()?;
    trace!("using home trash at {}", root.display());
    prepare(store, TrashLocation::new(root))
}

/// Resolve the trash directory of the user `uid` on the device rooted at `device_root`, creating
/// it if necessary.
///
/// A shared `.Trash` directory is used, through a per-user `.Trash/<uid>` subdirectory, if it
/// exists. Otherwise a private `.Trash-<uid>` directory is used.
///
/// # Errors
///
/// If `.Trash` is a symbolic link ([`ErrorKind::Security`]) or a trash directory can't be created
/// ([`ErrorKind::Location`]).
pub fn device_trash<S: Store>(store: &S, device_root: &Path, uid: u32) -> Result<TrashLocation> {
    let shared = device_root.join(SHARED_TRASH);
    if store.is_symlink(&shared) {
        return Err(Error::new(shared, ErrorKind::Security));
    }

    if store.is_dir(&shared) {
        let root = shared.join(uid.to_string());
        trace!("using shared device trash at {}", root.display());
        return prepare(store, TrashLocation::new(root));
    }

    let mut private = OsString::from(SHARED_TRASH);
    private.push(format!("-{uid}"));
    let root = device_root.join(private);
    trace!("using private device trash at {}", root.display());
    prepare(store, TrashLocation::new(root))
}

/// Find the root of the device `path` resides on, if that isn't the device of the user's data
/// directory.
///
/// For a path that doesn't exist (yet), its nearest existing ancestor is used instead. Returns
/// `None` whenever the devices can't be compared.
///
/// # Errors
///
/// If the device of an existing path can't be determined.
pub fn device_root<S: Store>(
    store: &S,
    env: &Environment,
    path: &Path,
) -> Result<Option<PathBuf>> {
    let data_home = env.data_home()?;
    let (Some(existing), Some(home)) =
        (nearest_existing(store, path), nearest_existing(store, &data_home))
    else {
        return Ok(None);
    };

    let device = store.device(existing)?;
    if device == store.device(home)? {
        return Ok(None);
    }

    let mut root = existing;
    while let Some(parent) = root.parent() {
        if parent.as_os_str().is_empty() || store.device(parent)? != device {
            break;
        }

        root = parent;
    }

    trace!("{} is on the device rooted at {}", path.display(), root.display());
    Ok(Some(root.to_owned()))
}

/// Get the nearest ancestor of `path`, including `path` itself, that exists.
fn nearest_existing<'a, S: Store>(store: &S, path: &'a Path) -> Option<&'a Path> {
    path.ancestors().find(|ancestor| !ancestor.as_os_str().is_empty() && store.exists(ancestor))
}

/// Make sure `location` and its `files/` and `info/` directories exist.
fn prepare<S: Store>(store: &S, location: TrashLocation) -> Result<TrashLocation> {
    store.create_dir_all(&location.files_dir()).map_err(Error::into_location)?;
    store.create_dir_all(&location.info_dir()).map_err(Error::into_location)?;
    Ok(location)
}
