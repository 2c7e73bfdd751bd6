// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::bare_urls)]

//! Move files to the trash instead of deleting them, restore them later, or erase them for good.
//!
//! On freedesktop-style systems the trash is implemented by [`posix::PosixTrash`], which keeps
//! trashed items in a `files/` directory next to an `info/` directory of `.trashinfo` records, and
//! maintains a `directorysizes` cache for trashed directories. Everywhere else the operating
//! system's own trash can is used through [`native::NativeShellTrash`].
//!
//! Both implement [`RecycleBin`]; use [`system_trash`] to get the right one for this platform.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use recyclebin::RecycleBin;
//!
//! let path = Path::new("/home/user/report.txt");
//! let bin = recyclebin::system_trash(path)?;
//! let name = bin.recycle(path)?;
//! bin.restore(&name)?;
//! # Ok::<(), recyclebin::Error>(())
//! ```

use std::ffi::{OsStr, OsString};
use std::path::Path;

pub mod env;
pub mod error;
#[cfg(feature = "native")]
pub mod native;
#[cfg(unix)]
pub mod posix;
pub mod store;

pub use env::Environment;
pub use error::{Error, ErrorKind, Result};
pub use store::{MemoryStore, OsStore, Store};

/// The operations every trash implementation provides.
pub trait RecycleBin {
    /// Move the entry at `path` into the trash.
    ///
    /// Returns the name under which the entry is kept in the trash, which is what [`restore`] and
    /// [`remove`] expect.
    ///
    /// [`restore`]: RecycleBin::restore
    /// [`remove`]: RecycleBin::remove
    ///
    /// # Errors
    ///
    /// If no trash directory can be used for `path` or the entry can't be moved.
    fn recycle(&self, path: &Path) -> Result<OsString>;

    /// Move the trashed entry called `name` back to where it was recycled from.
    ///
    /// # Errors
    ///
    /// If the entry is unknown, its metadata is unreadable, or its original location is taken.
    fn restore(&self, name: &OsStr) -> Result<()>;

    /// Permanently erase the trashed entry called `name`.
    ///
    /// # Errors
    ///
    /// If the entry or its metadata can't be removed.
    fn remove(&self, name: &OsStr) -> Result<()>;

    /// Permanently erase everything in the trash.
    ///
    /// # Errors
    ///
    /// If the trash can't be cleared.
    fn empty(&self) -> Result<()>;
}

/// Get the trash that governs `path` on this platform.
///
/// # Errors
///
/// If no trash directory can be found or created for `path`.
#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
pub fn system_trash(path: &Path) -> Result<Box<dyn RecycleBin>> {
    let env = Environment::from_process();
    let bin = posix::PosixTrash::for_location(OsStore, &env, path)?;
    Ok(Box::new(bin))
}

/// Get the trash that governs `path` on this platform.
///
/// # Errors
///
/// This function never returns an error on this platform.
#[cfg(all(
    feature = "native",
    not(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))
))]
#[allow(clippy::unnecessary_wraps)]
pub fn system_trash(_path: &Path) -> Result<Box<dyn RecycleBin>> {
    Ok(Box::new(native::NativeShellTrash))
}

/// Get the trash that governs `path` on this platform.
///
/// # Errors
///
/// Always, this build has no trash implementation for this platform.
#[cfg(all(
    not(feature = "native"),
    not(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))
))]
pub fn system_trash(path: &Path) -> Result<Box<dyn RecycleBin>> {
    Err(Error::new(path, ErrorKind::Unsupported))
}
