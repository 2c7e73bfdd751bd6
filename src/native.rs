// SPDX-License-Identifier: Apache-2.0

//! The operating system's own trash can, through the `trash` crate.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;

use log::trace;

use crate::RecycleBin;
use crate::error::{Error, Result};

/// The path reported by errors that concern the trash as a whole.
const TRASH: &str = "trash";

/// Struct implementing [`RecycleBin`] by delegating to the operating system.
///
/// Restoring, removing, and emptying need the platform to expose the contents of its trash,
/// elsewhere they fail with [`crate::ErrorKind::Unsupported`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeShellTrash;

impl RecycleBin for NativeShellTrash {
    fn recycle(&self, path: &Path) -> Result<OsString> {
        let Some(name) = path.file_name() else {
            return Err(Error::new(path, io::ErrorKind::InvalidInput.into())
                .with_tip("cannot recycle a path without a file name"));
        };

        trace!("recycle {} through the operating system", path.display());
        trash::delete(path).map_err(|err| Error::new(path, err.into()))?;
        Ok(name.to_owned())
    }

    #[cfg(any(
        target_os = "windows",
        all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))
    ))]
    fn restore(&self, name: &OsStr) -> Result<()> {
        let item = latest(name)?;
        trace!("restore {} through the operating system", name.display());
        trash::os_limited::restore_all(vec![item]).map_err(|err| Error::new(name, err.into()))
    }

    #[cfg(not(any(
        target_os = "windows",
        all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))
    )))]
    fn restore(&self, name: &OsStr) -> Result<()> {
        Err(Error::new(name, crate::ErrorKind::Unsupported))
    }

    #[cfg(any(
        target_os = "windows",
        all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))
    ))]
    fn remove(&self, name: &OsStr) -> Result<()> {
        let item = latest(name)?;
        trace!("remove {} through the operating system", name.display());
        trash::os_limited::purge_all(vec![item]).map_err(|err| Error::new(name, err.into()))
    }

    #[cfg(not(any(
        target_os = "windows",
        all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))
    )))]
    fn remove(&self, name: &OsStr) -> Result<()> {
        Err(Error::new(name, crate::ErrorKind::Unsupported))
    }

    #[cfg(any(
        target_os = "windows",
        all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))
    ))]
    fn empty(&self) -> Result<()> {
        let items = trash::os_limited::list().map_err(|err| Error::new(TRASH, err.into()))?;
        trace!("purge {} item(s) through the operating system", items.len());
        trash::os_limited::purge_all(items).map_err(|err| Error::new(TRASH, err.into()))
    }

    #[cfg(not(any(
        target_os = "windows",
        all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))
    )))]
    fn empty(&self) -> Result<()> {
        Err(Error::new(TRASH, crate::ErrorKind::Unsupported))
    }
}

/// Find the most recently trashed item called `name`.
#[cfg(any(
    target_os = "windows",
    all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))
))]
fn latest(name: &OsStr) -> Result<trash::TrashItem> {
    let items = trash::os_limited::list().map_err(|err| Error::new(name, err.into()))?;
    items
        .into_iter()
        .filter(|item| Path::new(&item.name) == Path::new(name))
        .max_by_key(|item| item.time_deleted)
        .ok_or_else(|| Error::new(name, io::ErrorKind::NotFound.into()))
}

/// Tests for the [`NativeShellTrash`] struct.
#[cfg(test)]
mod test_native_shell_trash {
    use crate::RecycleBin;
    use crate::error::ErrorKind;
    use crate::test_helpers::{TestResult, with_test_dir};

    use super::NativeShellTrash;

    use std::io;
    use std::path::Path;

    use assert_fs::prelude::*;
    use predicates::prelude::*;

    #[test]
    fn recycle_root() {
        let out = NativeShellTrash.recycle(Path::new("/"));
        assert_eq!(out.map_err(|err| err.kind()), Err(ErrorKind::Io(io::ErrorKind::InvalidInput)));
    }

    #[test]
    #[cfg_attr(not(feature = "test-native"), ignore = "Only run with the test-native feature")]
    fn recycle_file() -> TestResult {
        with_test_dir(|test_dir| {
            let file = test_dir.child("recyclebin-native-test-file");
            file.touch()?;

            let name = NativeShellTrash.recycle(file.path())?;

            assert_eq!(name, "recyclebin-native-test-file");
            file.assert(predicate::path::missing());

            Ok(())
        })
    }

    #[test]
    #[cfg(any(
        target_os = "windows",
        all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))
    ))]
    #[cfg_attr(not(feature = "test-native"), ignore = "Only run with the test-native feature")]
    fn recycle_then_restore() -> TestResult {
        with_test_dir(|test_dir| {
            let file = test_dir.child("recyclebin-native-restore-test");
            file.write_str("content")?;

            let name = NativeShellTrash.recycle(file.path())?;
            file.assert(predicate::path::missing());

            NativeShellTrash.restore(&name)?;
            file.assert("content");

            Ok(())
        })
    }
}
