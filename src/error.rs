// SPDX-License-Identifier: Apache-2.0

//! Errors reported by trash operations.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(test)]
use proptest_derive::Arbitrary;

/// The `Result` type for trash operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Struct representing an error of a trash operation.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(test, derive(Arbitrary))]
pub struct Error {
    /// The kind of error that occurred.
    kind: ErrorKind,

    /// The path for which the error occurred.
    path: OsString,

    /// More detail about the error, if any.
    tip: Option<String>,
}

impl Error {
    /// Create a new [`Error`] with a given `path` and [`ErrorKind`].
    pub fn new<P: AsRef<Path>>(path: P, kind: ErrorKind) -> Self {
        Self { kind, path: path.as_ref().as_os_str().to_owned(), tip: None }
    }

    /// Create a new [`Error`] for `path` from an [`io::Error`].
    pub fn io<P: AsRef<Path>>(path: P, err: &io::Error) -> Self {
        Self::new(path, err.kind().into())
    }

    /// Get the kind of the [`Error`].
    pub fn kind(&self) -> ErrorKind {
        self.kind.clone()
    }

    /// Get the file system path this [`Error`] is associated with.
    pub fn path(&self) -> PathBuf {
        Path::new(&self.path).to_owned()
    }

    /// Get the detail associated with this [`Error`], if any.
    pub fn tip(&self) -> Option<&str> {
        self.tip.as_deref()
    }

    /// Convert this [`Error`] into an [`Error`] with the provided tip associated to it.
    #[must_use]
    pub fn with_tip(mut self, tip: &str) -> Self {
        self.tip = Some(tip.to_owned());
        self
    }

    /// Convert this [`Error`] into an [`ErrorKind::Location`] error, keeping the original kind as
    /// the tip.
    #[must_use]
    pub fn into_location(self) -> Self {
        let tip = match self.tip {
            Some(tip) => format!("{}, {tip}", self.kind),
            None => self.kind.to_string(),
        };
        Self { kind: ErrorKind::Location, path: self.path, tip: Some(tip) }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(tip) = &self.tip {
            write!(f, "{}: {} ({tip})", self.path().display(), self.kind)
        } else {
            write!(f, "{}: {}", self.path().display(), self.kind)
        }
    }
}

impl std::error::Error for Error {}

/// Tests for the [`Error`] struct.
#[cfg(test)]
mod test_error {
    use super::{Error, ErrorKind};

    use std::io;

    use proptest::prelude::*;
    use proptest_attr_macro::proptest;

    #[proptest]
    fn new(path: String, kind: ErrorKind) {
        let err = Error::new(&path, kind.clone());
        prop_assert_eq!(err, Error { kind, path: path.into(), tip: None });
    }

    #[test]
    fn io() {
        let err = Error::io("/a", &io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.kind(), ErrorKind::Io(io::ErrorKind::NotFound));
        assert_eq!(err.path(), std::path::Path::new("/a"));
    }

    #[proptest]
    fn display_with_tip(err: Error) {
        prop_assume!(err.tip.is_some());

        prop_assert_eq!(
            err.to_string(),
            format!(
                "{}: {} ({})",
                err.path().display(),
                err.kind(),
                err.tip().expect("is_some() should be asserted"),
            )
        );
    }

    #[proptest]
    fn display_without_tip(err: Error) {
        prop_assume!(err.tip.is_none());

        prop_assert_eq!(err.to_string(), format!("{}: {}", err.path().display(), err.kind()));
    }

    #[proptest]
    fn with_tip(err: Error, tip: String) {
        let kind = err.kind();
        let path = err.path();

        prop_assert_eq!(err.with_tip(&tip), Error { kind, path: path.into(), tip: Some(tip) });
    }

    #[test]
    fn into_location_without_tip() {
        let err = Error::new("/a", ErrorKind::Io(io::ErrorKind::PermissionDenied)).into_location();
        assert_eq!(err.kind(), ErrorKind::Location);
        assert_eq!(err.tip(), Some("Permission denied"));
    }

    #[test]
    fn into_location_with_tip() {
        let err = Error::new("/a", ErrorKind::Io(io::ErrorKind::NotFound))
            .with_tip("moving to /b")
            .into_location();
        assert_eq!(err.kind(), ErrorKind::Location);
        assert_eq!(err.tip(), Some("Not found, moving to /b"));
    }
}

/// Enum representing kinds of [`Error`]s.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum ErrorKind {
    /// No trash directory could be found or created.
    Location,

    /// A shared trash directory is a symbolic link and was refused.
    Security,

    /// A `.trashinfo` record is malformed.
    Format,

    /// An underlying file system operation failed.
    Io(io::ErrorKind),

    /// The operation is not available on this platform.
    Unsupported,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Location => write!(f, "Cannot find or create a trash directory"),
            Self::Security => write!(f, "Refused to use a symbolic link as trash directory"),
            Self::Format => write!(f, "Not a valid trash info file"),
            Self::Io(io::ErrorKind::AlreadyExists) => write!(f, "Already exists"),
            Self::Io(io::ErrorKind::NotFound) => write!(f, "Not found"),
            Self::Io(io::ErrorKind::PermissionDenied) => write!(f, "Permission denied"),
            Self::Io(kind) => write!(f, "{kind}"),
            Self::Unsupported => write!(f, "Not supported on this platform"),
        }
    }
}

impl From<io::ErrorKind> for ErrorKind {
    fn from(val: io::ErrorKind) -> Self {
        Self::Io(val)
    }
}

#[cfg(feature = "native")]
impl From<trash::Error> for ErrorKind {
    fn from(val: trash::Error) -> Self {
        match val {
            trash::Error::CouldNotAccess { .. } => Self::Io(io::ErrorKind::PermissionDenied),
            #[cfg(all(unix, not(target_os = "macos")))]
            trash::Error::FileSystem { source, .. } => source.kind().into(),
            trash::Error::TargetedRoot => Self::Io(io::ErrorKind::InvalidInput),
            _ => Self::Io(io::ErrorKind::Other),
        }
    }
}

/// Tests for the [`ErrorKind`] enum.
#[cfg(test)]
mod test_error_kind {
    use super::ErrorKind;

    use std::io;

    use proptest::prelude::*;
    use proptest_attr_macro::proptest;

    #[proptest]
    fn from_io(kind: io::ErrorKind) {
        prop_assert_eq!(ErrorKind::Io(kind), kind.into());
    }

    #[test]
    fn display_not_found() {
        assert_eq!(ErrorKind::Io(io::ErrorKind::NotFound).to_string(), "Not found");
    }

    #[test]
    fn display_security() {
        assert_eq!(
            ErrorKind::Security.to_string(),
            "Refused to use a symbolic link as trash directory"
        );
    }

    #[proptest]
    #[cfg(feature = "native")]
    fn from_trash_could_not_access(target: String) {
        let err = trash::Error::CouldNotAccess { target };
        prop_assert_eq!(ErrorKind::Io(io::ErrorKind::PermissionDenied), err.into());
    }

    #[proptest]
    #[cfg(feature = "native")]
    #[cfg(all(unix, not(target_os = "macos")))]
    fn from_trash_file_system(kind: io::ErrorKind, path: String) {
        let err = trash::Error::FileSystem { source: io::Error::from(kind), path: std::path::Path::new(&path).into() };
        prop_assert_eq!(ErrorKind::Io(kind), err.into());
    }

    #[test]
    #[cfg(feature = "native")]
    fn from_trash_targeted_root() {
        assert_eq!(ErrorKind::Io(io::ErrorKind::InvalidInput), trash::Error::TargetedRoot.into());
    }
}
