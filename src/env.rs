// SPDX-License-Identifier: Apache-2.0

//! The parts of the process environment that decide where the trash lives.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorKind, Result};

/// The environment variable name of the user's home directory.
const HOME: &str = "HOME";

/// The environment variable name overriding the user's data directory.
const DATA_HOME: &str = "XDG_DATA_HOME";

/// Struct representing the environment configuration values used to locate trash directories.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Environment {
    /// The user's home directory, if known.
    home: Option<PathBuf>,

    /// The user's data directory override, if set.
    data_home: Option<PathBuf>,

    /// The numeric id of the user.
    uid: u32,
}

impl Environment {
    /// Create a new [`Environment`] from explicit values.
    pub fn new(home: Option<PathBuf>, data_home: Option<PathBuf>, uid: u32) -> Self {
        Self { home, data_home, uid }
    }

    /// Create an [`Environment`] from the current process.
    pub fn from_process() -> Self {
        parse_vars(std::env::vars_os(), current_uid())
    }

    /// Get the user's data directory: the override if set, `<home>/.local/share` otherwise.
    ///
    /// # Errors
    ///
    /// If neither the override nor the home directory is known.
    pub fn data_home(&self) -> Result<PathBuf> {
        match (&self.data_home, &self.home) {
            (Some(data_home), _) => Ok(data_home.clone()),
            (None, Some(home)) => Ok(home.join(".local").join("share")),
            (None, None) => Err(Error::new(Path::new(DATA_HOME), ErrorKind::Location)
                .with_tip("neither XDG_DATA_HOME nor HOME is set")),
        }
    }

    /// Get the path of the home trash directory.
    ///
    /// # Errors
    ///
    /// If the data directory is unknown, see [`Environment::data_home`].
    pub fn home_trash(&self) -> Result<PathBuf> {
        Ok(self.data_home()?.join("Trash"))
    }

    /// Get the numeric id of the user.
    pub fn uid(&self) -> u32 {
        self.uid
    }
}

/// Parse environment variables into an [`Environment`] for the user `uid`.
///
/// Variables that are set to an empty value are treated as unset.
pub fn parse_vars<T>(vars: T, uid: u32) -> Environment
where
    T: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env = Environment::new(None, None, uid);
    for (name, value) in vars {
        if value.is_empty() {
            continue;
        }

        if name == HOME {
            env.home = Some(value.into());
        } else if name == DATA_HOME {
            env.data_home = Some(value.into());
        }
    }

    env
}

/// Get the real user id of the current process.
#[cfg(unix)]
fn current_uid() -> u32 {
    nix::unistd::getuid().as_raw()
}

/// Get the real user id of the current process.
#[cfg(not(unix))]
fn current_uid() -> u32 {
    0
}


/// Tests for the [`Environment`] struct.
#[cfg(test)]
mod test_environment {
    use super::Environment;

    use crate::error::ErrorKind;

    use std::path::PathBuf;

    #[test]
    fn data_home_prefers_override() {
        let env = Environment::new(Some("/home/user".into()), Some("/data".into()), 1000);
        assert_eq!(env.data_home(), Ok(PathBuf::from("/data")));
    }

    #[test]
    fn data_home_defaults_below_home() {
        let env = Environment::new(Some("/home/user".into()), None, 1000);
        assert_eq!(env.data_home(), Ok(PathBuf::from("/home/user/.local/share")));
    }

    #[test]
    fn data_home_unknown() {
        let env = Environment::new(None, None, 1000);
        let err = env.data_home().expect_err("no home should be an error");
        assert_eq!(err.kind(), ErrorKind::Location);
    }

    #[test]
    fn home_trash() {
        let env = Environment::new(Some("/home/user".into()), None, 1000);
        assert_eq!(env.home_trash(), Ok(PathBuf::from("/home/user/.local/share/Trash")));
    }
}
