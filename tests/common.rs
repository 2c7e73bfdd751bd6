// SPDX-License-Identifier: Apache-2.0

//! Utility functions for writing integration tests for this project.

use std::env;
use std::error;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_fs::TempDir;

/// Create a predicate that verifies a `str` contains all and only the provided lines.
///
/// # Examples
///
/// Basic usage:
///
/// ```no_run
/// pub mod common;
///
/// use crate::common::has_exactly_lines;
///
/// use predicates::prelude::*;
///
/// #[test]
/// fn basic_test() -> TestResult {
///     let test_str = "\
///         line1\n\
///         line2\n\
///         line3\n\
///     ";
///
///     assert_eq!(true, has_exactly_lines!("line1\n", "line2\n", "line3\n").eval(test_str));
///     assert_eq!(false, has_exactly_lines!("line1\n", "line2\n").eval(test_str));
/// }
/// ```
///
/// Assert the content of trailing lines by using a semicolon as delimiter:
///
/// ```no_run
/// pub mod common;
///
/// use crate::common::has_exactly_lines;
///
/// use predicates::prelude::*;
///
/// #[test]
/// fn advanced_test() -> TestResult {
///     let test_str = "\
///         line1\n\
///         line2\n\
///         line3\n\
///     ";
///
///     assert_eq!(true, has_exactly_lines!("line1\n", "line2\n"; "line3\n").eval(test_str));
///     assert_eq!(false, has_exactly_lines!("line1\n", "line3\n"; "line2\n").eval(test_str));
/// }
/// ```
#[allow(unused_macros)]
macro_rules! has_exactly_lines {
    ($($line:expr),* $(,)?) => {
        // Base predicate.
        predicates::str::contains("").normalize()
        // Contains all strings ...
        $( .and(predicates::str::contains($line)) )*
        // ... and has the same length as all strings taken together ...
        .and(predicates::function::function(|s: &str| {
            s.len() == [$( $line, )*].join("").len()
        }))
        // ... means it only has these lines.
    };
    ($($line:expr),* ; $($last_line:expr),* $(,)?) => {
        has_exactly_lines!($( $line, )* $( $last_line, )*).and(
            predicates::str::ends_with([$( $last_line, )*].join(""))
        )
    };
}

/// Create a predicate that verifies a `str` contains all the provided lines, but maybe others as
/// well.
///
/// # Examples
///
/// Basic usage:
///
/// ```no_run
/// pub mod common;
///
/// use crate::common::has_lines;
///
/// use predicates::prelude::*;
///
/// #[test]
/// fn basic_test() -> TestResult {
///     let test_str = "\
///         line1\n\
///         line2\n\
///         line3\n\
///     ";
///
///     assert_eq!(true, has_lines!("line1\n", "line2\n").eval(test_str));
///     assert_eq!(false, has_lines!("line1\n", "line3\n").eval(test_str));
/// }
/// ```
///
/// Assert the content of trailing lines by using a semicolon as delimiter:
///
/// ```no_run
/// pub mod common;
///
/// use crate::common::has_lines;
///
/// use predicates::prelude::*;
///
/// #[test]
/// fn advanced_test() -> TestResult {
///     let test_str = "\
///         line1\n\
///         line2\n\
///         line3\n\
///     ";
///
///     assert_eq!(true, has_lines!("line1\n"; "line3\n").eval(test_str));
///     assert_eq!(false, has_lines!("line1\n"; "line2\n").eval(test_str));
/// }
/// ```
#[allow(unused_macros)]
macro_rules! has_lines {
    ($($line:expr),* $(,)?) => {
        // Base predicate.
        predicates::str::contains("").normalize()
        // Contains all strings ...
        $( .and(predicates::str::contains($line)) )*
    };
    ($($line:expr),* ; $($last_line:expr),* $(,)?) => {
        has_lines!($( $line, )* $( $last_line, )*).and(
            predicates::str::ends_with([$( $last_line, )*].join(""))
        )
    };
}

#[allow(unused_imports)]
pub(crate) use {has_exactly_lines, has_lines};

/// Test helpers to generate strings outputted by the CLI.
///
/// # Examples
///
/// ```no_run
/// pub mod common;
///
/// use crate::common::out;
///
/// #[test]
/// fn advanced_test() -> TestResult {
///     let stdout = "Removed file\n";
///     assert_eq!(stdout, out::removed("file"))
/// }
/// ```
pub mod out {
    use std::path::Path;

    #[must_use]
    pub fn conclusion(verb: &str, done: usize, errored: usize) -> String {
        format!(
            "{done} {verb}, {errored} {} occurred\n",
            if errored == 1 { "error" } else { "errors" }
        )
    }

    #[must_use]
    pub fn emptied(root: &Path) -> String {
        format!("Emptied {}\n", root.display())
    }

    #[must_use]
    pub fn empty_trash() -> String {
        "The trash is empty\n".to_owned()
    }

    #[must_use]
    pub fn erased_item<S: Into<String>>(name: S) -> String {
        format!("Erased item {} without a record\n", name.into())
    }

    #[must_use]
    pub fn erased_record<S: Into<String>>(name: S) -> String {
        format!("Erased record {} without an item\n", name.into())
    }

    #[must_use]
    pub fn found_item<S: Into<String>>(name: S) -> String {
        format!("Found item {} without a record (use '--repair' to erase)\n", name.into())
    }

    #[must_use]
    pub fn found_record<S: Into<String>>(name: S) -> String {
        format!("Found record {} without an item (use '--repair' to erase)\n", name.into())
    }

    #[must_use]
    pub fn leftovers(count: usize) -> String {
        format!("{count} {} found\n", if count == 1 { "leftover" } else { "leftovers" })
    }

    #[must_use]
    pub fn listed<S: Into<String>>(name: S, original: &Path) -> String {
        format!("  {}  {}\n", name.into(), original.display())
    }

    #[must_use]
    pub fn newline() -> String {
        "\n".to_owned()
    }

    #[must_use]
    pub fn recycled<S: Into<String>, T: Into<String>>(subject: S, name: T) -> String {
        format!("Moved {} to trash as {}\n", subject.into(), name.into())
    }

    #[must_use]
    pub fn removed<S: Into<String>>(name: S) -> String {
        format!("Removed {}\n", name.into())
    }

    #[must_use]
    pub fn restored<S: Into<String>>(name: S, original: &Path) -> String {
        format!("Restored {} to {}\n", name.into(), original.display())
    }

    #[must_use]
    pub fn start() -> String {
        "[start processing]\n".to_owned()
    }
}

/// The environment variable name to enable debugging mode for tests.
const TEST_DEBUG_MODE: &str = "RECYCLEBIN_DEBUG_TEST";

/// The directory, relative to the testing directory, used as `$XDG_DATA_HOME`.
pub const DATA_HOME: &str = "data";

/// The home trash, relative to the testing directory.
pub const HOME_TRASH: &str = "data/Trash";

/// The `Result` type used by [`with_test_dir`].
pub type TestResult = Result<(), Box<dyn error::Error>>;

/// Run a test with access to a (temporary) testing directory.
///
/// The testing directory is both the working directory and the home directory of the CLI, with
/// the data directory at [`DATA_HOME`] inside it.
///
/// # Errors
///
/// Any error returned by the test callback is returned by this function.
///
/// An error may also occur if the test could not be set up.
///
/// # Examples
///
/// ```no_run
/// pub mod common;
///
/// use crate::common::{with_test_dir, TestResult};
///
/// use assert_fs::prelude::*;
///
/// #[test]
/// fn example_test() -> TestResult {
///     with_test_dir(|mut cmd, test_dir| {
///         // Test something using `test_dir` ...
///
///         Ok(())
///     })
/// }
/// ```
pub fn with_test_dir<C>(callback: C) -> TestResult
where
    C: FnOnce(Command, &TempDir) -> TestResult,
{
    let debug = env::var_os(TEST_DEBUG_MODE).is_some();
    let temp_dir = TempDir::new()?.into_persistent_if(debug);

    let cmd = recyclebin(&temp_dir)?;
    callback(cmd, &temp_dir)
}

/// Get a fresh command for the CLI that runs in the testing directory `test_dir`.
///
/// Use this for every invocation after the first in a test.
///
/// # Errors
///
/// If the CLI binary can't be found.
pub fn recyclebin(test_dir: &TempDir) -> Result<Command, Box<dyn error::Error>> {
    let mut cmd = Command::cargo_bin("recyclebin")?;
    cmd.current_dir(test_dir)
        .env("HOME", test_dir.path())
        .env("XDG_DATA_HOME", test_dir.path().join(DATA_HOME))
        .env_remove("DEBUG");

    Ok(cmd)
}

/// Get the absolute path of `name` in the testing directory, as the CLI sees it.
///
/// # Errors
///
/// If the testing directory can't be resolved.
pub fn absolute(test_dir: &TempDir, name: &str) -> Result<PathBuf, Box<dyn error::Error>> {
    Ok(test_dir.path().canonicalize()?.join(name))
}
