// SPDX-License-Identifier: Apache-2.0

//! Percent-encoding of paths as stored in `.trashinfo` records and the `directorysizes` cache.

use std::ffi::OsString;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

/// Percent-encode `path`.
///
/// Separators (`/`) are kept, every other byte outside of `A-Z`, `a-z`, `0-9`, `-`, `_`, `.`, and
/// `~` is written as `%XX`.
pub fn escape(path: &Path) -> String {
    path.as_os_str()
        .as_bytes()
        .split(|byte| *byte == b'/')
        .map(urlencoding::encode_binary)
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode a percent-encoded path.
///
/// Returns `None` if a `%` isn't followed by two hexadecimal digits.
pub fn unescape(escaped: &str) -> Option<PathBuf> {
    if !is_well_formed(escaped.as_bytes()) {
        return None;
    }

    let bytes = urlencoding::decode_binary(escaped.as_bytes()).into_owned();
    Some(OsString::from_vec(bytes).into())
}

/// Check that every `%` in `escaped` starts a `%XX` escape.
fn is_well_formed(escaped: &[u8]) -> bool {
    let mut rest = escaped;
    while let Some(index) = rest.iter().position(|byte| *byte == b'%') {
        match rest.get(index + 1..index + 3) {
            Some(digits) if digits.iter().all(u8::is_ascii_hexdigit) => rest = &rest[index + 3..],
            _ => return false,
        }
    }

    true
}
