// SPDX-License-Identifier: Apache-2.0

//! Collision-free naming of items in a trash directory.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

use crate::store::Store;

use super::locate::TrashLocation;

/// Get a name for `candidate` that no item or `.trashinfo` record in `location` uses yet.
///
/// The candidate itself is returned if it's free. Otherwise a number is inserted before the
/// extension, trying `stem0.ext`, `stem1.ext`, and so on until both halves are free. This
/// assumes nobody else writes to `location` in the meantime.
pub fn uniquify<S: Store>(store: &S, location: &TrashLocation, candidate: &OsStr) -> OsString {
    if is_free(store, location, candidate) {
        return candidate.to_owned();
    }

    let (stem, extension) = split_extension(candidate);
    let mut index: u64 = 0;
    loop {
        let mut name = stem.to_owned();
        name.push(index.to_string());
        name.push(extension);

        if is_free(store, location, &name) {
            return name;
        }

        index += 1;
    }
}

/// Returns `true` if neither an item nor a record called `name` exists in `location`.
fn is_free<S: Store>(store: &S, location: &TrashLocation, name: &OsStr) -> bool {
    !store.exists(&location.file_path(name)) && !store.exists(&location.info_path(name))
}

/// Split `name` at its last `.` into a stem and an extension that starts with the `.`.
///
/// The extension is empty if `name` has no `.` at all.
fn split_extension(name: &OsStr) -> (&OsStr, &OsStr) {
    let bytes = name.as_bytes();
    match bytes.iter().rposition(|byte| *byte == b'.') {
        Some(index) => (OsStr::from_bytes(&bytes[..index]), OsStr::from_bytes(&bytes[index..])),
        None => (name, OsStr::new("")),
    }
}
