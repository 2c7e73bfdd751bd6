// SPDX-License-Identifier: Apache-2.0

//! Reading and writing `.trashinfo` records.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::trace;

use crate::error::{Error, ErrorKind, Result};
use crate::store::Store;

use super::escape::{escape, unescape};
use super::locate::TrashLocation;

/// The first line of every `.trashinfo` record.
const HEADER: &str = "[Trash Info]";

/// The key of the original path.
const PATH_KEY: &str = "Path";

/// The key of the deletion date.
const DATE_KEY: &str = "DeletionDate";

/// The format of the deletion date.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Struct representing the metadata of one trashed item.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrashInfoRecord {
    /// Where the item was recycled from.
    path: PathBuf,

    /// When the item was recycled, in local time.
    deletion_date: NaiveDateTime,

    /// The modification time of the record itself, in seconds since the Unix epoch.
    info_modified: i64,
}

impl TrashInfoRecord {
    /// Get the path the item was recycled from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the (local) time the item was recycled.
    pub fn deletion_date(&self) -> NaiveDateTime {
        self.deletion_date
    }

    /// Get the modification time of the record file in seconds since the Unix epoch.
    pub fn info_modified(&self) -> i64 {
        self.info_modified
    }
}

/// Write the `.trashinfo` record for the item called `name` in `location`.
///
/// # Errors
///
/// If the record already exists or can't be written.
pub fn write<S: Store>(
    store: &S,
    location: &TrashLocation,
    name: &OsStr,
    original: &Path,
    deleted: NaiveDateTime,
) -> Result<()> {
    let path = location.info_path(name);
    trace!("recording {} in {}", original.display(), path.display());
    store.write_new(&path, format(original, deleted).as_bytes())
}

/// Read the `.trashinfo` record for the item called `name` in `location`.
///
/// # Errors
///
/// If the record can't be read or isn't a valid `.trashinfo` record ([`ErrorKind::Format`]).
pub fn read<S: Store>(
    store: &S,
    location: &TrashLocation,
    name: &OsStr,
) -> Result<TrashInfoRecord> {
    let path = location.info_path(name);
    let contents = store.read_to_string(&path)?;
    let (original, deletion_date) =
        parse(&contents).map_err(|tip| Error::new(&path, ErrorKind::Format).with_tip(tip))?;
    let info_modified = store.modified(&path)?;

    Ok(TrashInfoRecord { path: original, deletion_date, info_modified })
}

/// Serialize a record for `original` recycled at `deleted`.
fn format(original: &Path, deleted: NaiveDateTime) -> String {
    format!(
        "{HEADER}\n{PATH_KEY}={}\n{DATE_KEY}={}\n",
        escape(original),
        deleted.format(DATE_FORMAT)
    )
}

/// Deserialize a record, describing what's wrong with it on failure.
fn parse(contents: &str) -> std::result::Result<(PathBuf, NaiveDateTime), &'static str> {
    let mut lines = contents.lines();
    if lines.next() != Some(HEADER) {
        return Err("missing [Trash Info] header");
    }

    let escaped = field(lines.next(), PATH_KEY).ok_or("missing Path")?;
    let path = unescape(escaped).ok_or("malformed Path")?;

    let date = field(lines.next(), DATE_KEY).ok_or("missing DeletionDate")?;
    let deletion_date =
        NaiveDateTime::parse_from_str(date, DATE_FORMAT).map_err(|_| "malformed DeletionDate")?;

    Ok((path, deletion_date))
}

/// Get the value of a `key=value` line if it has the expected `key`.
fn field<'a>(line: Option<&'a str>, key: &str) -> Option<&'a str> {
    let (name, value) = line?.split_once('=')?;
    (name == key).then_some(value)
}
