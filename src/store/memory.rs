// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::Store;

/// Enum representing the operations of a [`MemoryStore`] that can be made to fail.
///
/// Meant for testing how code built on a [`Store`] copes with an interrupted operation, see
/// [`MemoryStore::inject_fault`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fault {
    /// Every [`Store::rename`] fails, as if the process crashed right before it.
    Rename,

    /// Every [`Store::write_new`] fails, as if the disk were full.
    Write,
}

/// Struct implementing [`Store`] on an in-memory tree.
///
/// It's public so that code built on this crate can be tested without touching the file system.
/// The tree always has a root directory `/`. Symbolic links are only followed by
/// [`Store::is_dir`]; they are never resolved as intermediate path components. Every entry lives on
/// device `0` unless it is at or below a path passed to [`MemoryStore::mount`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<State>,
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<PathBuf, Node>,
    mounts: BTreeMap<PathBuf, u64>,
    now: i64,
    faults: Vec<Fault>,
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    modified: i64,
}

#[derive(Clone, Debug)]
enum NodeKind {
    Dir,
    File(Vec<u8>),
    Symlink(PathBuf),
}

impl MemoryStore {
    /// Create a new [`MemoryStore`] holding only the root directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time, in seconds since the Unix epoch, recorded for entries created from now on.
    pub fn set_time(&self, now: i64) {
        self.state.borrow_mut().now = now;
    }

    /// Make every future call of the operation described by `fault` fail.
    pub fn inject_fault(&self, fault: Fault) {
        self.state.borrow_mut().faults.push(fault);
    }

    /// Undo every [`MemoryStore::inject_fault`].
    pub fn clear_faults(&self) {
        self.state.borrow_mut().faults.clear();
    }

    /// Create a directory at `path`, and any missing parents, on a new device `device`.
    ///
    /// # Errors
    ///
    /// If the directory can't be created.
    pub fn mount<P: AsRef<Path>>(&self, path: P, device: u64) -> Result<()> {
        let path = path.as_ref();
        self.create_dir_all(path)?;
        self.state.borrow_mut().mounts.insert(path.to_owned(), device);
        Ok(())
    }

    /// Create a file at `path` holding `contents`, creating missing parents and replacing any
    /// existing file.
    ///
    /// # Errors
    ///
    /// If a parent can't be created.
    pub fn add_file<P: AsRef<Path>>(&self, path: P, contents: &[u8]) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }

        let mut state = self.state.borrow_mut();
        let node = Node { kind: NodeKind::File(contents.to_vec()), modified: state.now };
        state.nodes.insert(path.to_owned(), node);
        Ok(())
    }

    /// Create a symbolic link at `path` pointing to `target`, creating missing parents.
    ///
    /// # Errors
    ///
    /// If a parent can't be created or something exists at `path`.
    pub fn add_symlink<P: AsRef<Path>, Q: AsRef<Path>>(&self, path: P, target: Q) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }

        let mut state = self.state.borrow_mut();
        if state.contains(path) {
            return Err(Error::new(path, io::ErrorKind::AlreadyExists.into()));
        }

        let modified = state.now;
        let kind = NodeKind::Symlink(target.as_ref().to_owned());
        state.nodes.insert(path.to_owned(), Node { kind, modified });
        Ok(())
    }

    /// Read the file at `path` as raw bytes.
    ///
    /// # Errors
    ///
    /// If `path` is not a file.
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let path = path.as_ref();
        match self.state.borrow().node(path)?.kind {
            NodeKind::File(ref contents) => Ok(contents.clone()),
            _ => Err(Error::new(path, io::ErrorKind::InvalidInput.into())),
        }
    }

    /// Check whether an injected [`Fault`] applies, failing for `path` if so.
    fn check(&self, fault: Fault, path: &Path) -> Result<()> {
        if self.state.borrow().faults.contains(&fault) {
            return Err(Error::new(path, io::ErrorKind::Other.into()).with_tip("injected fault"));
        }

        Ok(())
    }
}

impl State {
    fn contains(&self, path: &Path) -> bool {
        path == Path::new("/") || self.nodes.contains_key(path)
    }

    fn node(&self, path: &Path) -> Result<Node> {
        if path == Path::new("/") {
            return Ok(Node { kind: NodeKind::Dir, modified: 0 });
        }

        self.nodes
            .get(path)
            .cloned()
            .ok_or_else(|| Error::new(path, io::ErrorKind::NotFound.into()))
    }

    fn is_dir(&self, path: &Path) -> bool {
        match self.node(path).map(|node| node.kind) {
            Ok(NodeKind::Dir) => true,
            Ok(NodeKind::Symlink(target)) => {
                matches!(self.node(&target).map(|node| node.kind), Ok(NodeKind::Dir))
            },
            _ => false,
        }
    }

    /// Require the parent of `path` to be a directory.
    fn require_parent(&self, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !self.is_dir(parent) => {
                Err(Error::new(path, io::ErrorKind::NotFound.into()))
            },
            _ => Ok(()),
        }
    }

    /// Get every path strictly below `path`.
    fn descendants(&self, path: &Path) -> Vec<PathBuf> {
        self.nodes
            .keys()
            .filter(|key| key.as_path() != path && key.starts_with(path))
            .cloned()
            .collect()
    }
}

impl Store for MemoryStore {
    fn exists(&self, path: &Path) -> bool {
        self.state.borrow().contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state.borrow().is_dir(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.state.borrow().node(path).map(|node| node.kind), Ok(NodeKind::Symlink(_)))
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.contains(path) {
            return Err(Error::new(path, io::ErrorKind::AlreadyExists.into()));
        }

        state.require_parent(path)?;
        let modified = state.now;
        state.nodes.insert(path.to_owned(), Node { kind: NodeKind::Dir, modified });
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut ancestors: Vec<&Path> =
            path.ancestors().filter(|ancestor| !ancestor.as_os_str().is_empty()).collect();
        ancestors.reverse();

        let mut state = self.state.borrow_mut();
        for ancestor in ancestors {
            if state.is_dir(ancestor) {
                continue;
            }

            if state.contains(ancestor) {
                return Err(Error::new(ancestor, io::ErrorKind::NotADirectory.into()));
            }

            let modified = state.now;
            state.nodes.insert(ancestor.to_owned(), Node { kind: NodeKind::Dir, modified });
        }

        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.check(Fault::Rename, from)?;

        let mut state = self.state.borrow_mut();
        let node = state.node(from)?;
        state.require_parent(to)?;
        if to.starts_with(from) && to != from {
            return Err(Error::new(from, io::ErrorKind::InvalidInput.into()));
        }

        if let Ok(existing) = state.node(to) {
            let replaceable = match (&node.kind, &existing.kind) {
                (NodeKind::Dir, NodeKind::Dir) => state.descendants(to).is_empty(),
                (NodeKind::Dir, _) => false,
                (_, NodeKind::Dir) => false,
                _ => true,
            };

            if !replaceable {
                return Err(Error::new(from, io::ErrorKind::AlreadyExists.into())
                    .with_tip(&format!("moving to {}", to.display())));
            }

            state.nodes.remove(to);
        }

        for descendant in state.descendants(from) {
            if let Some(moved) = state.nodes.remove(&descendant) {
                let relative = descendant.strip_prefix(from).unwrap_or(&descendant);
                state.nodes.insert(to.join(relative), moved);
            }
        }

        state.nodes.remove(from);
        state.nodes.insert(to.to_owned(), node);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.state.borrow_mut();
        match state.node(path)?.kind {
            NodeKind::Dir => Err(Error::new(path, io::ErrorKind::IsADirectory.into())),
            _ => {
                state.nodes.remove(path);
                Ok(())
            },
        }
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.node(path)?;
        for descendant in state.descendants(path) {
            state.nodes.remove(&descendant);
        }

        state.nodes.remove(path);
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let contents = self.read(path)?;
        String::from_utf8(contents).map_err(|_| Error::new(path, io::ErrorKind::InvalidData.into()))
    }

    fn write_new(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.check(Fault::Write, path)?;

        let mut state = self.state.borrow_mut();
        if state.contains(path) {
            return Err(Error::new(path, io::ErrorKind::AlreadyExists.into()));
        }

        state.require_parent(path)?;
        let node = Node { kind: NodeKind::File(contents.to_vec()), modified: state.now };
        state.nodes.insert(path.to_owned(), node);
        Ok(())
    }

    fn modified(&self, path: &Path) -> Result<i64> {
        Ok(self.state.borrow().node(path)?.modified)
    }

    fn device(&self, path: &Path) -> Result<u64> {
        let state = self.state.borrow();
        state.node(path)?;
        let device = path.ancestors().find_map(|ancestor| state.mounts.get(ancestor).copied());
        Ok(device.unwrap_or(0))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<OsString>> {
        let state = self.state.borrow();
        if !state.is_dir(path) {
            return Err(Error::new(path, io::ErrorKind::NotADirectory.into()));
        }

        Ok(state
            .nodes
            .keys()
            .filter(|key| key.parent() == Some(path))
            .filter_map(|key| key.file_name().map(ToOwned::to_owned))
            .collect())
    }

    fn tree_size(&self, path: &Path) -> Result<u64> {
        let state = self.state.borrow();
        state.node(path)?;

        let size: u64 = state
            .nodes
            .iter()
            .filter(|(key, _)| key.starts_with(path))
            .map(|(_, node)| match &node.kind {
                NodeKind::Dir => 0,
                NodeKind::File(contents) => contents.len() as u64,
                NodeKind::Symlink(target) => target.as_os_str().len() as u64,
            })
            .sum();
        Ok(size)
    }
}
