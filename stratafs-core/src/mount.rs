//! Mount table and pathname resolution
//!
//! A [`Vfs`] owns a root adapter plus adapters mounted at virtual-path
//! prefixes. Resolution maps a virtual path to the most deeply nested
//! mount whose prefix matches; the remainder becomes the adapter-local
//! path. Resolution is a pure function of the mount table and never
//! touches a backend.

use std::fmt;
use std::sync::Arc;

use crate::{
    adapter::Adapter,
    error::{StrataError, StrataResult},
    path::VirtualPath,
};

/// A virtual path resolved to its owning adapter.
///
/// Immutable once constructed; deriving a related location goes back
/// through [`Vfs::resolve`].
#[derive(Clone)]
pub struct Pathname {
    path: VirtualPath,
    adapter: Arc<dyn Adapter>,
    local: VirtualPath,
}

impl Pathname {
    /// The full virtual path.
    pub fn path(&self) -> &VirtualPath {
        &self.path
    }

    /// The adapter owning this path.
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    /// The path relative to the owning adapter's root.
    pub fn local(&self) -> &VirtualPath {
        &self.local
    }

    /// Whether `other` resolved to the same adapter instance.
    pub fn same_adapter(&self, other: &Pathname) -> bool {
        Arc::ptr_eq(&self.adapter, &other.adapter)
    }
}

impl fmt::Debug for Pathname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pathname")
            .field("path", &self.path.to_string())
            .field("adapter", &self.adapter.name())
            .field("local", &self.local.to_string())
            .finish()
    }
}

struct Mount {
    at: VirtualPath,
    adapter: Arc<dyn Adapter>,
}

/// The virtual filesystem: a root adapter plus a mount table.
///
/// The mount table is read-only during traversal; `mount` takes
/// `&mut self` and is expected to run only while no transfer is in
/// flight.
pub struct Vfs {
    root: Arc<dyn Adapter>,
    mounts: Vec<Mount>,
}

impl Vfs {
    pub fn new(root: Arc<dyn Adapter>) -> Self {
        Self {
            root,
            mounts: Vec::new(),
        }
    }

    /// Bind `adapter` at the virtual path `at`. Mount points must be
    /// unique and cannot shadow the root itself.
    pub fn mount(&mut self, at: VirtualPath, adapter: Arc<dyn Adapter>) -> StrataResult<()> {
        if at.is_root() {
            return Err(StrataError::InvalidPath(
                "cannot mount over the root adapter".into(),
            ));
        }
        if self.mounts.iter().any(|m| m.at == at) {
            return Err(StrataError::InvalidPath(format!(
                "mount point already in use: {at}"
            )));
        }
        tracing::debug!(at = %at, adapter = adapter.name(), "mounting adapter");
        self.mounts.push(Mount { at, adapter });
        Ok(())
    }

    /// Resolve a virtual path to the single adapter owning it.
    pub fn resolve(&self, path: &VirtualPath) -> Pathname {
        let mut owner = self.root.clone();
        let mut local = path.clone();
        let mut depth = 0;
        for mount in &self.mounts {
            if let Some(rest) = path.strip_prefix(&mount.at) {
                // mount prefixes are unique, so ties are impossible
                if mount.at.depth() > depth {
                    depth = mount.at.depth();
                    owner = mount.adapter.clone();
                    local = rest;
                }
            }
        }
        Pathname {
            path: path.clone(),
            adapter: owner,
            local,
        }
    }

    /// Parse then resolve a raw path string.
    pub fn resolve_str(&self, path: &str) -> StrataResult<Pathname> {
        Ok(self.resolve(&VirtualPath::parse(path)?))
    }

    /// Whether any mount point lies strictly below `prefix`.
    pub(crate) fn has_mounts_under(&self, prefix: &VirtualPath) -> bool {
        self.mounts
            .iter()
            .any(|m| m.at.starts_with(prefix) && m.at != *prefix)
    }
}
