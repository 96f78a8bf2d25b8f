//! Virtual path abstraction
//!
//! Paths are normalized at construction: `/`-separated segments with `.`
//! and `..` collapsed. Normalization is idempotent and traversal above
//! the root is rejected rather than clamped.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{StrataError, StrataResult};

/// A normalized location in the virtual tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// The root of the virtual tree.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse and normalize a path string.
    ///
    /// Empty and `.` segments are dropped, `..` pops the previous
    /// segment. A `..` that would escape the root fails with
    /// [`StrataError::InvalidPath`].
    pub fn parse(path: impl AsRef<str>) -> StrataResult<Self> {
        Self::root().join(path)
    }

    /// Join a relative path onto this one, normalizing as for `parse`.
    pub fn join(&self, rel: impl AsRef<str>) -> StrataResult<Self> {
        let rel = rel.as_ref();
        let mut segments = self.segments.clone();
        for part in rel.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(StrataError::InvalidPath(rel.to_string()));
                    }
                }
                _ => segments.push(part.to_string()),
            }
        }
        Ok(Self { segments })
    }

    /// Append a single child name.
    pub fn child(&self, name: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.as_ref().to_string());
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut segments = self.segments.clone();
            segments.pop();
            Some(Self { segments })
        }
    }

    /// Final segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn starts_with(&self, prefix: &VirtualPath) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// The remainder of this path below `prefix`, or `None` when
    /// `prefix` is not an ancestor-or-self.
    pub fn strip_prefix(&self, prefix: &VirtualPath) -> Option<VirtualPath> {
        if self.starts_with(prefix) {
            Some(Self {
                segments: self.segments[prefix.segments.len()..].to_vec(),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "/{}", self.segments.join("/"))
        }
    }
}
