//! In-memory backend
//!
//! A process-local tree with no POSIX ownership model. Ownership
//! queries report unsupported; permission bits are a single mode word
//! per file so the force-delete contract can be exercised.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use stratafs_core::{
    read_to_bytes, Adapter, ByteStream, StrataError, StrataResult, VirtualPath,
};

#[derive(Debug, Clone)]
enum Node {
    File {
        data: Vec<u8>,
        mode: u32,
        modified: DateTime<Utc>,
        created: DateTime<Utc>,
    },
    Dir {
        children: BTreeMap<String, Node>,
        created: DateTime<Utc>,
    },
}

impl Node {
    fn dir() -> Self {
        Node::Dir {
            children: BTreeMap::new(),
            created: Utc::now(),
        }
    }

    fn file(data: Vec<u8>) -> Self {
        let now = Utc::now();
        Node::File {
            data,
            mode: 0o644,
            modified: now,
            created: now,
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self, Node::Dir { .. })
    }
}

fn find<'a>(root: &'a Node, path: &VirtualPath) -> Option<&'a Node> {
    let mut node = root;
    for seg in path.segments() {
        match node {
            Node::Dir { children, .. } => node = children.get(seg)?,
            Node::File { .. } => return None,
        }
    }
    Some(node)
}

fn find_mut<'a>(root: &'a mut Node, path: &VirtualPath) -> Option<&'a mut Node> {
    let mut node = root;
    for seg in path.segments() {
        match node {
            Node::Dir { children, .. } => node = children.get_mut(seg)?,
            Node::File { .. } => return None,
        }
    }
    Some(node)
}

/// The directory entries holding `path`, plus its final name.
fn parent_entries<'a>(
    root: &'a mut Node,
    path: &VirtualPath,
) -> StrataResult<(&'a mut BTreeMap<String, Node>, String)> {
    let name = path
        .name()
        .ok_or_else(|| StrataError::InvalidPath(path.to_string()))?
        .to_string();
    let parent = path.parent().unwrap_or_else(VirtualPath::root);
    match find_mut(root, &parent) {
        Some(Node::Dir { children, .. }) => Ok((children, name)),
        Some(Node::File { .. }) => Err(StrataError::NotADirectory(parent.to_string())),
        None => Err(StrataError::MissingParent(parent.to_string())),
    }
}

/// Whether the whole subtree may be deleted: every file must be
/// writable unless `force` clears the restriction.
fn deletable(node: &Node, force: bool) -> bool {
    match node {
        Node::File { mode, .. } => force || mode & 0o200 != 0,
        Node::Dir { children, .. } => children.values().all(|c| deletable(c, force)),
    }
}

/// In-memory storage backend
pub struct MemoryAdapter {
    name: String,
    root: Mutex<Node>,
}

impl MemoryAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: Mutex::new(Node::dir()),
        }
    }

    fn single_chunk_stream(data: Vec<u8>) -> ByteStream {
        let bytes = Bytes::from(data);
        Box::pin(futures::stream::once(async move { Ok(bytes) }))
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &VirtualPath) -> StrataResult<bool> {
        Ok(find(&self.root.lock(), path).is_some())
    }

    async fn is_file(&self, path: &VirtualPath) -> StrataResult<bool> {
        Ok(matches!(
            find(&self.root.lock(), path),
            Some(Node::File { .. })
        ))
    }

    async fn is_directory(&self, path: &VirtualPath) -> StrataResult<bool> {
        Ok(matches!(
            find(&self.root.lock(), path),
            Some(Node::Dir { .. })
        ))
    }

    async fn is_link(&self, _path: &VirtualPath) -> StrataResult<bool> {
        Ok(false)
    }

    async fn file_size(&self, path: &VirtualPath) -> StrataResult<u64> {
        match find(&self.root.lock(), path) {
            Some(Node::File { data, .. }) => Ok(data.len() as u64),
            Some(Node::Dir { .. }) => Err(StrataError::NotAFile(path.to_string())),
            None => Err(StrataError::NotFound(path.to_string())),
        }
    }

    async fn mode(&self, path: &VirtualPath) -> StrataResult<u32> {
        match find(&self.root.lock(), path) {
            Some(Node::File { mode, .. }) => Ok(*mode),
            Some(Node::Dir { .. }) => Ok(0o755),
            None => Err(StrataError::NotFound(path.to_string())),
        }
    }

    async fn set_mode(&self, path: &VirtualPath, new_mode: u32) -> StrataResult<()> {
        match find_mut(&mut self.root.lock(), path) {
            Some(Node::File { mode, .. }) => {
                *mode = new_mode;
                Ok(())
            }
            Some(Node::Dir { .. }) => Ok(()),
            None => Err(StrataError::NotFound(path.to_string())),
        }
    }

    async fn modify_time(&self, path: &VirtualPath) -> StrataResult<DateTime<Utc>> {
        match find(&self.root.lock(), path) {
            Some(Node::File { modified, .. }) => Ok(*modified),
            Some(Node::Dir { created, .. }) => Ok(*created),
            None => Err(StrataError::NotFound(path.to_string())),
        }
    }

    async fn set_modify_time(&self, path: &VirtualPath, time: DateTime<Utc>) -> StrataResult<()> {
        match find_mut(&mut self.root.lock(), path) {
            Some(Node::File { modified, .. }) => {
                *modified = time;
                Ok(())
            }
            Some(Node::Dir { .. }) => Ok(()),
            None => Err(StrataError::NotFound(path.to_string())),
        }
    }

    async fn creation_time(&self, path: &VirtualPath) -> StrataResult<DateTime<Utc>> {
        match find(&self.root.lock(), path) {
            Some(Node::File { created, .. }) | Some(Node::Dir { created, .. }) => Ok(*created),
            None => Err(StrataError::NotFound(path.to_string())),
        }
    }

    async fn list(&self, path: &VirtualPath) -> StrataResult<Vec<String>> {
        match find(&self.root.lock(), path) {
            Some(Node::Dir { children, .. }) => Ok(children.keys().cloned().collect()),
            Some(Node::File { .. }) => Err(StrataError::NotADirectory(path.to_string())),
            None => Err(StrataError::NotFound(path.to_string())),
        }
    }

    async fn create_directory(&self, path: &VirtualPath, parents: bool) -> StrataResult<()> {
        let mut root = self.root.lock();
        if parents {
            let mut node = &mut *root;
            for seg in path.segments() {
                match node {
                    Node::Dir { children, .. } => {
                        node = children.entry(seg.clone()).or_insert_with(Node::dir);
                    }
                    Node::File { .. } => {
                        return Err(StrataError::NotADirectory(path.to_string()))
                    }
                }
            }
            if !node.is_dir() {
                return Err(StrataError::NotADirectory(path.to_string()));
            }
            return Ok(());
        }

        if let Some(node) = find(&root, path) {
            return if node.is_dir() {
                Ok(())
            } else {
                Err(StrataError::NotADirectory(path.to_string()))
            };
        }
        let (entries, name) = parent_entries(&mut root, path)?;
        entries.insert(name, Node::dir());
        Ok(())
    }

    async fn create_file(&self, path: &VirtualPath, parents: bool) -> StrataResult<()> {
        let mut root = self.root.lock();
        if let Some(node) = find(&root, path) {
            return if node.is_dir() {
                Err(StrataError::NotAFile(path.to_string()))
            } else {
                Ok(())
            };
        }
        if parents {
            if let Some(parent) = path.parent() {
                let mut node = &mut *root;
                for seg in parent.segments() {
                    match node {
                        Node::Dir { children, .. } => {
                            node = children.entry(seg.clone()).or_insert_with(Node::dir);
                        }
                        Node::File { .. } => {
                            return Err(StrataError::NotADirectory(parent.to_string()))
                        }
                    }
                }
            }
        }
        let (entries, name) = parent_entries(&mut root, path)?;
        entries.insert(name, Node::file(Vec::new()));
        Ok(())
    }

    async fn delete(&self, path: &VirtualPath, recursive: bool, force: bool) -> StrataResult<bool> {
        let mut root = self.root.lock();
        if path.is_root() {
            return Err(StrataError::InvalidPath(
                "cannot delete the adapter root".into(),
            ));
        }
        match find(&root, path) {
            None => return Err(StrataError::NotFound(path.to_string())),
            Some(Node::Dir { children, .. }) if !recursive && !children.is_empty() => {
                return Ok(false)
            }
            Some(node) if !deletable(node, force) => return Ok(false),
            Some(_) => {}
        }
        let (entries, name) = parent_entries(&mut root, path)?;
        entries.remove(&name);
        Ok(true)
    }

    async fn read(&self, path: &VirtualPath) -> StrataResult<ByteStream> {
        match find(&self.root.lock(), path) {
            Some(Node::File { data, .. }) => Ok(Self::single_chunk_stream(data.clone())),
            Some(Node::Dir { .. }) => Err(StrataError::NotAFile(path.to_string())),
            None => Err(StrataError::NotFound(path.to_string())),
        }
    }

    async fn write_stream(&self, path: &VirtualPath, stream: ByteStream) -> StrataResult<u64> {
        let data = read_to_bytes(stream).await?;
        let len = data.len() as u64;
        self.write(path, data).await?;
        Ok(len)
    }

    async fn write(&self, path: &VirtualPath, data: Bytes) -> StrataResult<()> {
        let mut root = self.root.lock();
        if matches!(find(&root, path), Some(Node::Dir { .. })) {
            return Err(StrataError::NotAFile(path.to_string()));
        }
        let (entries, name) = parent_entries(&mut root, path)?;
        match entries.get_mut(&name) {
            Some(Node::File {
                data: existing,
                modified,
                ..
            }) => {
                *existing = data.to_vec();
                *modified = Utc::now();
            }
            _ => {
                entries.insert(name, Node::file(data.to_vec()));
            }
        }
        Ok(())
    }

    async fn append(&self, path: &VirtualPath, data: Bytes) -> StrataResult<()> {
        let mut root = self.root.lock();
        if matches!(find(&root, path), Some(Node::Dir { .. })) {
            return Err(StrataError::NotAFile(path.to_string()));
        }
        let (entries, name) = parent_entries(&mut root, path)?;
        match entries.get_mut(&name) {
            Some(Node::File {
                data: existing,
                modified,
                ..
            }) => {
                existing.extend_from_slice(&data);
                *modified = Utc::now();
            }
            _ => {
                entries.insert(name, Node::file(data.to_vec()));
            }
        }
        Ok(())
    }

    async fn truncate(&self, path: &VirtualPath, len: u64) -> StrataResult<()> {
        let mut root = self.root.lock();
        match find_mut(&mut root, path) {
            Some(Node::File { data, modified, .. }) => {
                data.resize(len as usize, 0);
                *modified = Utc::now();
                Ok(())
            }
            Some(Node::Dir { .. }) => Err(StrataError::NotAFile(path.to_string())),
            None => Err(StrataError::NotFound(path.to_string())),
        }
    }

    async fn copy_native(&self, src: &VirtualPath, dst: &VirtualPath) -> StrataResult<bool> {
        let mut root = self.root.lock();
        let node = match find(&root, src) {
            Some(node) => node.clone(),
            None => return Err(StrataError::NotFound(src.to_string())),
        };
        let (entries, name) = parent_entries(&mut root, dst)?;
        entries.insert(name, node);
        Ok(true)
    }

    async fn rename_native(&self, src: &VirtualPath, dst: &VirtualPath) -> StrataResult<bool> {
        let mut root = self.root.lock();
        // destination parent must exist before the source is detached
        let dst_parent = dst.parent().unwrap_or_else(VirtualPath::root);
        if !matches!(find(&root, &dst_parent), Some(Node::Dir { .. })) {
            return Err(StrataError::MissingParent(dst_parent.to_string()));
        }
        let node = {
            let (entries, name) = parent_entries(&mut root, src)?;
            entries
                .remove(&name)
                .ok_or_else(|| StrataError::NotFound(src.to_string()))?
        };
        let (entries, name) = parent_entries(&mut root, dst)?;
        entries.insert(name, node);
        Ok(true)
    }
}
