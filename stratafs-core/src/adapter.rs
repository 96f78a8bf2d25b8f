//! Adapter capability trait
//!
//! One storage backend rooted at some point in the virtual tree. All
//! paths handed to an adapter are adapter-local: expressed relative to
//! the adapter's own root, with mount prefixes already stripped by
//! resolution.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;

use crate::{
    error::{StrataError, StrataResult},
    path::VirtualPath,
};

/// Byte stream type
pub type ByteStream = Pin<Box<dyn Stream<Item = StrataResult<Bytes>> + Send>>;

/// Free/total space report. Fields the backend cannot answer stay `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceInfo {
    pub total: Option<u64>,
    pub free: Option<u64>,
}

impl SpaceInfo {
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Storage backend capability interface.
///
/// Failure policy: every primitive that touches the underlying store
/// translates unexpected low-level failures into
/// [`StrataError::Adapter`] carrying the path and a description; raw
/// backend errors never percolate to the client. Capabilities the
/// backend cannot represent report [`StrataError::Unsupported`], which
/// is the default for the metadata setters and ownership queries below.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short identifier used in log lines and error messages.
    fn name(&self) -> &str;

    async fn exists(&self, path: &VirtualPath) -> StrataResult<bool>;
    async fn is_file(&self, path: &VirtualPath) -> StrataResult<bool>;
    async fn is_directory(&self, path: &VirtualPath) -> StrataResult<bool>;
    async fn is_link(&self, path: &VirtualPath) -> StrataResult<bool>;

    /// Byte size of a file. Directories have no intrinsic size; asking
    /// for one is [`StrataError::NotAFile`].
    async fn file_size(&self, path: &VirtualPath) -> StrataResult<u64>;

    async fn owner(&self, _path: &VirtualPath) -> StrataResult<u32> {
        Err(StrataError::Unsupported(format!("{}: owner", self.name())))
    }

    async fn set_owner(&self, _path: &VirtualPath, _uid: u32) -> StrataResult<()> {
        Err(StrataError::Unsupported(format!("{}: set owner", self.name())))
    }

    async fn group(&self, _path: &VirtualPath) -> StrataResult<u32> {
        Err(StrataError::Unsupported(format!("{}: group", self.name())))
    }

    async fn set_group(&self, _path: &VirtualPath, _gid: u32) -> StrataResult<()> {
        Err(StrataError::Unsupported(format!("{}: set group", self.name())))
    }

    /// POSIX-style permission bits.
    async fn mode(&self, _path: &VirtualPath) -> StrataResult<u32> {
        Err(StrataError::Unsupported(format!("{}: mode", self.name())))
    }

    async fn set_mode(&self, _path: &VirtualPath, _mode: u32) -> StrataResult<()> {
        Err(StrataError::Unsupported(format!("{}: set mode", self.name())))
    }

    async fn access_time(&self, _path: &VirtualPath) -> StrataResult<DateTime<Utc>> {
        Err(StrataError::Unsupported(format!("{}: access time", self.name())))
    }

    async fn set_access_time(&self, _path: &VirtualPath, _time: DateTime<Utc>) -> StrataResult<()> {
        Err(StrataError::Unsupported(format!("{}: set access time", self.name())))
    }

    async fn modify_time(&self, _path: &VirtualPath) -> StrataResult<DateTime<Utc>> {
        Err(StrataError::Unsupported(format!("{}: modify time", self.name())))
    }

    async fn set_modify_time(&self, _path: &VirtualPath, _time: DateTime<Utc>) -> StrataResult<()> {
        Err(StrataError::Unsupported(format!("{}: set modify time", self.name())))
    }

    async fn creation_time(&self, _path: &VirtualPath) -> StrataResult<DateTime<Utc>> {
        Err(StrataError::Unsupported(format!("{}: creation time", self.name())))
    }

    /// Child names of a directory, in name order.
    async fn list(&self, path: &VirtualPath) -> StrataResult<Vec<String>>;

    /// Create a directory. An existing directory at `path` is fine; an
    /// existing file is [`StrataError::NotADirectory`].
    async fn create_directory(&self, path: &VirtualPath, parents: bool) -> StrataResult<()>;

    /// Create an empty file without truncating an existing one.
    async fn create_file(&self, path: &VirtualPath, parents: bool) -> StrataResult<()>;

    /// Delete a file or directory wholly owned by this adapter.
    ///
    /// `Ok(false)` means policy declined: a non-empty directory without
    /// `recursive`, or a non-writable file without `force`. `force`
    /// clears restrictive permission bits and retries once. True I/O
    /// failures are errors.
    async fn delete(&self, path: &VirtualPath, recursive: bool, force: bool)
        -> StrataResult<bool>;

    /// Open a read stream on a file.
    async fn read(&self, path: &VirtualPath) -> StrataResult<ByteStream>;

    /// Drain `stream` into the file at `path`, creating or truncating
    /// it. Returns bytes written. The stream is consumed and closed on
    /// every exit path.
    async fn write_stream(&self, path: &VirtualPath, stream: ByteStream) -> StrataResult<u64>;

    async fn write(&self, path: &VirtualPath, data: Bytes) -> StrataResult<()>;
    async fn append(&self, path: &VirtualPath, data: Bytes) -> StrataResult<()>;
    async fn truncate(&self, path: &VirtualPath, len: u64) -> StrataResult<()>;

    /// Backend-native copy between two paths of this adapter.
    /// `Ok(false)` declines, sending the engine down the stream path.
    async fn copy_native(&self, _src: &VirtualPath, _dst: &VirtualPath) -> StrataResult<bool> {
        Ok(false)
    }

    /// Backend-native rename between two paths of this adapter.
    async fn rename_native(&self, _src: &VirtualPath, _dst: &VirtualPath) -> StrataResult<bool> {
        Ok(false)
    }

    async fn space(&self) -> StrataResult<SpaceInfo> {
        Ok(SpaceInfo::unknown())
    }
}

/// Collect a byte stream into one contiguous buffer.
pub async fn read_to_bytes(mut stream: ByteStream) -> StrataResult<Bytes> {
    use futures::StreamExt;

    let mut data = Vec::new();
    while let Some(chunk) = stream.next().await {
        data.extend_from_slice(&chunk?);
    }
    Ok(Bytes::from(data))
}
