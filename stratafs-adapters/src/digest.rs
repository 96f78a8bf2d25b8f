//! Content hashing over the virtual tree

use futures::StreamExt;
use stratafs_core::{StrataResult, Vfs, VirtualPath};

/// Hex-encoded BLAKE3 digest of a file's contents, streamed chunk by
/// chunk.
pub async fn content_hash(vfs: &Vfs, path: &VirtualPath) -> StrataResult<String> {
    let mut stream = vfs.open_read(path).await?;
    let mut hasher = blake3::Hasher::new();
    while let Some(chunk) = stream.next().await {
        hasher.update(&chunk?);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
