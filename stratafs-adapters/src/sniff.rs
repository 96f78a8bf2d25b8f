//! MIME sniffing
//!
//! A single process-wide matcher, initialized once on first use rather
//! than touched as ambient global state by each adapter.

use once_cell::sync::Lazy;
use stratafs_core::{StrataResult, Vfs, VirtualPath};

static MATCHER: Lazy<infer::Infer> = Lazy::new(infer::Infer::new);

/// MIME type guessed from a content prefix.
pub fn mime_type(head: &[u8]) -> Option<&'static str> {
    MATCHER.get(head).map(|kind| kind.mime_type())
}

/// MIME type of a file in the virtual tree, from its leading bytes.
pub async fn mime_type_of(vfs: &Vfs, path: &VirtualPath) -> StrataResult<Option<&'static str>> {
    let data = vfs.read_to_bytes(path).await?;
    Ok(mime_type(&data))
}
