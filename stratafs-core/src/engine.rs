//! Transfer engine: copy, move, delete, size
//!
//! The conflict matrix classifies a transfer by (source is directory,
//! destination is directory) against the destination's existence and
//! resolves it with the operation flags. Directory recursion always
//! re-enters through the [`Vfs`] on full virtual paths, so mounts
//! nested under a directory being transferred resolve to their own
//! adapters instead of being bypassed.
//!
//! Nothing is rolled back on failure: a recursive operation that fails
//! partway leaves the children already transferred in place, and the
//! caller must treat the destination as possibly partially populated.

use bytes::Bytes;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::{
    adapter::{read_to_bytes, ByteStream},
    error::{StrataError, StrataResult},
    flags::OperationFlags,
    mount::{Pathname, Vfs},
    path::VirtualPath,
};

impl Vfs {
    pub async fn exists(&self, path: &VirtualPath) -> StrataResult<bool> {
        let pn = self.resolve(path);
        pn.adapter().exists(pn.local()).await
    }

    pub async fn is_file(&self, path: &VirtualPath) -> StrataResult<bool> {
        let pn = self.resolve(path);
        pn.adapter().is_file(pn.local()).await
    }

    pub async fn is_directory(&self, path: &VirtualPath) -> StrataResult<bool> {
        let pn = self.resolve(path);
        pn.adapter().is_directory(pn.local()).await
    }

    pub async fn create_directory(&self, path: &VirtualPath, parents: bool) -> StrataResult<()> {
        let pn = self.resolve(path);
        pn.adapter().create_directory(pn.local(), parents).await
    }

    pub async fn create_file(&self, path: &VirtualPath, parents: bool) -> StrataResult<()> {
        let pn = self.resolve(path);
        pn.adapter().create_file(pn.local(), parents).await
    }

    /// Child paths of a directory, resolved and in name order.
    pub async fn list(&self, path: &VirtualPath) -> StrataResult<Vec<Pathname>> {
        let pn = self.resolve(path);
        let names = pn.adapter().list(pn.local()).await?;
        Ok(names
            .into_iter()
            .map(|name| self.resolve(&path.child(name)))
            .collect())
    }

    pub async fn open_read(&self, path: &VirtualPath) -> StrataResult<ByteStream> {
        let pn = self.resolve(path);
        pn.adapter().read(pn.local()).await
    }

    pub async fn read_to_bytes(&self, path: &VirtualPath) -> StrataResult<Bytes> {
        read_to_bytes(self.open_read(path).await?).await
    }

    pub async fn write_bytes(&self, path: &VirtualPath, data: Bytes) -> StrataResult<()> {
        let pn = self.resolve(path);
        pn.adapter().write(pn.local(), data).await
    }

    pub async fn append(&self, path: &VirtualPath, data: Bytes) -> StrataResult<()> {
        let pn = self.resolve(path);
        pn.adapter().append(pn.local(), data).await
    }

    pub async fn truncate(&self, path: &VirtualPath, len: u64) -> StrataResult<()> {
        let pn = self.resolve(path);
        pn.adapter().truncate(pn.local(), len).await
    }

    /// Byte size of a file, or the recursive sum of descendant file
    /// sizes for a directory. Directories themselves count zero.
    pub async fn size(&self, path: &VirtualPath) -> StrataResult<u64> {
        self.size_boxed(path).await
    }

    fn size_boxed<'a>(&'a self, path: &'a VirtualPath) -> BoxFuture<'a, StrataResult<u64>> {
        Box::pin(async move {
            let pn = self.resolve(path);
            if pn.adapter().is_directory(pn.local()).await? {
                let mut total = 0u64;
                for name in pn.adapter().list(pn.local()).await? {
                    total += self.size_boxed(&path.child(name)).await?;
                }
                Ok(total)
            } else {
                pn.adapter().file_size(pn.local()).await
            }
        })
    }

    /// Copy `src` to `dst`, resolving destination conflicts with `flags`.
    ///
    /// No destination state is deleted before the flag-driven decision
    /// is made.
    pub async fn copy(
        &self,
        src: &VirtualPath,
        dst: &VirtualPath,
        flags: OperationFlags,
    ) -> StrataResult<()> {
        self.copy_boxed(src, dst, flags).await
    }

    fn copy_boxed<'a>(
        &'a self,
        src: &'a VirtualPath,
        dst: &'a VirtualPath,
        flags: OperationFlags,
    ) -> BoxFuture<'a, StrataResult<()>> {
        Box::pin(self.copy_inner(src, dst, flags))
    }

    async fn copy_inner(
        &self,
        src: &VirtualPath,
        dst: &VirtualPath,
        mut flags: OperationFlags,
    ) -> StrataResult<()> {
        let src_pn = self.resolve(src);
        if !src_pn.adapter().exists(src_pn.local()).await? {
            return Err(StrataError::NotFound(src.to_string()));
        }
        let src_is_dir = src_pn.adapter().is_directory(src_pn.local()).await?;
        if src_is_dir && dst.starts_with(src) {
            return Err(StrataError::InvalidPath(format!(
                "destination {dst} lies inside source {src}"
            )));
        }
        self.prepare_parent(dst, flags).await?;

        let dst_pn = self.resolve(dst);
        let mut dst_exists = dst_pn.adapter().exists(dst_pn.local()).await?;

        if dst_exists {
            let dst_is_dir = dst_pn.adapter().is_directory(dst_pn.local()).await?;
            match (src_is_dir, dst_is_dir) {
                // file -> directory
                (false, true) => {
                    if flags.replace_allowed() {
                        self.require_deleted(dst, true, false).await?;
                        dst_exists = false;
                    } else if flags.contains(OperationFlags::MERGE) {
                        let name = src
                            .name()
                            .ok_or_else(|| StrataError::InvalidPath(src.to_string()))?;
                        return self.copy_boxed(src, &dst.child(name), flags).await;
                    } else {
                        return Err(StrataError::FileOverwriteDirectory {
                            src: src.to_string(),
                            dst: dst.to_string(),
                        });
                    }
                }
                // directory -> file
                (true, false) => {
                    if flags.replace_allowed() {
                        self.require_deleted(dst, false, false).await?;
                        dst_exists = false;
                        flags |= OperationFlags::RECURSIVE;
                    } else {
                        return Err(StrataError::DirectoryOverwriteFile {
                            src: src.to_string(),
                            dst: dst.to_string(),
                        });
                    }
                }
                // directory -> directory
                (true, true) => {
                    if flags.replace_allowed() {
                        self.require_deleted(dst, true, false).await?;
                        dst_exists = false;
                        flags |= OperationFlags::RECURSIVE;
                    } else if !flags.contains(OperationFlags::RECURSIVE) {
                        return Err(StrataError::DirectoryOverwriteDirectory {
                            src: src.to_string(),
                            dst: dst.to_string(),
                        });
                    }
                    // otherwise merge into the existing directory
                }
                // file -> file
                (false, false) => {
                    if !flags.replace_allowed() {
                        return Err(StrataError::FileOverwriteFile {
                            src: src.to_string(),
                            dst: dst.to_string(),
                        });
                    }
                }
            }
        }

        if src_is_dir {
            self.copy_directory(src, dst, dst_exists, flags).await
        } else {
            self.copy_file(src, dst).await
        }
    }

    /// Terminal directory copy: create the destination when absent and
    /// recurse child by child through fresh resolution.
    async fn copy_directory(
        &self,
        src: &VirtualPath,
        dst: &VirtualPath,
        dst_exists: bool,
        flags: OperationFlags,
    ) -> StrataResult<()> {
        if !flags.contains(OperationFlags::RECURSIVE) {
            return Err(StrataError::DirectoryOverwriteDirectory {
                src: src.to_string(),
                dst: dst.to_string(),
            });
        }
        // snapshot the children before the destination can appear in them
        let src_pn = self.resolve(src);
        let children = src_pn.adapter().list(src_pn.local()).await?;
        if !dst_exists {
            let dst_pn = self.resolve(dst);
            dst_pn.adapter().create_directory(dst_pn.local(), false).await?;
        }
        debug!(src = %src, dst = %dst, "copying directory");
        for name in children {
            self.copy_boxed(&src.child(&name), &dst.child(&name), flags)
                .await?;
        }
        Ok(())
    }

    /// Terminal file copy: backend-native when both sides resolved to
    /// the same adapter and it accepts, byte streaming otherwise.
    async fn copy_file(&self, src: &VirtualPath, dst: &VirtualPath) -> StrataResult<()> {
        let src_pn = self.resolve(src);
        let dst_pn = self.resolve(dst);
        if src_pn.same_adapter(&dst_pn)
            && src_pn
                .adapter()
                .copy_native(src_pn.local(), dst_pn.local())
                .await?
        {
            debug!(src = %src, dst = %dst, "native copy");
            return Ok(());
        }
        debug!(src = %src, dst = %dst, "stream copy");
        let stream = src_pn.adapter().read(src_pn.local()).await?;
        dst_pn.adapter().write_stream(dst_pn.local(), stream).await?;
        Ok(())
    }

    /// Move `src` to `dst` with the same conflict matrix as [`Vfs::copy`].
    ///
    /// Same-adapter terminal cases prefer the backend-native rename.
    /// Cross-adapter moves are copy-then-delete-source and are not
    /// atomic: a crash between the two can leave both sides present.
    pub async fn move_to(
        &self,
        src: &VirtualPath,
        dst: &VirtualPath,
        flags: OperationFlags,
    ) -> StrataResult<()> {
        self.move_boxed(src, dst, flags).await
    }

    fn move_boxed<'a>(
        &'a self,
        src: &'a VirtualPath,
        dst: &'a VirtualPath,
        flags: OperationFlags,
    ) -> BoxFuture<'a, StrataResult<()>> {
        Box::pin(self.move_inner(src, dst, flags))
    }

    async fn move_inner(
        &self,
        src: &VirtualPath,
        dst: &VirtualPath,
        mut flags: OperationFlags,
    ) -> StrataResult<()> {
        let src_pn = self.resolve(src);
        if !src_pn.adapter().exists(src_pn.local()).await? {
            return Err(StrataError::NotFound(src.to_string()));
        }
        let src_is_dir = src_pn.adapter().is_directory(src_pn.local()).await?;
        if src_is_dir && dst.starts_with(src) {
            return Err(StrataError::InvalidPath(format!(
                "destination {dst} lies inside source {src}"
            )));
        }
        self.prepare_parent(dst, flags).await?;

        let dst_pn = self.resolve(dst);
        let mut dst_exists = dst_pn.adapter().exists(dst_pn.local()).await?;

        if dst_exists {
            let dst_is_dir = dst_pn.adapter().is_directory(dst_pn.local()).await?;
            match (src_is_dir, dst_is_dir) {
                (false, true) => {
                    if flags.replace_allowed() {
                        self.require_deleted(dst, true, false).await?;
                        dst_exists = false;
                    } else if flags.contains(OperationFlags::MERGE) {
                        let name = src
                            .name()
                            .ok_or_else(|| StrataError::InvalidPath(src.to_string()))?;
                        return self.move_boxed(src, &dst.child(name), flags).await;
                    } else {
                        return Err(StrataError::FileOverwriteDirectory {
                            src: src.to_string(),
                            dst: dst.to_string(),
                        });
                    }
                }
                (true, false) => {
                    if flags.replace_allowed() {
                        self.require_deleted(dst, false, false).await?;
                        dst_exists = false;
                        flags |= OperationFlags::RECURSIVE;
                    } else {
                        return Err(StrataError::DirectoryOverwriteFile {
                            src: src.to_string(),
                            dst: dst.to_string(),
                        });
                    }
                }
                (true, true) => {
                    if flags.replace_allowed() {
                        self.require_deleted(dst, true, false).await?;
                        dst_exists = false;
                        flags |= OperationFlags::RECURSIVE;
                    } else if !flags.contains(OperationFlags::RECURSIVE) {
                        return Err(StrataError::DirectoryOverwriteDirectory {
                            src: src.to_string(),
                            dst: dst.to_string(),
                        });
                    }
                }
                (false, false) => {
                    if !flags.replace_allowed() {
                        return Err(StrataError::FileOverwriteFile {
                            src: src.to_string(),
                            dst: dst.to_string(),
                        });
                    }
                }
            }
        }

        if src_is_dir {
            // moving a whole tree to an absent destination is always
            // recursive
            if !dst_exists {
                flags |= OperationFlags::RECURSIVE;
            }
            self.move_directory(src, dst, dst_exists, flags).await
        } else {
            self.move_file(src, dst).await
        }
    }

    async fn move_directory(
        &self,
        src: &VirtualPath,
        dst: &VirtualPath,
        dst_exists: bool,
        flags: OperationFlags,
    ) -> StrataResult<()> {
        if !flags.contains(OperationFlags::RECURSIVE) {
            return Err(StrataError::DirectoryOverwriteDirectory {
                src: src.to_string(),
                dst: dst.to_string(),
            });
        }
        let src_pn = self.resolve(src);
        let dst_pn = self.resolve(dst);

        // Whole-tree native rename: same adapter, absent destination,
        // and no mount point under either prefix that the rename would
        // carry along or bury.
        if !dst_exists
            && src_pn.same_adapter(&dst_pn)
            && !self.has_mounts_under(src)
            && !self.has_mounts_under(dst)
            && src_pn
                .adapter()
                .rename_native(src_pn.local(), dst_pn.local())
                .await?
        {
            debug!(src = %src, dst = %dst, "native directory rename");
            return Ok(());
        }

        // snapshot the children before the destination can appear in them
        let children = src_pn.adapter().list(src_pn.local()).await?;
        if !dst_exists {
            dst_pn.adapter().create_directory(dst_pn.local(), false).await?;
        }
        debug!(src = %src, dst = %dst, "moving directory");
        for name in children {
            self.move_boxed(&src.child(&name), &dst.child(&name), flags)
                .await?;
        }

        // remove the emptied source directory
        let src_pn = self.resolve(src);
        if !src_pn.adapter().delete(src_pn.local(), false, false).await? {
            warn!(src = %src, "source directory not removed after move");
            return Err(StrataError::SourceNotRemoved(src.to_string()));
        }
        Ok(())
    }

    async fn move_file(&self, src: &VirtualPath, dst: &VirtualPath) -> StrataResult<()> {
        let src_pn = self.resolve(src);
        let dst_pn = self.resolve(dst);
        if src_pn.same_adapter(&dst_pn)
            && src_pn
                .adapter()
                .rename_native(src_pn.local(), dst_pn.local())
                .await?
        {
            debug!(src = %src, dst = %dst, "native rename");
            return Ok(());
        }

        self.copy_file(src, dst).await?;
        match src_pn.adapter().delete(src_pn.local(), false, false).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(src = %src, "source declined deletion after cross-adapter move");
                Err(StrataError::SourceNotRemoved(src.to_string()))
            }
            Err(err) => {
                warn!(src = %src, error = %err, "source deletion failed after cross-adapter move");
                Err(StrataError::SourceNotRemoved(src.to_string()))
            }
        }
    }

    /// Delete a file or directory tree.
    ///
    /// Returns `Ok(false)` when policy declines: a non-empty directory
    /// without `recursive`, or a non-writable file without `force`.
    /// Subtrees with no mounts beneath them are delegated whole to the
    /// owning adapter.
    pub async fn delete(
        &self,
        path: &VirtualPath,
        recursive: bool,
        force: bool,
    ) -> StrataResult<bool> {
        self.delete_boxed(path, recursive, force).await
    }

    fn delete_boxed<'a>(
        &'a self,
        path: &'a VirtualPath,
        recursive: bool,
        force: bool,
    ) -> BoxFuture<'a, StrataResult<bool>> {
        Box::pin(async move {
            let pn = self.resolve(path);
            if !pn.adapter().exists(pn.local()).await? {
                return Err(StrataError::NotFound(path.to_string()));
            }
            if !pn.adapter().is_directory(pn.local()).await? {
                return pn.adapter().delete(pn.local(), false, force).await;
            }

            if !self.has_mounts_under(path) {
                return pn.adapter().delete(pn.local(), recursive, force).await;
            }

            let children = pn.adapter().list(pn.local()).await?;
            if !recursive && !children.is_empty() {
                return Ok(false);
            }
            for name in children {
                if !self.delete_boxed(&path.child(name), recursive, force).await? {
                    return Ok(false);
                }
            }
            pn.adapter().delete(pn.local(), false, force).await
        })
    }

    /// Resolve `dst`'s parent: create it under PARENTS, otherwise
    /// require an existing directory.
    async fn prepare_parent(&self, dst: &VirtualPath, flags: OperationFlags) -> StrataResult<()> {
        let parent = dst
            .parent()
            .ok_or_else(|| StrataError::InvalidPath(dst.to_string()))?;
        let pn = self.resolve(&parent);
        if flags.contains(OperationFlags::PARENTS) {
            pn.adapter().create_directory(pn.local(), true).await
        } else if !pn.adapter().exists(pn.local()).await? {
            Err(StrataError::MissingParent(parent.to_string()))
        } else if !pn.adapter().is_directory(pn.local()).await? {
            Err(StrataError::NotADirectory(parent.to_string()))
        } else {
            Ok(())
        }
    }

    /// Delete that must succeed: a declined deletion here is an adapter
    /// failure, since the flag decision has already been made.
    async fn require_deleted(
        &self,
        path: &VirtualPath,
        recursive: bool,
        force: bool,
    ) -> StrataResult<()> {
        if self.delete_boxed(path, recursive, force).await? {
            Ok(())
        } else {
            Err(StrataError::adapter(
                path,
                "conflicting destination could not be deleted",
            ))
        }
    }
}
