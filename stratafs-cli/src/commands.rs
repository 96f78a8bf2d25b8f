// SPDX-License-Identifier: AGPL-3.0-or-later
//! Command implementations.

use std::io::Write;

use bytesize::ByteSize;
use console::style;

use stratafs_adapters::{digest, sniff};
use stratafs_core::{OperationFlags, StrataError, StrataResult, Vfs, VirtualPath};

/// Maps command-line switches onto the transfer flag set.
pub fn transfer_flags(recursive: bool, force: bool, merge: bool, parents: bool) -> OperationFlags {
    let mut flags = OperationFlags::empty();
    if recursive {
        flags |= OperationFlags::RECURSIVE;
    }
    if force {
        flags |= OperationFlags::REPLACE;
    }
    if merge {
        flags |= OperationFlags::MERGE;
    }
    if parents {
        flags |= OperationFlags::PARENTS;
    }
    flags
}

pub async fn ls(vfs: &Vfs, raw: &str, long: bool, human: bool) -> StrataResult<()> {
    let path = VirtualPath::parse(raw)?;
    for entry in vfs.list(&path).await? {
        let is_dir = entry.adapter().is_directory(entry.local()).await?;
        let name = match entry.path().name() {
            Some(name) => name.to_string(),
            None => "/".to_string(),
        };
        if long {
            let size = if is_dir {
                0
            } else {
                entry.adapter().file_size(entry.local()).await?
            };
            let size_text = if human {
                ByteSize(size).to_string()
            } else {
                size.to_string()
            };
            let kind = if is_dir { "d" } else { "-" };
            if is_dir {
                println!("{kind} {size_text:>10} {}", style(name).blue().bold());
            } else {
                println!("{kind} {size_text:>10} {name}");
            }
        } else if is_dir {
            println!("{}", style(name).blue().bold());
        } else {
            println!("{name}");
        }
    }
    Ok(())
}

pub async fn cat(vfs: &Vfs, raw: &str) -> StrataResult<()> {
    let path = VirtualPath::parse(raw)?;
    let data = vfs.read_to_bytes(&path).await?;
    std::io::stdout().write_all(&data)?;
    Ok(())
}

pub async fn cp(vfs: &Vfs, src: &str, dst: &str, flags: OperationFlags) -> StrataResult<()> {
    let src = VirtualPath::parse(src)?;
    let dst = VirtualPath::parse(dst)?;
    vfs.copy(&src, &dst, flags).await
}

pub async fn mv(vfs: &Vfs, src: &str, dst: &str, flags: OperationFlags) -> StrataResult<()> {
    let src = VirtualPath::parse(src)?;
    let dst = VirtualPath::parse(dst)?;
    vfs.move_to(&src, &dst, flags).await
}

pub async fn rm(vfs: &Vfs, raw: &str, recursive: bool, force: bool) -> StrataResult<()> {
    let path = VirtualPath::parse(raw)?;
    if !vfs.delete(&path, recursive, force).await? {
        eprintln!("strata: not removed: {path}");
    }
    Ok(())
}

pub async fn mkdir(vfs: &Vfs, raw: &str, parents: bool) -> StrataResult<()> {
    let path = VirtualPath::parse(raw)?;
    vfs.create_directory(&path, parents).await
}

pub async fn stat(vfs: &Vfs, raw: &str) -> StrataResult<()> {
    let path = VirtualPath::parse(raw)?;
    let resolved = vfs.resolve(&path);
    if !resolved.adapter().exists(resolved.local()).await? {
        return Err(StrataError::NotFound(path.to_string()));
    }
    let is_dir = resolved.adapter().is_directory(resolved.local()).await?;
    let is_link = resolved.adapter().is_link(resolved.local()).await?;

    println!("path:     {path}");
    println!("adapter:  {}", resolved.adapter().name());
    let kind = if is_link {
        "symlink"
    } else if is_dir {
        "directory"
    } else {
        "file"
    };
    println!("kind:     {kind}");
    println!("size:     {}", vfs.size(&path).await?);
    match resolved.adapter().mode(resolved.local()).await {
        Ok(mode) => println!("mode:     {mode:o}"),
        Err(_) => println!("mode:     -"),
    }
    if let Ok(modified) = resolved.adapter().modify_time(resolved.local()).await {
        println!("modified: {modified}");
    }
    if !is_dir {
        if let Some(mime) = sniff::mime_type_of(vfs, &path).await? {
            println!("mime:     {mime}");
        }
    }
    Ok(())
}

pub async fn hash(vfs: &Vfs, raw: &str) -> StrataResult<()> {
    let path = VirtualPath::parse(raw)?;
    println!("{}", digest::content_hash(vfs, &path).await?);
    Ok(())
}
