//! Transfer engine behavior across adapters and mounts

use std::sync::Arc;

use bytes::Bytes;
use stratafs_adapters::MemoryAdapter;
use stratafs_core::{OperationFlags, StrataError, Vfs, VirtualPath};

fn path(s: &str) -> VirtualPath {
    VirtualPath::parse(s).unwrap()
}

fn memory_vfs() -> Vfs {
    Vfs::new(Arc::new(MemoryAdapter::new("root")))
}

async fn write(vfs: &Vfs, p: &str, data: &'static [u8]) {
    vfs.write_bytes(&path(p), Bytes::from_static(data))
        .await
        .unwrap();
}

async fn contents(vfs: &Vfs, p: &str) -> Vec<u8> {
    vfs.read_to_bytes(&path(p)).await.unwrap().to_vec()
}

#[tokio::test]
async fn copy_file_to_absent_destination() {
    let vfs = memory_vfs();
    write(&vfs, "/a", b"hello").await;

    vfs.copy(&path("/a"), &path("/b"), OperationFlags::empty())
        .await
        .unwrap();

    assert_eq!(contents(&vfs, "/b").await, b"hello");
    assert_eq!(contents(&vfs, "/a").await, b"hello");
}

#[tokio::test]
async fn copy_missing_source_fails() {
    let vfs = memory_vfs();
    let err = vfs
        .copy(&path("/nope"), &path("/b"), OperationFlags::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::NotFound(_)));
}

#[tokio::test]
async fn copy_file_onto_directory_rejects_by_default() {
    let vfs = memory_vfs();
    write(&vfs, "/a", b"hello").await;
    vfs.create_directory(&path("/d"), false).await.unwrap();
    write(&vfs, "/d/keep", b"kept").await;

    let err = vfs
        .copy(&path("/a"), &path("/d"), OperationFlags::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::FileOverwriteDirectory { .. }));

    // destination untouched
    assert!(vfs.is_directory(&path("/d")).await.unwrap());
    assert_eq!(contents(&vfs, "/d/keep").await, b"kept");
}

#[tokio::test]
async fn copy_file_onto_directory_with_merge_nests_it() {
    let vfs = memory_vfs();
    write(&vfs, "/a", b"hello").await;
    vfs.create_directory(&path("/d"), false).await.unwrap();
    write(&vfs, "/d/keep", b"kept").await;

    vfs.copy(&path("/a"), &path("/d"), OperationFlags::MERGE)
        .await
        .unwrap();

    assert_eq!(contents(&vfs, "/d/a").await, b"hello");
    assert_eq!(contents(&vfs, "/d/keep").await, b"kept");
}

#[tokio::test]
async fn copy_file_onto_directory_with_replace_overwrites_it() {
    let vfs = memory_vfs();
    write(&vfs, "/a", b"hello").await;
    vfs.create_directory(&path("/d"), false).await.unwrap();
    write(&vfs, "/d/gone", b"x").await;

    vfs.copy(&path("/a"), &path("/d"), OperationFlags::REPLACE)
        .await
        .unwrap();

    assert!(vfs.is_file(&path("/d")).await.unwrap());
    assert_eq!(contents(&vfs, "/d").await, b"hello");
}

#[tokio::test]
async fn copy_file_onto_file_needs_replace() {
    let vfs = memory_vfs();
    write(&vfs, "/a", b"new").await;
    write(&vfs, "/b", b"old").await;

    let err = vfs
        .copy(&path("/a"), &path("/b"), OperationFlags::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::FileOverwriteFile { .. }));
    assert_eq!(contents(&vfs, "/b").await, b"old");

    vfs.copy(&path("/a"), &path("/b"), OperationFlags::REPLACE)
        .await
        .unwrap();
    assert_eq!(contents(&vfs, "/b").await, b"new");
}

#[tokio::test]
async fn reject_wins_over_replace() {
    let vfs = memory_vfs();
    write(&vfs, "/a", b"new").await;
    write(&vfs, "/b", b"old").await;

    let err = vfs
        .copy(
            &path("/a"),
            &path("/b"),
            OperationFlags::REJECT | OperationFlags::REPLACE,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::FileOverwriteFile { .. }));
    assert_eq!(contents(&vfs, "/b").await, b"old");
}

#[tokio::test]
async fn copy_directory_requires_recursive() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/src"), false).await.unwrap();
    write(&vfs, "/src/x", b"1").await;

    let err = vfs
        .copy(&path("/src"), &path("/dst"), OperationFlags::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::DirectoryOverwriteDirectory { .. }));
    assert!(!vfs.exists(&path("/dst")).await.unwrap());
}

#[tokio::test]
async fn copy_directory_recursively() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/src/y"), true).await.unwrap();
    write(&vfs, "/src/x", b"one").await;
    write(&vfs, "/src/y/z", b"two").await;

    vfs.copy(&path("/src"), &path("/dst"), OperationFlags::RECURSIVE)
        .await
        .unwrap();

    assert_eq!(contents(&vfs, "/dst/x").await, b"one");
    assert_eq!(contents(&vfs, "/dst/y/z").await, b"two");
    // source unchanged
    assert_eq!(contents(&vfs, "/src/x").await, b"one");
    assert_eq!(contents(&vfs, "/src/y/z").await, b"two");
}

#[tokio::test]
async fn copy_directory_onto_file_with_replace_forces_recursion() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/src"), false).await.unwrap();
    write(&vfs, "/src/x", b"payload").await;
    write(&vfs, "/dst", b"a file").await;

    // RECURSIVE is forced by the replace decision
    vfs.copy(&path("/src"), &path("/dst"), OperationFlags::REPLACE)
        .await
        .unwrap();

    assert!(vfs.is_directory(&path("/dst")).await.unwrap());
    assert_eq!(contents(&vfs, "/dst/x").await, b"payload");
}

#[tokio::test]
async fn copy_directory_merges_into_existing_directory() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/src"), false).await.unwrap();
    write(&vfs, "/src/new", b"n").await;
    vfs.create_directory(&path("/dst"), false).await.unwrap();
    write(&vfs, "/dst/old", b"o").await;

    vfs.copy(&path("/src"), &path("/dst"), OperationFlags::RECURSIVE)
        .await
        .unwrap();

    assert_eq!(contents(&vfs, "/dst/new").await, b"n");
    assert_eq!(contents(&vfs, "/dst/old").await, b"o");
}

#[tokio::test]
async fn copy_directory_into_own_subtree_is_rejected() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/a"), false).await.unwrap();
    write(&vfs, "/a/f", b"x").await;

    let err = vfs
        .copy(&path("/a"), &path("/a/b"), OperationFlags::RECURSIVE)
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::InvalidPath(_)));
    // nothing was created inside the source
    assert!(!vfs.exists(&path("/a/b")).await.unwrap());
    assert_eq!(contents(&vfs, "/a/f").await, b"x");
}

#[tokio::test]
async fn move_directory_into_own_subtree_is_rejected() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/a"), false).await.unwrap();
    write(&vfs, "/a/f", b"x").await;

    let err = vfs
        .move_to(&path("/a"), &path("/a/b"), OperationFlags::RECURSIVE)
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::InvalidPath(_)));
    assert!(!vfs.exists(&path("/a/b")).await.unwrap());
    assert_eq!(contents(&vfs, "/a/f").await, b"x");
}

#[tokio::test]
async fn copy_directory_onto_itself_is_rejected() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/a"), false).await.unwrap();

    let err = vfs
        .copy(&path("/a"), &path("/a"), OperationFlags::RECURSIVE)
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::InvalidPath(_)));
}

#[tokio::test]
async fn copy_with_parents_creates_ancestors() {
    let vfs = memory_vfs();
    write(&vfs, "/a", b"hi").await;

    let err = vfs
        .copy(&path("/a"), &path("/deep/nested/b"), OperationFlags::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::MissingParent(_)));

    vfs.copy(&path("/a"), &path("/deep/nested/b"), OperationFlags::PARENTS)
        .await
        .unwrap();
    assert_eq!(contents(&vfs, "/deep/nested/b").await, b"hi");
}

#[tokio::test]
async fn copy_across_adapters_streams_bytes() {
    let mut vfs = memory_vfs();
    vfs.mount(path("/remote"), Arc::new(MemoryAdapter::new("remote")))
        .unwrap();
    write(&vfs, "/local-file", b"carried across").await;

    vfs.copy(
        &path("/local-file"),
        &path("/remote/file"),
        OperationFlags::empty(),
    )
    .await
    .unwrap();

    assert_eq!(contents(&vfs, "/remote/file").await, b"carried across");
    assert_eq!(contents(&vfs, "/local-file").await, b"carried across");
}

#[tokio::test]
async fn recursive_copy_honors_nested_mounts() {
    let mut vfs = memory_vfs();
    let inner = Arc::new(MemoryAdapter::new("inner"));
    vfs.mount(path("/dst/sub"), inner.clone()).unwrap();

    vfs.create_directory(&path("/src/sub"), true).await.unwrap();
    write(&vfs, "/src/x", b"root side").await;
    write(&vfs, "/src/sub/file", b"mounted side").await;

    vfs.copy(&path("/src"), &path("/dst"), OperationFlags::RECURSIVE)
        .await
        .unwrap();

    assert_eq!(contents(&vfs, "/dst/x").await, b"root side");
    assert_eq!(contents(&vfs, "/dst/sub/file").await, b"mounted side");
    // the file landed in the mounted adapter, not the root one
    use stratafs_core::Adapter;
    assert!(inner.is_file(&path("/file")).await.unwrap());
}

#[tokio::test]
async fn move_file_within_one_adapter() {
    let vfs = memory_vfs();
    write(&vfs, "/a", b"hello").await;

    vfs.move_to(&path("/a"), &path("/b"), OperationFlags::empty())
        .await
        .unwrap();

    assert!(!vfs.exists(&path("/a")).await.unwrap());
    assert_eq!(contents(&vfs, "/b").await, b"hello");
}

#[tokio::test]
async fn move_directory_within_one_adapter() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/src/sub"), true).await.unwrap();
    write(&vfs, "/src/sub/f", b"deep").await;

    // no RECURSIVE needed when the destination is absent
    vfs.move_to(&path("/src"), &path("/dst"), OperationFlags::empty())
        .await
        .unwrap();

    assert!(!vfs.exists(&path("/src")).await.unwrap());
    assert_eq!(contents(&vfs, "/dst/sub/f").await, b"deep");
}

#[tokio::test]
async fn move_file_across_adapters_removes_source() {
    let mut vfs = memory_vfs();
    vfs.mount(path("/remote"), Arc::new(MemoryAdapter::new("remote")))
        .unwrap();
    write(&vfs, "/a", b"hello").await;

    vfs.move_to(&path("/a"), &path("/remote/a"), OperationFlags::empty())
        .await
        .unwrap();

    assert!(!vfs.exists(&path("/a")).await.unwrap());
    assert_eq!(contents(&vfs, "/remote/a").await, b"hello");
}

#[tokio::test]
async fn move_directory_across_adapters() {
    let mut vfs = memory_vfs();
    vfs.mount(path("/remote"), Arc::new(MemoryAdapter::new("remote")))
        .unwrap();
    vfs.create_directory(&path("/src/sub"), true).await.unwrap();
    write(&vfs, "/src/x", b"1").await;
    write(&vfs, "/src/sub/y", b"2").await;

    vfs.move_to(&path("/src"), &path("/remote/src"), OperationFlags::empty())
        .await
        .unwrap();

    assert!(!vfs.exists(&path("/src")).await.unwrap());
    assert_eq!(contents(&vfs, "/remote/src/x").await, b"1");
    assert_eq!(contents(&vfs, "/remote/src/sub/y").await, b"2");
}

#[tokio::test]
async fn move_of_undeletable_file_reports_source_not_removed() {
    use stratafs_core::Adapter;

    let root = Arc::new(MemoryAdapter::new("root"));
    let mut vfs = Vfs::new(root.clone());
    vfs.mount(path("/remote"), Arc::new(MemoryAdapter::new("remote")))
        .unwrap();
    write(&vfs, "/a", b"pinned").await;
    root.set_mode(&path("/a"), 0o444).await.unwrap();

    let err = vfs
        .move_to(&path("/a"), &path("/remote/a"), OperationFlags::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::SourceNotRemoved(_)));
    // the copy landed but the source stayed behind
    assert_eq!(contents(&vfs, "/remote/a").await, b"pinned");
    assert_eq!(contents(&vfs, "/a").await, b"pinned");
}

#[tokio::test]
async fn move_file_onto_directory_with_merge() {
    let vfs = memory_vfs();
    write(&vfs, "/a", b"hello").await;
    vfs.create_directory(&path("/d"), false).await.unwrap();

    vfs.move_to(&path("/a"), &path("/d"), OperationFlags::MERGE)
        .await
        .unwrap();

    assert!(!vfs.exists(&path("/a")).await.unwrap());
    assert_eq!(contents(&vfs, "/d/a").await, b"hello");
}

#[tokio::test]
async fn delete_non_empty_directory_declines_without_recursive() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/d"), false).await.unwrap();
    write(&vfs, "/d/f", b"x").await;

    assert!(!vfs.delete(&path("/d"), false, false).await.unwrap());
    // directory and contents intact
    assert!(vfs.is_directory(&path("/d")).await.unwrap());
    assert_eq!(contents(&vfs, "/d/f").await, b"x");

    assert!(vfs.delete(&path("/d"), true, false).await.unwrap());
    assert!(!vfs.exists(&path("/d")).await.unwrap());
}

#[tokio::test]
async fn delete_missing_path_is_an_error() {
    let vfs = memory_vfs();
    let err = vfs.delete(&path("/ghost"), false, false).await.unwrap_err();
    assert!(matches!(err, StrataError::NotFound(_)));
}

#[tokio::test]
async fn size_sums_descendant_files_across_mounts() {
    use stratafs_core::Adapter;

    let root = Arc::new(MemoryAdapter::new("root"));
    let mut vfs = Vfs::new(root.clone());
    // placeholder directory so the mount point shows up in listings
    root.create_directory(&path("/top/mnt"), true).await.unwrap();
    vfs.mount(path("/top/mnt"), Arc::new(MemoryAdapter::new("mnt")))
        .unwrap();

    vfs.create_directory(&path("/top/sub"), true).await.unwrap();
    write(&vfs, "/top/a", b"123").await;
    write(&vfs, "/top/sub/b", b"12345").await;
    write(&vfs, "/top/mnt/c", b"1234567").await;

    assert_eq!(vfs.size(&path("/top")).await.unwrap(), 15);
    assert_eq!(vfs.size(&path("/top/a")).await.unwrap(), 3);
}

#[tokio::test]
async fn list_resolves_children() {
    let vfs = memory_vfs();
    vfs.create_directory(&path("/d"), false).await.unwrap();
    write(&vfs, "/d/b", b"").await;
    write(&vfs, "/d/a", b"").await;

    let children = vfs.list(&path("/d")).await.unwrap();
    let names: Vec<_> = children
        .iter()
        .map(|pn| pn.path().name().unwrap().to_string())
        .collect();
    assert_eq!(names, ["a", "b"]);
}
