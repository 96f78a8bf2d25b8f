//! Local filesystem backend

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use stratafs_core::{
    read_to_bytes, Adapter, AdapterConfig, ByteStream, StrataError, StrataResult, VirtualPath,
};
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Read-stream chunk size in bytes.
const READ_CHUNK: usize = 64 * 1024;

/// Local filesystem backend rooted at a base directory
pub struct LocalAdapter {
    name: String,
    root: PathBuf,
}

impl LocalAdapter {
    /// Construct against an immutable configuration. The base path must
    /// be an existing directory unless the configuration asks for it to
    /// be created.
    pub fn new(name: impl Into<String>, config: &AdapterConfig) -> StrataResult<Self> {
        let root = PathBuf::from(config.root());
        if !root.is_dir() {
            if config.create_root() {
                std::fs::create_dir_all(&root).map_err(|err| {
                    StrataError::Configuration(format!(
                        "could not create base path {}: {err}",
                        root.display()
                    ))
                })?;
            } else {
                return Err(StrataError::Configuration(format!(
                    "base path is not a directory: {}",
                    root.display()
                )));
            }
        }
        let name = name.into();
        tracing::debug!(adapter = %name, root = %root.display(), "local adapter ready");
        Ok(Self { name, root })
    }

    fn real(&self, path: &VirtualPath) -> PathBuf {
        let mut real = self.root.clone();
        for seg in path.segments() {
            real.push(seg);
        }
        real
    }

    fn wrap(&self, path: &VirtualPath, what: &str, err: std::io::Error) -> StrataError {
        StrataError::adapter_io(path, format!("could not {what}"), err)
    }

    async fn open_if_exists(
        &self,
        path: &VirtualPath,
        real: &Path,
    ) -> StrataResult<Option<fs::File>> {
        match fs::File::open(real).await {
            Ok(file) => Ok(Some(file)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.wrap(path, "open", err)),
        }
    }
}

#[async_trait]
impl Adapter for LocalAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &VirtualPath) -> StrataResult<bool> {
        fs::try_exists(self.real(path))
            .await
            .map_err(|err| self.wrap(path, "get exists state", err))
    }

    async fn is_file(&self, path: &VirtualPath) -> StrataResult<bool> {
        match fs::metadata(self.real(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.wrap(path, "stat", err)),
        }
    }

    async fn is_directory(&self, path: &VirtualPath) -> StrataResult<bool> {
        match fs::metadata(self.real(path)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.wrap(path, "stat", err)),
        }
    }

    async fn is_link(&self, path: &VirtualPath) -> StrataResult<bool> {
        match fs::symlink_metadata(self.real(path)).await {
            Ok(meta) => Ok(meta.file_type().is_symlink()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.wrap(path, "stat", err)),
        }
    }

    async fn file_size(&self, path: &VirtualPath) -> StrataResult<u64> {
        let meta = fs::metadata(self.real(path)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StrataError::NotFound(path.to_string())
            } else {
                self.wrap(path, "stat", err)
            }
        })?;
        if meta.is_dir() {
            return Err(StrataError::NotAFile(path.to_string()));
        }
        Ok(meta.len())
    }

    #[cfg(unix)]
    async fn owner(&self, path: &VirtualPath) -> StrataResult<u32> {
        use std::os::unix::fs::MetadataExt;
        let meta = fs::metadata(self.real(path))
            .await
            .map_err(|err| self.wrap(path, "get owner", err))?;
        Ok(meta.uid())
    }

    #[cfg(unix)]
    async fn group(&self, path: &VirtualPath) -> StrataResult<u32> {
        use std::os::unix::fs::MetadataExt;
        let meta = fs::metadata(self.real(path))
            .await
            .map_err(|err| self.wrap(path, "get group", err))?;
        Ok(meta.gid())
    }

    #[cfg(unix)]
    async fn mode(&self, path: &VirtualPath) -> StrataResult<u32> {
        use std::os::unix::fs::MetadataExt;
        let meta = fs::metadata(self.real(path))
            .await
            .map_err(|err| self.wrap(path, "get mode", err))?;
        Ok(meta.mode() & 0o7777)
    }

    #[cfg(unix)]
    async fn set_mode(&self, path: &VirtualPath, mode: u32) -> StrataResult<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(self.real(path), std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|err| self.wrap(path, "set mode", err))
    }

    async fn access_time(&self, path: &VirtualPath) -> StrataResult<DateTime<Utc>> {
        let meta = fs::metadata(self.real(path))
            .await
            .map_err(|err| self.wrap(path, "get access time", err))?;
        meta.accessed()
            .map(DateTime::<Utc>::from)
            .map_err(|_| StrataError::Unsupported(format!("{}: access time", self.name)))
    }

    async fn modify_time(&self, path: &VirtualPath) -> StrataResult<DateTime<Utc>> {
        let meta = fs::metadata(self.real(path))
            .await
            .map_err(|err| self.wrap(path, "get modify time", err))?;
        meta.modified()
            .map(DateTime::<Utc>::from)
            .map_err(|_| StrataError::Unsupported(format!("{}: modify time", self.name)))
    }

    async fn creation_time(&self, path: &VirtualPath) -> StrataResult<DateTime<Utc>> {
        let meta = fs::metadata(self.real(path))
            .await
            .map_err(|err| self.wrap(path, "get creation time", err))?;
        meta.created()
            .map(DateTime::<Utc>::from)
            .map_err(|_| StrataError::Unsupported(format!("{}: creation time", self.name)))
    }

    async fn list(&self, path: &VirtualPath) -> StrataResult<Vec<String>> {
        let real = self.real(path);
        let mut read_dir = fs::read_dir(&real).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StrataError::NotFound(path.to_string())
            } else {
                self.wrap(path, "list", err)
            }
        })?;
        let mut names = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|err| self.wrap(path, "list", err))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn create_directory(&self, path: &VirtualPath, parents: bool) -> StrataResult<()> {
        let real = self.real(path);
        match fs::metadata(&real).await {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => return Err(StrataError::NotADirectory(path.to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(self.wrap(path, "stat", err)),
        }
        let result = if parents {
            fs::create_dir_all(&real).await
        } else {
            fs::create_dir(&real).await
        };
        result.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StrataError::MissingParent(
                    path.parent().unwrap_or_else(VirtualPath::root).to_string(),
                )
            } else {
                self.wrap(path, "create directory", err)
            }
        })
    }

    async fn create_file(&self, path: &VirtualPath, parents: bool) -> StrataResult<()> {
        let real = self.real(path);
        if parents {
            if let Some(parent) = real.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|err| self.wrap(path, "create parent directories", err))?;
            }
        }
        match fs::metadata(&real).await {
            Ok(meta) if meta.is_dir() => return Err(StrataError::NotAFile(path.to_string())),
            Ok(_) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(self.wrap(path, "stat", err)),
        }
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&real)
            .await
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    StrataError::MissingParent(
                        path.parent().unwrap_or_else(VirtualPath::root).to_string(),
                    )
                } else {
                    self.wrap(path, "create file", err)
                }
            })?;
        Ok(())
    }

    async fn delete(&self, path: &VirtualPath, recursive: bool, force: bool) -> StrataResult<bool> {
        let real = self.real(path);
        let meta = fs::metadata(&real).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StrataError::NotFound(path.to_string())
            } else {
                self.wrap(path, "stat", err)
            }
        })?;

        if meta.is_dir() {
            if recursive {
                fs::remove_dir_all(&real)
                    .await
                    .map_err(|err| self.wrap(path, "delete directory", err))?;
                return Ok(true);
            }
            let mut read_dir = fs::read_dir(&real)
                .await
                .map_err(|err| self.wrap(path, "list", err))?;
            if read_dir
                .next_entry()
                .await
                .map_err(|err| self.wrap(path, "list", err))?
                .is_some()
            {
                return Ok(false);
            }
            fs::remove_dir(&real)
                .await
                .map_err(|err| self.wrap(path, "delete directory", err))?;
            return Ok(true);
        }

        if meta.permissions().readonly() {
            if !force {
                return Ok(false);
            }
            // clear the restriction and retry once
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&real, std::fs::Permissions::from_mode(0o666))
                    .await
                    .map_err(|err| self.wrap(path, "make file writable", err))?;
            }
            #[cfg(not(unix))]
            {
                let mut perms = meta.permissions();
                perms.set_readonly(false);
                fs::set_permissions(&real, perms)
                    .await
                    .map_err(|err| self.wrap(path, "make file writable", err))?;
            }
        }
        fs::remove_file(&real)
            .await
            .map_err(|err| self.wrap(path, "delete file", err))?;
        Ok(true)
    }

    async fn read(&self, path: &VirtualPath) -> StrataResult<ByteStream> {
        let real = self.real(path);
        let file = self
            .open_if_exists(path, &real)
            .await?
            .ok_or_else(|| StrataError::NotFound(path.to_string()))?;
        let meta = file
            .metadata()
            .await
            .map_err(|err| self.wrap(path, "stat", err))?;
        if meta.is_dir() {
            return Err(StrataError::NotAFile(path.to_string()));
        }
        let display = path.to_string();
        let stream = futures::stream::unfold(Some(file), move |state| {
            let display = display.clone();
            async move {
                let mut file = state?;
                let mut buf = vec![0u8; READ_CHUNK];
                match file.read(&mut buf).await {
                    Ok(0) => None,
                    Ok(n) => {
                        buf.truncate(n);
                        Some((Ok(Bytes::from(buf)), Some(file)))
                    }
                    Err(err) => Some((
                        Err(StrataError::adapter_io(&display, "could not read", err)),
                        None,
                    )),
                }
            }
        });
        Ok(Box::pin(stream))
    }

    async fn write_stream(&self, path: &VirtualPath, stream: ByteStream) -> StrataResult<u64> {
        let data = read_to_bytes(stream).await?;
        let len = data.len() as u64;
        self.write(path, data).await?;
        Ok(len)
    }

    async fn write(&self, path: &VirtualPath, data: Bytes) -> StrataResult<()> {
        fs::write(self.real(path), &data)
            .await
            .map_err(|err| self.wrap(path, "write", err))
    }

    async fn append(&self, path: &VirtualPath, data: Bytes) -> StrataResult<()> {
        use tokio::io::AsyncWriteExt;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.real(path))
            .await
            .map_err(|err| self.wrap(path, "open for append", err))?;
        file.write_all(&data)
            .await
            .map_err(|err| self.wrap(path, "append", err))?;
        file.flush()
            .await
            .map_err(|err| self.wrap(path, "append", err))
    }

    async fn truncate(&self, path: &VirtualPath, len: u64) -> StrataResult<()> {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(self.real(path))
            .await
            .map_err(|err| self.wrap(path, "open for truncate", err))?;
        file.set_len(len)
            .await
            .map_err(|err| self.wrap(path, "truncate", err))
    }

    async fn copy_native(&self, src: &VirtualPath, dst: &VirtualPath) -> StrataResult<bool> {
        fs::copy(self.real(src), self.real(dst))
            .await
            .map_err(|err| self.wrap(src, "copy", err))?;
        Ok(true)
    }

    async fn rename_native(&self, src: &VirtualPath, dst: &VirtualPath) -> StrataResult<bool> {
        fs::rename(self.real(src), self.real(dst))
            .await
            .map_err(|err| self.wrap(src, "rename", err))?;
        Ok(true)
    }
}
