//! Error types for StrataFS

use thiserror::Error;

/// Result type alias
pub type StrataResult<T> = Result<T, StrataError>;

/// Main error type
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Adapter failure at {path}: {message}")]
    Adapter {
        path: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Missing parent directory: {0}")]
    MissingParent(String),

    #[error("Cannot overwrite directory {dst} with file {src}")]
    FileOverwriteDirectory { src: String, dst: String },

    #[error("Cannot overwrite file {dst} with directory {src}")]
    DirectoryOverwriteFile { src: String, dst: String },

    #[error("Cannot overwrite directory {dst} with directory {src}")]
    DirectoryOverwriteDirectory { src: String, dst: String },

    #[error("Cannot overwrite file {dst} with file {src}")]
    FileOverwriteFile { src: String, dst: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Copy completed but source was not removed: {0}")]
    SourceNotRemoved(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StrataError {
    /// Adapter failure without an underlying cause.
    pub fn adapter(path: impl ToString, message: impl Into<String>) -> Self {
        StrataError::Adapter {
            path: path.to_string(),
            message: message.into(),
            source: None,
        }
    }

    /// Adapter failure wrapping a backend error.
    pub fn adapter_io(
        path: impl ToString,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StrataError::Adapter {
            path: path.to_string(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Conflict-matrix outcome that the active flags did not resolve.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StrataError::FileOverwriteDirectory { .. }
                | StrataError::DirectoryOverwriteFile { .. }
                | StrataError::DirectoryOverwriteDirectory { .. }
                | StrataError::FileOverwriteFile { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_conflict() {
        let err = StrataError::FileOverwriteDirectory {
            src: "/a".into(),
            dst: "/d".into(),
        };
        assert!(err.is_conflict());

        let err = StrataError::FileOverwriteFile {
            src: "/a".into(),
            dst: "/b".into(),
        };
        assert!(err.is_conflict());

        assert!(!StrataError::NotFound("/a".into()).is_conflict());
        assert!(!StrataError::MissingParent("/a".into()).is_conflict());
    }

    #[test]
    fn test_error_display() {
        let err = StrataError::MissingParent("/a/b".into());
        assert_eq!(format!("{}", err), "Missing parent directory: /a/b");

        let err = StrataError::adapter("/x", "could not stat");
        assert_eq!(format!("{}", err), "Adapter failure at /x: could not stat");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StrataError = io_err.into();
        assert!(matches!(err, StrataError::Io(_)));
    }

    #[test]
    fn test_adapter_io_carries_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StrataError::adapter_io("/x", "could not delete", io_err);
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }
}
