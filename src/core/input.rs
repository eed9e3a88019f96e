//! File input abstraction for batch scanning.
//!
//! A `FileInput` is one unit of work for multi-file scans: either a named
//! in-memory payload or a path read when the batch reaches it.

use std::path::{Path, PathBuf};

use crate::core::error::{Result, SdkError};

/// A named payload submitted to a batch scan.
///
/// # Examples
///
/// ```rust
/// use clamav_api_sdk::FileInput;
///
/// let upload = FileInput::from_bytes(b"hello".to_vec(), "hello.txt");
/// assert_eq!(upload.filename(), "hello.txt");
///
/// let on_disk = FileInput::from_path("/srv/uploads/report.pdf");
/// assert_eq!(on_disk.filename(), "report.pdf");
/// ```
#[derive(Clone)]
pub enum FileInput {
    /// In-memory bytes with their filename.
    Bytes {
        /// The file data.
        data: Vec<u8>,
        /// Filename sent with the first chunk.
        filename: String,
    },

    /// A file on disk, read when the batch reaches it.
    Path(PathBuf),
}

impl std::fmt::Debug for FileInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes { data, filename } => f
                .debug_struct("Bytes")
                .field("data_len", &data.len())
                .field("filename", filename)
                .finish(),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
        }
    }
}

impl FileInput {
    /// Creates a `FileInput` from bytes and a filename.
    pub fn from_bytes(data: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self::Bytes {
            data: data.into(),
            filename: filename.into(),
        }
    }

    /// Creates a `FileInput` from a file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Returns the filename reported to the service.
    ///
    /// For paths this is the final component, or empty if there is none.
    pub fn filename(&self) -> &str {
        match self {
            Self::Bytes { filename, .. } => filename,
            Self::Path(path) => base_name(path),
        }
    }

    /// Returns the size in bytes, if known without touching the filesystem.
    pub fn size_hint(&self) -> Option<u64> {
        match self {
            Self::Bytes { data, .. } => Some(data.len() as u64),
            Self::Path(_) => None,
        }
    }

    /// Resolves the payload, reading it from disk for path inputs.
    ///
    /// An unreadable path is a `Validation` error.
    pub(crate) async fn into_data(self) -> Result<(Vec<u8>, String)> {
        match self {
            Self::Bytes { data, filename } => Ok((data, filename)),
            Self::Path(path) => {
                let filename = base_name(&path).to_string();
                let data = read_file(&path).await?;
                Ok((data, filename))
            }
        }
    }
}

impl From<PathBuf> for FileInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for FileInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Returns the last path component as UTF-8, or an empty string.
pub(crate) fn base_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Reads a whole file, mapping failures to `Validation`.
pub(crate) async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        SdkError::validation(format!("failed to read file: {}", path.display())).with_source(e)
    })
}

/// Opens a file for streaming, mapping failures to `Validation`.
pub(crate) async fn open_file(path: &Path) -> Result<tokio::fs::File> {
    tokio::fs::File::open(path).await.map_err(|e| {
        SdkError::validation(format!("failed to open file: {}", path.display())).with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_input_from_path() {
        let input = FileInput::from_path("/test/file.exe");
        assert_eq!(input.filename(), "file.exe");
        assert_eq!(input.size_hint(), None);
    }

    #[test]
    fn test_file_input_from_bytes() {
        let input = FileInput::from_bytes(vec![1, 2, 3, 4], "test.bin");
        assert_eq!(input.filename(), "test.bin");
        assert_eq!(input.size_hint(), Some(4));
    }

    #[test]
    fn test_debug_hides_payload() {
        let input = FileInput::from_bytes(vec![0u8; 1024], "big.bin");
        let debug = format!("{:?}", input);
        assert!(debug.contains("data_len: 1024"));
        assert!(!debug.contains("0, 0, 0"));
    }

    #[tokio::test]
    async fn test_into_data_reads_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, b"sample contents").unwrap();

        let (data, filename) = FileInput::from_path(&path).into_data().await.unwrap();
        assert_eq!(data, b"sample contents");
        assert_eq!(filename, "sample.txt");
    }

    #[tokio::test]
    async fn test_into_data_missing_path_is_validation() {
        let err = FileInput::from_path("/definitely/not/here.bin")
            .into_data()
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.message().contains("/definitely/not/here.bin"));
    }
}
