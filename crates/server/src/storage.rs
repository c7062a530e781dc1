//! Flat storage directory.
//!
//! There is no index: a stored file exists if the directory holds it, and
//! listings come from enumerating the directory.

use std::path::{Path, PathBuf};

use lanshare_protocol::FileEntry;
use lanshare_transfer::{
    ChunkedReader, ChunkedWriter, TransferError, detect_content_type, sanitize,
    validate_stored_name,
};
use tokio::io::AsyncRead;
use tracing::{debug, info};

/// A file persisted in the storage directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Sanitized name, also the file name on disk.
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
    pub content_type: &'static str,
}

impl From<StoredFile> for FileEntry {
    fn from(file: StoredFile) -> Self {
        Self {
            filename: file.filename,
            size: file.size,
            content_type: file.content_type.into(),
        }
    }
}

/// Storage directory plus the chunk size used to read and write it.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
    chunk_size: usize,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            dir: dir.into(),
            chunk_size,
        }
    }

    /// Storage directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the storage directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Persists `reader` under a name derived from `original_name`.
    ///
    /// An existing file with the same generated name is overwritten.
    pub async fn store<R>(
        &self,
        original_name: &str,
        reader: R,
    ) -> Result<StoredFile, TransferError>
    where
        R: AsyncRead,
    {
        let filename = sanitize(original_name);
        let path = self.dir.join(&filename);

        let size = ChunkedWriter::new(self.chunk_size)
            .write(&path, reader)
            .await?;

        info!(original = %original_name, stored = %filename, size, "file stored");
        Ok(StoredFile {
            content_type: detect_content_type(&filename),
            filename,
            path,
            size,
        })
    }

    /// Opens a stored file for chunked reading.
    pub async fn open(&self, filename: &str) -> Result<(StoredFile, ChunkedReader), TransferError> {
        validate_stored_name(filename)?;

        let path = self.dir.join(filename);
        let reader = ChunkedReader::open(&path, self.chunk_size).await?;
        debug!(path = %path.display(), size = reader.file_size(), "stored file opened");

        let file = StoredFile {
            filename: filename.to_string(),
            path,
            size: reader.file_size(),
            content_type: reader.content_type(),
        };
        Ok((file, reader))
    }

    /// Lists regular files in the storage directory, sorted by name.
    pub async fn list(&self) -> Result<Vec<StoredFile>, TransferError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            files.push(StoredFile {
                content_type: detect_content_type(&filename),
                path: entry.path(),
                size: metadata.len(),
                filename,
            });
        }

        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> Storage {
        Storage::new(dir.path(), 4)
    }

    #[tokio::test]
    async fn store_sanitizes_and_writes() {
        let dir = TempDir::new().unwrap();
        let stored = storage(&dir)
            .store("My Report (final).pdf", &b"%PDF-1.7 body"[..])
            .await
            .unwrap();

        assert!(stored.filename.starts_with("My_Report_final_"));
        assert!(stored.filename.ends_with(".pdf"));
        assert_eq!(stored.size, 13);
        assert_eq!(stored.content_type, "application/pdf");
        assert_eq!(stored.path, dir.path().join(&stored.filename));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"%PDF-1.7 body");
    }

    #[tokio::test]
    async fn store_empty_file() {
        let dir = TempDir::new().unwrap();
        let stored = storage(&dir).store("empty.txt", &b""[..]).await.unwrap();
        assert_eq!(stored.size, 0);
        assert_eq!(std::fs::metadata(&stored.path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn store_traversal_name_stays_inside() {
        let dir = TempDir::new().unwrap();
        let stored = storage(&dir)
            .store("../../escape.sh", &b"echo"[..])
            .await
            .unwrap();
        assert_eq!(stored.path.parent().unwrap(), dir.path());
        assert!(stored.filename.starts_with("escape_"));
    }

    #[tokio::test]
    async fn open_returns_metadata_and_reader() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"0123456789").unwrap();

        let (file, mut reader) = storage(&dir).open("notes.txt").await.unwrap();
        assert_eq!(file.size, 10);
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(reader.next_chunk().await.unwrap().unwrap(), &b"0123"[..]);
    }

    #[tokio::test]
    async fn open_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = storage(&dir).open("ghost.bin").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn open_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let err = storage(&dir).open("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, TransferError::InvalidName(_)));
    }

    #[tokio::test]
    async fn list_skips_directories_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let files = storage(&dir).list().await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.txt"]);
        assert_eq!(files[0].content_type, "image/png");
        assert_eq!(files[1].size, 2);
    }

    #[tokio::test]
    async fn ensure_dir_creates_nested() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("a/b/shared"), 0);
        storage.ensure_dir().await.unwrap();
        assert!(storage.dir().is_dir());
        assert!(storage.list().await.unwrap().is_empty());
    }
}
