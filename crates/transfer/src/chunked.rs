use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::Stream;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::{DEFAULT_CHUNK_SIZE, TransferError, detect_content_type};

fn effective_chunk_size(chunk_size: usize) -> usize {
    if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    }
}

/// Reads from `reader` until `buf` is full or the stream ends.
///
/// Returns the number of bytes placed in `buf`; 0 means end of stream.
async fn fill_chunk<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

// ---------------------------------------------------------------------------
// ChunkedWriter
// ---------------------------------------------------------------------------

/// Persists an inbound byte stream one fixed-size chunk at a time.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedWriter {
    chunk_size: usize,
}

impl Default for ChunkedWriter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkedWriter {
    /// Creates a writer. If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: effective_chunk_size(chunk_size),
        }
    }

    /// Chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Streams `reader` into `destination`, truncating any existing content.
    ///
    /// Returns the total bytes written. On error the destination is left
    /// partially written; removing it is up to the caller.
    pub async fn write<R>(&self, destination: &Path, reader: R) -> Result<u64, TransferError>
    where
        R: AsyncRead,
    {
        self.write_with_progress(destination, reader, |_| {}).await
    }

    /// Like [`write`](Self::write), calling `on_chunk` with the running byte
    /// total after every chunk is persisted.
    pub async fn write_with_progress<R, F>(
        &self,
        destination: &Path,
        reader: R,
        mut on_chunk: F,
    ) -> Result<u64, TransferError>
    where
        R: AsyncRead,
        F: FnMut(u64),
    {
        let mut reader = std::pin::pin!(reader);
        let mut file = File::create(destination).await?;
        let mut buf = vec![0u8; self.chunk_size];
        let mut written: u64 = 0;

        let copied = copy_chunks(
            &mut reader,
            &mut file,
            &mut buf,
            &mut written,
            &mut on_chunk,
        )
        .await;
        // Settle in-flight writes even on failure so the partial file is on disk.
        let flushed = file.flush().await;
        copied?;
        flushed?;

        debug!(path = %destination.display(), bytes = written, "chunked write finished");
        Ok(written)
    }
}

async fn copy_chunks<R, F>(
    reader: &mut R,
    file: &mut File,
    buf: &mut [u8],
    written: &mut u64,
    on_chunk: &mut F,
) -> io::Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
    F: FnMut(u64),
{
    loop {
        let n = fill_chunk(reader, buf).await?;
        if n == 0 {
            return Ok(());
        }
        file.write_all(&buf[..n]).await?;
        *written += n as u64;
        on_chunk(*written);
    }
}

// ---------------------------------------------------------------------------
// ChunkedReader
// ---------------------------------------------------------------------------

/// Lazy, finite sequence of fixed-size chunks read from a file.
///
/// Each [`open`](Self::open) starts again from byte 0; only the current
/// chunk is held in memory.
#[derive(Debug)]
pub struct ChunkedReader {
    file: File,
    path: PathBuf,
    chunk_size: usize,
    file_size: u64,
    offset: u64,
}

impl ChunkedReader {
    /// Opens `path` for chunked reading.
    ///
    /// Fails with [`TransferError::NotFound`] unless `path` is an existing
    /// regular file. If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let not_found = || TransferError::NotFound(path.display().to_string());

        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let file = File::open(path).await?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_size: effective_chunk_size(chunk_size),
            file_size: metadata.len(),
            offset: 0,
        })
    }

    /// Reads the next chunk. Returns `None` at end of file.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransferError> {
        Ok(self.read_next().await?)
    }

    async fn read_next(&mut self) -> io::Result<Option<Bytes>> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }

        let read_size = remaining.min(self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; read_size];
        let n = fill_chunk(&mut self.file, &mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        self.offset += n as u64;
        Ok(Some(Bytes::from(buf)))
    }

    /// Converts the reader into a byte stream suitable for HTTP bodies.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        futures_util::stream::try_unfold(self, |mut reader| async move {
            Ok(reader.read_next().await?.map(|chunk| (chunk, reader)))
        })
    }

    /// Content-type hint derived from the file extension.
    pub fn content_type(&self) -> &'static str {
        detect_content_type(&self.path)
    }

    /// File size in bytes, as of `open`.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.offset)
    }

    /// Chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Path this reader was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures_util::TryStreamExt;
    use tempfile::TempDir;
    use tokio::io::ReadBuf;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    async fn collect_chunks(path: &Path, chunk_size: usize) -> Vec<Bytes> {
        let mut reader = ChunkedReader::open(path, chunk_size).await.unwrap();
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().await.unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    /// Yields an error on every read.
    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "peer went away",
            )))
        }
    }

    #[tokio::test]
    async fn reader_reads_all() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"AABBCCDDEE");

        let mut reader = ChunkedReader::open(&path, 4).await.unwrap();
        assert_eq!(reader.file_size(), 10);
        assert_eq!(reader.remaining(), 10);

        assert_eq!(reader.next_chunk().await.unwrap().unwrap(), &b"AABB"[..]);
        assert_eq!(reader.offset(), 4);
        assert_eq!(reader.next_chunk().await.unwrap().unwrap(), &b"CCDD"[..]);
        assert_eq!(reader.next_chunk().await.unwrap().unwrap(), &b"EE"[..]);
        assert!(reader.next_chunk().await.unwrap().is_none());
        assert_eq!(reader.remaining(), 0);
    }

    #[tokio::test]
    async fn reader_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = ChunkedReader::open(&dir.path().join("ghost.txt"), 4).await;
        assert!(matches!(result, Err(TransferError::NotFound(_))));
    }

    #[tokio::test]
    async fn reader_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = ChunkedReader::open(dir.path(), 4).await;
        assert!(matches!(result, Err(TransferError::NotFound(_))));
    }

    #[tokio::test]
    async fn reader_reopen_yields_identical_sequence() {
        let dir = TempDir::new().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let path = create_test_file(dir.path(), "cycle.bin", &data);

        let first = collect_chunks(&path, 1024).await;
        let second = collect_chunks(&path, 1024).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert_eq!(first.concat(), data);
    }

    #[tokio::test]
    async fn reader_empty_file_has_no_chunks() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "empty.txt", b"");
        assert!(collect_chunks(&path, 4).await.is_empty());
    }

    #[tokio::test]
    async fn reader_default_chunk_size() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "one.bin", b"x");
        let reader = ChunkedReader::open(&path, 0).await.unwrap();
        assert_eq!(reader.chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[tokio::test]
    async fn reader_content_type_from_extension() {
        let dir = TempDir::new().unwrap();
        let pdf = create_test_file(dir.path(), "doc.pdf", b"%PDF");
        let raw = create_test_file(dir.path(), "blob", b"raw");
        assert_eq!(
            ChunkedReader::open(&pdf, 0).await.unwrap().content_type(),
            "application/pdf"
        );
        assert_eq!(
            ChunkedReader::open(&raw, 0).await.unwrap().content_type(),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn reader_stream_yields_chunks() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "s.bin", b"0123456789");
        let reader = ChunkedReader::open(&path, 3).await.unwrap();

        let chunks: Vec<Bytes> = reader.into_stream().try_collect().await.unwrap();
        let sizes: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(chunks.concat(), b"0123456789");
    }

    #[tokio::test]
    async fn writer_reports_running_totals_per_chunk() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let writer = ChunkedWriter::new(4);

        let mut seen = Vec::new();
        let written = writer
            .write_with_progress(&dest, &b"Hello World"[..], |n| seen.push(n))
            .await
            .unwrap();

        assert_eq!(written, 11);
        assert_eq!(seen, vec![4, 8, 11]);
        assert_eq!(std::fs::read(&dest).unwrap(), b"Hello World");
    }

    #[tokio::test]
    async fn writer_truncates_existing_content() {
        let dir = TempDir::new().unwrap();
        let dest = create_test_file(dir.path(), "out.txt", b"a much longer previous body");

        let written = ChunkedWriter::default()
            .write(&dest, &b"short"[..])
            .await
            .unwrap();

        assert_eq!(written, 5);
        assert_eq!(std::fs::read(&dest).unwrap(), b"short");
    }

    #[tokio::test]
    async fn writer_empty_stream_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("zero.bin");

        let mut calls = 0;
        let written = ChunkedWriter::new(8)
            .write_with_progress(&dest, &b""[..], |_| calls += 1)
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(calls, 0);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn writer_read_error_leaves_partial_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("partial.bin");
        let source = (&b"abcd"[..]).chain(BrokenReader);

        let result = ChunkedWriter::new(2).write(&dest, source).await;

        assert!(matches!(result, Err(TransferError::Io(_))));
        assert_eq!(std::fs::read(&dest).unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn writer_missing_parent_is_io_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("no/such/dir/file.bin");
        let err = ChunkedWriter::default()
            .write(&dest, &b"data"[..])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn reader_writer_roundtrip() {
        let dir = TempDir::new().unwrap();
        let original = b"The quick brown fox jumps over the lazy dog";
        let src = create_test_file(dir.path(), "src.txt", original);
        let dst = dir.path().join("dst.txt");

        let file = File::open(&src).await.unwrap();
        let written = ChunkedWriter::new(10).write(&dst, file).await.unwrap();

        assert_eq!(written, original.len() as u64);
        assert_eq!(collect_chunks(&dst, 10).await.concat(), original);
    }
}
