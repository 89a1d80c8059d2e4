//! File storage behind a transfer.
//!
//! A read session opens a byte source and learns its length up front; a write
//! session opens a byte sink that truncates any existing file. Handles are
//! plain owned values, so they close on every exit path when dropped.

use std::{
    collections::HashMap,
    io::{self, Cursor},
    path::{Component, Path, PathBuf},
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Where transferred files come from and go to.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Byte source for read sessions.
    type Reader: AsyncRead + Unpin + Send;

    /// Byte sink for write sessions.
    type Writer: AsyncWrite + Unpin + Send;

    /// Open `filename` for reading, returning the source and its length.
    ///
    /// A missing file must fail with [`io::ErrorKind::NotFound`].
    async fn open_read(&self, filename: &str) -> io::Result<(Self::Reader, u64)>;

    /// Create or truncate `filename` for writing.
    async fn open_write(&self, filename: &str) -> io::Result<Self::Writer>;
}

/// In-memory file table.
///
/// Clones share the same table, so a test can keep a handle and inspect what
/// a session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&self, filename: impl Into<String>, contents: impl Into<Vec<u8>>) {
        lock(&self.files).insert(filename.into(), contents.into());
    }

    /// Current contents of a file.
    pub fn get(&self, filename: &str) -> Option<Vec<u8>> {
        lock(&self.files).get(filename).cloned()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        lock(&self.files).len()
    }

    /// Whether the store has no files.
    pub fn is_empty(&self) -> bool {
        lock(&self.files).is_empty()
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    type Reader = Cursor<Vec<u8>>;
    type Writer = MemoryWriter;

    async fn open_read(&self, filename: &str) -> io::Result<(Self::Reader, u64)> {
        let contents = self.get(filename).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {filename}"))
        })?;
        let len = contents.len() as u64;
        Ok((Cursor::new(contents), len))
    }

    async fn open_write(&self, filename: &str) -> io::Result<Self::Writer> {
        self.insert(filename, Vec::new());
        Ok(MemoryWriter { files: Arc::clone(&self.files), filename: filename.to_string() })
    }
}

/// Sink appending to one file of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryWriter {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    filename: String,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        lock(&self.files).entry(self.filename.clone()).or_default().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn lock(files: &Mutex<HashMap<String, Vec<u8>>>) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
    files.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Files under a root directory.
///
/// Request filenames are resolved relative to the root. Absolute paths and
/// `..` components are refused so a peer cannot reach outside it.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Serve files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, filename: &str) -> io::Result<PathBuf> {
        if filename.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty filename"));
        }

        let path = Path::new(filename);
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{filename} resolves outside the served directory"),
            ));
        }

        Ok(self.root.join(path))
    }
}

#[async_trait]
impl FileStore for DirStore {
    type Reader = tokio::fs::File;
    type Writer = tokio::fs::File;

    async fn open_read(&self, filename: &str) -> io::Result<(Self::Reader, u64)> {
        let path = self.resolve(filename)?;
        let file = tokio::fs::File::open(&path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{filename} is not a regular file"),
            ));
        }
        Ok((file, metadata.len()))
    }

    async fn open_write(&self, filename: &str) -> io::Result<Self::Writer> {
        let path = self.resolve(filename)?;
        tokio::fs::File::create(&path).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn memory_round_trip() {
        let store = MemoryStore::new();
        let mut writer = store.open_write("a.bin").await.unwrap();
        writer.write_all(b"hello ").await.unwrap();
        writer.write_all(b"world").await.unwrap();
        writer.flush().await.unwrap();
        assert_eq!(store.get("a.bin").unwrap(), b"hello world");

        let (mut reader, len) = store.open_read("a.bin").await.unwrap();
        assert_eq!(len, 11);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello world");
    }

    #[tokio::test]
    async fn memory_write_truncates() {
        let store = MemoryStore::new();
        store.insert("a.bin", b"old contents".to_vec());
        let _writer = store.open_write("a.bin").await.unwrap();
        assert_eq!(store.get("a.bin").unwrap(), b"");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn memory_missing_file_is_not_found() {
        let store = MemoryStore::new();
        let err = store.open_read("nope").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn dir_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());

        let mut writer = store.open_write("boot.img").await.unwrap();
        writer.write_all(&[1, 2, 3]).await.unwrap();
        writer.flush().await.unwrap();
        drop(writer);

        let (mut reader, len) = store.open_read("boot.img").await.unwrap();
        assert_eq!(len, 3);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, [1, 2, 3]);
    }

    #[tokio::test]
    async fn dir_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let err = store.open_read("missing.bin").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn dir_refuses_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().join("root"));

        for name in ["../secret", "a/../../secret", "/etc/passwd", ""] {
            assert!(store.open_read(name).await.is_err(), "{name:?} should be refused");
            assert!(store.open_write(name).await.is_err(), "{name:?} should be refused");
        }
    }

    #[tokio::test]
    async fn dir_refuses_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let store = DirStore::new(dir.path());
        assert!(store.open_read("sub").await.is_err());
    }
}
