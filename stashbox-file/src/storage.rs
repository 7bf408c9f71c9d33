use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use dashmap::DashMap;
use lazy_static::lazy_static;
use serde_json::{Map, Value};
use stashbox_backend::{DeleteStatus, Storage, StorageResult};
use stashbox_core::{CacheKey, StorageLabel};
use tokio::sync::Mutex;

use crate::FileStorageError;

type Document = Map<String, Value>;

lazy_static! {
    /// One write lock per namespace document, shared by every `FileStorage`
    /// in the process that points at the same directory.
    static ref DOCUMENT_LOCKS: DashMap<PathBuf, Arc<Mutex<()>>> = DashMap::new();
}

fn document_lock(path: &Path) -> Arc<Mutex<()>> {
    DOCUMENT_LOCKS.entry(path.to_path_buf()).or_default().clone()
}

/// Durable storage keeping one JSON document per namespace.
///
/// Namespace `weather` lives in `<dir>/weather.json`, an object mapping each
/// key to its raw cache record. Every mutation rewrites the document through
/// a temporary file and an atomic rename, so readers never observe a torn
/// document.
///
/// ```no_run
/// use stashbox_file::FileStorage;
///
/// let storage = FileStorage::builder()
///     .path("/var/cache/myapp")
///     .build()?;
/// # Ok::<(), stashbox_file::FileStorageError>(())
/// ```
///
/// Cloning is cheap. Mutations of one namespace document are serialized
/// across every instance in the process opened on the same directory. Two
/// separate processes writing the same directory are not coordinated.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: Arc<PathBuf>,
    label: StorageLabel,
}

impl FileStorage {
    /// Starts building a new storage.
    pub fn builder() -> FileStorageBuilder {
        FileStorageBuilder::default()
    }

    /// Directory holding the namespace documents.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document backing `namespace`.
    pub fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", escape_namespace(namespace)))
    }

    async fn load(&self, path: &Path) -> Result<Document, FileStorageError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like `load`, but an undecodable document is replaced instead of
    /// failing the mutation that is about to overwrite it.
    async fn load_for_update(&self, path: &Path) -> Result<Document, FileStorageError> {
        match self.load(path).await {
            Err(FileStorageError::Json(error)) => {
                tracing::warn!(path = %path.display(), %error, "discarding corrupt namespace file");
                Ok(Document::new())
            }
            other => other,
        }
    }

    async fn save(&self, path: &Path, document: &Document) -> Result<(), FileStorageError> {
        if document.is_empty() {
            return remove_file(path).await;
        }
        let bytes = serde_json::to_vec(document)?;
        let dir = Arc::clone(&self.dir);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<(), FileStorageError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&*dir)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| FileStorageError::Io(std::io::Error::other(e)))?
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn read(&self, key: &CacheKey) -> StorageResult<Option<String>> {
        let path = self.namespace_path(key.namespace());
        let document = self.load(&path).await?;
        Ok(document
            .get(key.key())
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    async fn write(&self, key: &CacheKey, value: String) -> StorageResult<()> {
        let path = self.namespace_path(key.namespace());
        let lock = document_lock(&path);
        let _guard = lock.lock().await;
        let mut document = self.load_for_update(&path).await?;
        document.insert(key.key().to_string(), Value::String(value));
        self.save(&path, &document).await?;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> StorageResult<DeleteStatus> {
        let path = self.namespace_path(key.namespace());
        let lock = document_lock(&path);
        let _guard = lock.lock().await;
        let mut document = self.load_for_update(&path).await?;
        if document.remove(key.key()).is_none() {
            return Ok(DeleteStatus::Missing);
        }
        self.save(&path, &document).await?;
        Ok(DeleteStatus::Deleted(1))
    }

    async fn clear(&self, namespace: &str) -> StorageResult<u64> {
        let path = self.namespace_path(namespace);
        let lock = document_lock(&path);
        let _guard = lock.lock().await;
        let removed = self.load_for_update(&path).await?.len() as u64;
        remove_file(&path).await?;
        tracing::debug!(namespace, removed, "cleared namespace file");
        Ok(removed)
    }

    fn label(&self) -> StorageLabel {
        self.label.clone()
    }
}

async fn remove_file(path: &Path) -> Result<(), FileStorageError> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Maps a namespace onto a safe file stem.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes
/// `%XX`. Distinct namespaces therefore never share a file.
fn escape_namespace(namespace: &str) -> String {
    let mut out = String::with_capacity(namespace.len());
    for byte in namespace.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    if out.is_empty() {
        out.push('%');
    }
    out
}

/// Builder for [`FileStorage`].
#[derive(Debug)]
pub struct FileStorageBuilder {
    path: Option<PathBuf>,
    label: StorageLabel,
}

impl Default for FileStorageBuilder {
    fn default() -> Self {
        Self {
            path: None,
            label: StorageLabel::new_static("file"),
        }
    }
}

impl FileStorageBuilder {
    /// Directory for namespace documents. Created on `build()` if missing.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Identifies this storage in metrics. Default: `"file"`.
    pub fn label(mut self, label: impl Into<StorageLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Creates the storage.
    ///
    /// Fails if no path was given, or the directory can't be created. The
    /// directory is canonicalized so instances opened through different
    /// spellings of one path share their document locks.
    pub fn build(self) -> Result<FileStorage, FileStorageError> {
        let dir = self
            .path
            .ok_or_else(|| FileStorageError::InvalidConfig("path is required".into()))?;
        if dir.exists() && !dir.is_dir() {
            return Err(FileStorageError::InvalidConfig(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        std::fs::create_dir_all(&dir)?;
        let dir = std::fs::canonicalize(&dir)?;

        Ok(FileStorage {
            dir: Arc::new(dir),
            label: self.label,
        })
    }
}
