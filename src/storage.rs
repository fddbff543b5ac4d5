use async_trait::async_trait;
use axum::body::Bytes;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Prefix of every stored image reference, relative to the public directory.
pub const IMAGE_PREFIX: &str = "images";

// 1. ImageStore Contract
/// ImageStore
///
/// Owns the book cover files. References handed out are relative paths of the
/// form `images/<uuid>.<ext>`, which is also the URL path they are served under.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists `bytes` under a fresh unique name and returns its reference.
    async fn save(&self, extension: &str, bytes: Bytes) -> AppResult<String>;

    /// Deletes the file behind `reference`. Missing files are an error; callers
    /// that only clean up log and ignore it.
    async fn remove(&self, reference: &str) -> AppResult<()>;
}

/// StorageState
///
/// The concrete type used to share the image store across the application state.
pub type StorageState = Arc<dyn ImageStore>;

fn unique_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension)
}

/// file_name_of
///
/// Reduces a reference to its final path component so a crafted reference such
/// as `images/../../etc/passwd` can never point outside the images directory.
fn file_name_of(reference: &str) -> Option<&str> {
    Path::new(reference)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| *name != ".." && *name != ".")
}

// 2. Disk Implementation
/// LocalImageStore
///
/// Writes images into a directory on the local filesystem, creating it on demand.
#[derive(Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, extension: &str, bytes: Bytes) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = unique_name(extension);
        tokio::fs::write(self.dir.join(&name), &bytes).await?;
        tracing::debug!(file = %name, size = bytes.len(), "image stored");

        Ok(format!("{IMAGE_PREFIX}/{name}"))
    }

    async fn remove(&self, reference: &str) -> AppResult<()> {
        let name = file_name_of(reference)
            .ok_or_else(|| AppError::Internal(format!("invalid image reference `{reference}`")))?;
        tokio::fs::remove_file(self.dir.join(name)).await?;
        tracing::debug!(file = %name, "image removed");
        Ok(())
    }
}

// 3. In-Memory Implementation (For Tests)
/// MockImageStore
///
/// Keeps image sizes in memory so tests can assert which files exist without
/// touching the disk.
#[derive(Clone, Default)]
pub struct MockImageStore {
    files: Arc<Mutex<HashMap<String, usize>>>,
    /// When true, every operation fails.
    pub should_fail: bool,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub async fn contains(&self, reference: &str) -> bool {
        self.files.lock().await.contains_key(reference)
    }

    pub async fn len(&self) -> usize {
        self.files.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn save(&self, extension: &str, bytes: Bytes) -> AppResult<String> {
        if self.should_fail {
            return Err(AppError::Internal("mock image store failure".to_string()));
        }
        let reference = format!("{IMAGE_PREFIX}/{}", unique_name(extension));
        self.files.lock().await.insert(reference.clone(), bytes.len());
        Ok(reference)
    }

    async fn remove(&self, reference: &str) -> AppResult<()> {
        if self.should_fail {
            return Err(AppError::Internal("mock image store failure".to_string()));
        }
        match self.files.lock().await.remove(reference) {
            Some(_) => Ok(()),
            None => Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such image `{reference}`"),
            ))),
        }
    }
}
