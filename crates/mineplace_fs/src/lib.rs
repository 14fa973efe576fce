//! # Mineplace FileSystem Storage
//!
//! A local filesystem backend for uploaded version files.
//!
//! This crate implements the [`BlobStorage`] trait, storing every blob as a
//! single file directly below a root directory.
//!
//! ## Features
//!
//! * **Atomic Writes**: data goes to a uniquely named temporary file first and is then linked
//!   into place, so readers never observe a partial file.
//! * **No Clobbering**: an existing blob is never overwritten; [`BlobStorage::write_blob`]
//!   reports `false` instead, which lets callers tell apart files they created.
//!
//! ## Usage
//!
//! ```no_run
//! use mineplace_fs::FileSystemStorage;
//!
//! let storage = FileSystemStorage::new("./files");
//! ```

use bytes::Bytes;
use mineplace_core::prelude::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Removes a temporary file. Returns `false` if it could not be removed.
async fn remove_tmp(tmp_path: &Path) -> bool {
    match fs::remove_file(tmp_path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            warn!("Failed to remove temporary file {}: {e}", tmp_path.display());
            false
        }
    }
}

async fn atomic_create(path: &Path, data: Bytes) -> Result<bool, StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(StorageError::Io)?;
    }

    let tmp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
    if let Err(e) = fs::write(&tmp_path, data).await {
        remove_tmp(&tmp_path).await;
        return Err(StorageError::Io(e));
    }

    // hard_link fails instead of replacing an existing target
    let linked = fs::hard_link(&tmp_path, path).await;
    remove_tmp(&tmp_path).await;

    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(StorageError::Io(e)),
    }
}

#[derive(Clone, Debug)]
pub struct FileSystemStorage {
    root: PathBuf,
    public_prefix: String,
}

impl FileSystemStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into(),
            public_prefix: "/files".to_string(),
        }
    }

    /// URL prefix under which the HTTP layer serves the stored files.
    ///
    /// Defaults to `/files`.
    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn get_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !valid {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

impl BlobStorage for FileSystemStorage {
    async fn write_blob(&self, name: &str, data: Bytes) -> Result<bool, StorageError> {
        let path = self.get_path(name)?;
        if fs::try_exists(&path).await.map_err(StorageError::Io)? {
            return Ok(false);
        }
        atomic_create(&path, data).await
    }

    async fn read_blob(&self, name: &str) -> Result<Bytes, StorageError> {
        let path = self.get_path(name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let path = self.get_path(name)?;
        fs::try_exists(&path).await.map_err(StorageError::Io)
    }

    async fn delete_blob(&self, name: &str) -> Result<(), StorageError> {
        let path = self.get_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{name}", self.public_prefix)
    }
}
