use crate::error::*;

use bytes::Bytes;
use uuid::Uuid;

/// Durable byte storage for uploaded version files, addressed by file name.
pub trait BlobStorage: Send + Sync + 'static + Clone {
    /// Writes `data` under `name`, creating parent directories as needed.
    ///
    /// Returns `false` when a blob with that name already existed and nothing was written.
    fn write_blob(
        &self,
        name: &str,
        data: Bytes,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;
    fn read_blob(&self, name: &str) -> impl Future<Output = Result<Bytes, StorageError>> + Send;
    fn exists(&self, name: &str) -> impl Future<Output = Result<bool, StorageError>> + Send;
    /// Removing a missing blob is not an error.
    fn delete_blob(&self, name: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// The externally visible download URL of a stored file.
    fn public_url(&self, name: &str) -> String {
        format!("/files/{name}")
    }
}

/// A verified caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
}

pub trait AuthProvider: Send + Sync + 'static + Clone {
    fn verify(&self, token: &str) -> impl Future<Output = Result<Caller, AuthError>> + Send;
}
