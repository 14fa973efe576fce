use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::MarketError;

/// Largest accepted version file: 15 MiB.
pub const MAX_FILE_SIZE_BYTES: usize = 15 * 1024 * 1024;
pub const VERSION_LABEL_MAX_LEN: usize = 64;
pub const VERSION_DESCRIPTION_MIN_LEN: usize = 10;

const MAX_EXTENSION_LEN: usize = 16;

/// A version file as received from the client.
#[derive(Debug, Clone)]
pub struct VersionUpload {
    pub version: String,
    pub description: String,
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl VersionUpload {
    /// Shape checks on the label and description.
    pub fn validate_fields(&self) -> Result<(), MarketError> {
        let label_len = self.version.chars().count();
        if label_len == 0 || label_len > VERSION_LABEL_MAX_LEN {
            return Err(MarketError::invalid(format!(
                "version must be between 1 and {VERSION_LABEL_MAX_LEN} characters long"
            )));
        }
        if self.description.chars().count() < VERSION_DESCRIPTION_MIN_LEN {
            return Err(MarketError::invalid(format!(
                "description must be at least {VERSION_DESCRIPTION_MIN_LEN} characters long"
            )));
        }
        Ok(())
    }

    /// Rejects empty and oversized files, reporting the measured size.
    pub fn validate_size(&self) -> Result<(), MarketError> {
        let size = self.data.len();
        if size > MAX_FILE_SIZE_BYTES {
            return Err(MarketError::invalid(format!(
                "File size exceeds {:.0} MB (Current: {size} bytes, maximum: {MAX_FILE_SIZE_BYTES} bytes).",
                mebibytes(MAX_FILE_SIZE_BYTES),
            )));
        }
        if size == 0 {
            return Err(MarketError::invalid("The uploaded file is empty."));
        }
        Ok(())
    }
}

fn mebibytes(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Where a file lives once stored: derived from its bytes only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentAddress {
    /// Hex encoded SHA-256 of the file.
    pub hash: String,
    /// `<hash><.ext>`, the name inside the blob store.
    pub file_name: String,
}

impl ContentAddress {
    pub fn compute(data: &[u8], original_name: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let hash = hex::encode(hasher.finalize());

        let file_name = match original_name.and_then(extension) {
            Some(ext) => format!("{hash}.{ext}"),
            None => hash.clone(),
        };

        Self { hash, file_name }
    }
}

/// Keeps short alphanumeric extensions only, so the stored name stays a single path segment.
fn extension(name: &str) -> Option<&str> {
    let ext = Path::new(name).extension()?.to_str()?;
    (ext.len() <= MAX_EXTENSION_LEN && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}
