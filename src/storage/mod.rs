//! Upload sink for image attachments.
//!
//! Accepted files are written under the configured upload directory with a
//! name built from the ingestion time, a random v4 UUID and the sanitized
//! original name. Files are opened with create-new semantics so an existing
//! upload is never overwritten in place.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;

/// Media types the sink accepts; everything else is dropped silently.
pub const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpg", "image/jpeg"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result of persisting one accepted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDescriptor {
    pub stored_name: String,
    pub original_name: String,
    pub mime_type: String,
    /// Public path, e.g. `images/20260101T101010123Z-<uuid>_photo.png`
    pub storage_path: String,
}

#[derive(Debug, Clone)]
pub struct UploadSink {
    root: PathBuf,
    public_prefix: String,
}

impl UploadSink {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.upload_dir.clone(),
            public_prefix: config.public_prefix.trim_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Media type filter. Parameters (`; charset=...`) and case are ignored.
    pub fn accepts(mime_type: &str) -> bool {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        ACCEPTED_IMAGE_TYPES.contains(&essence.as_str())
    }

    /// Persist `bytes` if the media type passes the filter.
    ///
    /// Returns `Ok(None)` for a filtered file so callers treat it exactly
    /// like a missing one. Write failures are returned, never retried.
    pub async fn store(
        &self,
        original_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<Option<UploadDescriptor>, StorageError> {
        if !Self::accepts(mime_type) {
            debug!(original_name, mime_type, "upload dropped by media type filter");
            return Ok(None);
        }

        self.ensure_root().await?;

        let stored_name = stored_name(original_name);
        let full_path = self.root.join(&stored_name);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
            .map_err(|e| {
                warn!(path = %full_path.display(), error = %e, "upload: create failed");
                e
            })?;

        if let Err(e) = write_all(&mut file, bytes).await {
            warn!(path = %full_path.display(), error = %e, "upload: write failed");
            drop(file);
            let _ = fs::remove_file(&full_path).await;
            return Err(e.into());
        }

        let descriptor = UploadDescriptor {
            storage_path: format!("{}/{}", self.public_prefix, stored_name),
            stored_name,
            original_name: original_name.to_string(),
            mime_type: mime_type.to_string(),
        };

        info!(
            storage_path = %descriptor.storage_path,
            size = bytes.len(),
            "upload stored"
        );

        Ok(Some(descriptor))
    }

    /// Best-effort delete of a previously stored asset. Returns whether a
    /// file was removed; failures are logged and swallowed.
    pub async fn delete(&self, storage_path: &str) -> bool {
        let Some(full_path) = self.resolve(storage_path) else {
            warn!(storage_path, "refusing to delete path outside the upload directory");
            return false;
        };

        match fs::remove_file(&full_path).await {
            Ok(()) => {
                info!(storage_path, "previous upload deleted");
                true
            }
            Err(e) => {
                warn!(storage_path, error = %e, "could not delete previous upload");
                false
            }
        }
    }

    /// Map a public storage path back onto the upload directory.
    fn resolve(&self, storage_path: &str) -> Option<PathBuf> {
        let trimmed = storage_path.trim().trim_start_matches('/');
        let relative = trimmed
            .strip_prefix(self.public_prefix.as_str())?
            .strip_prefix('/')?;

        let relative = Path::new(relative);
        let mut components = relative.components().peekable();
        components.peek()?;
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }

        Some(self.root.join(relative))
    }
}

async fn write_all(file: &mut fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

/// `<UTC timestamp>-<uuid>_<sanitized original>`
pub fn stored_name(original_name: &str) -> String {
    format!(
        "{}-{}_{}",
        Utc::now().format("%Y%m%dT%H%M%S%3fZ"),
        Uuid::new_v4().simple(),
        sanitize_file_name(original_name)
    )
}

/// Keep only the final path segment and a conservative character set.
pub fn sanitize_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
