//! Storage for uploaded house images.
//!
//! Files are written to a local directory under a UUID-prefixed name. Only the
//! filename is persisted; read endpoints turn it into a URL with
//! [`UploadStore::base_url`]. Serving the directory is left to the web server
//! in front of this service.

use std::path::PathBuf;

use axum::body::Bytes;
use uuid::Uuid;

use crate::error::AppError;

/// A file part received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    base_url: String,
}

impl UploadStore {
    /// `base_url` must end with `/`; `Config` guarantees this.
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
        }
    }

    /// Public prefix for stored filenames.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reject anything that is not an image, before any write happens.
    pub fn check(&self, file: &UploadedFile) -> Result<(), AppError> {
        if file.bytes.is_empty() {
            return Err(AppError::Validation("image is empty".to_string()));
        }
        match file.content_type.as_deref() {
            Some(ct) if !ct.starts_with("image/") => Err(AppError::Validation(format!(
                "image must be an image file, got {ct}"
            ))),
            _ => Ok(()),
        }
    }

    /// Write the file and return the stored filename.
    pub async fn save(&self, file: UploadedFile) -> Result<String, AppError> {
        self.check(&file)?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let name = format!("{}-{}", Uuid::new_v4().simple(), sanitize(&file.file_name));
        tokio::fs::write(self.dir.join(&name), &file.bytes).await?;

        tracing::debug!(file = %name, size = file.bytes.len(), "stored upload");
        Ok(name)
    }

    /// Delete a stored file. Failures are logged, a missing file is ignored.
    pub async fn remove(&self, name: &str) {
        match tokio::fs::remove_file(self.dir.join(sanitize(name))).await {
            Ok(()) => tracing::debug!(file = %name, "removed upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %name, "failed to remove upload: {e}"),
        }
    }
}

/// Keep the last path component and replace anything outside `[A-Za-z0-9._-]`.
fn sanitize(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
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
