use std::path::PathBuf;

use chrono::Utc;

use crate::error::{AppError, Result};

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// An image received from a multipart form
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub data: Vec<u8>,
}

pub fn allowed_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduce an uploaded file name to a safe ASCII name without path components
pub fn sanitize_filename(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// `{stem}_{unix_timestamp}{.ext}` for the sanitized name
pub fn stored_name(file_name: &str, timestamp: i64) -> Option<String> {
    let safe = sanitize_filename(file_name);
    let (stem, ext) = safe.rsplit_once('.')?;
    let stem = if stem.is_empty() { "image" } else { stem };
    Some(format!("{}_{}.{}", stem, timestamp, ext))
}

/// Cover image storage on the local file system
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write an image and return its stored file name
    pub async fn save(&self, image: &UploadedImage) -> Result<String> {
        if !allowed_file(&image.file_name) {
            return Err(AppError::Validation(format!(
                "Image type not allowed. Use one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }
        let name = stored_name(&image.file_name, Utc::now().timestamp())
            .ok_or_else(|| AppError::Validation("Invalid image file name.".into()))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), &image.data).await?;
        tracing::debug!(file = %name, "Stored cover image");
        Ok(name)
    }

    /// Remove a stored image. A file that is already gone is not an error.
    pub async fn remove(&self, name: &str) -> Result<()> {
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
