//! On-disk storage for uploaded images
//!
//! Uploads are sniffed from their bytes, never trusted by extension, and
//! written under the upload directory that is served at `/assets`.

use common::database::now_millis;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// URL prefix the upload directory is served under
pub const ASSETS_PREFIX: &str = "/assets";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File is empty")]
    Empty,

    #[error("File exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },

    #[error("Unsupported file type, expected jpeg, png or webp")]
    UnsupportedType,

    #[error("Stored path {0} is outside the upload directory")]
    ForeignPath(String),

    #[error("File storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file written to the upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    /// Path recorded on the media document, e.g. `/assets/cover-1700000000000.png`
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    dir: PathBuf,
    max_size: usize,
}

impl MediaStorage {
    pub fn new(dir: impl Into<PathBuf>, max_size: usize) -> Self {
        Self {
            dir: dir.into(),
            max_size,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Check size and content type, returning the extension to store under
    pub fn inspect(&self, bytes: &[u8]) -> Result<&'static str, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > self.max_size {
            return Err(UploadError::TooLarge {
                limit: self.max_size,
            });
        }

        match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => Ok("jpg"),
            Ok(ImageFormat::Png) => Ok("png"),
            Ok(ImageFormat::WebP) => Ok("webp"),
            _ => Err(UploadError::UnsupportedType),
        }
    }

    /// Validate and write an upload, named after the client's file name
    pub async fn save(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, UploadError> {
        let extension = self.inspect(bytes)?;
        let file_name = format!(
            "{}-{}.{}",
            sanitize_stem(original_name.unwrap_or_default()),
            now_millis(),
            extension
        );

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;
        info!("Stored upload {} ({} bytes)", file_name, bytes.len());

        Ok(StoredFile {
            path: format!("{}/{}", ASSETS_PREFIX, file_name),
            file_name,
        })
    }

    /// Remove the file behind a recorded media path
    ///
    /// A missing file is an error, so the caller keeps its record.
    pub async fn remove(&self, recorded_path: &str) -> Result<(), UploadError> {
        let file = self.resolve(recorded_path)?;
        tokio::fs::remove_file(&file).await.map_err(|e| {
            warn!("Failed to remove {}: {}", file.display(), e);
            UploadError::Io(e)
        })
    }

    fn resolve(&self, recorded_path: &str) -> Result<PathBuf, UploadError> {
        let name = recorded_path
            .strip_prefix(ASSETS_PREFIX)
            .map(|rest| rest.trim_start_matches('/'))
            .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
            .ok_or_else(|| UploadError::ForeignPath(recorded_path.to_string()))?;
        Ok(self.dir.join(name))
    }
}

/// File stem reduced to lowercase ascii letters, digits, `-` and `_`
fn sanitize_stem(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };

    let mut clean = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            clean.push(c.to_ascii_lowercase());
        } else if !clean.ends_with('-') {
            clean.push('-');
        }
    }

    let clean = clean.trim_matches('-');
    if clean.is_empty() {
        "upload".to_string()
    } else {
        clean.chars().take(64).collect()
    }
}
