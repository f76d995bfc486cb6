//! Uploaded images. Decoding is delegated to the `image` crate; this module
//! only decides whether an upload is acceptable and where it lives on disk.
use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::body::Bytes;
use rand::{distributions::Alphanumeric, Rng};

use crate::errors::RequestError;

pub const MEDIA_URL: &str = "/media/";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// A file field as it arrived in a multipart form.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content: Bytes,
}

impl Upload {
    /// Browsers send an empty part when the file input was left blank.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// An upload that decoded successfully.
#[derive(Debug, Clone)]
pub struct ValidImage {
    content: Bytes,
    extension: &'static str,
}

impl ValidImage {
    pub fn extension(&self) -> &'static str {
        self.extension
    }
}

/// `Ok(None)` when the bytes are not a decodable image.
pub async fn inspect_image(upload: Upload) -> Result<Option<ValidImage>, RequestError> {
    let content = upload.content;
    let image = tokio::task::spawn_blocking(move || {
        let format = image::guess_format(&content).ok()?;
        image::load_from_memory_with_format(&content, format).ok()?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");
        Some(ValidImage { content, extension })
    })
    .await
    .context("image inspection task failed")?;

    if image.is_none() {
        tracing::debug!(file_name = ?upload.file_name, "rejected upload that is not an image");
    }
    Ok(image)
}

pub fn media_url(name: &str) -> String {
    format!("{MEDIA_URL}{name}")
}

/// Writes validated images under a root directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the stored name, relative to the root.
    pub async fn save(&self, image: ValidImage) -> Result<String, RequestError> {
        let name = format!("posts/{}.{}", random_name(), image.extension);
        let path = self.root.join(&name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("could not create {}", parent.display()))?;
        }
        tokio::fs::write(&path, &image.content)
            .await
            .with_context(|| format!("could not write {}", path.display()))?;
        Ok(name)
    }

    /// Removes a stored image that ended up unused. Failure is only logged.
    pub async fn discard(&self, name: &str) {
        let path = self.root.join(name);
        if let Err(error) = tokio::fs::remove_file(&path).await {
            tracing::warn!(%error, path = %path.display(), "could not remove unused image");
        }
    }
}

fn random_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
