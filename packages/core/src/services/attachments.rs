//! Attachment sources
//!
//! Seed records reference image and file payloads by name. An
//! [`AttachmentSource`] turns such a reference into bytes plus a MIME type.
//!
//! # Architecture
//!
//! - [`LocalAttachmentSource`] reads from a directory on disk and guesses
//!   MIME types from the file extension
//! - Remote byte-stream providers are injected by the host as another
//!   `AttachmentSource` implementation
//! - [`select_attachment_source`] picks between the two from
//!   `EcmConfig::load_local_files`

use super::content_mapper::DEFAULT_IMAGE_MIME_TYPE;
use super::error::SeedError;
use crate::config::EcmConfig;
use crate::models::Attachment;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

const OCTET_STREAM: &str = "application/octet-stream";

/// Resolves attachment references to bytes
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    /// Load the payload named by `reference`.
    ///
    /// # Errors
    ///
    /// `SeedError::AttachmentUnavailable` when the reference cannot be resolved.
    async fn fetch(&self, reference: &str) -> Result<Attachment, SeedError>;
}

/// Attachments stored below a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalAttachmentSource {
    root: PathBuf,
}

impl LocalAttachmentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative path below the root; anything escaping it is refused.
    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let relative = Path::new(reference.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if reference.trim().is_empty() || escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl AttachmentSource for LocalAttachmentSource {
    async fn fetch(&self, reference: &str) -> Result<Attachment, SeedError> {
        let path = self.resolve(reference).ok_or_else(|| {
            SeedError::attachment_unavailable(reference, "reference leaves the attachment directory")
        })?;

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| SeedError::attachment_unavailable(reference, e.to_string()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| reference.to_string());
        let mime_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        tracing::debug!(
            "Loaded attachment {} ({}, {} bytes)",
            path.display(),
            mime_type,
            data.len()
        );
        Ok(Attachment::new(name, mime_type, data))
    }
}

/// Source used when neither local files nor a remote provider are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttachmentSource;

#[async_trait]
impl AttachmentSource for NoAttachmentSource {
    async fn fetch(&self, reference: &str) -> Result<Attachment, SeedError> {
        Err(SeedError::attachment_unavailable(
            reference,
            "no attachment source configured",
        ))
    }
}

/// Fetch an image payload; unknown MIME types become `image/png`.
pub async fn fetch_image(
    source: &dyn AttachmentSource,
    reference: &str,
) -> Result<Attachment, SeedError> {
    let mut image = source.fetch(reference).await?;
    if image.mime_type.is_empty() || image.mime_type == OCTET_STREAM {
        image.mime_type = DEFAULT_IMAGE_MIME_TYPE.to_string();
    }
    Ok(image)
}

/// Local directory when `load_local_files` is set, otherwise the injected
/// remote source.
///
/// Local files are read from `attachments_dir`, falling back to `seed_dir`.
pub fn select_attachment_source(
    config: &EcmConfig,
    remote: Option<Arc<dyn AttachmentSource>>,
) -> Arc<dyn AttachmentSource> {
    if config.load_local_files {
        if let Some(dir) = config
            .attachments_dir
            .as_ref()
            .or(config.seed_dir.as_ref())
        {
            tracing::info!("Loading attachments from {}", dir.display());
            return Arc::new(LocalAttachmentSource::new(dir));
        }
        tracing::warn!("load_local_files is set but no attachment directory is configured");
    }
    match remote {
        Some(source) => source,
        None => {
            tracing::warn!("No attachment source available, seed attachments will be skipped");
            Arc::new(NoAttachmentSource)
        }
    }
}
