//! Seed index
//!
//! Seed content is read once at startup into a [`SeedIndex`] that the
//! bootstrap receives by reference. Nothing else holds on to seed records.
//!
//! # Architecture
//!
//! - One JSON array per supported language at `<seed_dir>/<language>.json`
//! - Records missing a mandatory field are logged and skipped
//! - Attachment references are resolved through an [`AttachmentSource`];
//!   unresolvable ones are logged and the content is kept without them
//! - Entries are keyed by `(view_id, language)`; a later duplicate replaces
//!   the earlier entry in place

use super::attachments::{fetch_image, AttachmentSource};
use super::error::SeedError;
use crate::config::EcmConfig;
use crate::models::{Content, ContentType, SeedRecord};
use std::collections::HashMap;
use std::path::Path;

/// Seed content keyed by `(view_id, language)`, in file order.
#[derive(Debug, Clone, Default)]
pub struct SeedIndex {
    entries: Vec<Content>,
    positions: HashMap<(String, String), usize>,
}

impl SeedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from records that are already converted.
    pub fn from_contents(contents: impl IntoIterator<Item = Content>) -> Self {
        let mut index = Self::new();
        for content in contents {
            index.insert(content);
        }
        index
    }

    /// Read every supported language's seed file.
    ///
    /// An unset `seed_dir` yields an empty index. Missing or unreadable
    /// files are logged and skipped.
    pub async fn load(config: &EcmConfig, attachments: &dyn AttachmentSource) -> Self {
        let mut index = Self::new();
        let Some(dir) = config.seed_dir.as_deref() else {
            tracing::info!("No seed directory configured, seed index is empty");
            return index;
        };

        for language in &config.supported_languages {
            let path = dir.join(format!("{}.json", language));
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tracing::info!("No seed file for '{}' at {}", language, path.display());
                continue;
            }
            match Self::read_file(&path, language, attachments).await {
                Ok(contents) => {
                    tracing::info!(
                        "Loaded {} seed records for '{}' from {}",
                        contents.len(),
                        language,
                        path.display()
                    );
                    for content in contents {
                        index.insert(content);
                    }
                }
                Err(e) => tracing::error!("{}", e),
            }
        }

        index
    }

    /// Parse one seed file, skipping malformed records.
    ///
    /// # Errors
    ///
    /// `SeedError::SeedFile` when the file cannot be read or is not a JSON array.
    pub async fn read_file(
        path: &Path,
        language: &str,
        attachments: &dyn AttachmentSource,
    ) -> Result<Vec<Content>, SeedError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SeedError::seed_file(path.display().to_string(), e.to_string()))?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| SeedError::seed_file(path.display().to_string(), e.to_string()))?;

        let mut contents = Vec::with_capacity(values.len());
        for (position, value) in values.into_iter().enumerate() {
            let record: SeedRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        "Skipping seed record #{} in {}: {}",
                        position,
                        path.display(),
                        e
                    );
                    continue;
                }
            };
            match record.to_content(language) {
                Ok(content) => {
                    contents.push(Self::attach(content, &record, attachments).await);
                }
                Err(source) => {
                    let err = SeedError::MalformedInput {
                        record: record.label().to_string(),
                        source,
                    };
                    tracing::warn!("Skipping seed record: {}", err);
                }
            }
        }
        Ok(contents)
    }

    async fn attach(
        mut content: Content,
        record: &SeedRecord,
        attachments: &dyn AttachmentSource,
    ) -> Content {
        if let Some(reference) = record.image.as_deref().filter(|r| !r.is_empty()) {
            match fetch_image(attachments, reference).await {
                Ok(image) => content.image = Some(image),
                Err(e) => tracing::warn!("'{}' saved without image: {}", content.view_id, e),
            }
        }

        if let Some(reference) = record.file.as_deref().filter(|r| !r.is_empty()) {
            let fetched = if content.content_type == ContentType::Image {
                fetch_image(attachments, reference).await
            } else {
                attachments.fetch(reference).await
            };
            match fetched {
                Ok(file) => content = content.with_file(file),
                Err(e) => tracing::warn!("'{}' saved without file: {}", content.view_id, e),
            }
        }

        content
    }

    fn insert(&mut self, content: Content) {
        let key = (content.view_id.clone(), content.language.clone());
        match self.positions.get(&key) {
            Some(&position) => {
                tracing::warn!(
                    "Duplicate seed record '{}' ({}), keeping the later one",
                    key.0,
                    key.1
                );
                self.entries[position] = content;
            }
            None => {
                self.positions.insert(key, self.entries.len());
                self.entries.push(content);
            }
        }
    }

    pub fn get(&self, view_id: &str, language: &str) -> Option<&Content> {
        self.positions
            .get(&(view_id.to_string(), language.to_string()))
            .and_then(|position| self.entries.get(*position))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Content> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
