//! Content Data Structures
//!
//! This module contains the `Content` record exchanged with callers, its
//! optional versioning attributes, attachments, and the "not found"
//! sentinel.
//!
//! # Architecture
//!
//! - **Identity**: `(view_id, language)`; language is empty for folders
//! - **Versionable content**: a `Content` whose `versioning` is `Some`
//! - **Sentinel**: `ContentType::Error` with a fresh identifier, returned
//!   instead of an absence on read paths
//! - **Paths**: `path`/`parent_path` are filled by the repository after a
//!   write and by the mapper after a read; callers only set `parent_path`

use super::content_type::ContentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Name of the sentinel returned when nothing matches
pub const NOT_FOUND_NAME: &str = "<ERROR> Content not found";

/// Body of the sentinel returned when nothing matches
pub const NOT_FOUND_MESSAGE: &str = "Oooops! Something went wrong. The element which should be displayed is not found, and there is no fallback element. Support has been informed about that matter!";

/// Permissions assigned when none are given
pub const DEFAULT_PERMISSIONS: &str = "NONE";

/// Validation errors for content records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("Invalid date '{value}' for {field}")]
    InvalidDate { field: String, value: String },
}

/// Version identifier compared segment by segment.
///
/// Numeric segments compare numerically (`1.10 > 1.9`), missing segments
/// count as zero (`1 == 1.0`), anything else compares as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentVersion(String);

impl ContentVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn initial() -> Self {
        Self::new("1.0")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for ContentVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let left: Vec<&str> = self.0.trim().split('.').collect();
        let right: Vec<&str> = other.0.trim().split('.').collect();
        for i in 0..left.len().max(right.len()) {
            let a = left.get(i).copied().unwrap_or("0");
            let b = right.get(i).copied().unwrap_or("0");
            let ordering = match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => a.cmp(b),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for ContentVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ContentVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ContentVersion {}

impl fmt::Display for ContentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Versioning attributes of a versionable content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    /// Defaulted to `1.0` when the item is written without one
    pub version: Option<ContentVersion>,
    pub version_comment: Option<String>,
    /// Defaulted to the write time when absent
    pub valid_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_on_launch: bool,
}

impl Versioning {
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: Some(ContentVersion::new(version)),
            ..Default::default()
        }
    }
}

/// Binary payload attached to a content item.
///
/// Bytes are fully materialized; serialization skips them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A content item as seen by callers of the repository.
///
/// # Examples
///
/// ```rust
/// # use contentspace_core::models::{Content, ContentType};
/// let page = Content::new("home", "Home", ContentType::Html, "en")
///     .with_html("<p>hi</p>")
///     .with_tags(["press"]);
/// assert_eq!(page.permissions, "NONE");
/// assert!(!page.is_versionable());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub view_id: String,
    #[serde(default)]
    pub language: String,
    pub name: String,
    pub content_type: ContentType,
    pub active: bool,
    pub system: bool,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub permissions: String,
    pub app: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_edit_date: Option<DateTime<Utc>>,
    pub html_content: Option<String>,
    pub image: Option<Attachment>,
    pub file: Option<Attachment>,
    /// MIME type of the file payload, known even when bytes are not loaded
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    pub parent_path: Option<String>,
    pub path: Option<String>,
    pub versioning: Option<Versioning>,
}

impl Content {
    pub fn new(
        view_id: impl Into<String>,
        name: impl Into<String>,
        content_type: ContentType,
        language: impl Into<String>,
    ) -> Self {
        Self {
            view_id: view_id.into(),
            language: language.into(),
            name: name.into(),
            content_type,
            active: true,
            system: false,
            author: None,
            tags: Vec::new(),
            permissions: DEFAULT_PERMISSIONS.to_string(),
            app: None,
            created_at: None,
            last_edit_date: None,
            html_content: None,
            image: None,
            file: None,
            mime_type: None,
            file_size: None,
            parent_path: None,
            path: None,
            versioning: None,
        }
    }

    /// Language-agnostic folder whose view id is its name.
    pub fn folder(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, ContentType::Folder, "")
    }

    /// Sentinel substituted for "nothing matched".
    pub fn not_found() -> Self {
        let mut sentinel = Self::new(
            Uuid::new_v4().to_string(),
            NOT_FOUND_NAME,
            ContentType::Error,
            "",
        );
        sentinel.html_content = Some(NOT_FOUND_MESSAGE.to_string());
        sentinel.created_at = Some(Utc::now());
        sentinel
    }

    pub fn with_parent_path(mut self, parent_path: impl Into<String>) -> Self {
        self.parent_path = Some(parent_path.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_content = Some(html.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_versioning(mut self, versioning: Versioning) -> Self {
        self.versioning = Some(versioning);
        self
    }

    pub fn with_file(mut self, file: Attachment) -> Self {
        self.mime_type = Some(file.mime_type.clone());
        self.file_size = Some(file.size());
        self.file = Some(file);
        self
    }

    pub fn is_sentinel(&self) -> bool {
        self.content_type == ContentType::Error
    }

    pub fn is_versionable(&self) -> bool {
        self.versioning.is_some()
    }

    /// True when `(view_id, language)` cannot address this record: the view
    /// id is blank, or the language is blank on anything but a folder.
    pub fn lacks_identity(&self) -> bool {
        self.view_id.trim().is_empty()
            || (self.language.trim().is_empty() && self.content_type != ContentType::Folder)
    }

    /// Version id of a versionable item.
    pub fn version(&self) -> Option<&ContentVersion> {
        self.versioning.as_ref().and_then(|v| v.version.as_ref())
    }
}
