//! Seed records
//!
//! One JSON array per supported language feeds the bootstrap. Records are
//! lenient on input (booleans may arrive as `"true"` strings, most fields
//! are optional) and strict on conversion: `viewId`, `name` and a known
//! `contentType` are required.

use super::content::{Content, ContentVersion, ValidationError, Versioning, DEFAULT_PERMISSIONS};
use super::content_type::ContentType;
use chrono::{NaiveDate, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Raw seed entry as found in `<language>.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRecord {
    pub view_id: Option<String>,
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub language: Option<String>,
    pub html_content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub system: Option<bool>,
    pub parent_path: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub versionable: Option<bool>,
    pub version_comment: Option<String>,
    /// `yyyy-MM-dd`
    pub valid_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub update_on_launch: Option<bool>,
    pub version: Option<String>,
    pub permissions: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub app: Option<String>,
    /// Attachment reference for the image payload
    pub image: Option<String>,
    /// Attachment reference for the file payload
    pub file: Option<String>,
}

/// Accept `true`, `"true"`, `"TRUE"` and friends.
fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Bool(bool),
        Text(String),
    }

    match Option::<Flexible>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flexible::Bool(b)) => Ok(Some(b)),
        Some(Flexible::Text(s)) if s.trim().eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Flexible::Text(s)) if s.trim().eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(Flexible::Text(s)) => Err(de::Error::custom(format!(
            "expected a boolean, got '{}'",
            s
        ))),
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ValidationError::MissingField(field.to_string()))
}

impl SeedRecord {
    /// Identifier used in log lines; falls back to the name.
    pub fn label(&self) -> &str {
        self.view_id
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("<unnamed>")
    }

    /// Convert to a content record without attachments.
    ///
    /// `file_language` is the language of the seed file and applies when the
    /// record names none.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when `viewId`, `name` or `contentType` is
    /// missing, when the content type is unknown, or when `validDate` is not
    /// `yyyy-MM-dd`.
    pub fn to_content(&self, file_language: &str) -> Result<Content, ValidationError> {
        let view_id = required(&self.view_id, "viewId")?;
        let name = required(&self.name, "name")?;
        let content_type: ContentType = required(&self.content_type, "contentType")?
            .parse()
            .map_err(ValidationError::InvalidContentType)?;

        let language = self
            .language
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| file_language.to_string());

        let mut content = Content::new(view_id, name, content_type, language);
        content.html_content = self.html_content.clone();
        content.active = self.active.unwrap_or(true);
        content.system = self.system.unwrap_or(false);
        content.parent_path = self.parent_path.clone().filter(|p| !p.is_empty());
        content.permissions = self
            .permissions
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PERMISSIONS.to_string());
        content.tags = self.tags.clone();
        content.app = self.app.clone().filter(|a| !a.is_empty());

        let versionable = self.versionable.unwrap_or(false)
            || self.version.is_some()
            || self.version_comment.is_some();
        if versionable {
            let valid_date = match self.valid_date.as_deref() {
                Some(raw) => Some(parse_valid_date(raw)?),
                None => None,
            };
            content.versioning = Some(Versioning {
                version: self.version.as_deref().map(ContentVersion::from),
                version_comment: self.version_comment.clone(),
                valid_date,
                update_on_launch: self.update_on_launch.unwrap_or(false),
            });
        }

        Ok(content)
    }
}

fn parse_valid_date(raw: &str) -> Result<chrono::DateTime<Utc>, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        field: "validDate".to_string(),
        value: raw.to_string(),
    };
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    Ok(Utc.from_utc_datetime(&midnight))
}
