//! Content types and the feature folders they live in

use crate::constants::{NT_FILE, NT_FOLDER};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of content kinds the platform stores.
///
/// Serialized with kebab-case keys (`"news-feed"`), the same keys written to
/// the `oaf:contentType` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Folder,
    Document,
    Html,
    Image,
    NewsFeed,
    Notification,
    Tag,
    /// Synthetic "not found" marker, never persisted on purpose
    Error,
}

impl ContentType {
    pub const ALL: [ContentType; 8] = [
        Self::Folder,
        Self::Document,
        Self::Html,
        Self::Image,
        Self::NewsFeed,
        Self::Notification,
        Self::Tag,
        Self::Error,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Document => "document",
            Self::Html => "html",
            Self::Image => "image",
            Self::NewsFeed => "news-feed",
            Self::Notification => "notification",
            Self::Tag => "tag",
            Self::Error => "error",
        }
    }

    /// Types whose payload is an html body stored in the body child.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Html | Self::NewsFeed | Self::Notification)
    }

    /// Types whose payload is a binary file stored in the body child.
    pub fn carries_file(&self) -> bool {
        matches!(self, Self::Document | Self::Image)
    }

    /// Primary node type used when a node is created for this content type.
    pub fn primary_node_type(&self) -> &'static str {
        match self {
            Self::Folder => NT_FOLDER,
            Self::Document
            | Self::Html
            | Self::Image
            | Self::NewsFeed
            | Self::Notification
            | Self::Tag
            | Self::Error => NT_FILE,
        }
    }

    /// Feature folder receiving content of this type when no parent path is given.
    pub fn feature_folder(&self) -> Option<FeatureFolder> {
        match self {
            Self::Folder | Self::Document => Some(FeatureFolder::Documents),
            Self::Html => Some(FeatureFolder::Html),
            Self::Image => Some(FeatureFolder::Images),
            Self::NewsFeed => Some(FeatureFolder::NewsFeed),
            Self::Notification => Some(FeatureFolder::Notifications),
            Self::Tag => Some(FeatureFolder::Tags),
            Self::Error => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "folder" => Ok(Self::Folder),
            "document" => Ok(Self::Document),
            "html" => Ok(Self::Html),
            "image" => Ok(Self::Image),
            "news-feed" | "newsfeed" => Ok(Self::NewsFeed),
            "notification" => Ok(Self::Notification),
            "tag" => Ok(Self::Tag),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid content type: {}", s)),
        }
    }
}

/// Well-known folders directly below the platform root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureFolder {
    Html,
    NewsFeed,
    Notifications,
    Documents,
    Images,
    Tags,
}

impl FeatureFolder {
    pub const ALL: [FeatureFolder; 6] = [
        Self::Html,
        Self::NewsFeed,
        Self::Notifications,
        Self::Documents,
        Self::Images,
        Self::Tags,
    ];

    /// Folders holding one subfolder per supported language.
    pub fn is_localized(&self) -> bool {
        matches!(self, Self::Html | Self::NewsFeed | Self::Notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for content_type in ContentType::ALL {
            assert_eq!(content_type.key().parse::<ContentType>(), Ok(content_type));
        }
    }

    #[test]
    fn test_legacy_spellings() {
        assert_eq!("NEWS_FEED".parse::<ContentType>(), Ok(ContentType::NewsFeed));
        assert_eq!("newsfeed".parse::<ContentType>(), Ok(ContentType::NewsFeed));
        assert_eq!(" Html ".parse::<ContentType>(), Ok(ContentType::Html));
        assert!("appinfo".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_serde_uses_keys() {
        let json = serde_json::to_string(&ContentType::NewsFeed).unwrap();
        assert_eq!(json, "\"news-feed\"");
    }

    #[test]
    fn test_payload_kinds_are_disjoint() {
        for content_type in ContentType::ALL {
            assert!(!(content_type.is_textual() && content_type.carries_file()));
        }
    }

    #[test]
    fn test_localized_feature_folders() {
        let localized: Vec<_> = FeatureFolder::ALL
            .into_iter()
            .filter(FeatureFolder::is_localized)
            .collect();
        assert_eq!(
            localized,
            vec![
                FeatureFolder::Html,
                FeatureFolder::NewsFeed,
                FeatureFolder::Notifications
            ]
        );
    }
}
