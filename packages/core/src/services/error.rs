//! Service Layer Error Types
//!
//! This module defines the error types of the content services. Only
//! [`RepositoryError::StoreUnavailable`] is ever returned from the
//! repository's read and write operations; everything else is logged and
//! turned into a degraded result close to where it happens.

use crate::db::StoreError;
use crate::models::ValidationError;
use thiserror::Error;

/// Errors crossing the repository boundary
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The store is unreachable or refused the session
    #[error("Content store unavailable: {0}")]
    StoreUnavailable(String),

    /// Schema resource could not be read or parsed
    #[error("Node type registration failed: {0}")]
    Registration(String),

    /// Any other store failure surfaced by non-degrading helpers
    #[error("Store operation failed: {0}")]
    Store(StoreError),
}

impl RepositoryError {
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        if err.is_unavailable() {
            Self::StoreUnavailable(err.to_string())
        } else {
            Self::Store(err)
        }
    }
}

/// Errors mapping one node to or from a content record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// A mandatory property is missing or unreadable
    #[error("Malformed node {path}: {reason}")]
    MalformedNode { path: String, reason: String },

    /// The store failed while reading or writing the node
    #[error("Store failure while mapping: {0}")]
    Store(#[from] StoreError),
}

impl MappingError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedNode {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors while building the seed index
#[derive(Error, Debug)]
pub enum SeedError {
    /// A seed record misses a mandatory field
    #[error("Malformed seed record '{record}': {source}")]
    MalformedInput {
        record: String,
        source: ValidationError,
    },

    /// A referenced binary cannot be located
    #[error("Attachment unavailable: {reference}: {reason}")]
    AttachmentUnavailable { reference: String, reason: String },

    /// A seed file cannot be read or parsed
    #[error("Failed to load seed file {path}: {reason}")]
    SeedFile { path: String, reason: String },
}

impl SeedError {
    pub fn attachment_unavailable(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AttachmentUnavailable {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn seed_file(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SeedFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
