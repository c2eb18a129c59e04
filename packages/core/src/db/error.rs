//! Tree Store Error Types
//!
//! This module defines error types for tree-store operations: session
//! management, node manipulation, type registration and version control.

use thiserror::Error;

/// Tree store operation errors
///
/// Covers every failure the storage engine can report. Services decide
/// which of these are fatal; only [`StoreError::Unavailable`] and
/// [`StoreError::LoginFailed`] mean the store itself cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot be reached
    #[error("Tree store unavailable: {0}")]
    Unavailable(String),

    /// Credentials were rejected
    #[error("Login failed for user '{user}'")]
    LoginFailed { user: String },

    /// The session was already logged out
    #[error("Session is closed")]
    SessionClosed,

    /// A node id no longer resolves (removed or never existed)
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A path does not resolve to a node
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// A sibling with the same name already exists
    #[error("Item already exists: {0}")]
    ItemExists(String),

    /// Node name contains illegal characters
    #[error("Invalid node name: '{0}'")]
    InvalidName(String),

    /// Node type or mixin has not been registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Node type definition refers to unknown namespaces or supertypes
    #[error("Invalid node type definition: {0}")]
    InvalidDefinition(String),

    /// Namespace prefix already mapped to a different URI
    #[error("Namespace prefix '{prefix}' already mapped to '{uri}'")]
    NamespaceConflict { prefix: String, uri: String },

    /// Version operation on a node without version control
    #[error("Node is not versionable: {0}")]
    NotVersionable(String),

    /// Write attempted on a checked-in node
    #[error("Node is checked in: {0}")]
    CheckedIn(String),

    /// Structural violation (removing the root, moving under a descendant)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound(id.into())
    }

    /// Create a path not found error
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Create an item exists error
    pub fn item_exists(path: impl Into<String>) -> Self {
        Self::ItemExists(path.into())
    }

    /// Create an unknown node type error
    pub fn unknown_node_type(name: impl Into<String>) -> Self {
        Self::UnknownNodeType(name.into())
    }

    /// Create an invalid definition error
    pub fn invalid_definition(msg: impl Into<String>) -> Self {
        Self::InvalidDefinition(msg.into())
    }

    /// Create a constraint violation error
    pub fn constraint_violation(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    /// True when the store as a whole cannot serve requests.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::LoginFailed { .. } | Self::SessionClosed
        )
    }
}

/// Result alias for tree-store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
