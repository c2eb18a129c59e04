//! Tree Store Abstraction
//!
//! This module defines the `TreeStore` and `TreeSession` traits, the seam
//! between the content services and the hierarchical storage engine.
//!
//! # Architecture
//!
//! - A [`TreeStore`] authenticates and hands out sessions
//! - A [`TreeSession`] is a short-lived handle used by one logical operation
//! - Nodes are addressed by stable [`NodeId`]s; paths are derived on demand
//! - Version history is exposed as immutable [`VersionRecord`] snapshots
//!
//! Services only ever hold `Arc<dyn TreeStore>`, so alternative engines
//! plug in without touching the mapping or navigation code.

use super::error::StoreResult;
use super::query::EqualityQuery;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of a node inside one store.
///
/// Identifiers survive moves and renames; a removed node's id is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Value of a node property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    String(String),
    Boolean(bool),
    Long(i64),
    Date(DateTime<Utc>),
    Binary(Vec<u8>),
    Strings(Vec<String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Booleans, tolerating the `"true"`/`"false"` strings older writers used.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            Self::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Binary payload; string values are returned as their UTF-8 bytes.
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            Self::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Multi-valued strings; a single string is promoted to a one-element list.
    pub fn as_strings(&self) -> Option<Vec<String>> {
        match self {
            Self::Strings(values) => Some(values.clone()),
            Self::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    /// Equality as evaluated by queries: a multi-valued property matches
    /// when any of its values equals the literal.
    pub fn matches(&self, literal: &PropertyValue) -> bool {
        match (self, literal) {
            (Self::Strings(values), Self::String(s)) => values.iter().any(|v| v == s),
            (Self::String(a), Self::Boolean(b)) | (Self::Boolean(b), Self::String(a)) => {
                a.parse::<bool>().map(|v| v == *b).unwrap_or(false)
            }
            (a, b) => a == b,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        Self::Strings(value)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

/// Property lookups shared by live nodes and frozen snapshots
pub trait PropertyAccess {
    fn properties(&self) -> &BTreeMap<String, PropertyValue>;

    fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties().get(name)
    }

    /// Non-empty string property
    fn string(&self, name: &str) -> Option<&str> {
        self.property(name)
            .and_then(PropertyValue::as_str)
            .filter(|s| !s.is_empty())
    }

    fn boolean(&self, name: &str) -> Option<bool> {
        self.property(name).and_then(PropertyValue::as_bool)
    }

    fn date(&self, name: &str) -> Option<DateTime<Utc>> {
        self.property(name).and_then(PropertyValue::as_date)
    }
}

/// Read-only view of a live node, detached from the session that loaded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub id: NodeId,
    pub name: String,
    pub path: String,
    pub parent: Option<NodeId>,
    pub primary_type: String,
    pub mixins: Vec<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    pub fn has_mixin(&self, mixin: &str) -> bool {
        self.mixins.iter().any(|m| m == mixin)
    }

    /// Path of the parent node, `None` for the root.
    pub fn parent_path(&self) -> Option<String> {
        parent_path_of(&self.path)
    }
}

impl PropertyAccess for NodeData {
    fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }
}

/// Immutable copy of a node subtree captured at check-in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrozenNode {
    pub name: String,
    pub primary_type: String,
    pub mixins: Vec<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub children: Vec<FrozenNode>,
}

impl FrozenNode {
    pub fn child(&self, name: &str) -> Option<&FrozenNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn has_mixin(&self, mixin: &str) -> bool {
        self.mixins.iter().any(|m| m == mixin)
    }
}

impl PropertyAccess for FrozenNode {
    fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }
}

/// One entry of a node's version history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    /// History identifier assigned by the store ("1.0", "1.1", ...)
    pub name: String,
    pub created: DateTime<Utc>,
    /// Historical path of the frozen snapshot
    pub path: String,
    /// Path of the versioned node when the snapshot was taken
    pub source_path: String,
    pub frozen: FrozenNode,
}

/// Login credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

/// Property declared by a node type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub required_type: String,
    pub multiple: bool,
}

/// Node type or mixin registered with the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeDefinition {
    pub name: String,
    pub supertypes: Vec<String>,
    pub is_mixin: bool,
    pub properties: Vec<PropertyDefinition>,
}

/// Entry point of a storage engine.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Authenticate and open a new session.
    ///
    /// # Errors
    ///
    /// `StoreError::Unavailable` when the engine cannot be reached,
    /// `StoreError::LoginFailed` when the credentials are rejected.
    async fn login(&self, credentials: &Credentials) -> StoreResult<Box<dyn TreeSession>>;
}

/// Short-lived handle into the store for one logical operation.
///
/// Sessions are not shared between concurrent operations. Writes become
/// durable on [`TreeSession::save`]; [`TreeSession::logout`] is synchronous
/// so it can run from `Drop`.
#[async_trait]
pub trait TreeSession: Send + Sync {
    /// Authenticated user
    fn user(&self) -> &str;

    /// Map a namespace prefix to a URI. Re-registering the same mapping is a no-op.
    async fn register_namespace(&self, prefix: &str, uri: &str) -> StoreResult<()>;

    /// Register node types and mixins.
    ///
    /// Existing definitions with the same name are replaced in place.
    ///
    /// # Returns
    ///
    /// The names that were not registered before this call.
    async fn register_node_types(&self, definitions: &[NodeTypeDefinition])
        -> StoreResult<Vec<String>>;

    /// True when a node type or mixin with this name is known.
    async fn has_node_type(&self, name: &str) -> StoreResult<bool>;

    /// Id of the root node
    async fn root(&self) -> StoreResult<NodeId>;

    /// Snapshot of a node, `None` when the id no longer resolves.
    async fn node(&self, id: NodeId) -> StoreResult<Option<NodeData>>;

    /// Resolve an absolute path.
    async fn node_at(&self, path: &str) -> StoreResult<Option<NodeId>>;

    /// Child of `parent` with the given name.
    async fn child(&self, parent: NodeId, name: &str) -> StoreResult<Option<NodeId>>;

    /// Children of `parent` in insertion order.
    async fn children(&self, parent: NodeId) -> StoreResult<Vec<NodeId>>;

    /// Absolute path of a node, derived from parent links.
    async fn path_of(&self, id: NodeId) -> StoreResult<String>;

    /// Create a child node.
    ///
    /// # Errors
    ///
    /// `ItemExists` when a sibling already uses the name, `UnknownNodeType`
    /// for unregistered primary types, `CheckedIn` when the parent is under
    /// version control and checked in.
    async fn add_node(&self, parent: NodeId, name: &str, primary_type: &str) -> StoreResult<NodeId>;

    /// Attach a registered mixin. Adding a mixin twice is a no-op.
    async fn add_mixin(&self, id: NodeId, mixin: &str) -> StoreResult<()>;

    async fn set_property(&self, id: NodeId, name: &str, value: PropertyValue) -> StoreResult<()>;

    /// Remove a property; removing an absent property is a no-op.
    async fn remove_property(&self, id: NodeId, name: &str) -> StoreResult<()>;

    /// Remove a node and its subtree. Version histories are retained.
    async fn remove(&self, id: NodeId) -> StoreResult<()>;

    /// Move a node below `new_parent` as `new_name`; covers renames in place.
    async fn move_node(&self, id: NodeId, new_parent: NodeId, new_name: &str) -> StoreResult<()>;

    /// Execute an equality query, returning matches in document order.
    async fn query(&self, query: &EqualityQuery) -> StoreResult<Vec<NodeId>>;

    /// True when the node carries `mix:versionable` (directly or by inheritance).
    async fn is_versionable(&self, id: NodeId) -> StoreResult<bool>;

    async fn is_checked_out(&self, id: NodeId) -> StoreResult<bool>;

    async fn checkout(&self, id: NodeId) -> StoreResult<()>;

    /// Snapshot the node subtree into its history and check it in.
    ///
    /// # Returns
    ///
    /// The history identifier of the new version.
    async fn checkin(&self, id: NodeId) -> StoreResult<String>;

    /// Version history, oldest first, starting with the root version.
    async fn version_history(&self, id: NodeId) -> StoreResult<Vec<VersionRecord>>;

    /// Persist pending changes.
    async fn save(&self) -> StoreResult<()>;

    /// Release the session. Idempotent.
    fn logout(&self);
}

/// Parent of an absolute path; `None` for `/`.
pub fn parent_path_of(path: &str) -> Option<String> {
    if path == "/" || path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

/// Join a parent path and a child name.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_path_of() {
        assert_eq!(parent_path_of("/"), None);
        assert_eq!(parent_path_of("/oaf"), Some("/".to_string()));
        assert_eq!(parent_path_of("/oaf/docs/a"), Some("/oaf/docs".to_string()));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "oaf"), "/oaf");
        assert_eq!(join_path("/oaf", "docs"), "/oaf/docs");
    }

    #[test]
    fn test_multi_value_matches_any() {
        let tags = PropertyValue::Strings(vec!["press".into(), "news".into()]);
        assert!(tags.matches(&PropertyValue::from("press")));
        assert!(!tags.matches(&PropertyValue::from("sports")));
    }

    #[test]
    fn test_boolean_matches_legacy_string() {
        let legacy = PropertyValue::from("true");
        assert!(legacy.matches(&PropertyValue::Boolean(true)));
        assert_eq!(legacy.as_bool(), Some(true));
    }
}
