//! Tree Store Layer
//!
//! This module defines how the content services talk to the hierarchical,
//! versioned storage engine:
//!
//! - `TreeStore` / `TreeSession` traits (authentication, node CRUD,
//!   mixins, version history, equality queries)
//! - `MemoryTreeStore`, an arena-backed engine used by tests and the
//!   bootstrap dry-run binary
//! - `EqualityQuery`, the single query dialect the services need
//!
//! # Architecture
//!
//! Nodes are addressed by stable `NodeId`s. Paths are never stored; every
//! path is computed from parent links when asked for, so moves cannot leave
//! stale paths behind.

mod error;
mod memory_store;
mod query;
mod tree_store;

pub use error::{StoreError, StoreResult};
pub use memory_store::{MemorySession, MemoryTreeStore};
pub use query::{Condition, EqualityQuery};
pub use tree_store::{
    join_path, parent_path_of, Credentials, FrozenNode, NodeData, NodeId, NodeTypeDefinition,
    PropertyAccess, PropertyDefinition, PropertyValue, TreeSession, TreeStore, VersionRecord,
};
