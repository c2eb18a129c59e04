//! Content Services
//!
//! This module contains the content layer built on top of the tree store:
//!
//! - `SessionProvider` - Authenticated, scoped sessions
//! - `NodeTypeRegistrar` - Node type schema parsing and registration
//! - `ContentMapper` - Content <-> node encoding and decoding
//! - `TreeNavigator` - Bounded traversal and identifier queries
//! - `ContentRepository` - Localized reads, saves, deletes and version history
//! - `BootstrapSeeder` - Folder skeleton and seed import at startup
//!
//! Services never hand store handles to callers; everything crossing the
//! module boundary is a decoded `Content` value.

pub mod attachments;
pub mod bootstrap;
pub mod content_mapper;
pub mod content_repository;
pub mod error;
pub mod node_type_registrar;
pub mod seed_index;
pub mod session;
pub mod tree_navigator;

pub use attachments::{
    fetch_image, select_attachment_source, AttachmentSource, LocalAttachmentSource,
    NoAttachmentSource,
};
pub use bootstrap::{should_update_content, BootstrapReport, BootstrapSeeder, SEED_AUTHOR};
pub use content_mapper::{ContentMapper, DecodeOutcome, SkipReason};
pub use content_repository::{ContentRepository, SaveOutcome};
pub use error::{MappingError, RepositoryError, SeedError};
pub use node_type_registrar::{NodeTypeRegistrar, RegistrationReport, DEFAULT_NODE_TYPES};
pub use seed_index::SeedIndex;
pub use session::{SessionGuard, SessionProvider};
pub use tree_navigator::{
    ContentTree, TraversalDepth, TraversalPolicy, TreeEntry, TreeNavigator, TreeNodeKind,
};
