//! ContentSpace Core Content Layer
//!
//! This crate maps typed content records onto a hierarchical, versioned node
//! store and reads them back, for the ContentSpace content management system.
//!
//! # Architecture
//!
//! - **Typed content over untyped nodes**: Every content item is a node tagged
//!   with the platform marker mixin; fields live in namespaced properties
//! - **Feature folders**: Content is filed below one folder per content type,
//!   with per-language subfolders for localized types
//! - **Versioned history**: Versionable items are checked in on every save and
//!   their history decodes back into content
//! - **Locale fallback**: Reads retry in the default language before yielding
//!   a not-found sentinel
//!
//! # Modules
//!
//! - [`models`] - Content records, content types, seed records
//! - [`services`] - Sessions, mapping, traversal, repository facade, bootstrap
//! - [`db`] - Tree store abstraction with an in-memory engine
//! - [`config`] - Repository configuration
//! - [`constants`] - Store vocabulary (node types, mixins, property names)

pub mod config;
pub mod constants;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::EcmConfig;
pub use models::*;
pub use services::*;
