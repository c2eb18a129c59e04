//! Data Models
//!
//! Content records, content types, and the seed records they are built from.

mod content;
mod content_type;
mod seed;

pub use content::{
    Attachment, Content, ContentVersion, ValidationError, Versioning, DEFAULT_PERMISSIONS,
    NOT_FOUND_MESSAGE, NOT_FOUND_NAME,
};
pub use content_type::{ContentType, FeatureFolder};
pub use seed::SeedRecord;
