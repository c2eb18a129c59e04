//! Store vocabulary shared by the engine, the mapper and the navigator.
//!
//! Names follow the `prefix:local` convention of hierarchical content
//! repositories. The `oaf` prefix is the platform namespace registered by
//! every session.

/// Platform namespace prefix
pub const PLATFORM_PREFIX: &str = "oaf";

/// Platform namespace URI
pub const PLATFORM_NAMESPACE_URI: &str = "http://contentspace.io/oaf/1.0";

// ============================================================================
// Node names
// ============================================================================

/// Body child holding the textual or binary payload of a content node
pub const BODY_NODE: &str = "jcr:content";

/// Internal subtree (version storage, type registry); never content
pub const SYSTEM_NODE: &str = "jcr:system";

/// Version storage below the system subtree
pub const VERSION_STORAGE_NODE: &str = "jcr:versionStorage";

/// Name of the snapshot node inside a version
pub const FROZEN_NODE: &str = "jcr:frozenNode";

/// Name of the empty version every history starts with
pub const ROOT_VERSION: &str = "jcr:rootVersion";

// ============================================================================
// Node types
// ============================================================================

pub const NT_BASE: &str = "nt:base";
pub const NT_FOLDER: &str = "nt:folder";
pub const NT_FILE: &str = "nt:file";
pub const NT_RESOURCE: &str = "nt:resource";
pub const NT_UNSTRUCTURED: &str = "nt:unstructured";
pub const REP_ROOT: &str = "rep:root";
pub const REP_SYSTEM: &str = "rep:system";
pub const MIX_VERSIONABLE: &str = "mix:versionable";
pub const MIX_REFERENCEABLE: &str = "mix:referenceable";
pub const MIX_CREATED: &str = "mix:created";

/// Marker mixin carried by every node the platform writes
pub const PLATFORM_MARKER: &str = "oaf:NodeType";

/// Platform mixin applied next to `mix:versionable`
pub const PLATFORM_VERSIONABLE: &str = "oaf:versionable";

// ============================================================================
// Properties
// ============================================================================

pub const PROP_VIEW_ID: &str = "oaf:viewId";
pub const PROP_NAME: &str = "oaf:name";
pub const PROP_CONTENT_TYPE: &str = "oaf:contentType";
pub const PROP_LANGUAGE: &str = "oaf:language";
pub const PROP_ACTIVE: &str = "oaf:active";
pub const PROP_SYSTEM: &str = "oaf:system";
pub const PROP_AUTHOR: &str = "oaf:author";
pub const PROP_TAGS: &str = "oaf:tags";
pub const PROP_PERMISSIONS: &str = "oaf:permissions";
pub const PROP_APP: &str = "oaf:app";
pub const PROP_CREATED: &str = "oaf:created";
pub const PROP_LAST_EDIT_DATE: &str = "oaf:lastEditDate";
pub const PROP_HTML_CONTENT: &str = "oaf:htmlContent";
pub const PROP_IMAGE: &str = "oaf:image";
pub const PROP_IMAGE_NAME: &str = "oaf:imageName";
pub const PROP_IMAGE_MIME_TYPE: &str = "oaf:imageMimeType";
pub const PROP_FILE_SIZE: &str = "oaf:fileSize";
pub const PROP_FILE_NAME: &str = "oaf:fileName";
pub const PROP_VERSION: &str = "oaf:version";
pub const PROP_VERSION_COMMENT: &str = "oaf:versionComment";
pub const PROP_VALID_DATE: &str = "oaf:validDate";
pub const PROP_UPDATE_ON_LAUNCH: &str = "oaf:updateOnLaunch";

pub const JCR_CREATED: &str = "jcr:created";
pub const JCR_DATA: &str = "jcr:data";
pub const JCR_MIME_TYPE: &str = "jcr:mimeType";
pub const JCR_ENCODING: &str = "jcr:encoding";
pub const JCR_LAST_MODIFIED: &str = "jcr:lastModified";

/// MIME type of textual bodies
pub const HTML_MIME_TYPE: &str = "text/html";

/// Encoding of textual bodies
pub const BODY_ENCODING: &str = "UTF-8";
