//! Content Mapper
//!
//! Bidirectional mapping between [`Content`] records and tree nodes.
//!
//! # Architecture
//!
//! - **Encode** writes scalar and collection attributes as `oaf:` properties,
//!   image bytes as a binary property, and the payload into the body child
//!   (`jcr:content`): html for textual types, file bytes for documents and
//!   images
//! - **Decode** reads a live node (plus its body child) back into a record
//!   and reports the result per node as a [`DecodeOutcome`]
//! - **Decode version** does the same for a frozen snapshot from the version
//!   history
//!
//! Decoding is tolerant: optional properties may be missing. Only the view
//! id and the content type are mandatory on platform nodes. Nodes without
//! the platform marker are foreign; folders among them decode to a minimal
//! record, everything else is skipped.

use super::error::MappingError;
use crate::constants::{
    BODY_ENCODING, BODY_NODE, HTML_MIME_TYPE, JCR_CREATED, JCR_DATA, JCR_ENCODING,
    JCR_LAST_MODIFIED, JCR_MIME_TYPE, NT_FOLDER, NT_RESOURCE, PLATFORM_MARKER,
    PLATFORM_VERSIONABLE, PROP_ACTIVE, PROP_APP, PROP_AUTHOR, PROP_CONTENT_TYPE, PROP_CREATED,
    PROP_FILE_NAME, PROP_FILE_SIZE, PROP_HTML_CONTENT, PROP_IMAGE, PROP_IMAGE_MIME_TYPE,
    PROP_IMAGE_NAME, PROP_LANGUAGE, PROP_LAST_EDIT_DATE, PROP_NAME, PROP_PERMISSIONS,
    PROP_SYSTEM, PROP_TAGS, PROP_UPDATE_ON_LAUNCH, PROP_VALID_DATE, PROP_VERSION,
    PROP_VERSION_COMMENT, PROP_VIEW_ID, ROOT_VERSION, SYSTEM_NODE,
};
use crate::db::{
    parent_path_of, NodeData, NodeId, PropertyAccess, PropertyValue, TreeSession, VersionRecord,
};
use crate::models::{
    Attachment, Content, ContentType, ContentVersion, Versioning, DEFAULT_PERMISSIONS,
};
use chrono::Utc;
use uuid::Uuid;

/// MIME type assumed for images stored without one
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/png";

/// Why a node produced no content record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Node lacks the platform marker and is not a folder
    Foreign,
    /// System subtree or a body child
    Internal,
    /// Empty snapshot at the start of every version history
    RootVersion,
}

/// Result of decoding one node
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Decoded(Content),
    Skipped(SkipReason),
    Failed(MappingError),
}

impl DecodeOutcome {
    pub fn into_content(self) -> Option<Content> {
        match self {
            Self::Decoded(content) => Some(content),
            Self::Skipped(_) | Self::Failed(_) => None,
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }
}

/// Escape characters that are illegal in node names as `%XX`.
///
/// # Examples
///
/// ```rust
/// # use contentspace_core::services::content_mapper::{escape_node_name, unescape_node_name};
/// assert_eq!(escape_node_name("a/b:c"), "a%2Fb%3Ac");
/// assert_eq!(unescape_node_name("a%2Fb%3Ac"), "a/b:c");
/// ```
pub fn escape_node_name(name: &str) -> String {
    if name == "." || name == ".." {
        return name.replace('.', "%2E");
    }
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '%' | '/' | ':' | '[' | ']' | '*' | '|') || c.is_control() {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push_str(&format!("%{:02X}", byte));
            }
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Reverse of [`escape_node_name`]; malformed escapes are kept verbatim.
pub fn unescape_node_name(name: &str) -> String {
    fn hex(b: u8) -> Option<u8> {
        (b as char).to_digit(16).map(|d| d as u8)
    }

    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push(high << 4 | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Maps content records to and from tree nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentMapper;

impl ContentMapper {
    pub fn new() -> Self {
        Self
    }

    /// Give new content an identity: a random view id when the record
    /// cannot be addressed (see [`Content::lacks_identity`]) and a creation
    /// date when absent.
    pub fn decorate_new(content: &mut Content) {
        if content.lacks_identity() {
            content.view_id = Uuid::new_v4().to_string();
            tracing::debug!(
                "Assigned view id {} to new content '{}'",
                content.view_id,
                content.name
            );
        }
        if content.created_at.is_none() {
            content.created_at = Some(Utc::now());
        }
    }

    /// Write `content` onto `node`.
    ///
    /// Blank view ids are assigned, versioning defaults (version `1.0`,
    /// valid date now) are filled in, and the record's derived fields
    /// (`last_edit_date`, `file_size`, `mime_type`) are updated to what was
    /// written. A document or image without file bytes keeps the file
    /// already stored on the node.
    pub async fn encode(
        &self,
        session: &dyn TreeSession,
        content: &mut Content,
        node: NodeId,
    ) -> Result<(), MappingError> {
        Self::decorate_new(content);
        let now = Utc::now();
        let last_edit = *content.last_edit_date.get_or_insert(now);

        session
            .set_property(node, PROP_VIEW_ID, content.view_id.as_str().into())
            .await?;
        session
            .set_property(node, PROP_NAME, content.name.as_str().into())
            .await?;
        session
            .set_property(node, PROP_CONTENT_TYPE, content.content_type.key().into())
            .await?;
        session
            .set_property(node, PROP_LANGUAGE, content.language.as_str().into())
            .await?;
        session
            .set_property(node, PROP_ACTIVE, content.active.into())
            .await?;
        session
            .set_property(node, PROP_SYSTEM, content.system.into())
            .await?;
        session
            .set_property(node, PROP_TAGS, content.tags.clone().into())
            .await?;
        session
            .set_property(node, PROP_PERMISSIONS, content.permissions.as_str().into())
            .await?;
        set_optional(session, node, PROP_AUTHOR, content.author.as_deref().map(Into::into))
            .await?;
        set_optional(session, node, PROP_APP, content.app.as_deref().map(Into::into)).await?;
        set_optional(session, node, PROP_CREATED, content.created_at.map(Into::into)).await?;
        session
            .set_property(node, PROP_LAST_EDIT_DATE, last_edit.into())
            .await?;

        self.encode_image(session, content, node).await?;
        self.encode_versioning(session, content, node).await?;

        match content.content_type {
            ContentType::Html | ContentType::NewsFeed | ContentType::Notification => {
                let html = content.html_content.clone().unwrap_or_default();
                let body = ensure_body(session, node).await?;
                session.set_property(body, JCR_DATA, html.into()).await?;
                session
                    .set_property(body, JCR_MIME_TYPE, HTML_MIME_TYPE.into())
                    .await?;
                session
                    .set_property(body, JCR_ENCODING, BODY_ENCODING.into())
                    .await?;
                session
                    .set_property(body, JCR_LAST_MODIFIED, now.into())
                    .await?;
                session.remove_property(node, PROP_HTML_CONTENT).await?;
            }
            ContentType::Document | ContentType::Image => {
                if let Some(file) = &content.file {
                    let body = ensure_body(session, node).await?;
                    session
                        .set_property(body, JCR_DATA, file.data.clone().into())
                        .await?;
                    session
                        .set_property(body, JCR_MIME_TYPE, file.mime_type.as_str().into())
                        .await?;
                    session
                        .set_property(body, JCR_LAST_MODIFIED, now.into())
                        .await?;
                    session
                        .set_property(node, PROP_FILE_SIZE, (file.size() as i64).into())
                        .await?;
                    session
                        .set_property(node, PROP_FILE_NAME, file.name.as_str().into())
                        .await?;
                    content.file_size = Some(file.size());
                    content.mime_type = Some(file.mime_type.clone());
                }
                set_optional(
                    session,
                    node,
                    PROP_HTML_CONTENT,
                    content.html_content.as_deref().map(Into::into),
                )
                .await?;
            }
            ContentType::Folder | ContentType::Tag | ContentType::Error => {
                set_optional(
                    session,
                    node,
                    PROP_HTML_CONTENT,
                    content.html_content.as_deref().map(Into::into),
                )
                .await?;
            }
        }

        tracing::debug!(
            "Encoded {} '{}' ({}) onto {}",
            content.content_type,
            content.view_id,
            content.language,
            node
        );
        Ok(())
    }

    async fn encode_image(
        &self,
        session: &dyn TreeSession,
        content: &Content,
        node: NodeId,
    ) -> Result<(), MappingError> {
        match &content.image {
            Some(image) => {
                session
                    .set_property(node, PROP_IMAGE, image.data.clone().into())
                    .await?;
                session
                    .set_property(node, PROP_IMAGE_NAME, image.name.as_str().into())
                    .await?;
                session
                    .set_property(node, PROP_IMAGE_MIME_TYPE, image.mime_type.as_str().into())
                    .await?;
            }
            None => {
                for name in [PROP_IMAGE, PROP_IMAGE_NAME, PROP_IMAGE_MIME_TYPE] {
                    session.remove_property(node, name).await?;
                }
            }
        }
        Ok(())
    }

    async fn encode_versioning(
        &self,
        session: &dyn TreeSession,
        content: &mut Content,
        node: NodeId,
    ) -> Result<(), MappingError> {
        let Some(versioning) = content.versioning.as_mut() else {
            return Ok(());
        };

        let version = versioning
            .version
            .get_or_insert_with(ContentVersion::initial)
            .clone();
        let valid_date = *versioning.valid_date.get_or_insert_with(Utc::now);

        session
            .set_property(node, PROP_VERSION, version.as_str().into())
            .await?;
        session
            .set_property(node, PROP_VALID_DATE, valid_date.into())
            .await?;
        session
            .set_property(node, PROP_UPDATE_ON_LAUNCH, versioning.update_on_launch.into())
            .await?;
        set_optional(
            session,
            node,
            PROP_VERSION_COMMENT,
            versioning.version_comment.as_deref().map(Into::into),
        )
        .await?;
        Ok(())
    }

    /// Decode a live node.
    pub async fn decode(&self, session: &dyn TreeSession, node: NodeId) -> DecodeOutcome {
        let data = match session.node(node).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                return DecodeOutcome::Failed(MappingError::Store(
                    crate::db::StoreError::node_not_found(node.to_string()),
                ))
            }
            Err(e) => return DecodeOutcome::Failed(e.into()),
        };

        if data.name == SYSTEM_NODE || data.name == BODY_NODE {
            return DecodeOutcome::Skipped(SkipReason::Internal);
        }
        if !data.has_mixin(PLATFORM_MARKER) {
            return decode_foreign(&data);
        }

        let body = match load_body(session, node).await {
            Ok(body) => body,
            Err(e) => return DecodeOutcome::Failed(e),
        };

        let versionable = data.has_mixin(PLATFORM_VERSIONABLE);
        match build_content(&data, body.as_ref(), &data.name, versionable) {
            Ok(mut content) => {
                content.parent_path = data.parent_path();
                content.path = Some(data.path.clone());
                DecodeOutcome::Decoded(content)
            }
            Err(reason) => DecodeOutcome::Failed(MappingError::malformed(&data.path, reason)),
        }
    }

    /// Decode a snapshot from a version history.
    ///
    /// The version id comes from `oaf:version` when present, otherwise from
    /// the store's history identifier. The record's path is the historical
    /// frozen-node path.
    pub fn decode_version(&self, record: &VersionRecord) -> DecodeOutcome {
        if record.name == ROOT_VERSION {
            return DecodeOutcome::Skipped(SkipReason::RootVersion);
        }

        let frozen = &record.frozen;
        let node_name = record
            .source_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        match build_content(frozen, frozen.child(BODY_NODE), &node_name, true) {
            Ok(mut content) => {
                let versioning = content.versioning.get_or_insert_with(Versioning::default);
                if versioning.version.is_none() {
                    versioning.version = Some(ContentVersion::new(&record.name));
                }
                content.path = Some(record.path.clone());
                content.parent_path = parent_path_of(&record.source_path);
                DecodeOutcome::Decoded(content)
            }
            Err(reason) => DecodeOutcome::Failed(MappingError::malformed(&record.path, reason)),
        }
    }

    /// Load a document's file bytes from its body child.
    pub async fn load_file(
        &self,
        session: &dyn TreeSession,
        node: NodeId,
    ) -> Result<Option<Attachment>, MappingError> {
        let Some(data) = session.node(node).await? else {
            return Ok(None);
        };
        let Some(body) = load_body(session, node).await? else {
            return Ok(None);
        };
        let Some(bytes) = body.property(JCR_DATA).and_then(PropertyValue::as_binary) else {
            return Ok(None);
        };

        let name = data
            .string(PROP_FILE_NAME)
            .map(str::to_string)
            .unwrap_or_else(|| unescape_node_name(&data.name));
        let mime_type = body
            .string(JCR_MIME_TYPE)
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(&name)
                    .first_or_octet_stream()
                    .to_string()
            });
        Ok(Some(Attachment::new(name, mime_type, bytes.to_vec())))
    }
}

async fn set_optional(
    session: &dyn TreeSession,
    node: NodeId,
    name: &str,
    value: Option<PropertyValue>,
) -> Result<(), MappingError> {
    match value {
        Some(value) => session.set_property(node, name, value).await?,
        None => session.remove_property(node, name).await?,
    }
    Ok(())
}

async fn ensure_body(session: &dyn TreeSession, node: NodeId) -> Result<NodeId, MappingError> {
    match session.child(node, BODY_NODE).await? {
        Some(body) => Ok(body),
        None => Ok(session.add_node(node, BODY_NODE, NT_RESOURCE).await?),
    }
}

async fn load_body(
    session: &dyn TreeSession,
    node: NodeId,
) -> Result<Option<NodeData>, MappingError> {
    match session.child(node, BODY_NODE).await? {
        Some(body) => Ok(session.node(body).await?),
        None => Ok(None),
    }
}

/// Minimal record for unmarked folders; other foreign nodes are skipped.
fn decode_foreign(data: &NodeData) -> DecodeOutcome {
    if data.primary_type != NT_FOLDER {
        return DecodeOutcome::Skipped(SkipReason::Foreign);
    }
    let name = unescape_node_name(&data.name);
    let mut folder = Content::new(name.clone(), name, ContentType::Folder, "");
    folder.created_at = data.date(JCR_CREATED);
    folder.parent_path = data.parent_path();
    folder.path = Some(data.path.clone());
    DecodeOutcome::Decoded(folder)
}

/// Attribute decoding shared by live nodes and frozen snapshots.
fn build_content<P: PropertyAccess>(
    node: &P,
    body: Option<&P>,
    node_name: &str,
    versionable: bool,
) -> Result<Content, String> {
    let view_id = node
        .string(PROP_VIEW_ID)
        .ok_or_else(|| format!("missing {}", PROP_VIEW_ID))?
        .to_string();
    let content_type: ContentType = node
        .string(PROP_CONTENT_TYPE)
        .ok_or_else(|| format!("missing {}", PROP_CONTENT_TYPE))?
        .parse()?;

    let name = node
        .string(PROP_NAME)
        .map(str::to_string)
        .unwrap_or_else(|| unescape_node_name(node_name));
    let language = node
        .property(PROP_LANGUAGE)
        .and_then(PropertyValue::as_str)
        .unwrap_or_default()
        .to_string();

    let mut content = Content::new(view_id, name, content_type, language);
    content.active = node.boolean(PROP_ACTIVE).unwrap_or(true);
    content.system = node.boolean(PROP_SYSTEM).unwrap_or(false);
    content.author = node.string(PROP_AUTHOR).map(str::to_string);
    content.tags = node
        .property(PROP_TAGS)
        .and_then(PropertyValue::as_strings)
        .unwrap_or_default();
    content.permissions = node
        .string(PROP_PERMISSIONS)
        .unwrap_or(DEFAULT_PERMISSIONS)
        .to_string();
    content.app = node.string(PROP_APP).map(str::to_string);
    content.created_at = node.date(PROP_CREATED).or_else(|| node.date(JCR_CREATED));
    content.last_edit_date = node.date(PROP_LAST_EDIT_DATE);

    content.html_content = if content_type.is_textual() {
        body.and_then(|b| b.property(JCR_DATA))
            .and_then(PropertyValue::as_binary)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .or_else(|| node.string(PROP_HTML_CONTENT).map(str::to_string))
    } else {
        node.string(PROP_HTML_CONTENT).map(str::to_string)
    };

    if let Some(bytes) = node.property(PROP_IMAGE).and_then(PropertyValue::as_binary) {
        content.image = Some(Attachment::new(
            node.string(PROP_IMAGE_NAME).unwrap_or_default(),
            node.string(PROP_IMAGE_MIME_TYPE)
                .unwrap_or(DEFAULT_IMAGE_MIME_TYPE),
            bytes.to_vec(),
        ));
    }

    match content_type {
        ContentType::Document => {
            // bytes stay in the store until load_file
            content.file_size = node
                .property(PROP_FILE_SIZE)
                .and_then(PropertyValue::as_long)
                .and_then(|n| u64::try_from(n).ok());
            content.mime_type = body.and_then(|b| b.string(JCR_MIME_TYPE)).map(str::to_string);
        }
        ContentType::Image => {
            let mime_type = body.and_then(|b| b.string(JCR_MIME_TYPE)).map(str::to_string);
            if let Some(bytes) = body
                .and_then(|b| b.property(JCR_DATA))
                .and_then(PropertyValue::as_binary)
            {
                let file_name = node
                    .string(PROP_FILE_NAME)
                    .map(str::to_string)
                    .unwrap_or_else(|| content.name.clone());
                content = content.with_file(Attachment::new(
                    file_name,
                    mime_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_IMAGE_MIME_TYPE.to_string()),
                    bytes.to_vec(),
                ));
            }
        }
        ContentType::Folder
        | ContentType::Html
        | ContentType::NewsFeed
        | ContentType::Notification
        | ContentType::Tag
        | ContentType::Error => {}
    }

    let has_version_props = [PROP_VERSION, PROP_VERSION_COMMENT, PROP_VALID_DATE]
        .iter()
        .any(|p| node.property(p).is_some());
    if versionable || has_version_props {
        content.versioning = Some(Versioning {
            version: node.string(PROP_VERSION).map(ContentVersion::from),
            version_comment: node.string(PROP_VERSION_COMMENT).map(str::to_string),
            valid_date: node.date(PROP_VALID_DATE),
            update_on_launch: node.boolean(PROP_UPDATE_ON_LAUNCH).unwrap_or(false),
        });
    }

    Ok(content)
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "content_mapper_test.rs"]
mod content_mapper_test;
