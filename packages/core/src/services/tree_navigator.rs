//! Tree Navigator
//!
//! Depth-bounded traversal of the content tree, per-language folder
//! provisioning, and identifier lookups.
//!
//! # Architecture
//!
//! - Traversal is an explicit depth-first stack walk (pre-order, children
//!   in store order); the start node itself is never emitted
//! - The system subtree (`jcr:system`) and every body child (`jcr:content`)
//!   are pruned before decoding, including everything below them
//! - Each visited node is decoded into a [`DecodeOutcome`]; skipped nodes
//!   are not emitted but their children are still walked, failed nodes are
//!   handled according to the [`TraversalPolicy`]
//! - Tree results are arenas: entries point to their parent by index

use super::content_mapper::{ContentMapper, DecodeOutcome};
use super::error::{MappingError, RepositoryError};
use super::node_type_registrar::{NodeTypeRegistrar, RegistrationReport};
use crate::config::EcmConfig;
use crate::constants::{
    BODY_NODE, NT_FOLDER, PLATFORM_MARKER, PROP_ACTIVE, PROP_LANGUAGE, PROP_VIEW_ID, SYSTEM_NODE,
};
use crate::db::{EqualityQuery, NodeId, StoreError, TreeSession};
use crate::models::{Content, ContentType};
use serde::Serialize;
use std::sync::Arc;

/// How deep a traversal goes below its start node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDepth {
    Unbounded,
    /// Direct children are depth 1
    Limited(u32),
}

impl TraversalDepth {
    /// `-1` (any negative value) means unbounded.
    pub fn from_raw(depth: i32) -> Self {
        u32::try_from(depth).map_or(Self::Unbounded, Self::Limited)
    }

    fn includes(&self, depth: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limited(max) => depth <= *max,
        }
    }
}

/// What a traversal does with a node that fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalPolicy {
    /// Log the failure and keep walking
    #[default]
    SkipFailures,
    /// Stop and return the failure
    AbortOnFailure,
}

/// Marks entries callers may want to lazy-load bytes for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeNodeKind {
    Document,
    Default,
}

/// One decoded node in a [`ContentTree`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEntry {
    pub content: Content,
    pub kind: TreeNodeKind,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Arena of decoded nodes linked to their parents by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentTree {
    entries: Vec<TreeEntry>,
    roots: Vec<usize>,
}

impl ContentTree {
    fn push(&mut self, content: Content, parent: Option<usize>) -> usize {
        let kind = if content.content_type == ContentType::Document {
            TreeNodeKind::Document
        } else {
            TreeNodeKind::Default
        };
        let index = self.entries.len();
        self.entries.push(TreeEntry {
            content,
            kind,
            parent,
            children: Vec::new(),
        });
        match parent.and_then(|p| self.entries.get_mut(p)) {
            Some(parent_entry) => parent_entry.children.push(index),
            None => self.roots.push(index),
        }
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TreeEntry> {
        self.entries.get(index)
    }

    pub fn roots(&self) -> impl Iterator<Item = &TreeEntry> {
        self.roots.iter().filter_map(|i| self.entries.get(*i))
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = &TreeEntry> {
        self.entries
            .get(index)
            .into_iter()
            .flat_map(|e| e.children.iter())
            .filter_map(|i| self.entries.get(*i))
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Entries tagged as documents
    pub fn documents(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == TreeNodeKind::Document)
    }

    pub fn position(&self, view_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.content.view_id == view_id)
    }

    /// Names from the root down to `index`, inclusive.
    pub fn lineage(&self, index: usize) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            match self.entries.get(i) {
                Some(entry) => {
                    names.push(entry.content.name.as_str());
                    current = entry.parent;
                }
                None => break,
            }
        }
        names.reverse();
        names
    }
}

fn is_internal(name: &str) -> bool {
    name == SYSTEM_NODE || name == BODY_NODE
}

/// Walks and queries the content tree.
pub struct TreeNavigator {
    mapper: ContentMapper,
    config: Arc<EcmConfig>,
}

impl TreeNavigator {
    pub fn new(config: Arc<EcmConfig>) -> Self {
        Self {
            mapper: ContentMapper::new(),
            config,
        }
    }

    pub fn mapper(&self) -> &ContentMapper {
        &self.mapper
    }

    /// Register custom node types; safe to repeat.
    pub async fn register_types(
        &self,
        session: &dyn TreeSession,
        schema_text: &str,
    ) -> Result<RegistrationReport, RepositoryError> {
        NodeTypeRegistrar::register(session, schema_text).await
    }

    /// Make sure `parent/folder_name/<language>` exists for each language.
    ///
    /// Only applies to the localized feature folders (html, news feed,
    /// notifications); other names are left alone. Creates `folder_name`
    /// itself when it is missing.
    ///
    /// # Returns
    ///
    /// Paths of the folders this call created.
    pub async fn ensure_locale_folders(
        &self,
        session: &dyn TreeSession,
        parent: NodeId,
        folder_name: &str,
        languages: &[String],
    ) -> Result<Vec<String>, StoreError> {
        if !self.config.is_localized_folder(folder_name) {
            tracing::debug!("'{}' has no locale folders", folder_name);
            return Ok(Vec::new());
        }

        let mut created = Vec::new();
        let folder = match session.child(parent, folder_name).await? {
            Some(folder) => folder,
            None => {
                let folder = session.add_node(parent, folder_name, NT_FOLDER).await?;
                created.push(session.path_of(folder).await?);
                folder
            }
        };

        for language in languages.iter().filter(|l| !l.trim().is_empty()) {
            if session.child(folder, language).await?.is_some() {
                tracing::debug!(
                    "Locale folder '{}' below '{}' already exists, skipping",
                    language,
                    folder_name
                );
                continue;
            }
            let node = session.add_node(folder, language, NT_FOLDER).await?;
            let path = session.path_of(node).await?;
            tracing::info!("Created locale folder {}", path);
            created.push(path);
        }

        Ok(created)
    }

    /// Depth-first walk below `root`, emitting decoded content.
    ///
    /// # Errors
    ///
    /// Store failures always abort the walk; decode failures only abort
    /// under [`TraversalPolicy::AbortOnFailure`].
    pub async fn traverse(
        &self,
        session: &dyn TreeSession,
        root: NodeId,
        depth: TraversalDepth,
        policy: TraversalPolicy,
    ) -> Result<Vec<Content>, MappingError> {
        let mut results = Vec::new();
        let mut stack: Vec<(NodeId, u32)> = session
            .children(root)
            .await?
            .into_iter()
            .rev()
            .map(|child| (child, 1))
            .collect();

        while let Some((id, level)) = stack.pop() {
            if !depth.includes(level) {
                continue;
            }
            let Some(data) = session.node(id).await? else {
                continue;
            };
            if is_internal(&data.name) {
                continue;
            }

            match self.mapper.decode(session, id).await {
                DecodeOutcome::Decoded(content) => results.push(content),
                DecodeOutcome::Skipped(reason) => {
                    tracing::trace!("Skipped {} ({:?})", data.path, reason);
                }
                DecodeOutcome::Failed(MappingError::Store(e)) => return Err(e.into()),
                DecodeOutcome::Failed(err) => match policy {
                    TraversalPolicy::SkipFailures => {
                        tracing::warn!("Skipping undecodable node {}: {}", data.path, err);
                    }
                    TraversalPolicy::AbortOnFailure => return Err(err),
                },
            }

            if depth.includes(level + 1) {
                stack.extend(data.children.iter().rev().map(|child| (*child, level + 1)));
            }
        }

        Ok(results)
    }

    /// Walk everything below `root` into a [`ContentTree`].
    ///
    /// The start node becomes the single root entry when it decodes;
    /// otherwise its children are the roots. Children of skipped or failed
    /// nodes attach to the nearest decoded ancestor.
    pub async fn traverse_to_tree(
        &self,
        session: &dyn TreeSession,
        root: NodeId,
    ) -> Result<ContentTree, MappingError> {
        let mut tree = ContentTree::default();
        let mut stack: Vec<(NodeId, Option<usize>)> = vec![(root, None)];

        while let Some((id, parent)) = stack.pop() {
            let Some(data) = session.node(id).await? else {
                continue;
            };
            if is_internal(&data.name) {
                continue;
            }

            let attach_to = match self.mapper.decode(session, id).await {
                DecodeOutcome::Decoded(content) => Some(tree.push(content, parent)),
                DecodeOutcome::Skipped(_) => parent,
                DecodeOutcome::Failed(MappingError::Store(e)) => return Err(e.into()),
                DecodeOutcome::Failed(err) => {
                    tracing::warn!("Skipping undecodable node {}: {}", data.path, err);
                    parent
                }
            };

            stack.extend(data.children.iter().rev().map(|child| (*child, attach_to)));
        }

        Ok(tree)
    }

    /// Equality query for `(view_id, language)` lookups.
    ///
    /// A blank or absent language matches every language.
    pub fn identifier_query(
        view_id: &str,
        active_only: bool,
        language: Option<&str>,
    ) -> EqualityQuery {
        let query = EqualityQuery::new(PLATFORM_MARKER)
            .and(PROP_VIEW_ID, view_id)
            .and_some(PROP_LANGUAGE, language.filter(|l| !l.trim().is_empty()));
        if active_only {
            query.and(PROP_ACTIVE, true)
        } else {
            query
        }
    }

    /// Nodes matching `(view_id, language)`, in store order.
    pub async fn find_by_identifier(
        &self,
        session: &dyn TreeSession,
        view_id: &str,
        active_only: bool,
        language: Option<&str>,
    ) -> Result<Vec<NodeId>, StoreError> {
        let query = Self::identifier_query(view_id, active_only, language);
        tracing::debug!("Executing {}", query);
        session.query(&query).await
    }

    /// Execute a query and decode every match.
    ///
    /// Malformed matches are logged and left out; store failures propagate.
    pub async fn find(
        &self,
        session: &dyn TreeSession,
        query: &EqualityQuery,
    ) -> Result<Vec<Content>, StoreError> {
        tracing::debug!("Executing {}", query);
        let mut results = Vec::new();
        for id in session.query(query).await? {
            match self.mapper.decode(session, id).await {
                DecodeOutcome::Decoded(content) => results.push(content),
                DecodeOutcome::Skipped(_) => {}
                DecodeOutcome::Failed(MappingError::Store(e)) => return Err(e),
                DecodeOutcome::Failed(err) => {
                    tracing::warn!("Ignoring malformed query match {}: {}", id, err);
                }
            }
        }
        Ok(results)
    }
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "tree_navigator_test.rs"]
mod tree_navigator_test;
