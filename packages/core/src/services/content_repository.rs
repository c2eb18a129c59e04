//! Content Repository
//!
//! Domain-facing API over the tree store: save, delete and lookups with
//! locale fallback and sentinel semantics.
//!
//! # Architecture
//!
//! - Every public operation opens its own session through the
//!   [`SessionProvider`] and releases it when the guard drops
//! - Lookups go through the [`TreeNavigator`]; records are mapped by its
//!   [`ContentMapper`](super::content_mapper::ContentMapper)
//! - Language-scoped lookups retry once with the configured default
//!   language when the requested language has no match and differs from
//!   the default
//! - Read paths never return an absence for identifier lookups: an empty
//!   result becomes a single [`Content::not_found`] sentinel
//!
//! # Failure semantics
//!
//! Only [`RepositoryError::StoreUnavailable`] is returned. Every other store
//! or mapping failure is logged and the operation degrades to an empty
//! collection, a sentinel, or [`SaveOutcome::Skipped`].

use super::content_mapper::{escape_node_name, ContentMapper, DecodeOutcome};
use super::error::{MappingError, RepositoryError};
use super::session::SessionProvider;
use super::tree_navigator::{ContentTree, TraversalDepth, TraversalPolicy, TreeNavigator};
use crate::config::EcmConfig;
use crate::constants::{
    MIX_VERSIONABLE, NT_FOLDER, PLATFORM_MARKER, PLATFORM_VERSIONABLE, PROP_ACTIVE, PROP_APP,
    PROP_CONTENT_TYPE, PROP_LANGUAGE, PROP_TAGS, PROP_VIEW_ID,
};
use crate::db::{
    join_path, parent_path_of, EqualityQuery, NodeId, StoreError, TreeSession, TreeStore,
};
use crate::models::{Content, ContentType, FeatureFolder};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of [`ContentRepository::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Content was written at `path`
    Saved { path: String },
    /// Nothing was written; the reason has been logged
    Skipped { reason: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Saved { path } => Some(path),
            Self::Skipped { .. } => None,
        }
    }
}

/// Raise outages, log and degrade everything else.
fn degrade<T>(
    result: Result<T, MappingError>,
    operation: &str,
    fallback: impl FnOnce() -> T,
) -> Result<T, RepositoryError> {
    match result {
        Ok(value) => Ok(value),
        Err(MappingError::Store(e)) if e.is_unavailable() => {
            tracing::error!("{} failed, store unavailable: {}", operation, e);
            Err(RepositoryError::store_unavailable(e.to_string()))
        }
        Err(e) => {
            tracing::error!("{} failed: {}", operation, e);
            Ok(fallback())
        }
    }
}

/// Content repository facade
pub struct ContentRepository {
    sessions: Arc<SessionProvider>,
    navigator: TreeNavigator,
    config: Arc<EcmConfig>,
}

impl ContentRepository {
    pub fn new(sessions: Arc<SessionProvider>, config: Arc<EcmConfig>) -> Self {
        Self {
            sessions,
            navigator: TreeNavigator::new(config.clone()),
            config,
        }
    }

    /// Repository over `store`, authenticating with the configured
    /// administrative credentials.
    pub fn from_store(store: Arc<dyn TreeStore>, config: Arc<EcmConfig>) -> Self {
        let sessions = Arc::new(SessionProvider::new(store, config.credentials()));
        Self::new(sessions, config)
    }

    pub fn config(&self) -> &EcmConfig {
        &self.config
    }

    pub fn navigator(&self) -> &TreeNavigator {
        &self.navigator
    }

    pub fn sessions(&self) -> &SessionProvider {
        &self.sessions
    }

    fn mapper(&self) -> &ContentMapper {
        self.navigator.mapper()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Content matching `(view_id, language)`.
    ///
    /// Falls back to the default language, then to a single sentinel.
    pub async fn get(
        &self,
        view_id: &str,
        active_only: bool,
        language: &str,
    ) -> Result<Vec<Content>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let found = self
            .find_localized(&*session, language, |lang| {
                TreeNavigator::identifier_query(view_id, active_only, Some(lang))
            })
            .await;
        let found = degrade(found, "get", Vec::new)?;

        if found.is_empty() {
            tracing::info!(
                "No content for '{}' in '{}' or the default language",
                view_id,
                language
            );
            return Ok(vec![Content::not_found()]);
        }
        Ok(found)
    }

    /// First match of [`get`](Self::get), or the sentinel.
    pub async fn get_first(
        &self,
        view_id: &str,
        active_only: bool,
        language: &str,
    ) -> Result<Content, RepositoryError> {
        Ok(self
            .get(view_id, active_only, language)
            .await?
            .into_iter()
            .next()
            .unwrap_or_else(Content::not_found))
    }

    /// Active content of one type in `language`, with default-language fallback.
    pub async fn get_by_content_type(
        &self,
        content_type: ContentType,
        language: &str,
    ) -> Result<Vec<Content>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let found = self
            .find_localized(&*session, language, |lang| {
                EqualityQuery::new(PLATFORM_MARKER)
                    .and(PROP_CONTENT_TYPE, content_type.key())
                    .and(PROP_LANGUAGE, lang)
                    .and(PROP_ACTIVE, true)
            })
            .await;
        degrade(found, "get_by_content_type", Vec::new)
    }

    /// Decoded direct children of a folder.
    ///
    /// Absolute paths are used as given; relative paths are resolved below
    /// the documents folder.
    pub async fn get_folder_contents(&self, path: &str) -> Result<Vec<Content>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let absolute = self.documents_relative(path);
        let result = async {
            let Some(folder) = session.node_at(&absolute).await? else {
                tracing::warn!("Folder {} not found", absolute);
                return Ok(Vec::new());
            };
            self.navigator
                .traverse(
                    &*session,
                    folder,
                    TraversalDepth::Limited(1),
                    TraversalPolicy::SkipFailures,
                )
                .await
        }
        .await;
        degrade(result, "get_folder_contents", Vec::new)
    }

    /// Direct children of the first active item with this view id.
    pub async fn get_children_files(&self, view_id: &str) -> Result<Vec<Content>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let result = async {
            let matches = self
                .navigator
                .find_by_identifier(&*session, view_id, true, None)
                .await?;
            let Some(parent) = matches.first().copied() else {
                tracing::warn!("Element '{}' not found", view_id);
                return Ok(Vec::new());
            };
            self.navigator
                .traverse(
                    &*session,
                    parent,
                    TraversalDepth::Limited(1),
                    TraversalPolicy::SkipFailures,
                )
                .await
        }
        .await;
        degrade(result, "get_children_files", Vec::new)
    }

    /// Historical versions of the node at `path`, oldest first.
    ///
    /// The root version of the history is not included. Unknown or
    /// unversioned paths yield an empty list.
    pub async fn get_content_versions(&self, path: &str) -> Result<Vec<Content>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let result = async {
            let Some(node) = session.node_at(path).await? else {
                tracing::warn!("No content at {}", path);
                return Ok(Vec::new());
            };
            if !session.is_versionable(node).await? {
                tracing::debug!("{} is not under version control", path);
                return Ok(Vec::new());
            }

            self.decode_history(&*session, node, path).await
        }
        .await;
        degrade(result, "get_content_versions", Vec::new)
    }

    /// Newest version of a `doc_type` document that is valid now, looked up
    /// from `path` towards the documents folder.
    ///
    /// At each level the direct children that are versionable and whose
    /// view id contains `doc_type` are candidates, in `language` or else in
    /// the default language. The first level holding a version with a
    /// valid date in the past wins and the latest such valid date is
    /// returned, with the level as its `parent_path`. The documents folder
    /// itself is not searched; missing levels are passed over.
    pub async fn get_current_valid_version(
        &self,
        path: &str,
        doc_type: &str,
        language: &str,
    ) -> Result<Option<Content>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let documents = format!("{}/", self.config.folder_path(FeatureFolder::Documents));
        let now = Utc::now();
        let result = async {
            let mut level = Some(self.documents_relative(path));
            while let Some(current) = level.take().filter(|p| p.starts_with(&documents)) {
                if let Some(node) = session.node_at(&current).await? {
                    let mut valid = Vec::new();
                    for candidate in self
                        .versionable_children(&*session, node, doc_type, language)
                        .await?
                    {
                        let Some(candidate_path) = candidate.path.as_deref() else {
                            continue;
                        };
                        let Some(candidate_node) = session.node_at(candidate_path).await? else {
                            continue;
                        };
                        valid.extend(
                            self.decode_history(&*session, candidate_node, candidate_path)
                                .await?
                                .into_iter()
                                .filter(|v| valid_date(v).is_some_and(|date| date <= now)),
                        );
                    }
                    if let Some(mut newest) = valid.into_iter().max_by_key(valid_date) {
                        newest.parent_path = Some(current);
                        return Ok(Some(newest));
                    }
                }
                level = parent_path_of(&current);
            }
            tracing::warn!(
                "No valid '{}' version for path {} in '{}'",
                doc_type,
                path,
                language
            );
            Ok::<_, MappingError>(None)
        }
        .await;
        degrade(result, "get_current_valid_version", || None)
    }

    /// Number of textual items (html, news feed, notification) carrying `tag`.
    pub async fn count_by_tag_name(&self, tag: &str) -> Result<usize, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let result = async {
            let mut count = 0;
            for content_type in ContentType::ALL.into_iter().filter(|t| t.is_textual()) {
                let query = EqualityQuery::new(PLATFORM_MARKER)
                    .and(PROP_CONTENT_TYPE, content_type.key())
                    .and(PROP_TAGS, tag);
                tracing::debug!("Executing {}", query);
                count += session.query(&query).await?.len();
            }
            Ok::<_, MappingError>(count)
        }
        .await;
        degrade(result, "count_by_tag_name", || 0)
    }

    /// Html descriptions of every app in `language`, keyed by app.
    ///
    /// Descriptions are textual items carrying an app link.
    pub async fn get_app_descriptions(
        &self,
        language: &str,
    ) -> Result<BTreeMap<String, String>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let found = self
            .find_localized_where(
                &*session,
                language,
                |lang| EqualityQuery::new(PLATFORM_MARKER).and(PROP_LANGUAGE, lang),
                is_app_description,
            )
            .await;
        let found = degrade(found, "get_app_descriptions", Vec::new)?;

        Ok(found
            .into_iter()
            .filter_map(|content| match (content.app, content.html_content) {
                (Some(app), Some(html)) => Some((app, html)),
                _ => None,
            })
            .collect())
    }

    /// View id of the first item of `content_type` linked to `app`.
    pub async fn get_app_info_id(
        &self,
        content_type: ContentType,
        app: &str,
        language: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let found = self
            .find_localized(&*session, language, |lang| {
                EqualityQuery::new(PLATFORM_MARKER)
                    .and(PROP_CONTENT_TYPE, content_type.key())
                    .and(PROP_APP, app)
                    .and(PROP_LANGUAGE, lang)
            })
            .await;
        let found = degrade(found, "get_app_info_id", Vec::new)?;
        Ok(found.into_iter().next().map(|content| content.view_id))
    }

    /// Concatenated html descriptions of `app` in `language`.
    pub async fn get_app_desc(&self, app: &str, language: &str) -> Result<String, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let found = self
            .find_localized_where(
                &*session,
                language,
                |lang| {
                    EqualityQuery::new(PLATFORM_MARKER)
                        .and(PROP_APP, app)
                        .and(PROP_LANGUAGE, lang)
                },
                is_app_description,
            )
            .await;
        let found = degrade(found, "get_app_desc", Vec::new)?;
        Ok(found
            .into_iter()
            .filter_map(|content| content.html_content)
            .collect())
    }

    /// The documents folder and everything below it.
    pub async fn get_documents_tree(&self) -> Result<ContentTree, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let documents = self.config.folder_path(FeatureFolder::Documents);
        let result = async {
            let Some(folder) = session.node_at(&documents).await? else {
                tracing::warn!("Documents folder {} not found", documents);
                return Ok(ContentTree::default());
            };
            self.navigator.traverse_to_tree(&*session, folder).await
        }
        .await;
        degrade(result, "get_documents_tree", ContentTree::default)
    }

    /// A content item with its file bytes loaded.
    pub async fn load_file(&self, path: &str) -> Result<Option<Content>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let result = async {
            let Some(node) = session.node_at(path).await? else {
                tracing::warn!("No file at {}", path);
                return Ok(None);
            };
            let mut content = match self.mapper().decode(&*session, node).await {
                DecodeOutcome::Decoded(content) => content,
                DecodeOutcome::Skipped(reason) => {
                    tracing::warn!("{} holds no content ({:?})", path, reason);
                    return Ok(None);
                }
                DecodeOutcome::Failed(e) => return Err(e),
            };
            if let Some(file) = self.mapper().load_file(&*session, node).await? {
                content = content.with_file(file);
            }
            Ok::<_, MappingError>(Some(content))
        }
        .await;
        degrade(result, "load_file", || None)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create or update a content item.
    ///
    /// The node is found by `(view_id, language)` (last match wins), then by
    /// the content's stored path, and is created otherwise. The platform
    /// marker is applied to every saved node, the versionable mixins only to
    /// versionable content. On success the content's `path` and
    /// `parent_path` are updated.
    pub async fn save(&self, content: &mut Content) -> Result<SaveOutcome, RepositoryError> {
        if content.is_sentinel() {
            tracing::error!("Refusing to save sentinel content '{}'", content.view_id);
            return Ok(SaveOutcome::Skipped {
                reason: "sentinel content is never persisted".to_string(),
            });
        }

        let session = self.sessions.create_session().await?;
        match self.save_in(&*session, content).await {
            Ok(path) => {
                tracing::info!("[+] Saved content {} at {}", content.view_id, path);
                content.parent_path = parent_path_of(&path);
                content.path = Some(path.clone());
                Ok(SaveOutcome::Saved { path })
            }
            Err(MappingError::Store(StoreError::ItemExists(path))) => {
                tracing::warn!("Item {} already exists in this repository, skipping", path);
                Ok(SaveOutcome::Skipped {
                    reason: format!("{} already exists", path),
                })
            }
            Err(e) => {
                let reason = e.to_string();
                degrade(Err(e), "save", || ())?;
                Ok(SaveOutcome::Skipped { reason })
            }
        }
    }

    async fn save_in(
        &self,
        session: &dyn TreeSession,
        content: &mut Content,
    ) -> Result<String, MappingError> {
        let node_name = escape_node_name(&content.name);

        // Unaddressable records are new; encoding assigns their identity
        let existing = if content.lacks_identity() {
            None
        } else {
            self.resolve_identity(session, content).await?
        };

        let node = match existing {
            Some(node) => node,
            None => match self.resolve_stored_path(session, content).await? {
                Some(node) => node,
                None => self.create_node(session, content, &node_name).await?,
            },
        };

        if session.is_versionable(node).await? && !session.is_checked_out(node).await? {
            session.checkout(node).await?;
        }
        session.add_mixin(node, PLATFORM_MARKER).await?;
        if content.is_versionable() {
            session.add_mixin(node, MIX_VERSIONABLE).await?;
            session.add_mixin(node, PLATFORM_VERSIONABLE).await?;
        }
        let versionable = session.is_versionable(node).await?;

        self.mapper().encode(session, content, node).await?;
        session.save().await?;

        if versionable {
            let version = session.checkin(node).await?;
            tracing::debug!("Checked in {} as version {}", content.view_id, version);
        }

        Ok(session.path_of(node).await?)
    }

    /// Last node stored under the same `(view_id, language)`, moved to
    /// `parent_path/escaped name` when either part changed.
    async fn resolve_identity(
        &self,
        session: &dyn TreeSession,
        content: &mut Content,
    ) -> Result<Option<NodeId>, MappingError> {
        let query = EqualityQuery::new(PLATFORM_MARKER)
            .and(PROP_VIEW_ID, content.view_id.as_str())
            .and(PROP_LANGUAGE, content.language.as_str());
        let Some(node) = session.query(&query).await?.last().copied() else {
            return Ok(None);
        };
        let Some(data) = session.node(node).await? else {
            return Ok(None);
        };

        let Some(current_parent) = data.parent_path() else {
            return Ok(Some(node));
        };
        let wanted_parent = content
            .parent_path
            .get_or_insert_with(|| current_parent.clone())
            .clone();
        let node_name = escape_node_name(&content.name);
        let wanted = join_path(&wanted_parent, &node_name);

        if wanted != data.path {
            let target = session
                .node_at(&wanted_parent)
                .await?
                .ok_or_else(|| StoreError::path_not_found(wanted_parent.as_str()))?;
            session.move_node(node, target, &node_name).await?;
            tracing::info!("Moved {} from {} to {}", content.view_id, data.path, wanted);
        }

        Ok(Some(node))
    }

    async fn resolve_stored_path(
        &self,
        session: &dyn TreeSession,
        content: &Content,
    ) -> Result<Option<NodeId>, StoreError> {
        match content.path.as_deref() {
            Some(path) => session.node_at(path).await,
            None => Ok(None),
        }
    }

    async fn create_node(
        &self,
        session: &dyn TreeSession,
        content: &Content,
        node_name: &str,
    ) -> Result<NodeId, StoreError> {
        let parent = self.resolve_parent(session, content).await?;
        let node = session
            .add_node(parent, node_name, content.content_type.primary_node_type())
            .await?;

        if content.content_type == ContentType::Folder {
            self.navigator
                .ensure_locale_folders(session, parent, node_name, &self.config.supported_languages)
                .await?;
        }

        tracing::debug!(
            "Created {} node {} for '{}'",
            content.content_type.primary_node_type(),
            session.path_of(node).await?,
            content.view_id
        );
        Ok(node)
    }

    /// Parent path when given, otherwise the type's feature folder (and its
    /// language subfolder for localized folders).
    async fn resolve_parent(
        &self,
        session: &dyn TreeSession,
        content: &Content,
    ) -> Result<NodeId, StoreError> {
        if let Some(path) = content.parent_path.as_deref().filter(|p| !p.is_empty()) {
            return session
                .node_at(path)
                .await?
                .ok_or_else(|| StoreError::path_not_found(path));
        }

        let Some(folder) = content.content_type.feature_folder() else {
            let root = self.config.root_path();
            return session
                .node_at(&root)
                .await?
                .ok_or_else(|| StoreError::path_not_found(root));
        };

        let folder_path = self.config.folder_path(folder);
        let folder_node = session
            .node_at(&folder_path)
            .await?
            .ok_or_else(|| StoreError::path_not_found(&folder_path))?;

        let language = content.language.trim();
        if !folder.is_localized() || language.is_empty() {
            return Ok(folder_node);
        }

        if let Some(locale) = session.child(folder_node, language).await? {
            return Ok(locale);
        }
        let folder_parent = session
            .node_at(&self.config.root_path())
            .await?
            .ok_or_else(|| StoreError::path_not_found(self.config.root_path()))?;
        self.navigator
            .ensure_locale_folders(
                session,
                folder_parent,
                self.config.folder_name(folder),
                &[language.to_string()],
            )
            .await?;
        session
            .child(folder_node, language)
            .await?
            .ok_or_else(|| StoreError::path_not_found(join_path(&folder_path, language)))
    }

    /// Remove a content item by its stored path.
    pub async fn delete(&self, content: &Content) -> Result<(), RepositoryError> {
        match content.path.as_deref() {
            Some(path) => self.delete_path(path).await,
            None => {
                tracing::warn!("'{}' was never persisted, nothing to delete", content.view_id);
                Ok(())
            }
        }
    }

    /// Remove the node at `path`; a path that no longer resolves is a no-op.
    pub async fn delete_path(&self, path: &str) -> Result<(), RepositoryError> {
        let session = self.sessions.create_session().await?;
        let result = async {
            match session.node_at(path).await? {
                Some(node) => {
                    session.remove(node).await?;
                    session.save().await?;
                    tracing::info!("[-] Deleted {}", path);
                }
                None => tracing::debug!("Nothing to delete at {}", path),
            }
            Ok::<_, MappingError>(())
        }
        .await;
        degrade(result, "delete", || ())
    }

    /// Make sure `path` (relative to the documents folder) exists as a chain
    /// of folders.
    ///
    /// # Returns
    ///
    /// The absolute path, or `None` when it could not be created.
    pub async fn get_or_create_documents_path(
        &self,
        path: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let session = self.sessions.create_session().await?;
        let result = async {
            let mut current = session.root().await?;
            let segments = [
                self.config.root_node.as_str(),
                self.config.folder_name(FeatureFolder::Documents),
            ]
            .into_iter()
            .chain(path.split('/').filter(|s| !s.is_empty()));

            for segment in segments {
                current = match session.child(current, segment).await? {
                    Some(child) => child,
                    None => session.add_node(current, segment, NT_FOLDER).await?,
                };
            }
            session.save().await?;
            Ok::<_, MappingError>(Some(session.path_of(current).await?))
        }
        .await;
        degrade(result, "get_or_create_documents_path", || None)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn documents_relative(&self, path: &str) -> String {
        if path.starts_with('/') {
            path.to_string()
        } else {
            join_path(&self.config.folder_path(FeatureFolder::Documents), path)
        }
    }

    /// Decoded version history of `node`, oldest first.
    async fn decode_history(
        &self,
        session: &dyn TreeSession,
        node: NodeId,
        path: &str,
    ) -> Result<Vec<Content>, MappingError> {
        let mut versions = Vec::new();
        for record in session.version_history(node).await? {
            match self.mapper().decode_version(&record) {
                DecodeOutcome::Decoded(content) => versions.push(content),
                DecodeOutcome::Skipped(_) => {}
                DecodeOutcome::Failed(e) => {
                    tracing::warn!("Skipping version {} of {}: {}", record.name, path, e);
                }
            }
        }
        Ok(versions)
    }

    /// Versionable direct children of `node` whose view id contains
    /// `doc_type`, in `language` or else in the default language.
    async fn versionable_children(
        &self,
        session: &dyn TreeSession,
        node: NodeId,
        doc_type: &str,
        language: &str,
    ) -> Result<Vec<Content>, MappingError> {
        let children: Vec<Content> = self
            .navigator
            .traverse(
                session,
                node,
                TraversalDepth::Limited(1),
                TraversalPolicy::SkipFailures,
            )
            .await?
            .into_iter()
            .filter(|c| c.is_versionable() && c.view_id.contains(doc_type))
            .collect();

        let in_language = |lang: &str| -> Vec<Content> {
            children.iter().filter(|c| c.language == lang).cloned().collect()
        };
        let found = in_language(language);
        if found.is_empty() && language != self.config.default_language {
            return Ok(in_language(&self.config.default_language));
        }
        Ok(found)
    }

    /// Run `build(language)`, retrying with the default language when the
    /// result is empty and `language` is not already the default.
    async fn find_localized<F>(
        &self,
        session: &dyn TreeSession,
        language: &str,
        build: F,
    ) -> Result<Vec<Content>, MappingError>
    where
        F: Fn(&str) -> EqualityQuery + Send + Sync,
    {
        self.find_localized_where(session, language, build, |_| true)
            .await
    }

    async fn find_localized_where<F, P>(
        &self,
        session: &dyn TreeSession,
        language: &str,
        build: F,
        keep: P,
    ) -> Result<Vec<Content>, MappingError>
    where
        F: Fn(&str) -> EqualityQuery + Send + Sync,
        P: Fn(&Content) -> bool + Send + Sync,
    {
        let found: Vec<Content> = self
            .navigator
            .find(session, &build(language))
            .await?
            .into_iter()
            .filter(|c| keep(c))
            .collect();
        if !found.is_empty() || language == self.config.default_language {
            return Ok(found);
        }

        tracing::debug!(
            "Nothing found in '{}', retrying with default language '{}'",
            language,
            self.config.default_language
        );
        Ok(self
            .navigator
            .find(session, &build(&self.config.default_language))
            .await?
            .into_iter()
            .filter(|c| keep(c))
            .collect())
    }
}

fn valid_date(content: &Content) -> Option<DateTime<Utc>> {
    content.versioning.as_ref().and_then(|v| v.valid_date)
}

fn is_app_description(content: &Content) -> bool {
    content.app.is_some() && content.content_type.is_textual()
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "content_repository_test.rs"]
mod content_repository_test;
