//! Bootstrap
//!
//! Startup routine that brings a store into the shape the repository
//! expects, then imports seed content.
//!
//! # Architecture
//!
//! - Node types come from the configured schema resource; when it cannot be
//!   read or parsed the built-in schema is registered instead
//! - The root folder lives directly below `/` with its name as view id
//! - Every feature folder lives below the root; the localized ones get one
//!   subfolder per supported language
//! - Configured document folders are created below the documents folder
//! - Seed content is saved when [`should_update_content`] says so
//!
//! Every step only creates what is missing, so the routine can be re-run
//! against a fully or partially initialized store.

use super::content_repository::{ContentRepository, SaveOutcome};
use super::error::RepositoryError;
use super::node_type_registrar::{NodeTypeRegistrar, DEFAULT_NODE_TYPES};
use super::seed_index::SeedIndex;
use crate::config::EcmConfig;
use crate::db::{join_path, StoreError};
use crate::models::{Content, ContentType, FeatureFolder};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Author recorded on seeded content
pub const SEED_AUTHOR: &str = "System";

/// What a bootstrap run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapReport {
    /// Node types that were new to the store
    pub registered_types: Vec<String>,
    /// True when the configured schema resource was unusable
    pub builtin_schema: bool,
    /// Paths of folders created by this run
    pub created_folders: Vec<String>,
    pub seeded: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Decide whether a seed record should overwrite what is stored.
///
/// Content is written when nothing usable is stored, when a non-tag item
/// sits below a different parent than the seed asks for, and when a
/// versionable seed carries a strictly newer version. Other
/// non-versionable content is rewritten unless `insert_only` is set.
pub fn should_update_content(seed: &Content, existing: Option<&Content>, insert_only: bool) -> bool {
    let Some(existing) = existing.filter(|e| !e.is_sentinel()) else {
        return true;
    };

    if existing.content_type != ContentType::Tag {
        if let Some(wanted) = seed.parent_path.as_deref() {
            if existing.parent_path.as_deref() != Some(wanted) {
                return true;
            }
        }
    }

    if seed.is_versionable() {
        return match (seed.version(), existing.version()) {
            (Some(new), Some(stored)) => new > stored,
            (Some(_), None) => true,
            (None, _) => false,
        };
    }

    !insert_only
}

/// Ensures the folder skeleton and imports seed content.
pub struct BootstrapSeeder {
    repository: Arc<ContentRepository>,
    seeds: Arc<SeedIndex>,
}

impl BootstrapSeeder {
    pub fn new(repository: Arc<ContentRepository>, seeds: Arc<SeedIndex>) -> Self {
        Self { repository, seeds }
    }

    fn config(&self) -> &EcmConfig {
        self.repository.config()
    }

    /// Run every bootstrap step.
    ///
    /// # Errors
    ///
    /// `RepositoryError::StoreUnavailable` when the store cannot be reached;
    /// `RepositoryError::Registration` when even the built-in schema cannot
    /// be registered.
    pub async fn run(&self) -> Result<BootstrapReport, RepositoryError> {
        tracing::info!("Initializing content repository");
        let mut report = BootstrapReport::default();

        self.register_types(&mut report).await?;

        let root_path = self
            .ensure_folder(&self.config().root_node, "/", &mut report)
            .await?;

        for folder in FeatureFolder::ALL {
            let name = self.config().folder_name(folder);
            self.ensure_folder(name, &root_path, &mut report).await?;
            if folder.is_localized() {
                self.update_locale_folders(name, &mut report).await?;
            }
        }

        let documents = self.config().folder_path(FeatureFolder::Documents);
        for name in &self.config().auto_create_folders {
            self.ensure_folder(name, &documents, &mut report).await?;
        }

        if self.config().seed_content {
            self.import_seeds(&mut report).await?;
        } else {
            tracing::info!("Seed content disabled");
        }

        tracing::info!(
            "Content repository initialized: {} folders created, {} seeded, {} unchanged, {} skipped",
            report.created_folders.len(),
            report.seeded,
            report.unchanged,
            report.skipped
        );
        Ok(report)
    }

    async fn register_types(&self, report: &mut BootstrapReport) -> Result<(), RepositoryError> {
        let session = self.repository.sessions().create_session().await?;
        let resource = &self.config().node_types_resource;

        let registration = match NodeTypeRegistrar::register_file(&*session, resource).await {
            Ok(registration) => registration,
            Err(e) if e.is_store_unavailable() => return Err(e),
            Err(e) => {
                tracing::warn!("{}; continuing with the built-in node types", e);
                report.builtin_schema = true;
                NodeTypeRegistrar::register(&*session, DEFAULT_NODE_TYPES).await?
            }
        };

        report.registered_types = registration.registered;
        Ok(())
    }

    /// Make sure a folder with view id `name` exists below `parent_path`.
    ///
    /// # Returns
    ///
    /// The folder's path.
    async fn ensure_folder(
        &self,
        name: &str,
        parent_path: &str,
        report: &mut BootstrapReport,
    ) -> Result<String, RepositoryError> {
        let expected = join_path(parent_path, name);
        let existing = self.repository.get_first(name, false, "").await?;
        if !existing.is_sentinel() && existing.content_type == ContentType::Folder {
            tracing::debug!("Folder '{}' already initialized", name);
            return Ok(existing.path.unwrap_or(expected));
        }

        let mut folder = Content::folder(name).with_parent_path(parent_path);
        folder.path = Some(expected.clone());
        match self.repository.save(&mut folder).await? {
            SaveOutcome::Saved { path } => {
                tracing::info!("Folder '{}' initialized at {}", name, path);
                report.created_folders.push(path.clone());
                Ok(path)
            }
            SaveOutcome::Skipped { reason } => {
                tracing::warn!("Folder '{}' not initialized: {}", name, reason);
                Ok(expected)
            }
        }
    }

    /// Add subfolders for languages that became supported since the
    /// folder was created.
    async fn update_locale_folders(
        &self,
        folder_name: &str,
        report: &mut BootstrapReport,
    ) -> Result<(), RepositoryError> {
        let session = self.repository.sessions().create_session().await?;
        let result = async {
            let root = session
                .node_at(&self.config().root_path())
                .await?
                .ok_or_else(|| StoreError::path_not_found(self.config().root_path()))?;
            let created = self
                .repository
                .navigator()
                .ensure_locale_folders(
                    &*session,
                    root,
                    folder_name,
                    &self.config().supported_languages,
                )
                .await?;
            session.save().await?;
            Ok::<_, StoreError>(created)
        }
        .await;

        match result {
            Ok(created) => {
                report.created_folders.extend(created);
                Ok(())
            }
            Err(e) if e.is_unavailable() => Err(e.into()),
            Err(e) => {
                tracing::error!("Locale folders of '{}' not updated: {}", folder_name, e);
                Ok(())
            }
        }
    }

    async fn import_seeds(&self, report: &mut BootstrapReport) -> Result<(), RepositoryError> {
        let insert_only = self.config().seed_insert_only;
        tracing::info!(
            "Seeding {} content records (insert only: {})",
            self.seeds.len(),
            insert_only
        );

        for seed in self.seeds.iter() {
            let mut content = seed.clone();
            content.author = Some(SEED_AUTHOR.to_string());
            content.last_edit_date = Some(Utc::now());

            let existing = self
                .repository
                .get(&content.view_id, false, &content.language)
                .await?
                .into_iter()
                .rev()
                .find(|c| !c.is_sentinel() && c.language == content.language);

            if !should_update_content(&content, existing.as_ref(), insert_only) {
                tracing::debug!(
                    "Seed '{}' ({}) is up to date",
                    content.view_id,
                    content.language
                );
                report.unchanged += 1;
                continue;
            }

            match self.repository.save(&mut content).await? {
                SaveOutcome::Saved { path } => {
                    tracing::info!(
                        "Seeded '{}' ({}) at {}",
                        content.view_id,
                        content.language,
                        path
                    );
                    report.seeded += 1;
                }
                SaveOutcome::Skipped { reason } => {
                    tracing::warn!(
                        "Error seeding viewId: {} with language: {}: {}",
                        content.view_id,
                        content.language,
                        reason
                    );
                    report.skipped += 1;
                }
            }
        }
        Ok(())
    }
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod bootstrap_test;
