//! Tests for BootstrapSeeder
//!
//! Tests cover:
//! - Folder skeleton on an empty store and on re-runs
//! - Partially initialized stores and newly supported languages
//! - Schema resource fallback
//! - Seed import rules (insert-only, versions, parent moves)

#[cfg(test)]
mod tests {
    use crate::config::EcmConfig;
    use crate::db::{MemoryTreeStore, TreeStore};
    use crate::models::{Content, ContentType, Versioning};
    use crate::services::bootstrap::{should_update_content, BootstrapSeeder, SEED_AUTHOR};
    use crate::services::content_repository::ContentRepository;
    use crate::services::error::RepositoryError;
    use crate::services::node_type_registrar::DEFAULT_NODE_TYPES;
    use crate::services::seed_index::SeedIndex;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_seeder(
        store: &MemoryTreeStore,
        config: EcmConfig,
        seeds: Vec<Content>,
    ) -> (Arc<ContentRepository>, BootstrapSeeder) {
        let repository = Arc::new(ContentRepository::from_store(
            Arc::new(store.clone()),
            Arc::new(config),
        ));
        let seeder = BootstrapSeeder::new(
            repository.clone(),
            Arc::new(SeedIndex::from_contents(seeds)),
        );
        (repository, seeder)
    }

    fn home(language: &str, html: &str) -> Content {
        Content::new("home", "Home", ContentType::Html, language).with_html(html)
    }

    fn versioned_notice(version: &str) -> Content {
        Content::new("notice", "Notice", ContentType::Notification, "en")
            .with_html(format!("<p>{}</p>", version))
            .with_versioning(Versioning::with_version(version))
    }

    // ========================================================================
    // Folder skeleton
    // ========================================================================

    #[tokio::test]
    async fn test_fresh_store_gets_full_skeleton() {
        let store = MemoryTreeStore::new();
        let (repository, seeder) = create_test_seeder(&store, EcmConfig::default(), Vec::new());

        let report = seeder.run().await.unwrap();

        assert!(report.created_folders.contains(&"/oaf".to_string()));
        for folder in [
            "/oaf/oaf_html",
            "/oaf/oaf_news_feed",
            "/oaf/oaf_notifications",
            "/oaf/oaf_documents",
            "/oaf/oaf_images",
            "/oaf/oaf_tags",
        ] {
            assert!(
                report.created_folders.contains(&folder.to_string()),
                "{} not created",
                folder
            );
        }

        let features = repository.get_folder_contents("/oaf").await.unwrap();
        assert_eq!(features.len(), 6);

        let html = repository.get_folder_contents("/oaf/oaf_html").await.unwrap();
        let mut languages: Vec<_> = html.iter().map(|c| c.name.as_str()).collect();
        languages.sort();
        assert_eq!(languages, vec!["de", "en"]);

        let images = repository.get_folder_contents("/oaf/oaf_images").await.unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn test_rerun_creates_nothing() {
        let store = MemoryTreeStore::new();
        let (repository, seeder) = create_test_seeder(&store, EcmConfig::default(), Vec::new());

        seeder.run().await.unwrap();
        let second = seeder.run().await.unwrap();

        assert!(second.created_folders.is_empty());
        assert_eq!(repository.get_folder_contents("/oaf").await.unwrap().len(), 6);
        assert_eq!(
            repository.get("oaf_html", false, "").await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_partial_store_is_completed() {
        let store = MemoryTreeStore::new();
        {
            let session = store
                .login(&EcmConfig::default().credentials())
                .await
                .unwrap();
            let root = session.root().await.unwrap();
            let oaf = session.add_node(root, "oaf", "nt:folder").await.unwrap();
            let html = session.add_node(oaf, "oaf_html", "nt:folder").await.unwrap();
            session.add_node(html, "en", "nt:folder").await.unwrap();
            session.save().await.unwrap();
            session.logout();
        }
        let (repository, seeder) = create_test_seeder(&store, EcmConfig::default(), Vec::new());

        let report = seeder.run().await.unwrap();

        assert!(report.created_folders.contains(&"/oaf/oaf_html/de".to_string()));
        assert!(!report.created_folders.contains(&"/oaf/oaf_html/en".to_string()));

        let html = repository.get_first("oaf_html", false, "").await.unwrap();
        assert_eq!(html.path.as_deref(), Some("/oaf/oaf_html"));
        assert_eq!(repository.get_folder_contents("/oaf").await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_new_language_gets_locale_folders() {
        let store = MemoryTreeStore::new();
        let (_, seeder) = create_test_seeder(&store, EcmConfig::default(), Vec::new());
        seeder.run().await.unwrap();

        let config = EcmConfig {
            supported_languages: vec!["en".to_string(), "de".to_string(), "pt".to_string()],
            ..EcmConfig::default()
        };
        let (_, seeder) = create_test_seeder(&store, config, Vec::new());
        let report = seeder.run().await.unwrap();

        let mut created = report.created_folders.clone();
        created.sort();
        assert_eq!(
            created,
            vec![
                "/oaf/oaf_html/pt",
                "/oaf/oaf_news_feed/pt",
                "/oaf/oaf_notifications/pt",
            ]
        );
    }

    #[tokio::test]
    async fn test_auto_create_folders_below_documents() {
        let store = MemoryTreeStore::new();
        let config = EcmConfig {
            auto_create_folders: vec!["contracts".to_string(), "invoices".to_string()],
            ..EcmConfig::default()
        };
        let (repository, seeder) = create_test_seeder(&store, config, Vec::new());

        let report = seeder.run().await.unwrap();
        assert!(report
            .created_folders
            .contains(&"/oaf/oaf_documents/contracts".to_string()));

        let second = seeder.run().await.unwrap();
        assert!(second.created_folders.is_empty());

        let documents = repository.get_folder_contents("/oaf/oaf_documents").await.unwrap();
        let mut names: Vec<_> = documents.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["contracts", "invoices"]);
    }

    // ========================================================================
    // Node type registration
    // ========================================================================

    #[tokio::test]
    async fn test_missing_schema_falls_back_to_builtin() {
        let store = MemoryTreeStore::new();
        let config = EcmConfig {
            node_types_resource: "does/not/exist.cnd".into(),
            ..EcmConfig::default()
        };
        let (_, seeder) = create_test_seeder(&store, config, Vec::new());

        let report = seeder.run().await.unwrap();

        assert!(report.builtin_schema);
        assert!(!report.registered_types.is_empty());
    }

    #[tokio::test]
    async fn test_configured_schema_is_used() {
        let dir = TempDir::new().unwrap();
        let schema = dir.path().join("types.cnd");
        std::fs::write(&schema, DEFAULT_NODE_TYPES).unwrap();

        let store = MemoryTreeStore::new();
        let config = EcmConfig {
            node_types_resource: schema,
            ..EcmConfig::default()
        };
        let (_, seeder) = create_test_seeder(&store, config, Vec::new());

        let first = seeder.run().await.unwrap();
        assert!(!first.builtin_schema);
        assert!(!first.registered_types.is_empty());

        let second = seeder.run().await.unwrap();
        assert!(second.registered_types.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_bootstrap() {
        let store = MemoryTreeStore::new();
        store.set_available(false);
        let (_, seeder) = create_test_seeder(&store, EcmConfig::default(), Vec::new());

        let err = seeder.run().await.unwrap_err();
        assert!(matches!(err, RepositoryError::StoreUnavailable(_)));
    }

    // ========================================================================
    // Seed import
    // ========================================================================

    #[tokio::test]
    async fn test_seeds_are_saved_with_system_author() {
        let store = MemoryTreeStore::new();
        let seeds = vec![
            home("en", "<p>hi</p>"),
            Content::new("press", "press", ContentType::Tag, "en"),
        ];
        let (repository, seeder) = create_test_seeder(&store, EcmConfig::default(), seeds);

        let report = seeder.run().await.unwrap();
        assert_eq!(report.seeded, 2);

        let stored = repository.get_first("home", true, "en").await.unwrap();
        assert_eq!(stored.html_content.as_deref(), Some("<p>hi</p>"));
        assert_eq!(stored.author.as_deref(), Some(SEED_AUTHOR));
        assert_eq!(stored.path.as_deref(), Some("/oaf/oaf_html/en/Home"));
        assert!(stored.last_edit_date.is_some());

        let tag = repository.get_first("press", true, "en").await.unwrap();
        assert_eq!(tag.parent_path.as_deref(), Some("/oaf/oaf_tags"));
    }

    #[tokio::test]
    async fn test_seed_disabled_only_builds_skeleton() {
        let store = MemoryTreeStore::new();
        let config = EcmConfig {
            seed_content: false,
            ..EcmConfig::default()
        };
        let (repository, seeder) =
            create_test_seeder(&store, config, vec![home("en", "<p>hi</p>")]);

        let report = seeder.run().await.unwrap();

        assert_eq!(report.seeded, 0);
        assert!(repository.get_first("home", false, "en").await.unwrap().is_sentinel());
    }

    #[tokio::test]
    async fn test_insert_only_keeps_existing_content() {
        let store = MemoryTreeStore::new();
        let (_, seeder) =
            create_test_seeder(&store, EcmConfig::default(), vec![home("en", "<p>v1</p>")]);
        seeder.run().await.unwrap();

        let config = EcmConfig {
            seed_insert_only: true,
            ..EcmConfig::default()
        };
        let (repository, seeder) = create_test_seeder(&store, config, vec![home("en", "<p>v2</p>")]);
        let report = seeder.run().await.unwrap();

        assert_eq!(report.seeded, 0);
        assert_eq!(report.unchanged, 1);
        let stored = repository.get_first("home", false, "en").await.unwrap();
        assert_eq!(stored.html_content.as_deref(), Some("<p>v1</p>"));
    }

    #[tokio::test]
    async fn test_overwrite_mode_rewrites_existing_content() {
        let store = MemoryTreeStore::new();
        let (_, seeder) =
            create_test_seeder(&store, EcmConfig::default(), vec![home("en", "<p>v1</p>")]);
        seeder.run().await.unwrap();

        let (repository, seeder) =
            create_test_seeder(&store, EcmConfig::default(), vec![home("en", "<p>v2</p>")]);
        let report = seeder.run().await.unwrap();

        assert_eq!(report.seeded, 1);
        let found = repository.get("home", false, "en").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].html_content.as_deref(), Some("<p>v2</p>"));
    }

    #[tokio::test]
    async fn test_versionable_seed_updates_only_when_newer() {
        let store = MemoryTreeStore::new();
        let (_, seeder) =
            create_test_seeder(&store, EcmConfig::default(), vec![versioned_notice("1.0")]);
        assert_eq!(seeder.run().await.unwrap().seeded, 1);

        let (_, seeder) =
            create_test_seeder(&store, EcmConfig::default(), vec![versioned_notice("1.0")]);
        let same = seeder.run().await.unwrap();
        assert_eq!(same.seeded, 0);
        assert_eq!(same.unchanged, 1);

        let (repository, seeder) =
            create_test_seeder(&store, EcmConfig::default(), vec![versioned_notice("2.0")]);
        assert_eq!(seeder.run().await.unwrap().seeded, 1);

        let stored = repository.get_first("notice", false, "en").await.unwrap();
        assert_eq!(stored.html_content.as_deref(), Some("<p>2.0</p>"));
    }

    // ========================================================================
    // Update rules
    // ========================================================================

    #[test]
    fn test_update_when_nothing_is_stored() {
        let seed = home("en", "<p>hi</p>");
        assert!(should_update_content(&seed, None, true));
        assert!(should_update_content(&seed, Some(&Content::not_found()), true));
    }

    #[test]
    fn test_update_when_parent_differs() {
        let seed = home("en", "<p>hi</p>").with_parent_path("/oaf/oaf_html/en/landing");
        let stored = home("en", "<p>hi</p>").with_parent_path("/oaf/oaf_html/en");
        assert!(should_update_content(&seed, Some(&stored), true));

        let same = home("en", "<p>hi</p>").with_parent_path("/oaf/oaf_html/en/landing");
        assert!(!should_update_content(&seed, Some(&same), true));
    }

    #[test]
    fn test_tags_ignore_parent_differences() {
        let seed = Content::new("press", "press", ContentType::Tag, "en").with_parent_path("/elsewhere");
        let stored = Content::new("press", "press", ContentType::Tag, "en").with_parent_path("/oaf/oaf_tags");
        assert!(!should_update_content(&seed, Some(&stored), true));
        assert!(should_update_content(&seed, Some(&stored), false));
    }

    #[test]
    fn test_versionable_compares_versions() {
        let stored = versioned_notice("1.10");
        assert!(!should_update_content(&versioned_notice("1.9"), Some(&stored), false));
        assert!(!should_update_content(&versioned_notice("1.10"), Some(&stored), false));
        assert!(should_update_content(&versioned_notice("1.11"), Some(&stored), true));

        let unversioned = Content::new("notice", "Notice", ContentType::Notification, "en");
        assert!(should_update_content(&versioned_notice("1.0"), Some(&unversioned), false));
    }
}
