//! Tests for TreeNavigator
//!
//! Tests cover:
//! - Pruning of the system subtree and body children
//! - Depth limits and failure policies
//! - Tree building with document tagging
//! - Locale folder provisioning
//! - Identifier lookups

#[cfg(test)]
mod tests {
    use crate::config::EcmConfig;
    use crate::constants::{NT_FILE, NT_FOLDER, NT_UNSTRUCTURED, PLATFORM_MARKER, PROP_VIEW_ID};
    use crate::db::{Credentials, MemoryTreeStore, NodeId, PropertyValue, TreeSession, TreeStore};
    use crate::models::{Attachment, Content, ContentType};
    use crate::services::error::MappingError;
    use crate::services::node_type_registrar::DEFAULT_NODE_TYPES;
    use crate::services::tree_navigator::{
        TraversalDepth, TraversalPolicy, TreeNavigator, TreeNodeKind,
    };
    use std::sync::Arc;

    /// Helper to create a navigator and a session with the platform types registered
    async fn create_test_env() -> (MemoryTreeStore, Box<dyn TreeSession>, TreeNavigator) {
        let store = MemoryTreeStore::new();
        let session = store
            .login(&Credentials::new("admin", "admin"))
            .await
            .unwrap();
        let navigator = TreeNavigator::new(Arc::new(EcmConfig::default()));
        navigator
            .register_types(session.as_ref(), DEFAULT_NODE_TYPES)
            .await
            .unwrap();
        (store, session, navigator)
    }

    /// Helper to write a content node below `parent`
    async fn put(
        session: &dyn TreeSession,
        navigator: &TreeNavigator,
        parent: NodeId,
        mut content: Content,
    ) -> NodeId {
        let node = session
            .add_node(parent, &content.name, content.content_type.primary_node_type())
            .await
            .unwrap();
        session.add_mixin(node, PLATFORM_MARKER).await.unwrap();
        navigator
            .mapper()
            .encode(session, &mut content, node)
            .await
            .unwrap();
        node
    }

    /// /oaf/oaf_html/en/home (+ body), /oaf/oaf_documents/terms.pdf (+ body)
    async fn create_sample_tree(session: &dyn TreeSession, navigator: &TreeNavigator) -> NodeId {
        let root = session.root().await.unwrap();
        let oaf = put(session, navigator, root, Content::folder("oaf")).await;
        let html = put(session, navigator, oaf, Content::folder("oaf_html")).await;
        let en = session.add_node(html, "en", NT_FOLDER).await.unwrap();
        put(
            session,
            navigator,
            en,
            Content::new("home", "home", ContentType::Html, "en").with_html("<p>hi</p>"),
        )
        .await;
        let docs = put(session, navigator, oaf, Content::folder("oaf_documents")).await;
        put(
            session,
            navigator,
            docs,
            Content::new("terms", "terms.pdf", ContentType::Document, "en")
                .with_file(Attachment::new("terms.pdf", "application/pdf", vec![0; 8])),
        )
        .await;
        oaf
    }

    fn names(contents: &[Content]) -> Vec<&str> {
        contents.iter().map(|c| c.name.as_str()).collect()
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    #[tokio::test]
    async fn test_unbounded_traversal_prunes_internal_nodes() {
        let (_store, session, navigator) = create_test_env().await;
        create_sample_tree(session.as_ref(), &navigator).await;
        let root = session.root().await.unwrap();

        let all = navigator
            .traverse(
                session.as_ref(),
                root,
                TraversalDepth::from_raw(-1),
                TraversalPolicy::SkipFailures,
            )
            .await
            .unwrap();

        assert_eq!(
            names(&all),
            vec!["oaf", "oaf_html", "en", "home", "oaf_documents", "terms.pdf"]
        );
        for content in &all {
            let path = content.path.as_deref().unwrap();
            assert!(!path.contains("jcr:system"));
            assert!(!path.contains("jcr:content"));
        }
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let (_store, session, navigator) = create_test_env().await;
        let oaf = create_sample_tree(session.as_ref(), &navigator).await;

        let direct = navigator
            .traverse(
                session.as_ref(),
                oaf,
                TraversalDepth::Limited(1),
                TraversalPolicy::SkipFailures,
            )
            .await
            .unwrap();
        assert_eq!(names(&direct), vec!["oaf_html", "oaf_documents"]);

        let none = navigator
            .traverse(
                session.as_ref(),
                oaf,
                TraversalDepth::from_raw(0),
                TraversalPolicy::SkipFailures,
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_skipped_nodes_are_still_descended() {
        let (_store, session, navigator) = create_test_env().await;
        let root = session.root().await.unwrap();
        let container = session
            .add_node(root, "imported", NT_UNSTRUCTURED)
            .await
            .unwrap();
        put(
            session.as_ref(),
            &navigator,
            container,
            Content::new("tag-press", "press", ContentType::Tag, "en"),
        )
        .await;

        let all = navigator
            .traverse(
                session.as_ref(),
                root,
                TraversalDepth::Unbounded,
                TraversalPolicy::SkipFailures,
            )
            .await
            .unwrap();
        assert_eq!(names(&all), vec!["press"]);
    }

    #[tokio::test]
    async fn test_failure_policies() {
        let (_store, session, navigator) = create_test_env().await;
        let root = session.root().await.unwrap();
        put(
            session.as_ref(),
            &navigator,
            root,
            Content::folder("good"),
        )
        .await;
        let broken = session.add_node(root, "broken", NT_FILE).await.unwrap();
        session.add_mixin(broken, PLATFORM_MARKER).await.unwrap();
        session
            .set_property(broken, PROP_VIEW_ID, PropertyValue::from("broken"))
            .await
            .unwrap();

        let lenient = navigator
            .traverse(
                session.as_ref(),
                root,
                TraversalDepth::Unbounded,
                TraversalPolicy::SkipFailures,
            )
            .await
            .unwrap();
        assert_eq!(names(&lenient), vec!["good"]);

        let strict = navigator
            .traverse(
                session.as_ref(),
                root,
                TraversalDepth::Unbounded,
                TraversalPolicy::AbortOnFailure,
            )
            .await;
        assert!(matches!(strict, Err(MappingError::MalformedNode { .. })));
    }

    #[tokio::test]
    async fn test_tree_links_parents_and_tags_documents() {
        let (_store, session, navigator) = create_test_env().await;
        let oaf = create_sample_tree(session.as_ref(), &navigator).await;

        let tree = navigator
            .traverse_to_tree(session.as_ref(), oaf)
            .await
            .unwrap();

        assert_eq!(tree.len(), 6);
        let roots: Vec<_> = tree.roots().map(|e| e.content.name.as_str()).collect();
        assert_eq!(roots, vec!["oaf"]);

        let home = tree.position("home").unwrap();
        assert_eq!(tree.lineage(home), vec!["oaf", "oaf_html", "en", "home"]);

        let documents: Vec<_> = tree.documents().map(|e| e.content.view_id.as_str()).collect();
        assert_eq!(documents, vec!["terms"]);
        let terms = tree.position("terms").unwrap();
        assert_eq!(tree.get(terms).unwrap().kind, TreeNodeKind::Document);
        assert_eq!(tree.children(terms).count(), 0);
    }

    // ========================================================================
    // Locale folders
    // ========================================================================

    #[tokio::test]
    async fn test_ensure_locale_folders_is_idempotent() {
        let (_store, session, navigator) = create_test_env().await;
        let root = session.root().await.unwrap();
        let languages = vec!["en".to_string(), "de".to_string()];

        let first = navigator
            .ensure_locale_folders(session.as_ref(), root, "oaf_html", &languages)
            .await
            .unwrap();
        assert_eq!(first, vec!["/oaf_html", "/oaf_html/en", "/oaf_html/de"]);

        let second = navigator
            .ensure_locale_folders(session.as_ref(), root, "oaf_html", &languages)
            .await
            .unwrap();
        assert!(second.is_empty());

        let folder = session.node_at("/oaf_html").await.unwrap().unwrap();
        assert_eq!(session.children(folder).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ensure_locale_folders_adds_new_language() {
        let (_store, session, navigator) = create_test_env().await;
        let root = session.root().await.unwrap();

        navigator
            .ensure_locale_folders(session.as_ref(), root, "oaf_news_feed", &["en".to_string()])
            .await
            .unwrap();
        let added = navigator
            .ensure_locale_folders(
                session.as_ref(),
                root,
                "oaf_news_feed",
                &["en".to_string(), "pt".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(added, vec!["/oaf_news_feed/pt"]);
    }

    #[tokio::test]
    async fn test_ensure_locale_folders_ignores_other_folders() {
        let (_store, session, navigator) = create_test_env().await;
        let root = session.root().await.unwrap();

        let created = navigator
            .ensure_locale_folders(session.as_ref(), root, "oaf_documents", &["en".to_string()])
            .await
            .unwrap();
        assert!(created.is_empty());
        assert!(session.node_at("/oaf_documents").await.unwrap().is_none());
    }

    // ========================================================================
    // Identifier lookups
    // ========================================================================

    #[tokio::test]
    async fn test_find_by_identifier_filters() {
        let (_store, session, navigator) = create_test_env().await;
        let root = session.root().await.unwrap();

        let en = put(
            session.as_ref(),
            &navigator,
            root,
            Content::new("home", "home-en", ContentType::Html, "en"),
        )
        .await;
        let mut inactive = Content::new("home", "home-de", ContentType::Html, "de");
        inactive.active = false;
        let de = put(session.as_ref(), &navigator, root, inactive).await;

        let any = navigator
            .find_by_identifier(session.as_ref(), "home", false, None)
            .await
            .unwrap();
        assert_eq!(any, vec![en, de]);

        let german = navigator
            .find_by_identifier(session.as_ref(), "home", false, Some("de"))
            .await
            .unwrap();
        assert_eq!(german, vec![de]);

        let active_german = navigator
            .find_by_identifier(session.as_ref(), "home", true, Some("de"))
            .await
            .unwrap();
        assert!(active_german.is_empty());

        let blank_language = navigator
            .find_by_identifier(session.as_ref(), "home", true, Some(""))
            .await
            .unwrap();
        assert_eq!(blank_language, vec![en]);
    }

    #[test]
    fn test_identifier_query_rendering() {
        let query = TreeNavigator::identifier_query("home", true, Some("en"));
        assert_eq!(
            query.to_string(),
            "SELECT * FROM [oaf:NodeType] AS n WHERE n.[oaf:viewId] = 'home' \
             AND n.[oaf:language] = 'en' AND n.[oaf:active] = true"
        );
    }

    #[test]
    fn test_depth_from_raw() {
        assert_eq!(TraversalDepth::from_raw(-1), TraversalDepth::Unbounded);
        assert_eq!(TraversalDepth::from_raw(-7), TraversalDepth::Unbounded);
        assert_eq!(TraversalDepth::from_raw(2), TraversalDepth::Limited(2));
    }
}
