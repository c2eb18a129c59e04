//! Integration tests for ContentRepository
//!
//! Tests cover:
//! - Concurrent saves through a shared repository
//! - Editing a versionable page and reading its history
//! - Document folder management and file loading
//! - Recovery after a store outage

use contentspace_core::db::MemoryTreeStore;
use contentspace_core::services::{BootstrapSeeder, ContentRepository, SeedIndex};
use contentspace_core::{Attachment, Content, ContentType, EcmConfig, Versioning};
use std::sync::Arc;

async fn create_bootstrapped_repository() -> (MemoryTreeStore, Arc<ContentRepository>) {
    let store = MemoryTreeStore::new();
    let repository = Arc::new(ContentRepository::from_store(
        Arc::new(store.clone()),
        Arc::new(EcmConfig::default()),
    ));
    BootstrapSeeder::new(repository.clone(), Arc::new(SeedIndex::new()))
        .run()
        .await
        .unwrap();
    (store, repository)
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test]
async fn test_concurrent_saves_use_separate_sessions() {
    let (store, repository) = create_bootstrapped_repository().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let repository = repository.clone();
        handles.push(tokio::spawn(async move {
            let mut content = Content::new(
                format!("page-{}", i),
                format!("Page {}", i),
                ContentType::Html,
                "en",
            )
            .with_html(format!("<p>{}</p>", i));
            repository.save(&mut content).await.unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_saved());
    }

    let pages = repository
        .get_by_content_type(ContentType::Html, "en")
        .await
        .unwrap();
    assert_eq!(pages.len(), 8);
    assert_eq!(store.open_sessions(), 0);
}

// =========================================================================
// Versioned editing
// =========================================================================

#[tokio::test]
async fn test_page_history_follows_edits() {
    let (_store, repository) = create_bootstrapped_repository().await;

    let mut page = Content::new("faq", "FAQ", ContentType::Html, "en")
        .with_html("<p>first</p>")
        .with_versioning(Versioning::default());
    assert!(repository.save(&mut page).await.unwrap().is_saved());

    let mut stored = repository.get_first("faq", false, "en").await.unwrap();
    stored.html_content = Some("<p>second</p>".to_string());
    assert!(repository.save(&mut stored).await.unwrap().is_saved());

    let path = stored.path.clone().unwrap();
    let history = repository.get_content_versions(&path).await.unwrap();
    let bodies: Vec<_> = history
        .iter()
        .filter_map(|c| c.html_content.as_deref())
        .collect();
    assert_eq!(bodies, vec!["<p>first</p>", "<p>second</p>"]);

    let current = repository.get_first("faq", false, "en").await.unwrap();
    assert_eq!(current.html_content.as_deref(), Some("<p>second</p>"));
}

// =========================================================================
// Documents
// =========================================================================

#[tokio::test]
async fn test_document_folders_and_files() {
    let (_store, repository) = create_bootstrapped_repository().await;

    let folder = repository
        .get_or_create_documents_path("reports/2024")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(folder, "/oaf/oaf_documents/reports/2024");

    let mut report = Content::new("q1", "q1.csv", ContentType::Document, "en")
        .with_parent_path(folder.clone())
        .with_file(Attachment::new("q1.csv", "text/csv", b"a,b\n1,2\n".to_vec()));
    assert!(repository.save(&mut report).await.unwrap().is_saved());

    let listing = repository.get_folder_contents("reports/2024").await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].file_size, Some(8));
    assert!(listing[0].file.is_none());

    let loaded = repository
        .load_file("/oaf/oaf_documents/reports/2024/q1.csv")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.file.unwrap().data, b"a,b\n1,2\n");

    let stored = repository.get_first("q1", false, "en").await.unwrap();
    repository.delete(&stored).await.unwrap();
    assert!(repository
        .get_folder_contents("reports/2024")
        .await
        .unwrap()
        .is_empty());
}

// =========================================================================
// Outages
// =========================================================================

#[tokio::test]
async fn test_reads_recover_after_outage() {
    let (store, repository) = create_bootstrapped_repository().await;
    let mut page = Content::new("home", "Home", ContentType::Html, "en").with_html("<p>hi</p>");
    repository.save(&mut page).await.unwrap();

    store.set_available(false);
    let err = repository.get("home", false, "en").await.unwrap_err();
    assert!(err.is_store_unavailable());

    store.set_available(true);
    let home = repository.get_first("home", false, "en").await.unwrap();
    assert_eq!(home.html_content.as_deref(), Some("<p>hi</p>"));
}
