/// Configuration for the content repository and its bootstrap
use crate::db::Credentials;
use crate::models::FeatureFolder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Environment variable overriding `seed_dir`
pub const ENV_SEED_DIR: &str = "CONTENTSPACE_SEED_DIR";

/// Environment variable overriding `default_language`
pub const ENV_DEFAULT_LANGUAGE: &str = "CONTENTSPACE_DEFAULT_LANGUAGE";

/// Environment variable overriding `load_local_files`
pub const ENV_LOAD_LOCAL_FILES: &str = "CONTENTSPACE_LOAD_LOCAL_FILES";

/// Environment variable overriding `auto_create_folders` (comma separated)
pub const ENV_AUTO_CREATE_FOLDERS: &str = "CONTENTSPACE_AUTO_CREATE_FOLDERS";

/// Repository configuration.
///
/// Every field has a default, so a partial JSON file only overrides what
/// it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EcmConfig {
    /// Root folder name, directly below the store root
    pub root_node: String,

    pub html_node: String,
    pub news_feed_node: String,
    pub notifications_node: String,
    pub documents_node: String,
    pub images_node: String,
    pub tags_node: String,

    /// Languages that get a subfolder below localized feature folders
    pub supported_languages: Vec<String>,

    /// Language used when a lookup in the requested language finds nothing
    pub default_language: String,

    /// Schema resource (CND) registered at bootstrap
    pub node_types_resource: PathBuf,

    /// Folders created below the documents folder at bootstrap
    pub auto_create_folders: Vec<String>,

    /// Import seed content at bootstrap
    pub seed_content: bool,

    /// Never update existing items from seed content
    pub seed_insert_only: bool,

    /// Resolve seed attachments from `attachments_dir` instead of the remote source
    pub load_local_files: bool,

    /// Directory holding `<language>.json` seed files
    pub seed_dir: Option<PathBuf>,

    /// Directory holding seed attachments when `load_local_files` is set
    pub attachments_dir: Option<PathBuf>,

    pub admin_user: String,
    pub admin_password: String,
}

impl Default for EcmConfig {
    fn default() -> Self {
        Self {
            root_node: "oaf".to_string(),
            html_node: "oaf_html".to_string(),
            news_feed_node: "oaf_news_feed".to_string(),
            notifications_node: "oaf_notifications".to_string(),
            documents_node: "oaf_documents".to_string(),
            images_node: "oaf_images".to_string(),
            tags_node: "oaf_tags".to_string(),
            supported_languages: vec!["en".to_string(), "de".to_string()],
            default_language: "en".to_string(),
            node_types_resource: PathBuf::from("jcr/oafnodetypes.cnd"),
            auto_create_folders: Vec::new(),
            seed_content: true,
            seed_insert_only: false,
            load_local_files: true,
            seed_dir: None,
            attachments_dir: None,
            admin_user: "admin".to_string(),
            admin_password: "admin".to_string(),
        }
    }
}

impl EcmConfig {
    /// Load from a JSON file, falling back to defaults when the file is absent.
    ///
    /// Environment overrides are applied afterwards.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let mut config = if tokio::fs::try_exists(path).await.unwrap_or(false) {
            let contents = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
            serde_json::from_str::<EcmConfig>(&contents)
                .map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))?
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            EcmConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `CONTENTSPACE_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(ENV_SEED_DIR) {
            self.seed_dir = Some(PathBuf::from(dir));
        }
        if let Ok(language) = std::env::var(ENV_DEFAULT_LANGUAGE) {
            if !language.trim().is_empty() {
                self.default_language = language.trim().to_string();
            }
        }
        if let Ok(flag) = std::env::var(ENV_LOAD_LOCAL_FILES) {
            if let Ok(flag) = flag.trim().parse() {
                self.load_local_files = flag;
            }
        }
        if let Ok(folders) = std::env::var(ENV_AUTO_CREATE_FOLDERS) {
            self.auto_create_folders = parse_folder_list(&folders);
        }
    }

    /// Configured name of a feature folder
    pub fn folder_name(&self, folder: FeatureFolder) -> &str {
        match folder {
            FeatureFolder::Html => &self.html_node,
            FeatureFolder::NewsFeed => &self.news_feed_node,
            FeatureFolder::Notifications => &self.notifications_node,
            FeatureFolder::Documents => &self.documents_node,
            FeatureFolder::Images => &self.images_node,
            FeatureFolder::Tags => &self.tags_node,
        }
    }

    /// True for the html, news-feed and notifications folder names.
    pub fn is_localized_folder(&self, name: &str) -> bool {
        FeatureFolder::ALL
            .into_iter()
            .filter(FeatureFolder::is_localized)
            .any(|folder| self.folder_name(folder) == name)
    }

    /// Absolute path of the root folder
    pub fn root_path(&self) -> String {
        format!("/{}", self.root_node)
    }

    /// Absolute path of a feature folder
    pub fn folder_path(&self, folder: FeatureFolder) -> String {
        format!("/{}/{}", self.root_node, self.folder_name(folder))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.admin_user, &self.admin_password)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        let names = std::iter::once(("root_node", self.root_node.as_str())).chain(
            FeatureFolder::ALL
                .into_iter()
                .map(|folder| ("feature folder", self.folder_name(folder))),
        );
        for (field, name) in names {
            if name.trim().is_empty() {
                return Err(format!("{} name cannot be empty", field));
            }
            if name.contains('/') {
                return Err(format!("{} name '{}' cannot contain '/'", field, name));
            }
            if !seen.insert(name) {
                return Err(format!("folder name '{}' is used twice", name));
            }
        }

        if self.supported_languages.is_empty() {
            return Err("supported_languages cannot be empty".to_string());
        }

        if !self
            .supported_languages
            .iter()
            .any(|l| l == &self.default_language)
        {
            return Err(format!(
                "default_language '{}' is not one of the supported languages",
                self.default_language
            ));
        }

        if self.admin_user.is_empty() {
            return Err("admin_user cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Split a comma separated folder list, dropping blanks.
pub fn parse_folder_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EcmConfig::default();
        assert_eq!(config.root_node, "oaf");
        assert_eq!(config.default_language, "en");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.folder_path(FeatureFolder::Documents),
            "/oaf/oaf_documents"
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = EcmConfig::default();

        // Invalid: default language not supported
        config.default_language = "fr".to_string();
        assert!(config.validate().is_err());

        // Invalid: duplicate folder names
        config.default_language = "en".to_string();
        config.tags_node = config.images_node.clone();
        assert!(config.validate().is_err());

        // Invalid: slash in a folder name
        config.tags_node = "a/b".to_string();
        assert!(config.validate().is_err());

        // Invalid: no languages
        config.tags_node = "oaf_tags".to_string();
        config.supported_languages.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_localized_folders() {
        let config = EcmConfig::default();
        assert!(config.is_localized_folder("oaf_html"));
        assert!(config.is_localized_folder("oaf_notifications"));
        assert!(!config.is_localized_folder("oaf_documents"));
    }

    #[test]
    fn test_parse_folder_list() {
        assert_eq!(
            parse_folder_list(" contracts, ,invoices ,"),
            vec!["contracts".to_string(), "invoices".to_string()]
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ecm.json");
        std::fs::write(&path, r#"{ "root_node": "site", "supported_languages": ["en", "fr"] }"#)
            .unwrap();

        let config = tokio_test::block_on(EcmConfig::from_json_file(&path)).unwrap();
        assert_eq!(config.root_node, "site");
        assert_eq!(config.html_node, "oaf_html");
        assert_eq!(config.supported_languages, vec!["en", "fr"]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config =
            tokio_test::block_on(EcmConfig::from_json_file(temp.path().join("absent.json")))
                .unwrap();
        assert_eq!(config.root_node, "oaf");
    }
}
