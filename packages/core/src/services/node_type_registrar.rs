//! Node type registration
//!
//! Parses the schema resource (compact node type definition text) and
//! registers its namespaces and node types with a session. Registration is
//! idempotent: definitions that already exist are replaced in place and
//! reported as updated.
//!
//! Supported syntax:
//!
//! ```text
//! <oaf = 'http://contentspace.io/oaf/1.0'>
//! [oaf:versionable] > mix:versionable mixin
//!   - oaf:version (string)
//!   - oaf:tags (string) multiple
//! ```
//!
//! Child node definitions (`+ ...`) are accepted and ignored.

use super::error::RepositoryError;
use crate::db::{NodeTypeDefinition, PropertyDefinition, TreeSession};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Node types shipped with the crate
pub const DEFAULT_NODE_TYPES: &str = include_str!("../../resources/oafnodetypes.cnd");

const NAMESPACE_PATTERN: &str = r"^<\s*([A-Za-z_][\w.-]*)\s*=\s*'([^']*)'\s*>$";
const PROPERTY_PATTERN: &str = r"^-\s*([^\s(]+)\s*(?:\(\s*([A-Za-z]+)\s*\))?(.*)$";

const TYPE_FLAGS: &[&str] = &["mixin", "orderable", "abstract", "noquery", "query"];

/// Parsed schema resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTypeSchema {
    pub namespaces: Vec<(String, String)>,
    pub node_types: Vec<NodeTypeDefinition>,
}

/// Outcome of one registration run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationReport {
    pub namespaces: usize,
    /// Types not known before this run
    pub registered: Vec<String>,
    /// Types that existed and were replaced
    pub updated: Vec<String>,
}

fn strip_block_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => {
                // keep line numbers stable for error messages
                let comment = &rest[start..start + 2 + end + 2];
                out.extend(std::iter::repeat('\n').take(comment.matches('\n').count()));
                rest = &rest[start + 2 + end + 2..];
            }
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse schema text.
///
/// # Errors
///
/// `RepositoryError::Registration` naming the first offending line.
pub fn parse_node_types(text: &str) -> Result<NodeTypeSchema, RepositoryError> {
    static NAMESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
    static PROPERTY_REGEX: OnceLock<Regex> = OnceLock::new();
    let namespace_regex = NAMESPACE_REGEX.get_or_init(|| Regex::new(NAMESPACE_PATTERN).unwrap());
    let property_regex = PROPERTY_REGEX.get_or_init(|| Regex::new(PROPERTY_PATTERN).unwrap());

    let mut schema = NodeTypeSchema::default();
    let cleaned = strip_block_comments(text);

    for (index, raw) in cleaned.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if line.starts_with('<') {
            let caps = namespace_regex.captures(line).ok_or_else(|| {
                RepositoryError::registration(format!(
                    "line {}: malformed namespace declaration",
                    line_no
                ))
            })?;
            schema
                .namespaces
                .push((caps[1].to_string(), caps[2].to_string()));
        } else if let Some(header) = line.strip_prefix('[') {
            let (name, rest) = header.split_once(']').ok_or_else(|| {
                RepositoryError::registration(format!("line {}: unterminated type name", line_no))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(RepositoryError::registration(format!(
                    "line {}: empty type name",
                    line_no
                )));
            }

            let mut definition = NodeTypeDefinition {
                name: name.to_string(),
                supertypes: Vec::new(),
                is_mixin: false,
                properties: Vec::new(),
            };
            let rest = rest.trim().trim_start_matches('>');
            for token in rest.split(|c: char| c == ',' || c.is_whitespace()) {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                if TYPE_FLAGS.contains(&token.to_ascii_lowercase().as_str()) {
                    definition.is_mixin |= token.eq_ignore_ascii_case("mixin");
                } else {
                    definition.supertypes.push(token.to_string());
                }
            }
            schema.node_types.push(definition);
        } else if line.starts_with('-') {
            let caps = property_regex.captures(line).ok_or_else(|| {
                RepositoryError::registration(format!(
                    "line {}: malformed property definition",
                    line_no
                ))
            })?;
            let current = schema.node_types.last_mut().ok_or_else(|| {
                RepositoryError::registration(format!(
                    "line {}: property outside of a type definition",
                    line_no
                ))
            })?;
            let attributes = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            current.properties.push(PropertyDefinition {
                name: caps[1].to_string(),
                required_type: caps
                    .get(2)
                    .map(|m| m.as_str().to_ascii_lowercase())
                    .unwrap_or_else(|| "string".to_string()),
                multiple: attributes
                    .split_whitespace()
                    .any(|a| a.eq_ignore_ascii_case("multiple") || a == "*"),
            });
        } else if line.starts_with('+') {
            tracing::debug!("Ignoring child node definition on line {}", line_no);
        } else {
            return Err(RepositoryError::registration(format!(
                "line {}: unexpected input '{}'",
                line_no, line
            )));
        }
    }

    Ok(schema)
}

/// Registers namespaces and node types from a schema resource.
pub struct NodeTypeRegistrar;

impl NodeTypeRegistrar {
    /// Register schema text with the session.
    ///
    /// Re-running with the same text succeeds and reports every type as
    /// updated.
    pub async fn register(
        session: &dyn TreeSession,
        schema_text: &str,
    ) -> Result<RegistrationReport, RepositoryError> {
        let schema = parse_node_types(schema_text)?;

        for (prefix, uri) in &schema.namespaces {
            session.register_namespace(prefix, uri).await?;
        }

        let added = session.register_node_types(&schema.node_types).await?;
        let updated = schema
            .node_types
            .iter()
            .map(|d| d.name.clone())
            .filter(|name| !added.contains(name))
            .collect::<Vec<_>>();

        tracing::info!(
            "Registered node types: {} new, {} updated",
            added.len(),
            updated.len()
        );

        Ok(RegistrationReport {
            namespaces: schema.namespaces.len(),
            registered: added,
            updated,
        })
    }

    /// Read a schema resource from disk and register it.
    pub async fn register_file(
        session: &dyn TreeSession,
        path: &Path,
    ) -> Result<RegistrationReport, RepositoryError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            RepositoryError::registration(format!(
                "cannot read schema resource {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::register(session, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PLATFORM_MARKER, PLATFORM_VERSIONABLE};
    use crate::db::{Credentials, MemoryTreeStore, TreeStore};

    #[test]
    fn test_parse_default_schema() {
        let schema = parse_node_types(DEFAULT_NODE_TYPES).unwrap();
        assert!(schema.namespaces.iter().any(|(p, _)| p == "oaf"));

        let marker = schema
            .node_types
            .iter()
            .find(|d| d.name == PLATFORM_MARKER)
            .unwrap();
        assert!(marker.is_mixin);
        assert!(marker
            .properties
            .iter()
            .any(|p| p.name == "oaf:tags" && p.multiple));

        let versionable = schema
            .node_types
            .iter()
            .find(|d| d.name == PLATFORM_VERSIONABLE)
            .unwrap();
        assert_eq!(versionable.supertypes, vec!["mix:versionable".to_string()]);
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let err = parse_node_types("<oaf = 'x'>\n\n[oaf:A]\n  garbage").unwrap_err();
        assert!(err.to_string().contains("line 4"));
    }

    #[test]
    fn test_property_outside_type_rejected() {
        assert!(parse_node_types("- oaf:name (string)").is_err());
    }

    #[tokio::test]
    async fn test_registration_is_idempotent() {
        let store = MemoryTreeStore::new();
        let session = store
            .login(&Credentials::new("admin", "admin"))
            .await
            .unwrap();

        let first = NodeTypeRegistrar::register(session.as_ref(), DEFAULT_NODE_TYPES)
            .await
            .unwrap();
        let second = NodeTypeRegistrar::register(session.as_ref(), DEFAULT_NODE_TYPES)
            .await
            .unwrap();

        assert_eq!(first.registered.len(), 2);
        assert!(second.registered.is_empty());
        assert_eq!(second.updated.len(), 2);
        assert!(session.has_node_type(PLATFORM_MARKER).await.unwrap());
    }
}
