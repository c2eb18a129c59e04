//! Equality query
//!
//! The only query dialect the content layer needs: nodes of a given type
//! (primary type, mixin, or any supertype of either) whose properties equal
//! literal values, all conditions joined with AND.

use super::tree_store::PropertyValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `property = literal` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub property: String,
    pub value: PropertyValue,
}

/// Query over nodes of one type with ANDed equality conditions.
///
/// # Examples
///
/// ```rust
/// # use contentspace_core::db::EqualityQuery;
/// let query = EqualityQuery::new("oaf:NodeType")
///     .and("oaf:viewId", "home")
///     .and("oaf:language", "en");
/// assert_eq!(
///     query.to_string(),
///     "SELECT * FROM [oaf:NodeType] AS n WHERE n.[oaf:viewId] = 'home' AND n.[oaf:language] = 'en'"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqualityQuery {
    node_type: String,
    conditions: Vec<Condition>,
}

impl EqualityQuery {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            conditions: Vec::new(),
        }
    }

    /// Add an `AND property = value` condition.
    pub fn and(mut self, property: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.conditions.push(Condition {
            property: property.into(),
            value: value.into(),
        });
        self
    }

    /// Add the condition only when `value` is present.
    pub fn and_some<V: Into<PropertyValue>>(
        self,
        property: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(v) => self.and(property, v),
            None => self,
        }
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluate the conditions against a property lookup.
    pub fn matches_properties<'a, F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<&'a PropertyValue>,
    {
        self.conditions.iter().all(|c| {
            lookup(&c.property)
                .map(|stored| stored.matches(&c.value))
                .unwrap_or(false)
        })
    }
}

impl fmt::Display for EqualityQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT * FROM [{}] AS n", self.node_type)?;
        for (i, condition) in self.conditions.iter().enumerate() {
            let keyword = if i == 0 { "WHERE" } else { "AND" };
            write!(
                f,
                " {} n.[{}] = {}",
                keyword,
                condition.property,
                literal(&condition.value)
            )?;
        }
        Ok(())
    }
}

fn literal(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) => format!("'{}'", s.replace('\'', "''")),
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Long(n) => n.to_string(),
        PropertyValue::Date(d) => format!("CAST('{}' AS DATE)", d.to_rfc3339()),
        PropertyValue::Binary(bytes) => format!("<{} bytes>", bytes.len()),
        PropertyValue::Strings(values) => format!("'{}'", values.join(",")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_render_escapes_quotes() {
        let query = EqualityQuery::new("oaf:NodeType").and("oaf:viewId", "it's");
        assert!(query.to_string().ends_with("n.[oaf:viewId] = 'it''s'"));
    }

    #[test]
    fn test_render_boolean_literal() {
        let query = EqualityQuery::new("oaf:NodeType").and("oaf:active", true);
        assert!(query.to_string().ends_with("n.[oaf:active] = true"));
    }

    #[test]
    fn test_and_some_skips_absent() {
        let query = EqualityQuery::new("oaf:NodeType")
            .and("oaf:viewId", "home")
            .and_some::<&str>("oaf:language", None);
        assert_eq!(query.conditions().len(), 1);
    }

    #[test]
    fn test_matches_requires_every_condition() {
        let mut props = BTreeMap::new();
        props.insert("oaf:viewId".to_string(), PropertyValue::from("home"));
        props.insert("oaf:language".to_string(), PropertyValue::from("en"));

        let hit = EqualityQuery::new("t")
            .and("oaf:viewId", "home")
            .and("oaf:language", "en");
        let miss = EqualityQuery::new("t")
            .and("oaf:viewId", "home")
            .and("oaf:language", "fr");
        let absent = EqualityQuery::new("t").and("oaf:active", true);

        assert!(hit.matches_properties(|name| props.get(name)));
        assert!(!miss.matches_properties(|name| props.get(name)));
        assert!(!absent.matches_properties(|name| props.get(name)));
    }
}
