//! Attribute schema types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value domain of a single attribute, resolved once when the schema is loaded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeDomain {
    /// Finite ordered set of category labels
    Categorical(Vec<String>),
    /// Numbers with no declared bounds; bounds come from observed data
    Numeric,
    /// YES/NO coded column decoded to booleans. `labels` keeps the declared order.
    Boolean { labels: Vec<String> },
    /// Free text, carried through but never encoded
    Text,
}

impl AttributeDomain {
    /// Whether this domain has a finite label set
    pub fn is_categorical(&self) -> bool {
        matches!(self, AttributeDomain::Categorical(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, AttributeDomain::Boolean { .. })
    }

    /// Short human-readable description, used in listings
    pub fn describe(&self) -> String {
        match self {
            AttributeDomain::Categorical(labels) => format!("{{{}}}", labels.join(",")),
            AttributeDomain::Numeric => "numeric".to_string(),
            AttributeDomain::Boolean { labels } => format!("boolean {{{}}}", labels.join(",")),
            AttributeDomain::Text => "string".to_string(),
        }
    }
}

/// Name and domain of one column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeMeta {
    pub name: String,
    pub domain: AttributeDomain,
}

impl AttributeMeta {
    pub fn new(name: impl Into<String>, domain: AttributeDomain) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }

    pub fn categorical<S: Into<String>>(name: impl Into<String>, labels: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            AttributeDomain::Categorical(labels.into_iter().map(Into::into).collect()),
        )
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, AttributeDomain::Numeric)
    }
}

/// Ordered attribute list with name lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    attributes: Vec<AttributeMeta>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema. Duplicate names are rejected by the loader before they get here.
    pub fn new(attributes: Vec<AttributeMeta>) -> Self {
        let index = attributes
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();
        Self { attributes, index }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeMeta> {
        self.index_of(name).map(|i| &self.attributes[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn attributes(&self) -> &[AttributeMeta] {
        &self.attributes
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeMeta> {
        self.attributes.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lookup() {
        let schema = Schema::new(vec![
            AttributeMeta::numeric("age"),
            AttributeMeta::categorical("sex", ["FEMALE", "MALE"]),
        ]);

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.index_of("sex"), Some(1));
        assert!(schema.get("income").is_none());
        assert!(schema.get("sex").unwrap().domain.is_categorical());
    }

    #[test]
    fn test_domain_describe() {
        let domain = AttributeDomain::Categorical(vec!["YES".into(), "NO".into()]);
        assert_eq!(domain.describe(), "{YES,NO}");
        assert_eq!(AttributeDomain::Numeric.describe(), "numeric");
    }
}
