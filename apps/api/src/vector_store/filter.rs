//! Exact-match metadata filter shared by every vector store backend.

use serde_json::{json, Map, Value};

use crate::vector_store::Metadata;

/// Conjunction of `field == value` conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    equals: Vec<(String, Value)>,
}

impl MetadataFilter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::default().and_eq(field, value)
    }

    pub fn and_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.equals.push((field.to_string(), value.into()));
        self
    }

    /// A record missing a filtered field never matches.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.equals
            .iter()
            .all(|(field, value)| metadata.get(field).is_some_and(|v| v == value))
    }

    /// Pinecone filter syntax: `{"field": {"$eq": value}, ...}`.
    pub fn to_pinecone(&self) -> Value {
        let clauses: Map<String, Value> = self
            .equals
            .iter()
            .map(|(field, value)| (field.clone(), json!({ "$eq": value })))
            .collect();
        Value::Object(clauses)
    }
}
