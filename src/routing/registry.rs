//! Ordered collection of the schemas produced by a run.

use serde::Serialize;

use crate::routing::schema::{RouteSchema, RouteStatus};

/// Schemas in discovery order (depth-first, children in scan order).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Registry {
    schemas: Vec<RouteSchema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, schema: RouteSchema) {
        self.schemas.push(schema);
    }

    pub fn all(&self) -> &[RouteSchema] {
        &self.schemas
    }

    pub fn clear(&mut self) {
        self.schemas.clear();
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteSchema> {
        self.schemas.iter()
    }

    /// Number of schemas with the given status.
    pub fn count(&self, status: RouteStatus) -> usize {
        self.schemas.iter().filter(|s| s.status == status).count()
    }

    /// Find the schema recorded for a source file.
    pub fn find(&self, source: &std::path::Path) -> Option<&RouteSchema> {
        self.schemas.iter().find(|s| s.source_path == source)
    }

    pub fn into_vec(self) -> Vec<RouteSchema> {
        self.schemas
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a RouteSchema;
    type IntoIter = std::slice::Iter<'a, RouteSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.schemas.iter()
    }
}
