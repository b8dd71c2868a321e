//! In-memory template storage

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::metrics::StoreMetrics;

use super::repository::TemplateRepository;
use super::types::{Template, TemplateError, TemplateResult};

/// In-memory template storage backed by a concurrent map.
///
/// Besides the read path used by the dispatcher, it offers the CRUD helpers
/// used for seeding and tests.
pub struct MemoryTemplateRepository {
    templates: DashMap<String, Template>,
}

impl Default for MemoryTemplateRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTemplateRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    /// Create a store pre-populated with templates, validating each one
    pub fn with_templates(templates: impl IntoIterator<Item = Template>) -> TemplateResult<Self> {
        let store = Self::new();
        for template in templates {
            store.upsert(template)?;
        }
        Ok(store)
    }

    /// Insert a new template, rejecting duplicates
    pub fn insert(&self, template: Template) -> TemplateResult<()> {
        template.validate()?;

        match self.templates.entry(template.id.clone()) {
            Entry::Occupied(_) => Err(TemplateError::AlreadyExists(template.id)),
            Entry::Vacant(slot) => {
                slot.insert(template);
                Ok(())
            }
        }
    }

    /// Insert or replace a template
    pub fn upsert(&self, template: Template) -> TemplateResult<()> {
        template.validate()?;
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    /// Get a template by ID
    pub fn get(&self, id: &str) -> TemplateResult<Template> {
        self.templates
            .get(id)
            .map(|t| t.clone())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    /// Remove a template by ID
    pub fn remove(&self, id: &str) -> TemplateResult<()> {
        self.templates
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    /// List all templates, ordered by id
    pub fn list(&self) -> Vec<Template> {
        let mut templates: Vec<Template> = self
            .templates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    /// Check if a template exists
    pub fn exists(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Get the number of templates
    pub fn count(&self) -> usize {
        self.templates.len()
    }

    /// Load a JSON array of templates from disk and upsert each one.
    ///
    /// Returns the number of templates loaded. The whole file is validated
    /// before anything is written, so a bad entry leaves the store untouched.
    pub async fn load_seed_file(&self, path: impl AsRef<Path>) -> TemplateResult<usize> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TemplateError::Seed(format!("{}: {}", path.display(), e)))?;

        let templates: Vec<Template> = serde_json::from_str(&raw)
            .map_err(|e| TemplateError::Seed(format!("{}: {}", path.display(), e)))?;

        for template in &templates {
            template.validate()?;
        }

        let loaded = templates.len();
        for template in templates {
            self.templates.insert(template.id.clone(), template);
        }

        tracing::info!(path = %path.display(), loaded, "Loaded template seed file");
        Ok(loaded)
    }
}

#[async_trait]
impl TemplateRepository for MemoryTemplateRepository {
    async fn find_by_id(&self, id: &str) -> TemplateResult<Template> {
        let started = Instant::now();
        let result = self.get(id);
        StoreMetrics::record_lookup(self.backend_name(), started.elapsed());
        result
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
