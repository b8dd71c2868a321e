//! Template store factory

use std::sync::Arc;

use crate::config::{TemplateBackend, TemplatesConfig};
use crate::postgres::PostgresPool;

use super::memory::MemoryTemplateRepository;
use super::postgres::PostgresTemplateRepository;
use super::repository::TemplateRepository;
use super::types::TemplateResult;

/// Create a template store based on configuration.
///
/// - `postgres`: Returns a `PostgresTemplateRepository` if a PostgreSQL pool is provided
/// - `memory` (default): Returns a `MemoryTemplateRepository`, seeded from
///   `seed_file` when one is configured
///
/// `synchronize` creates the PostgreSQL table when missing.
pub async fn create_template_repository(
    settings: &TemplatesConfig,
    postgres_pool: Option<&PostgresPool>,
    synchronize: bool,
) -> TemplateResult<Arc<dyn TemplateRepository>> {
    match (settings.backend, postgres_pool) {
        (TemplateBackend::Postgres, Some(pool)) => {
            tracing::info!(backend = "postgres", "Creating PostgreSQL template store");
            let repository = PostgresTemplateRepository::new(pool.pool().clone());
            if synchronize {
                repository.ensure_schema().await?;
            }
            if settings.seed_file.is_some() {
                tracing::warn!("templates.seed_file is ignored for the PostgreSQL backend");
            }
            Ok(Arc::new(repository))
        }
        (backend, _) => {
            if backend == TemplateBackend::Postgres {
                tracing::warn!(
                    "PostgreSQL template store requested but no pool provided, falling back to memory"
                );
            }
            tracing::info!(backend = "memory", "Creating memory template store");
            let repository = MemoryTemplateRepository::new();
            if let Some(ref path) = settings.seed_file {
                repository.load_seed_file(path).await?;
            }
            Ok(Arc::new(repository))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateError;

    #[tokio::test]
    async fn test_create_memory_store() {
        let settings = TemplatesConfig::default();
        let store = create_template_repository(&settings, None, false)
            .await
            .unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_postgres_without_pool_falls_back() {
        let settings = TemplatesConfig {
            backend: TemplateBackend::Postgres,
            ..Default::default()
        };
        let store = create_template_repository(&settings, None, true)
            .await
            .unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_an_error() {
        let settings = TemplatesConfig {
            seed_file: Some("/nonexistent/seed.json".to_string()),
            ..Default::default()
        };
        let result = create_template_repository(&settings, None, false).await;
        assert!(matches!(result, Err(TemplateError::Seed(_))));
    }
}
