//! PostgreSQL-backed template store.
//!
//! Templates live in a single table:
//!
//! ```sql
//! CREATE TABLE email_templates (
//!     id       TEXT PRIMARY KEY,
//!     subject  TEXT NOT NULL,
//!     content  TEXT NOT NULL,
//!     metadata JSONB
//! );
//! ```

use std::time::Instant;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::metrics::StoreMetrics;

use super::repository::TemplateRepository;
use super::types::{Template, TemplateError, TemplateResult};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS email_templates (
    id       TEXT PRIMARY KEY,
    subject  TEXT NOT NULL,
    content  TEXT NOT NULL,
    metadata JSONB
)
"#;

type TemplateRow = (String, String, String, Option<serde_json::Value>);

/// Read-only template lookup against PostgreSQL.
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the templates table when it does not exist yet.
    pub async fn ensure_schema(&self) -> TemplateResult<()> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        tracing::info!("Ensured email_templates table exists");
        Ok(())
    }
}

fn template_from_row(row: TemplateRow) -> Template {
    let (id, subject, content, metadata) = row;

    Template {
        id,
        subject,
        content,
        metadata: metadata.filter(|m| !m.is_null()),
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn find_by_id(&self, id: &str) -> TemplateResult<Template> {
        let started = Instant::now();

        let outcome: Result<Option<TemplateRow>, sqlx::Error> = sqlx::query_as(
            "SELECT id, subject, content, metadata FROM email_templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        StoreMetrics::record_lookup(self.backend_name(), started.elapsed());

        let row = outcome.map_err(|e| {
            tracing::warn!(template_id = %id, error = %e, "Template lookup failed");
            TemplateError::from(e)
        })?;

        match row {
            Some(row) => Ok(template_from_row(row)),
            None => Err(TemplateError::NotFound(id.to_string())),
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
