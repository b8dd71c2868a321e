//! Backend trait for template lookup.
//!
//! The dispatcher only ever reads templates. Creation and updates belong to
//! administrative tooling, so the trait exposes a single keyed lookup.

use async_trait::async_trait;

use super::types::{Template, TemplateResult};

/// Keyed, read-only template lookup.
///
/// Implementations must be safe for concurrent use; the dispatcher shares one
/// instance across every in-flight send.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Fetch a template by id.
    ///
    /// Returns `TemplateError::NotFound` when no template has that id.
    async fn find_by_id(&self, id: &str) -> TemplateResult<Template>;

    /// Backend identifier used in logs and metrics.
    fn backend_name(&self) -> &'static str;
}
