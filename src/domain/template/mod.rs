//! Email template storage.
//!
//! This module provides:
//! - `Template`: id, subject and body template text, opaque metadata
//! - `TemplateRepository`: the read-only lookup the dispatcher consumes
//! - `MemoryTemplateRepository`: concurrent in-memory store with seeding
//! - `PostgresTemplateRepository`: lookup against the `email_templates` table
//!
//! Use `create_template_repository()` to pick a backend from configuration.

mod factory;
mod memory;
mod postgres;
mod repository;
mod types;

pub use factory::create_template_repository;
pub use memory::MemoryTemplateRepository;
pub use postgres::PostgresTemplateRepository;
pub use repository::TemplateRepository;
pub use types::{Template, TemplateError, TemplateResult};
