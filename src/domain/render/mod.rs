//! Template rendering.
//!
//! `TemplateEngine` is the contract the dispatcher renders through;
//! `JinjaTemplateEngine` is the minijinja implementation.

mod engine;
mod jinja;

pub use engine::{deserialize_template_data, RenderError, RenderResult, TemplateData, TemplateEngine};
pub use jinja::JinjaTemplateEngine;
