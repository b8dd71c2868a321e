//! Minijinja-backed template engine.
//!
//! Templates use `{{ variable }}` placeholders with dotted access into nested
//! data (`{{ order.customer.name }}`, `{{ order.items[0].sku }}`), plus the
//! minijinja built-in filters and control flow.
//!
//! Data never fails a render; only template text that does not parse does.
//!
//! - A missing key, or a chain through a missing parent such as
//!   `{{ user.address.city }}` without `user`, renders as the empty string, or
//!   as the configured placeholder when one is set.
//! - `length`/`count` of a missing value is `0`.
//! - An expression that cannot be evaluated against the supplied data
//!   (`{{ missing + 1 }}`, `{{ total | round }}` without `total`) renders like
//!   a missing key. A failing `if`/`elif` condition is false, a failing `for`
//!   iterable yields no items, and a failing `set` assigns `none`.
//!
//! JSON `null` always renders as the empty string. Values are not HTML-escaped.

use std::borrow::Cow;
use std::ops::Range;

use async_trait::async_trait;
use minijinja::value::Value;
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior};

use super::engine::{RenderError, RenderResult, TemplateData, TemplateEngine};

/// Upper bound on tags blanked out while rendering a single template.
const MAX_NEUTRALIZED_TAGS: usize = 64;

/// Template engine built on a shared minijinja environment.
pub struct JinjaTemplateEngine {
    env: Environment<'static>,
}

impl Default for JinjaTemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl JinjaTemplateEngine {
    /// Engine rendering unresolved variables as the empty string.
    pub fn new() -> Self {
        Self {
            env: build_env(None),
        }
    }

    /// Engine rendering unresolved variables as `placeholder`.
    pub fn with_placeholder(placeholder: impl Into<String>) -> Self {
        Self {
            env: build_env(Some(placeholder.into())),
        }
    }

    /// Engine configured from the optional `templates.missing_placeholder` setting.
    pub fn from_placeholder(placeholder: Option<String>) -> Self {
        match placeholder {
            Some(p) => Self::with_placeholder(p),
            None => Self::new(),
        }
    }

    /// Render template text synchronously.
    pub fn render_str(&self, template: &str, data: &TemplateData) -> RenderResult<String> {
        let mut source = Cow::Borrowed(template);

        for _ in 0..=MAX_NEUTRALIZED_TAGS {
            let err = match self.env.render_str(&source, data) {
                Ok(rendered) => return Ok(rendered),
                Err(err) if is_data_error(err.kind()) => err,
                Err(err) => return Err(RenderError(describe(&err))),
            };

            let rewritten = failed_span(&source, &err)
                .and_then(|span| neutralize_tag(&source, span, data))
                .ok_or_else(|| RenderError(describe(&err)))?;

            tracing::debug!(error = %err, "Expression not evaluable with the supplied data");
            source = Cow::Owned(rewritten);
        }

        Err(RenderError(format!(
            "more than {} expressions could not be evaluated",
            MAX_NEUTRALIZED_TAGS
        )))
    }
}

fn build_env(placeholder: Option<String>) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env.set_formatter(move |out, state, value| {
        if value.is_undefined() {
            if let Some(ref p) = placeholder {
                out.write_str(p)?;
            }
            return Ok(());
        }
        if value.is_none() {
            return Ok(());
        }
        minijinja::escape_formatter(out, state, value)
    });
    env.add_filter("length", length);
    env.add_filter("count", length);
    env
}

/// `length` that counts a missing value as empty.
fn length(value: Value) -> Result<usize, Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(0);
    }
    value.len().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot calculate length of value of type {}", value.kind()),
        )
    })
}

/// Runtime failures caused by the values a template was given, as opposed to
/// the template text itself.
fn is_data_error(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::InvalidOperation
            | ErrorKind::UndefinedError
            | ErrorKind::CannotUnpack
            | ErrorKind::NonKey
            | ErrorKind::NonPrimitive
    )
}

/// Byte range of the failing expression. Falls back to the first tag on the
/// reported line when minijinja has no span for it.
fn failed_span(source: &str, err: &Error) -> Option<Range<usize>> {
    if let Some(range) = err.range() {
        return Some(range);
    }
    let line = err.line()?;
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let rest = source.get(line_start..)?;
    let tag = [rest.find("{{"), rest.find("{%")]
        .into_iter()
        .flatten()
        .min()?;
    let inside = line_start + tag + 2;
    Some(inside..inside)
}

/// Replace the tag enclosing `span` with one that evaluates without data.
fn neutralize_tag(source: &str, span: Range<usize>, data: &TemplateData) -> Option<String> {
    let head = source.get(..span.start)?;
    let start = [head.rfind("{{"), head.rfind("{%")]
        .into_iter()
        .flatten()
        .max()?;

    let is_output = source[start..].starts_with("{{");
    let close = if is_output { "}}" } else { "%}" };
    let search_from = span.end.max(start + 2);
    let end = search_from + source.get(search_from..)?.find(close)? + 2;

    let tag = &source[start..end];
    let replacement = if is_output {
        neutral_output(tag, data)
    } else {
        neutral_statement(tag)?
    };

    Some(format!("{}{}{}", &source[..start], replacement, &source[end..]))
}

/// Whitespace-control markers (`-` / `+`) on either side of a tag.
fn markers(tag: &str) -> (&str, &str, &str) {
    let inner = &tag[2..tag.len() - 2];
    let is_marker = |c: char| c == '-' || c == '+';
    let left = if inner.starts_with(is_marker) { &inner[..1] } else { "" };
    let right = if inner.len() > 1 && inner.ends_with(is_marker) {
        &inner[inner.len() - 1..]
    } else {
        ""
    };
    let body = inner[left.len()..inner.len() - right.len()].trim();
    (left, body, right)
}

/// An output tag referencing a name absent from `data`, so it renders
/// exactly like any other unresolved variable.
fn neutral_output(tag: &str, data: &TemplateData) -> String {
    let (left, _, right) = markers(tag);
    let mut name = String::from("__unresolved");
    while data.contains_key(&name) {
        name.push('_');
    }
    format!("{{{{{} {} {}}}}}", left, name, right)
}

fn neutral_statement(tag: &str) -> Option<String> {
    let (left, body, right) = markers(tag);
    let (keyword, rest) = body.split_once(char::is_whitespace)?;

    let statement = match keyword {
        "if" | "elif" => format!("{} false", keyword),
        "for" => {
            let (target, _) = rest.split_once(" in ")?;
            format!("for {} in []", target.trim())
        }
        "set" => {
            let (target, _) = rest.split_once('=')?;
            format!("set {} = none", target.trim())
        }
        _ => return None,
    };

    Some(format!("{{%{} {} {}%}}", left, statement, right))
}

/// Error text including the offending line, when minijinja reports one.
fn describe(err: &Error) -> String {
    match err.line() {
        Some(line) => format!("{} (line {})", err, line),
        None => err.to_string(),
    }
}

/// Fold line breaks and whitespace runs into single spaces.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl TemplateEngine for JinjaTemplateEngine {
    async fn render(&self, template: &str, data: &TemplateData) -> RenderResult<String> {
        self.render_str(template, data)
    }

    async fn render_subject(&self, template: &str, data: &TemplateData) -> RenderResult<String> {
        self.render_str(template, data).map(|s| single_line(&s))
    }

    fn engine_name(&self) -> &'static str {
        "minijinja"
    }
}
