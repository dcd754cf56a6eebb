//! Review prompt templates
//!
//! Both templates are embedded at compile time. The system prompt is static;
//! the user prompt uses `{{VARIABLE}}` placeholders filled from the source file.

use std::collections::HashMap;

use crate::source::SourceFile;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");
const USER_TEMPLATE: &str = include_str!("prompts/user.md");

/// Reviewer persona, categories, severity levels and output format
pub fn system_prompt() -> &'static str {
    SYSTEM_TEMPLATE.trim()
}

/// Build the user prompt carrying the file under review
pub fn user_prompt(source: &SourceFile) -> String {
    let fence = code_fence(source.contents());

    let mut vars = HashMap::new();
    vars.insert("FILE_NAME", source.name());
    vars.insert("LANGUAGE", source.language().to_string());
    vars.insert("FENCE", fence);
    vars.insert("SOURCE", source.contents().to_string());

    render_template(USER_TEMPLATE.trim(), &vars)
}

/// The two prompt strings sent as one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    /// System instructions
    pub system: String,
    /// User content
    pub user: String,
}

impl ReviewRequest {
    /// Build both prompts for `source`
    pub fn for_source(source: &SourceFile) -> Self {
        Self {
            system: system_prompt().to_string(),
            user: user_prompt(source),
        }
    }
}

/// A backtick fence longer than any backtick run inside `text`
fn code_fence(text: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in text.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Substitute placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so placeholder-like text inside
/// the reviewed file survives untouched. Unknown placeholders are kept as-is.
fn render_template(template: &str, vars: &HashMap<&str, String>) -> String {
    let capacity = template.len() + vars.values().map(String::len).sum::<usize>();
    let mut out = String::with_capacity(capacity);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
