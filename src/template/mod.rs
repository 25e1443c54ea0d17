//! Template module
//!
//! Holds the `edit` and `view` page templates. Built-in defaults are
//! compiled in; a configured template directory may override either
//! one at startup. Rendering substitutes `$title`, `$url` and `$body`
//! into the template text.

use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;

use crate::content::Page;

/// Errors from template loading and rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown template: {0}")]
    Unknown(String),

    #[error("failed to read template {path}: {source}")]
    Load {
        path: String,
        source: std::io::Error,
    },
}

/// The page templates, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    edit: String,
    view: String,
}

impl TemplateSet {
    /// The compiled-in templates.
    pub fn builtin() -> Self {
        Self {
            edit: include_str!("edit.html").to_string(),
            view: include_str!("view.html").to_string(),
        }
    }

    /// Built-in templates, overridden by `edit.html` / `view.html`
    /// from the template directory when those files exist. An
    /// unreadable override file fails startup.
    pub fn load(template_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut set = Self::builtin();
        if let Some(dir) = template_dir {
            if let Some(text) = read_override(dir, "edit.html")? {
                set.edit = text;
            }
            if let Some(text) = read_override(dir, "view.html")? {
                set.view = text;
            }
        }
        Ok(set)
    }

    /// Render the named template for a page.
    ///
    /// `$body` is substituted last so page content containing a
    /// placeholder is never expanded, and it is HTML-escaped.
    pub fn render(&self, name: &str, page: &Page) -> Result<String, TemplateError> {
        let template = match name {
            "edit" => &self.edit,
            "view" => &self.view,
            _ => return Err(TemplateError::Unknown(name.to_string())),
        };

        Ok(template
            .replace("$title", &page.title)
            .replace("$url", &page.url)
            .replace("$body", &escape_html(&page.body_text())))
    }
}

fn read_override(dir: &Path, name: &str) -> Result<Option<String>, TemplateError> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TemplateError::Load {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

/// HTML-escape text for element content. Ampersand first so escapes
/// are not double-escaped.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
