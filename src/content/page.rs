//! Page model
//!
//! A page is one content file addressed by its relative path (the
//! title). The file is the only persistent state; `Page` is the
//! transient read/write unit passed to templates.

use std::borrow::Cow;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::content::{ContentError, ContentRoot};

/// One content file.
#[derive(Debug, Clone)]
pub struct Page {
    /// Relative path from the content root, e.g. `notes/todo.md`.
    pub title: String,
    /// Raw file contents.
    pub body: Vec<u8>,
    /// Derived view path with the extension stripped, e.g.
    /// `/notes/todo`. Rendered into the preview iframe.
    pub url: String,
}

impl Page {
    pub fn new(title: &str, body: Vec<u8>) -> Self {
        Self {
            title: title.to_string(),
            body,
            url: derive_url(title),
        }
    }

    /// An empty page for editing a file that does not exist yet.
    pub fn blank(title: &str) -> Self {
        Self::new(title, Vec::new())
    }

    /// Read the page file from under the content root.
    pub async fn load(root: &ContentRoot, title: &str) -> Result<Self, ContentError> {
        let path = root.resolve(title)?;
        let body = fs::read(&path).await?;
        Ok(Self::new(title, body))
    }

    /// Write the page file, creating it with mode 0600 or truncating
    /// an existing one. Parent directories are not created.
    pub async fn save(&self, root: &ContentRoot) -> Result<(), ContentError> {
        let path = root.resolve(&self.title)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&path).await?;
        file.write_all(&self.body).await?;
        file.flush().await?;
        Ok(())
    }

    /// Body as text for template rendering. Content files are expected
    /// to be UTF-8; invalid bytes are replaced.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Strip the extension from the final path segment and prefix `/`,
/// so `notes/todo.md` becomes `/notes/todo`.
fn derive_url(title: &str) -> String {
    match std::path::Path::new(title).extension() {
        Some(ext) => format!("/{}", &title[..title.len() - ext.len() - 1]),
        None => format!("/{title}"),
    }
}
