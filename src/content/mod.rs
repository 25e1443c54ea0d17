//! Content module
//!
//! The page model and the content root it lives under. All filesystem
//! access for pages goes through `ContentRoot::resolve`, which keeps
//! request paths inside the configured directory.

mod page;
mod root;

pub use page::Page;
pub use root::ContentRoot;

use thiserror::Error;

/// Errors from content root resolution and page I/O.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("path escapes the content root: {0}")]
    OutsideRoot(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
