//! Request handler module
//!
//! Dispatches classified routes to the page operation handlers and the
//! directory listing / raw file server.

pub mod pages;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
