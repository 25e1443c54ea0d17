//! HTTP protocol layer module
//!
//! Response builders, MIME detection, cache validation and Range
//! parsing, decoupled from the page and listing handlers.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;
