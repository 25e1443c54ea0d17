//! Routing module
//!
//! Classifies request paths into page operations and directory
//! listings before any filesystem access happens.

mod matcher;

pub use matcher::{classify, PageOp, RouteTarget};
