//! Route matching module
//!
//! Implements the path grammar for page operations and directory
//! listings. A page path is `/<op>/<segments...>/<name>.<ext>` where
//! every directory segment is ASCII alphanumeric, the file stem is
//! ASCII alphanumeric and the extension is one to three alphanumeric
//! characters. A listing path is `/view` or `/view/<segments...>/`
//! with alphanumeric segments only.

/// Page operation selected by the first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOp {
    View,
    Edit,
    Save,
}

impl PageOp {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "view" => Some(Self::View),
            "edit" => Some(Self::Edit),
            "save" => Some(Self::Save),
            _ => None,
        }
    }

    /// Path prefix used when building links for this operation.
    pub const fn as_prefix(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Save => "save",
        }
    }
}

/// Outcome of classifying a request path.
///
/// The borrowed slices point into the original path, so targets are
/// cheap to produce and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget<'a> {
    /// A page operation on a relative file path like `notes/todo.md`.
    Page { op: PageOp, path: &'a str },
    /// A directory listing of a relative directory path like `blog/`
    /// (empty string for the content root).
    Listing { path: &'a str },
    /// The path matches neither grammar.
    NotFound,
}

/// Classify a request path into a route target.
///
/// Page operations take priority over listings, so `/view/a.txt`
/// is a page view rather than a listing of a directory named `a.txt`.
pub fn classify(path: &str) -> RouteTarget<'_> {
    if let Some(target) = match_page_operation(path) {
        return target;
    }
    if let Some(target) = match_directory_listing(path) {
        return target;
    }
    RouteTarget::NotFound
}

/// Match `/<op>/<segments...>/<name>.<ext>`.
fn match_page_operation(path: &str) -> Option<RouteTarget<'_>> {
    let rest = path.strip_prefix('/')?;
    let (prefix, remainder) = rest.split_once('/')?;
    let op = PageOp::from_prefix(prefix)?;

    let mut segments = remainder.split('/');
    let file = segments.next_back()?;
    if !is_page_filename(file) {
        return None;
    }
    for segment in segments {
        if !is_alphanumeric_segment(segment) {
            return None;
        }
    }

    Some(RouteTarget::Page {
        op,
        path: remainder,
    })
}

/// Match `/view` or `/view/<segments...>/` (alphanumeric segments,
/// trailing slash optional on the last one).
fn match_directory_listing(path: &str) -> Option<RouteTarget<'_>> {
    if path == "/view" {
        return Some(RouteTarget::Listing { path: "" });
    }

    let remainder = path.strip_prefix("/view/")?;
    if !remainder
        .chars()
        .all(|c| c == '/' || c.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(RouteTarget::Listing { path: remainder })
}

/// A non-empty, all-alphanumeric directory segment.
fn is_alphanumeric_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric())
}

/// `<name>.<ext>` with an alphanumeric stem and a one to three
/// character alphanumeric extension.
fn is_page_filename(file: &str) -> bool {
    let Some((stem, ext)) = file.rsplit_once('.') else {
        return false;
    };
    is_alphanumeric_segment(stem)
        && (1..=3).contains(&ext.len())
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
}
