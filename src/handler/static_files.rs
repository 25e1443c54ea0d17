//! Directory listing and raw file serving module
//!
//! Serves the directory side of the route grammar: a resolved
//! directory renders an HTML index (or its index.html when one
//! exists), anything else is served raw with `ETag` and Range support.

use std::path::Path;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::config::AppState;
use crate::content::ContentError;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::RangeParseResult};
use crate::logger;
use crate::template::escape_html;

const INDEX_FILE: &str = "index.html";

/// Serve a directory listing or a raw file below the content root.
pub async fn serve_listing(
    ctx: &RequestContext,
    relative: &str,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    let path = match state.content_root.resolve(relative) {
        Ok(path) => path,
        Err(ContentError::OutsideRoot(p)) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {p}"));
            return http::response::build_404_response();
        }
        Err(ContentError::Io(_)) => return http::response::build_404_response(),
    };

    let Ok(metadata) = fs::metadata(&path).await else {
        return http::response::build_404_response();
    };

    if metadata.is_dir() {
        let index_path = path.join(INDEX_FILE);
        if fs::metadata(&index_path)
            .await
            .is_ok_and(|m| m.is_file())
        {
            return serve_raw_file(ctx, &index_path).await;
        }
        return serve_directory_index(ctx, relative, &path).await;
    }

    serve_raw_file(ctx, &path).await
}

/// Render the generated index page for a directory
async fn serve_directory_index(
    ctx: &RequestContext,
    relative: &str,
    dir: &Path,
) -> Response<Full<Bytes>> {
    match collect_entries(dir).await {
        Ok(entries) => {
            let html = render_directory_index(relative, &entries);
            http::response::build_html_response(html, ctx.is_head)
        }
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read directory '{}': {}",
                dir.display(),
                e
            ));
            http::response::build_500_response(&e.to_string())
        }
    }
}

/// Directory entries as (name, `is_dir`), directories first then by name
async fn collect_entries(dir: &Path) -> std::io::Result<Vec<(String, bool)>> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        entries.push((name, is_dir));
    }
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(entries)
}

/// Build the index HTML. Entry names come off the filesystem, not the
/// route grammar, so they are escaped.
fn render_directory_index(relative: &str, entries: &[(String, bool)]) -> String {
    let heading = format!("/{}", relative.trim_end_matches('/'));
    let base = if relative.is_empty() || relative.ends_with('/') {
        format!("/view/{relative}")
    } else {
        format!("/view/{relative}/")
    };

    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Index of {}</title>\n", escape_html(&heading)));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>Index of {}</h1>\n<ul>\n", escape_html(&heading)));
    for (name, is_dir) in entries {
        let suffix = if *is_dir { "/" } else { "" };
        let escaped = escape_html(name);
        html.push_str(&format!(
            "<li><a href=\"{base}{escaped}{suffix}\">{escaped}{suffix}</a></li>\n"
        ));
    }
    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

/// Serve a file as raw bytes with conditional and range handling
async fn serve_raw_file(ctx: &RequestContext, path: &Path) -> Response<Full<Bytes>> {
    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {}", path.display(), e));
            return http::response::build_404_response();
        }
    };

    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    build_raw_file_response(&content, content_type, ctx)
}

/// Build raw file response with `ETag` and Range support
fn build_raw_file_response(
    data: &[u8],
    content_type: &str,
    ctx: &RequestContext,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);
    let total_size = data.len();

    // Check if client has a cached version
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::response::build_304_response(&etag);
    }

    match http::range::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Valid(range) => {
            let start = range.start;
            let end = range.end_position(total_size);

            let body = if ctx.is_head {
                Bytes::new()
            } else {
                Bytes::from(data[start..=end].to_vec())
            };

            http::response::build_partial_response(
                body,
                content_type,
                &etag,
                start,
                end,
                total_size,
                ctx.is_head,
            )
        }
        RangeParseResult::NotSatisfiable => http::response::build_416_response(total_size),
        // Full content; the builder strips the body itself on HEAD so
        // Content-Length still reports the real size.
        RangeParseResult::None => http::response::build_cached_response(
            Bytes::from(data.to_owned()),
            content_type,
            &etag,
            ctx.is_head,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::content::ContentRoot;
    use crate::template::TemplateSet;

    fn test_state(dir: &Path) -> Arc<AppState> {
        let config = Config::load_from("no-such-config-file").unwrap();
        let root = ContentRoot::open(dir).unwrap();
        Arc::new(AppState::new(config, root, TemplateSet::builtin()))
    }

    fn plain_ctx() -> RequestContext {
        RequestContext {
            is_head: false,
            if_none_match: None,
            range_header: None,
        }
    }

    #[tokio::test]
    async fn test_root_listing_links_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("blog")).unwrap();
        let state = test_state(dir.path());

        let resp = serve_listing(&plain_ctx(), "", &state).await;
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_missing_directory_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let resp = serve_listing(&plain_ctx(), "nope/", &state).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_extensionless_file_served_raw() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes"), "raw bytes").unwrap();
        let state = test_state(dir.path());

        let resp = serve_listing(&plain_ctx(), "notes", &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/octet-stream"
        );
        assert!(resp.headers().contains_key("ETag"));
    }

    #[tokio::test]
    async fn test_directory_with_index_html_serves_it() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("site")).unwrap();
        std::fs::write(dir.path().join("site/index.html"), "<p>home</p>").unwrap();
        let state = test_state(dir.path());

        let resp = serve_listing(&plain_ctx(), "site/", &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_head_reports_full_length_without_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes"), "raw bytes").unwrap();
        let state = test_state(dir.path());

        let ctx = RequestContext {
            is_head: true,
            if_none_match: None,
            range_header: None,
        };
        let resp = serve_listing(&ctx, "notes", &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("Content-Length").unwrap(), "9");
    }

    #[tokio::test]
    async fn test_etag_match_returns_304() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes"), "cached").unwrap();
        let state = test_state(dir.path());

        let first = serve_listing(&plain_ctx(), "notes", &state).await;
        let etag = first.headers().get("ETag").unwrap().to_str().unwrap().to_string();

        let ctx = RequestContext {
            is_head: false,
            if_none_match: Some(etag),
            range_header: None,
        };
        let resp = serve_listing(&ctx, "notes", &state).await;
        assert_eq!(resp.status(), 304);
    }

    #[tokio::test]
    async fn test_range_request_returns_206() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes"), "hello world").unwrap();
        let state = test_state(dir.path());

        let ctx = RequestContext {
            is_head: false,
            if_none_match: None,
            range_header: Some("bytes=0-4".to_string()),
        };
        let resp = serve_listing(&ctx, "notes", &state).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(
            resp.headers().get("Content-Range").unwrap(),
            "bytes 0-4/11"
        );
    }

    #[tokio::test]
    async fn test_unsatisfiable_range_returns_416() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes"), "short").unwrap();
        let state = test_state(dir.path());

        let ctx = RequestContext {
            is_head: false,
            if_none_match: None,
            range_header: Some("bytes=100-".to_string()),
        };
        let resp = serve_listing(&ctx, "notes", &state).await;
        assert_eq!(resp.status(), 416);
    }

    #[tokio::test]
    async fn test_entries_sort_directories_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zebra.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("apple")).unwrap();
        std::fs::write(dir.path().join("beta.txt"), "").unwrap();

        let entries = collect_entries(dir.path()).await.unwrap();
        assert_eq!(entries[0], ("apple".to_string(), true));
        assert_eq!(entries[1], ("beta.txt".to_string(), false));
        assert_eq!(entries[2], ("zebra.txt".to_string(), false));
    }

    #[test]
    fn test_index_escapes_entry_names() {
        let entries = vec![("a<b".to_string(), false)];
        let html = render_directory_index("", &entries);
        assert!(html.contains("a&lt;b"));
        assert!(!html.contains("a<b"));
    }

    #[test]
    fn test_index_link_base_keeps_subdirectory() {
        let entries = vec![("post.md".to_string(), false)];
        let html = render_directory_index("blog/", &entries);
        assert!(html.contains("href=\"/view/blog/post.md\""));

        let html = render_directory_index("blog", &entries);
        assert!(html.contains("href=\"/view/blog/post.md\""));
    }
}
