//! Page operation handlers
//!
//! View, edit and save of a single content file, rendered through the
//! shared template set.

use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response};

use crate::config::AppState;
use crate::content::Page;
use crate::http;
use crate::logger;

/// Render the page read-only. A file that cannot be loaded redirects
/// to its editor instead of erroring.
pub async fn view(title: &str, is_head: bool, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    match Page::load(&state.content_root, title).await {
        Ok(page) => render(&page, "view", is_head, state),
        Err(_) => http::response::build_redirect_response(&format!("/edit/{title}")),
    }
}

/// Render the editor form, blank when the file does not exist yet.
pub async fn edit(title: &str, is_head: bool, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let page = match Page::load(&state.content_root, title).await {
        Ok(page) => page,
        Err(_) => Page::blank(title),
    };
    render(&page, "edit", is_head, state)
}

/// Collect the POSTed form, write the file and redirect to the view.
pub async fn save(
    req: Request<hyper::body::Incoming>,
    title: &str,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    let max_body_size = state.config.http.max_body_size;

    let collected = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_error(&format!("Failed to read save body for '{title}': {e}"));
            return http::response::build_500_response(&e.to_string());
        }
    };
    // Content-Length was checked before dispatch; this catches chunked
    // bodies that never declared one.
    if collected.len() as u64 > max_body_size {
        return http::response::build_413_response();
    }

    save_form(&collected, title, state).await
}

/// Write the `body` form field (absent means empty) as the page file.
async fn save_form(form: &[u8], title: &str, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let body = form_field(form, "body").unwrap_or_default();
    let page = Page::new(title, body.into_bytes());

    match page.save(&state.content_root).await {
        Ok(()) => http::response::build_redirect_response(&format!("/view/{title}")),
        Err(e) => {
            logger::log_error(&format!("Failed to save '{title}': {e}"));
            http::response::build_500_response(&e.to_string())
        }
    }
}

/// First value of a field in a urlencoded form body.
fn form_field(form: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(form)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn render(
    page: &Page,
    template: &str,
    is_head: bool,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    match state.templates.render(template, page) {
        Ok(html) => http::response::build_html_response(html, is_head),
        Err(e) => {
            logger::log_error(&format!("Template rendering failed: {e}"));
            http::response::build_500_response(&e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::content::ContentRoot;
    use crate::template::TemplateSet;
    use std::path::Path;

    fn test_state(dir: &Path) -> Arc<AppState> {
        let config = Config::load_from("no-such-config-file").unwrap();
        let root = ContentRoot::open(dir).unwrap();
        Arc::new(AppState::new(config, root, TemplateSet::builtin()))
    }

    #[tokio::test]
    async fn test_view_missing_redirects_to_edit() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let resp = view("missing.txt", false, &state).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(
            resp.headers().get("Location").unwrap(),
            "/edit/missing.txt"
        );
    }

    #[tokio::test]
    async fn test_save_then_view_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let resp = save_form(b"body=hello", "a.txt", &state).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers().get("Location").unwrap(), "/view/a.txt");

        let resp = view("a.txt", false, &state).await;
        assert_eq!(resp.status(), 200);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("hello"));
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        save_form(b"body=same", "a.txt", &state).await;
        save_form(b"body=same", "a.txt", &state).await;

        let content = std::fs::read(dir.path().join("a.txt")).unwrap();
        assert_eq!(content, b"same");
    }

    #[tokio::test]
    async fn test_save_decodes_form_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        save_form(b"body=hello+world%21", "a.txt", &state).await;

        let content = std::fs::read(dir.path().join("a.txt")).unwrap();
        assert_eq!(content, b"hello world!");
    }

    #[tokio::test]
    async fn test_save_without_body_field_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let resp = save_form(b"other=1", "a.txt", &state).await;
        assert_eq!(resp.status(), 302);

        let content = std::fs::read(dir.path().join("a.txt")).unwrap();
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let resp = save_form(b"body=x", "nodir/a.txt", &state).await;
        assert_eq!(resp.status(), 500);
    }

    #[tokio::test]
    async fn test_edit_missing_renders_blank_editor() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let resp = edit("new.txt", false, &state).await;
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn test_form_field_takes_first_value() {
        assert_eq!(form_field(b"body=a&body=b", "body").unwrap(), "a");
        assert_eq!(form_field(b"x=1&body=c", "body").unwrap(), "c");
        assert!(form_field(b"x=1", "body").is_none());
    }
}
