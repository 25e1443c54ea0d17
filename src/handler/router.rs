//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: classifies the path,
//! enforces the method set of the matched operation, dispatches to the
//! page or listing handlers and emits the access log entry.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::handler::{pages, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{classify, PageOp, RouteTarget};

/// Conditional and range request state, extracted before the request
/// body is consumed.
pub struct RequestContext {
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

impl RequestContext {
    fn from_request(req: &Request<hyper::body::Incoming>) -> Self {
        Self {
            is_head: *req.method() == Method::HEAD,
            if_none_match: header_string(req, "if-none-match"),
            range_header: header_string(req, "range"),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let http_version = version_label(req.version());
    let referer = header_string(&req, "referer");
    let user_agent = header_string(&req, "user-agent");

    let response = dispatch(req, &state).await;

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method, path);
        entry.query = query;
        entry.http_version = http_version;
        entry.status = response.status().as_u16();
        entry.body_bytes = response_body_bytes(&response);
        entry.referer = referer;
        entry.user_agent = user_agent;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Classify the path and dispatch to the matching operation
async fn dispatch(
    req: Request<hyper::body::Incoming>,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    let enable_cors = state.config.http.enable_cors;
    let path = req.uri().path().to_string();

    match classify(&path) {
        RouteTarget::Page {
            op: PageOp::Save,
            path: title,
        } => {
            if let Some(resp) = check_save_method(req.method(), enable_cors) {
                return resp;
            }
            if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
                return resp;
            }
            pages::save(req, title, state).await
        }
        RouteTarget::Page {
            op: PageOp::View,
            path: title,
        } => {
            if let Some(resp) = check_read_method(req.method(), enable_cors) {
                return resp;
            }
            let is_head = *req.method() == Method::HEAD;
            pages::view(title, is_head, state).await
        }
        RouteTarget::Page {
            op: PageOp::Edit,
            path: title,
        } => {
            if let Some(resp) = check_read_method(req.method(), enable_cors) {
                return resp;
            }
            let is_head = *req.method() == Method::HEAD;
            pages::edit(title, is_head, state).await
        }
        RouteTarget::Listing { path: relative } => {
            if let Some(resp) = check_read_method(req.method(), enable_cors) {
                return resp;
            }
            let ctx = RequestContext::from_request(&req);
            static_files::serve_listing(&ctx, relative, state).await
        }
        RouteTarget::NotFound => http::response::build_404_response(),
    }
}

/// Gate for the read-only operations (view, edit, listing)
fn check_read_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::response::build_options_response(
            "GET, HEAD, OPTIONS",
            enable_cors,
        )),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::response::build_405_response("GET, HEAD, OPTIONS"))
        }
    }
}

/// Gate for save, which only accepts POST
fn check_save_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::POST => None,
        Method::OPTIONS => Some(http::response::build_options_response(
            "POST, OPTIONS",
            enable_cors,
        )),
        _ => {
            logger::log_warning(&format!("Method not allowed for save: {method}"));
            Some(http::response::build_405_response("POST, OPTIONS"))
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::response::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_string(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Body size for the access log, read back from Content-Length
fn response_body_bytes(response: &Response<Full<Bytes>>) -> usize {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn version_label(version: hyper::Version) -> String {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_methods_pass_the_gate() {
        assert!(check_read_method(&Method::GET, false).is_none());
        assert!(check_read_method(&Method::HEAD, false).is_none());
    }

    #[test]
    fn test_post_rejected_on_read_routes() {
        let resp = check_read_method(&Method::POST, false).unwrap();
        assert_eq!(resp.status(), 405);
        assert_eq!(
            resp.headers().get("Allow").unwrap(),
            "GET, HEAD, OPTIONS"
        );
    }

    #[test]
    fn test_get_rejected_on_save() {
        let resp = check_save_method(&Method::GET, false).unwrap();
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers().get("Allow").unwrap(), "POST, OPTIONS");
    }

    #[test]
    fn test_options_answered_directly() {
        let resp = check_save_method(&Method::OPTIONS, true).unwrap();
        assert_eq!(resp.status(), 204);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Methods").unwrap(),
            "POST, OPTIONS"
        );
    }
}
