//! HTTP response handlers.
//!
//! tiny_http drops the body of `HEAD` responses itself, so handlers build
//! the full response either way and `Content-Length` stays accurate.

use anyhow::{Result, anyhow};
use tiny_http::{Header, Request, Response, StatusCode};

use super::content::maybe_inject_hotreload;
use crate::asset::Asset;
use crate::compiler::Diagnostics;
use crate::utils::html;
use crate::utils::mime::types::{HTML, JAVASCRIPT, PLAIN};

/// Every response is revalidated: the build can change at any moment.
const CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Generation the response was answered from.
pub const GENERATION_HEADER: &str = "X-Hotserve-Generation";

/// Respond with an asset from the current snapshot.
///
/// A matching `If-None-Match` yields 304 without a body.
pub fn respond_asset(
    request: Request,
    asset: &Asset,
    generation: u64,
    live_reload: bool,
) -> Result<()> {
    let etag = asset.etag();

    if etag_matches(&request, &etag) {
        let response = Response::empty(StatusCode(304))
            .with_header(header("ETag", &etag)?)
            .with_header(header("Cache-Control", CACHE_CONTROL)?)
            .with_header(header(GENERATION_HEADER, &generation.to_string())?);
        request.respond(response)?;
        return Ok(());
    }

    let body = maybe_inject_hotreload(asset.content(), asset.content_type(), live_reload);
    let response = Response::from_data(body)
        .with_status_code(StatusCode(200))
        .with_header(header("Content-Type", asset.content_type())?)
        .with_header(header("ETag", &etag)?)
        .with_header(header("Cache-Control", CACHE_CONTROL)?)
        .with_header(header(GENERATION_HEADER, &generation.to_string())?);
    request.respond(response)?;
    Ok(())
}

/// Respond with 404 page (the build's own `404.html`, or plain text).
pub fn respond_not_found(
    request: Request,
    page: Option<&Asset>,
    generation: u64,
    live_reload: bool,
) -> Result<()> {
    let (content_type, body) = match page {
        Some(page) => (
            page.content_type(),
            maybe_inject_hotreload(page.content(), page.content_type(), live_reload),
        ),
        None => (PLAIN, b"404 Not Found".to_vec()),
    };

    let response = Response::from_data(body)
        .with_status_code(StatusCode(404))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", CACHE_CONTROL)?)
        .with_header(header(GENERATION_HEADER, &generation.to_string())?);
    request.respond(response)?;
    Ok(())
}

/// Respond with loading page (first build not published yet).
///
/// The page polls with `HEAD` until the status is no longer 503. If the
/// latest compile failed it lists the diagnostics, and it carries the live
/// reload client so later failures show up without a refresh.
pub fn respond_loading(
    request: Request,
    failure: Option<&Diagnostics>,
    live_reload: bool,
) -> Result<()> {
    let body = loading_page(failure);
    let body = maybe_inject_hotreload(body.as_bytes(), HTML, live_reload);
    let response = Response::from_data(body)
        .with_status_code(StatusCode(503))
        .with_header(header("Content-Type", HTML)?)
        .with_header(header("Cache-Control", CACHE_CONTROL)?)
        .with_header(header("Retry-After", "1")?);
    request.respond(response)?;
    Ok(())
}

fn loading_page(failure: Option<&Diagnostics>) -> String {
    use crate::embed::serve::{LOADING_HTML, LoadingVars};

    let (title, status) = match failure {
        Some(diagnostics) => {
            let lines: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
            let status = format!(
                "<p class=\"failed\">{}</p>\n    <pre>{}</pre>\n    <p>Waiting for a successful build…</p>",
                html::escape(&diagnostics.to_string()),
                html::escape(&lines.join("\n"))
            );
            ("Build failed", status)
        }
        None => (
            "Building…",
            "<p>Waiting for the first build to finish…</p>".to_string(),
        ),
    };

    LOADING_HTML.render(&LoadingVars {
        version: env!("CARGO_PKG_VERSION"),
        title,
        status: &status,
    })
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_text(request, 503, "503 Service Unavailable")
}

/// Respond with 405 for anything but `GET` / `HEAD`.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_string("405 Method Not Allowed")
        .with_status_code(StatusCode(405))
        .with_header(header("Content-Type", PLAIN)?)
        .with_header(header("Allow", "GET, HEAD")?);
    request.respond(response)?;
    Ok(())
}

pub fn respond_bad_request(request: Request, reason: &str) -> Result<()> {
    send_text(request, 400, &format!("400 Bad Request: {reason}"))
}

/// Respond with the live reload client from memory.
pub fn respond_client_js(request: Request) -> Result<()> {
    use crate::embed::serve::{HOTRELOAD_JS, HotreloadVars};

    let body = HOTRELOAD_JS.render(&HotreloadVars {
        ws_path: super::WS_PATH,
    });
    let response = Response::from_string(body)
        .with_header(header("Content-Type", JAVASCRIPT)?)
        .with_header(header("Cache-Control", CACHE_CONTROL)?);
    request.respond(response)?;
    Ok(())
}

fn send_text(request: Request, status: u16, text: &str) -> Result<()> {
    let response = Response::from_string(text)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", PLAIN)?);
    request.respond(response)?;
    Ok(())
}

fn etag_matches(request: &Request, etag: &str) -> bool {
    header_value(request, "If-None-Match").is_some_and(|value| {
        value
            .split(',')
            .map(|tag| tag.trim().trim_start_matches("W/"))
            .any(|tag| tag == etag || tag == "*")
    })
}

/// First value of a request header, matched case-insensitively.
pub fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow!("invalid header `{key}: {value}`"))
}
