//! Live reload client injection.

use super::CLIENT_PATH;

/// Inject the live reload client if the content is HTML and live reload is on.
pub fn maybe_inject_hotreload(body: &[u8], content_type: &str, live_reload: bool) -> Vec<u8> {
    if live_reload && crate::utils::mime::is_html(content_type) {
        inject_hotreload_script(body)
    } else {
        body.to_vec()
    }
}

fn script_tag() -> String {
    format!(r#"<script src="{CLIENT_PATH}"></script>"#)
}

/// Inject the client script tag before `</body>`
fn inject_hotreload_script(content: &[u8]) -> Vec<u8> {
    let script = script_tag();
    let script_bytes = script.as_bytes();

    // Byte pattern for </body> - most generators use lowercase
    const PATTERN: &[u8] = b"</body>";

    let mut result = Vec::with_capacity(content.len() + script_bytes.len());

    // Reverse search for </body> using byte windows
    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(script_bytes);
        result.extend_from_slice(&content[pos..]);
        return result;
    }

    // No </body> found, append to end (browsers handle this gracefully)
    result.extend_from_slice(content);
    result.extend_from_slice(script_bytes);
    result
}
