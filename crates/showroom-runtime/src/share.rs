//! URL-shareable editor state for the standalone example editor
//!
//! Edited code travels in the `code` query parameter, compressed in
//! lz-string's URI-safe format so links stay short and survive copy/paste.

/// Query parameter carrying the edited code.
pub const CODE_PARAM: &str = "code";

/// Path of the standalone editor for a code block.
pub fn standalone_path(code_hash: &str) -> String {
    format!("/_standalone/{}/", code_hash)
}

/// Encode edited code, or `None` when it still equals the original.
pub fn encode_code_param(code: &str, original: &str) -> Option<String> {
    if code == original {
        return None;
    }
    Some(lz_str::compress_to_encoded_uri_component(code))
}

/// Decode a `code` parameter, falling back to the original code when the
/// parameter is missing or cannot be decoded.
///
/// Form decoding turns `+` into a space; both are accepted.
pub fn decode_code_param(param: Option<&str>, original: &str) -> String {
    param
        .filter(|value| !value.is_empty())
        .map(|value| value.replace(' ', "+"))
        .and_then(|value| lz_str::decompress_from_encoded_uri_component(value.as_str()))
        .and_then(|wide| String::from_utf16(&wide).ok())
        .unwrap_or_else(|| original.to_string())
}

/// Shareable link for a code block in its current edited state.
pub fn share_url(code_hash: &str, code: &str, original: &str) -> String {
    let path = standalone_path(code_hash);
    match encode_code_param(code, original) {
        Some(encoded) => format!("{}?{}={}", path, CODE_PARAM, encoded),
        None => path,
    }
}
