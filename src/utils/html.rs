use ammonia;

/// Clean HTML in user-supplied text using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) are preserved,
/// dangerous tags (<script>, <iframe>) and attributes (onclick) are stripped.
/// Applied to prompt descriptions and comment bodies before storage as a
/// fail-safe against stored XSS.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
