//! Path Sanitizer (C1): pure, I/O-free functions that map a story title to a
//! safe directory-name fragment and a URL to a local file name.

use std::path::Path;

use unicode_normalization::UnicodeNormalization;
use url::Url;

const DEFAULT_MAX_LEN: usize = 20;
pub const DEFAULT_ALLOWED_SUFFIXES: &[&str] = &[".html", ".htm", ".pdf"];

/// Decompose Unicode into NFKD, drop non-ASCII codepoints, strip anything
/// that isn't alphanumeric/underscore/whitespace/hyphen, collapse runs of
/// whitespace, trim, and truncate to `max_len` *characters*.
pub fn sanitize_title(title: &str, max_len: usize) -> String {
    let decomposed: String = title.nfkd().filter(char::is_ascii).collect();

    let filtered: String = decomposed
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let collapsed = collapse_whitespace(&filtered);
    let trimmed = collapsed.trim();
    trimmed.chars().take(max_len).collect()
}

/// [`sanitize_title`] with the spec's default `max_len` of 20.
pub fn sanitize_title_default(title: &str) -> String {
    sanitize_title(title, DEFAULT_MAX_LEN)
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

/// Derive the on-disk file name for a downloaded URL: the URL's last path
/// segment when it has an allowed extension, otherwise `default_name`.
/// Touches no filesystem state.
pub fn derive_file_name(url: &str, default_name: &str, allowed_suffixes: &[&str]) -> String {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return default_name.to_string(),
    };

    let url_path = Path::new(parsed.path());
    let basename = match url_path.file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.is_empty() => name,
        _ => return default_name.to_string(),
    };

    match url_path.extension().and_then(|e| e.to_str()) {
        Some(ext) if allowed_suffixes.contains(&format!(".{ext}").as_str()) => basename.to_string(),
        _ => default_name.to_string(),
    }
}
