//! Path rewriting applied before forwarding.

/// Remove `prefix` from the front of `path`.
///
/// The result always starts with `/`: an empty remainder becomes `/`, and a
/// remainder that does not start with `/` gets one prepended. A path that
/// doesn't start with `prefix` is returned unchanged.
pub fn strip_prefix(path: &str, prefix: &str) -> String {
    let Some(rest) = path.strip_prefix(prefix) else {
        return path.to_string();
    };

    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}
