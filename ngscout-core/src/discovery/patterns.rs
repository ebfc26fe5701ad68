//! Include and exclude pattern normalization.

/// Characters that mark a token as already being a glob.
const GLOB_METACHARS: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Normalize configured include tokens into glob syntax.
///
/// Tokens that already look like globs or paths pass through (backslashes
/// rewritten to forward slashes); bare extension tokens such as `ts` or
/// `.spec.ts` become `**/*.<ext>`. Empty tokens are dropped.
pub fn normalize_includes(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter_map(|token| normalize_include(token))
        .collect()
}

fn normalize_include(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if token.contains(GLOB_METACHARS) || token.contains('/') || token.contains('\\') {
        return Some(token.replace('\\', "/"));
    }
    let ext = token.strip_prefix('.').unwrap_or(token);
    if ext.is_empty() {
        return None;
    }
    Some(format!("**/*.{ext}"))
}

/// Normalize exclude patterns to trimmed, forward-slash form.
pub fn normalize_excludes(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| token.trim())
        .filter(|token| !token.is_empty())
        .map(|token| token.replace('\\', "/"))
        .collect()
}
