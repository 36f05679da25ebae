/// Handle named by the first `@` in `body`, if any. The handle is the run of
/// ASCII letters and digits right after the `@`; a bare `@` names nobody, and
/// later `@`s are not considered.
pub fn find_mention(body: &str) -> Option<&str> {
    let start = body.find('@')? + 1;
    let rest = &body[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// First `limit` characters of `body`, respecting char boundaries.
pub fn preview(body: &str, limit: usize) -> &str {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
