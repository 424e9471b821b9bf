//! Helpers over absolute, slash-delimited path strings. The store has no
//! native hierarchy; depth counting and the subtree upper bound are what let
//! a flat indexed string column emulate one.

/// Number of slash-delimited segments. `/` has depth 0, `/a/b` depth 2.
pub fn path_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

/// Parent path, or `None` for the root.
pub fn parent_path(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(trimmed[..idx].to_string()),
        None => None,
    }
}

/// Exclusive upper bound for an index range scan over the subtree rooted at
/// `path`: the path string with its final character incremented by one. Any
/// descendant `path + "/..."` sorts below this bound, anything outside the
/// subtree sorts at or above it.
///
/// Returns `None` when no bound applies: single-character paths (the scan is
/// left open-ended from the lower bound), and a final character at the
/// maximum codepoint, which has no successor. The latter is a known
/// correctness gap of the increment trick, kept as-is.
pub fn subtree_upper_bound(path: &str) -> Option<String> {
    if path.chars().count() <= 1 {
        return None;
    }
    let last = path.chars().last()?;
    let bumped = char::from_u32(last as u32 + 1)?;
    let mut bound = String::with_capacity(path.len());
    bound.push_str(&path[..path.len() - last.len_utf8()]);
    bound.push(bumped);
    Some(bound)
}
