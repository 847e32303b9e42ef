//! Separator-agnostic helpers for remote folder paths (`\\server\share\dir` or `/mnt/share/dir`).

/// Preferred separator for `path`: backslash if it contains one, else slash.
fn separator(path: &str) -> char {
    if path.contains('\\') {
        '\\'
    } else {
        '/'
    }
}

/// Key used for deduplication: forward slashes, no trailing separator, ASCII-lowercased.
pub fn normalize(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let trimmed = unified.trim_end_matches('/');
    if trimmed.is_empty() {
        return unified.to_ascii_lowercase();
    }
    trimmed.to_ascii_lowercase()
}

/// Appends `child` to `base` using the separator `base` already uses.
pub fn join(base: &str, child: &str) -> String {
    let sep = separator(base);
    let base = base.trim_end_matches(['/', '\\']);
    let child = child.trim_start_matches(['/', '\\']);
    format!("{}{}{}", base, sep, child)
}

/// Last non-empty component of `path`.
pub fn last_component(path: &str) -> Option<&str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty()).last()
}

/// Everything before the last component, or `None` for single-component paths
/// and share roots (`\\server\share`).
pub fn parent(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches(['/', '\\']);
    let idx = trimmed.rfind(['/', '\\'])?;
    let head = &trimmed[..idx];
    if head.trim_start_matches(['/', '\\']).is_empty() {
        return None;
    }
    if trimmed.starts_with("\\\\") || trimmed.starts_with("//") {
        // \\server\share has no reachable parent.
        let components = head.split(['/', '\\']).filter(|s| !s.is_empty()).count();
        if components < 2 {
            return None;
        }
    }
    Some(head.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_ignores_case_separators_and_trailing() {
        assert_eq!(normalize(r"\\Srv\Share\Dir\"), "//srv/share/dir");
        assert_eq!(normalize("//srv/share/dir"), "//srv/share/dir");
        assert_eq!(normalize("/mnt/A/"), "/mnt/a");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn join_keeps_style() {
        assert_eq!(join(r"\\srv\share\dir", "sub"), r"\\srv\share\dir\sub");
        assert_eq!(join(r"\\srv\share\dir\", "sub"), r"\\srv\share\dir\sub");
        assert_eq!(join("/mnt/a/", "b"), "/mnt/a/b");
    }

    #[test]
    fn last_component_and_parent() {
        assert_eq!(last_component(r"\\srv\share\dir\"), Some("dir"));
        assert_eq!(last_component("/mnt/a"), Some("a"));
        assert_eq!(parent(r"\\srv\share\dir").as_deref(), Some(r"\\srv\share"));
        assert_eq!(parent(r"\\srv\share"), None);
        assert_eq!(parent("/mnt/a").as_deref(), Some("/mnt"));
        assert_eq!(parent("/mnt"), None);
    }
}
