//! Name handling for users and projects.
//!
//! Both usernames and project names become directory names under the projects
//! root, so the same path-component rule guards every segment that reaches the
//! filesystem.

/// Normalize a raw project name: trim surrounding whitespace, replace internal
/// spaces with hyphens. Returns `None` when nothing is left.
pub fn normalize_project_name(raw: &str) -> Option<String> {
    let name = raw.trim().replace(' ', "-");
    if name.is_empty() { None } else { Some(name) }
}

/// True when `segment` is usable as a single directory/file name: non-empty,
/// no separators, no NUL, and not a dotfile (staging directories and the
/// relative `.`/`..` entries all start with a dot).
pub fn is_clean_component(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.contains(&['/', '\\', '\0'][..])
}
