//! Static resolution of deployed artifact sets.
//!
//! Maps `/{owner}/{project}[/{file}]` onto the on-disk tree. Every segment
//! must be a clean path component and the canonicalized result must stay
//! inside the project directory, so `..`, separators, dotfiles and symlinks
//! pointing elsewhere all resolve to not-found — never to a file outside the
//! projects root.

use std::path::{Path, PathBuf};

use crate::naming;

/// Entry document served when no filename is given.
pub const ENTRY_FILE: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub content_type: &'static str,
}

/// Resolve a request against the projects root. Missing files, traversal
/// attempts and metadata errors all report `None`; the caller turns that into
/// a plain 404.
pub fn resolve(
    root: &Path,
    owner: &str,
    project: &str,
    filename: Option<&str>,
) -> Option<ResolvedFile> {
    let file = filename.unwrap_or(ENTRY_FILE);
    if !naming::is_clean_component(owner)
        || !naming::is_clean_component(project)
        || !naming::is_clean_component(file)
    {
        return None;
    }

    // Canonicalization fails for nonexistent paths, which covers the
    // existence check; the prefix test refuses symlinks escaping the
    // project directory.
    let project_dir = root.join(owner).join(project).canonicalize().ok()?;
    let path = project_dir.join(file).canonicalize().ok()?;
    if !path.starts_with(&project_dir) || !path.is_file() {
        return None;
    }

    Some(ResolvedFile {
        path,
        content_type: content_type_for(file),
    })
}

/// Extension-driven content type, the way a generic static sender labels
/// files. No negotiation, no sniffing.
fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
