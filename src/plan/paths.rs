//! Link target normalization
//!
//! Plan authors write root-relative links the way Markdown renderers expect
//! (`/src/main.rs`). The executor wants project-relative paths, but must
//! still see genuinely absolute paths so validation can reject them.

use regex::Regex;
use std::sync::OnceLock;

/// POSIX prefixes that mark a path as genuinely absolute
const ABSOLUTE_ROOTS: &[&str] = &[
    "/home/", "/Users/", "/usr/", "/etc/", "/var/", "/tmp/", "/opt/", "/root/", "/private/",
    "/mnt/", "/media/", "/dev/", "/proc/", "/sys/", "/bin/", "/sbin/", "/lib/", "/srv/",
    "/Volumes/", "/Library/", "/System/",
];

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid regex"))
}

fn drive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/?[A-Za-z]:/").expect("valid regex"))
}

/// True for scheme-prefixed resources (`https://...`, `file://...`)
pub fn is_url(resource: &str) -> bool {
    scheme_regex().is_match(resource.trim())
}

/// True when the (already slash-normalized) path is absolute on some platform
pub fn looks_absolute(path: &str) -> bool {
    if drive_regex().is_match(path) {
        return true;
    }
    ABSOLUTE_ROOTS.iter().any(|root| path.starts_with(root))
}

/// Normalize a link target into a project-relative path
///
/// - URLs are returned untouched
/// - `%20` is decoded, backslashes become forward slashes
/// - a leading `/` is stripped unless the path is genuinely absolute
pub fn normalize_link_path(target: &str) -> String {
    let trimmed = target.trim();
    if is_url(trimmed) {
        return trimmed.to_string();
    }

    let path = trimmed.replace("%20", " ").replace('\\', "/");

    if drive_regex().is_match(&path) {
        // "/C:/x" is how some renderers emit Windows links
        return path.trim_start_matches('/').to_string();
    }

    if looks_absolute(&path) {
        return path;
    }

    match path.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => path,
    }
}
