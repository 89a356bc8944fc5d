// src/slug.rs

use regex::Regex;
use std::sync::OnceLock;

fn github_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://(?:www\.)?github\.com/([^/]+)/([^/]+?)(?:\.git)?(?:/|$)")
            .expect("static regex is valid")
    })
}

/// `owner/name` for a GitHub repository URL, or `None` if the URL does not
/// have the expected shape.
pub fn parse_slug(repo_url: &str) -> Option<String> {
    let caps = github_url_re().captures(repo_url.trim())?;
    let owner = &caps[1];
    let name = &caps[2];
    if name.is_empty() {
        return None;
    }
    Some(format!("{owner}/{name}"))
}

/// Filesystem-safe directory name for a slug: `owner/name` -> `owner__name`
pub fn dir_name(slug: &str) -> String {
    slug.replace('/', "__")
}
