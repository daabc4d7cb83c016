//! Site identity derivation.
//!
//! The host application (the short-URL redirector) is configured with a single
//! site URL that may include a subdirectory, e.g. `https://example.com/yourls`.
//! Everything this crate does — where generated files land, what the public
//! short links look like, which requests belong to the host app — derives from
//! that one value plus the host's install directory. This module computes the
//! derived identity; it performs no I/O.

use std::path::{Path, PathBuf};

use url::Url;

/// Derived identity of the site being taken over.
///
/// Recomputed from configuration on each use; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteIdentity {
    /// Scheme + host (+ non-default port) of the configured site URL.
    pub root_origin: Url,

    /// Subpath the host application lives under. Either `""` or a string
    /// starting with `/` and carrying no trailing `/` (e.g. `/yourls`).
    pub base_path: String,

    /// Physical document root of the domain. Equals the install directory
    /// when the host app sits at the root; otherwise the directory
    /// `base_path` levels above it.
    pub document_root: PathBuf,
}

impl SiteIdentity {
    /// Derive the identity from the configured site URL and install directory.
    ///
    /// An unparsable site URL never fails: `base_path` falls back to empty
    /// and the origin is reconstructed best-effort, so every dependent keeps
    /// producing valid output.
    pub fn resolve(site_url: &str, install_dir: &Path) -> Self {
        match Url::parse(site_url) {
            Ok(url) if url.has_host() => {
                let base_path = normalize_base_path(url.path());
                let mut root_origin = url;
                root_origin.set_path("/");
                root_origin.set_query(None);
                root_origin.set_fragment(None);
                let document_root = recover_document_root(install_dir, &base_path);
                Self {
                    root_origin,
                    base_path,
                    document_root,
                }
            }
            _ => {
                tracing::warn!(
                    site_url,
                    "configured site URL is unparsable, using origin-only defaults"
                );
                Self {
                    root_origin: fallback_origin(site_url),
                    base_path: String::new(),
                    document_root: install_dir.to_path_buf(),
                }
            }
        }
    }

    /// Canonical homepage URL, e.g. `https://example.com/`.
    pub fn homepage_url(&self) -> String {
        self.root_origin.to_string()
    }

    /// Public short link for a keyword, always at the root origin — the
    /// host-app subdirectory is deliberately excluded from what visitors see.
    pub fn short_url(&self, keyword: &str) -> String {
        self.root_origin
            .join(keyword)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.homepage_url(), keyword))
    }

    /// Rewrite a URL on our own host so the host-app subdirectory disappears.
    ///
    /// `https://example.com/yourls/git` becomes `https://example.com/git`.
    /// URLs on other hosts, unparsable URLs, and URLs without the prefix pass
    /// through unchanged. Applying this twice yields the same result as once.
    pub fn strip_base_path(&self, raw: &str) -> String {
        if self.base_path.is_empty() {
            return raw.to_string();
        }
        let Ok(mut url) = Url::parse(raw) else {
            return raw.to_string();
        };
        if url.host_str() != self.root_origin.host_str() {
            return raw.to_string();
        }
        let path = url.path().to_string();
        let Some(rest) = path.strip_prefix(&self.base_path) else {
            return raw.to_string();
        };
        // "/yourlsthing" is not under "/yourls"
        if !rest.is_empty() && !rest.starts_with('/') {
            return raw.to_string();
        }
        url.set_path(if rest.is_empty() { "/" } else { rest });
        url.to_string()
    }
}

/// Normalize a URL path component into a base path: `""` or `/seg[/seg...]`.
fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Walk upward from the install directory one level per base-path segment.
///
/// This is the inverse of the path concatenation that placed the host app in
/// its subdirectory: `/var/www/html/yourls` with base path `/yourls` recovers
/// `/var/www/html`, and a two-segment base path walks up two levels.
fn recover_document_root(install_dir: &Path, base_path: &str) -> PathBuf {
    let depth = base_path.split('/').filter(|s| !s.is_empty()).count();
    let mut root = install_dir.to_path_buf();
    for _ in 0..depth {
        root.pop();
    }
    root
}

/// Best-effort origin for an unparsable site URL.
fn fallback_origin(raw: &str) -> Url {
    Url::parse(&format!("http://{}", raw.trim_matches('/')))
        .ok()
        .filter(|u| u.has_host())
        .unwrap_or_else(|| Url::parse("http://localhost/").expect("literal URL is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(site_url: &str, install_dir: &str) -> SiteIdentity {
        SiteIdentity::resolve(site_url, Path::new(install_dir))
    }

    #[test]
    fn root_install_has_empty_base_path() {
        let id = identity("https://example.com", "/var/www/html");
        assert_eq!(id.base_path, "");
        assert_eq!(id.document_root, PathBuf::from("/var/www/html"));
        assert_eq!(id.root_origin.as_str(), "https://example.com/");
    }

    #[test]
    fn subdirectory_install_walks_up_one_level() {
        let id = identity("https://example.com/yourls", "/var/www/html/yourls");
        assert_eq!(id.base_path, "/yourls");
        assert_eq!(id.document_root, PathBuf::from("/var/www/html"));
    }

    #[test]
    fn multi_segment_base_path_walks_up_each_segment() {
        let id = identity("https://example.com/apps/links", "/srv/site/apps/links");
        assert_eq!(id.base_path, "/apps/links");
        assert_eq!(id.document_root, PathBuf::from("/srv/site"));
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_path() {
        let id = identity("https://example.com/yourls/", "/var/www/html/yourls");
        assert_eq!(id.base_path, "/yourls");
    }

    #[test]
    fn unparsable_site_url_degrades_to_empty_base_path() {
        let id = identity("not a url at all", "/var/www/html");
        assert_eq!(id.base_path, "");
        assert_eq!(id.document_root, PathBuf::from("/var/www/html"));
        assert!(id.root_origin.has_host());
    }

    #[test]
    fn port_is_preserved_in_root_origin() {
        let id = identity("http://example.com:8080/yourls", "/srv/yourls");
        assert_eq!(id.root_origin.as_str(), "http://example.com:8080/");
        assert_eq!(id.short_url("git"), "http://example.com:8080/git");
    }

    #[test]
    fn strip_base_path_removes_prefix_on_same_host() {
        let id = identity("https://example.com/yourls", "/var/www/html/yourls");
        assert_eq!(
            id.strip_base_path("https://example.com/yourls/git"),
            "https://example.com/git"
        );
    }

    #[test]
    fn strip_base_path_is_idempotent() {
        let id = identity("https://example.com/yourls", "/var/www/html/yourls");
        let once = id.strip_base_path("https://example.com/yourls/git");
        let twice = id.strip_base_path(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn strip_base_path_ignores_other_hosts() {
        let id = identity("https://example.com/yourls", "/var/www/html/yourls");
        let foreign = "https://other.example.net/yourls/git";
        assert_eq!(id.strip_base_path(foreign), foreign);
    }

    #[test]
    fn strip_base_path_ignores_sibling_prefix() {
        let id = identity("https://example.com/yourls", "/var/www/html/yourls");
        let sibling = "https://example.com/yourlsthing";
        assert_eq!(id.strip_base_path(sibling), sibling);
    }

    #[test]
    fn strip_base_path_on_bare_subdirectory_yields_homepage() {
        let id = identity("https://example.com/yourls", "/var/www/html/yourls");
        assert_eq!(
            id.strip_base_path("https://example.com/yourls"),
            "https://example.com/"
        );
    }

    #[test]
    fn homepage_url_ends_with_slash() {
        let id = identity("https://example.com/yourls", "/var/www/html/yourls");
        assert_eq!(id.homepage_url(), "https://example.com/");
    }
}
