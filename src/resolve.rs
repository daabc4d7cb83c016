//! Short-link resolution.
//!
//! Maps the request path of a document-root request that fell through the
//! rewrite rules onto one of three outcomes: the homepage, a known keyword's
//! redirect, or not-found. Lookup misses are a normal outcome here, never an
//! error; anything that goes wrong degrades to `NotFound`.

use url::Url;

use crate::identity::SiteIdentity;
use crate::store::KeywordStore;

/// Suffix character the host app reserves for per-keyword stats views.
/// Paths carrying it are refused outright: stats stay reachable only through
/// the host app's own subdirectory.
pub const STATS_SUFFIX: char = '+';

/// The decision made for one incoming request. Produced once per request and
/// consumed immediately by the page renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// Serve the profile homepage.
    Home,
    /// Redirect a known keyword.
    Redirect {
        keyword: String,
        destination: String,
        title: String,
    },
    /// Branded not-found response.
    NotFound { path: String },
}

/// Resolve a request path against the host's keyword store.
///
/// `raw_path` is the path component without scheme/host; surrounding slashes
/// are ignored. On a hit the click is recorded through the store before the
/// outcome is returned; a failed recording is logged and swallowed — the
/// visitor still gets their redirect.
pub async fn resolve_path(
    store: &dyn KeywordStore,
    identity: &SiteIdentity,
    raw_path: &str,
    referrer: Option<&str>,
) -> RedirectOutcome {
    let path = raw_path.trim_matches('/');
    if path.is_empty() {
        // Intercepted earlier as the homepage route; kept as a safety net.
        return RedirectOutcome::Home;
    }
    if path.contains(STATS_SUFFIX) {
        return RedirectOutcome::NotFound {
            path: path.to_string(),
        };
    }

    let keyword = sanitize_keyword(path);
    if keyword.is_empty() {
        return RedirectOutcome::NotFound {
            path: path.to_string(),
        };
    }

    let entry = match store.lookup(&keyword).await {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            return RedirectOutcome::NotFound {
                path: path.to_string(),
            }
        }
        Err(err) => {
            tracing::warn!(keyword, error = %err, "keyword lookup failed");
            return RedirectOutcome::NotFound {
                path: path.to_string(),
            };
        }
    };

    // A keyword pointing nowhere is treated as not found, not as an error.
    if entry.destination.trim().is_empty() || Url::parse(&entry.destination).is_err() {
        return RedirectOutcome::NotFound {
            path: path.to_string(),
        };
    }

    let referrer = normalize_referrer(identity, referrer);
    if let Err(err) = store.record_hit(&keyword, referrer.as_deref()).await {
        tracing::warn!(keyword, error = %err, "failed to record short-link hit");
    }

    RedirectOutcome::Redirect {
        keyword,
        destination: entry.destination,
        title: entry.title,
    }
}

/// Reduce a request path to the host app's keyword grammar.
fn sanitize_keyword(path: &str) -> String {
    path.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

/// Collapse origin-only homepage variants of the referrer onto the canonical
/// homepage URL, so click analytics attribute consistently regardless of
/// scheme or trailing-slash variance. Anything else passes through as-is.
/// A non-default port is a different origin and never collapses.
fn normalize_referrer(identity: &SiteIdentity, referrer: Option<&str>) -> Option<String> {
    let raw = referrer?;
    match Url::parse(raw) {
        Ok(url)
            if url.host_str() == identity.root_origin.host_str()
                && url.port() == identity.root_origin.port()
                && matches!(url.path(), "" | "/")
                && url.query().is_none() =>
        {
            Some(identity.homepage_url())
        }
        _ => Some(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeywordEntry, MemoryKeywordStore};
    use std::path::Path;

    fn identity() -> SiteIdentity {
        SiteIdentity::resolve("https://example.com/yourls", Path::new("/var/www/html/yourls"))
    }

    fn store_with_git() -> MemoryKeywordStore {
        let store = MemoryKeywordStore::new();
        store.insert(KeywordEntry {
            keyword: "git".to_string(),
            destination: "https://github.com/user".to_string(),
            title: "My code".to_string(),
        });
        store
    }

    #[tokio::test]
    async fn known_keyword_redirects_and_records_the_hit() {
        let store = store_with_git();
        let outcome = resolve_path(&store, &identity(), "git", None).await;
        assert_eq!(
            outcome,
            RedirectOutcome::Redirect {
                keyword: "git".to_string(),
                destination: "https://github.com/user".to_string(),
                title: "My code".to_string(),
            }
        );
        assert_eq!(store.hits().len(), 1);
    }

    #[tokio::test]
    async fn unknown_keyword_is_not_found() {
        let store = store_with_git();
        let outcome = resolve_path(&store, &identity(), "ghost", None).await;
        assert_eq!(
            outcome,
            RedirectOutcome::NotFound {
                path: "ghost".to_string()
            }
        );
        assert!(store.hits().is_empty());
    }

    #[tokio::test]
    async fn stats_suffix_always_resolves_to_not_found() {
        let store = store_with_git();
        // Even though the prefix matches a real keyword.
        let outcome = resolve_path(&store, &identity(), "git+", None).await;
        assert_eq!(
            outcome,
            RedirectOutcome::NotFound {
                path: "git+".to_string()
            }
        );
        assert!(store.hits().is_empty());
    }

    #[tokio::test]
    async fn surrounding_slashes_are_ignored() {
        let store = store_with_git();
        let outcome = resolve_path(&store, &identity(), "/git/", None).await;
        assert!(matches!(outcome, RedirectOutcome::Redirect { .. }));
    }

    #[tokio::test]
    async fn empty_path_falls_back_to_home() {
        let store = store_with_git();
        let outcome = resolve_path(&store, &identity(), "/", None).await;
        assert_eq!(outcome, RedirectOutcome::Home);
    }

    #[tokio::test]
    async fn empty_destination_is_not_found() {
        let store = MemoryKeywordStore::new();
        store.insert(KeywordEntry {
            keyword: "void".to_string(),
            destination: "   ".to_string(),
            title: String::new(),
        });
        let outcome = resolve_path(&store, &identity(), "void", None).await;
        assert!(matches!(outcome, RedirectOutcome::NotFound { .. }));
    }

    #[tokio::test]
    async fn origin_only_referrer_is_normalized_to_the_homepage() {
        let store = store_with_git();
        resolve_path(&store, &identity(), "git", Some("http://example.com")).await;
        resolve_path(&store, &identity(), "git", Some("https://example.com/")).await;
        let hits = store.hits();
        assert_eq!(hits[0].referrer.as_deref(), Some("https://example.com/"));
        assert_eq!(hits[1].referrer.as_deref(), Some("https://example.com/"));
    }

    #[tokio::test]
    async fn same_host_other_port_referrer_is_not_collapsed() {
        let store = store_with_git();
        resolve_path(&store, &identity(), "git", Some("https://example.com:8443/")).await;
        let hits = store.hits();
        assert_eq!(
            hits[0].referrer.as_deref(),
            Some("https://example.com:8443/")
        );
    }

    #[tokio::test]
    async fn foreign_referrer_passes_through_unchanged() {
        let store = store_with_git();
        resolve_path(&store, &identity(), "git", Some("https://social.example.net/post/1")).await;
        let hits = store.hits();
        assert_eq!(
            hits[0].referrer.as_deref(),
            Some("https://social.example.net/post/1")
        );
    }

    #[test]
    fn sanitize_strips_foreign_characters() {
        assert_eq!(sanitize_keyword("gi!t"), "git");
        assert_eq!(sanitize_keyword("my_link-2"), "my_link-2");
        assert_eq!(sanitize_keyword("%%%"), "");
    }
}
