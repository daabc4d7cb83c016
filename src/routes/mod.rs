//! Route definitions.
//!
//! ## Routes
//!
//! - `GET /` - Profile homepage (external collaborator)
//! - `GET /health` - Health check (JSON)
//! - `GET /{path}` - Short-link pipeline: redirect or branded 404

mod dispatch;
mod health;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the front-controller router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dispatch::home))
        .route("/health", get(health::health_check))
        .route("/{*path}", get(dispatch::short_link))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::render::GENERATOR_META;
    use crate::store::{
        keys, KeywordEntry, MemoryKeywordStore, MemorySettingsStore, SettingsStore, StaticHomepage,
    };
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        keywords: Arc<MemoryKeywordStore>,
        settings: Arc<MemorySettingsStore>,
    }

    fn harness() -> Harness {
        let config = Config {
            bind_addr: "127.0.0.1:0".to_string(),
            site_url: "https://example.com/yourls".to_string(),
            install_dir: PathBuf::from("/var/www/html/yourls"),
            site_name: "Jo".to_string(),
            profile_bio: "links and things".to_string(),
            profile_avatar: String::new(),
            redirect_delay_secs: 1,
            fetch_user_agent: "linkfront-test".to_string(),
            settings_path: PathBuf::from("/dev/null"),
            links_path: None,
        };
        let keywords = Arc::new(MemoryKeywordStore::new());
        keywords.insert(KeywordEntry {
            keyword: "git".to_string(),
            destination: "https://10.0.0.5/user".to_string(),
            title: "My code".to_string(),
        });
        let settings = Arc::new(MemorySettingsStore::new());
        let homepage = Arc::new(StaticHomepage::new("Jo", "links and things"));
        let state = AppState::new(
            config,
            settings.clone(),
            keywords.clone(),
            homepage,
        );
        Harness {
            router: router(state),
            keywords,
            settings,
        }
    }

    async fn get_response(harness: &Harness, uri: &str) -> (StatusCode, String) {
        let response = harness
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn homepage_is_served_and_stamped() {
        let harness = harness();
        let (status, body) = get_response(&harness, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Jo"));
        assert!(body.contains(GENERATOR_META));
    }

    #[tokio::test]
    async fn health_endpoint_answers() {
        let harness = harness();
        let (status, body) = get_response(&harness, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#""status":"ok""#));
    }

    #[tokio::test]
    async fn known_keyword_renders_the_interstitial() {
        // The destination sits in private address space, so the metadata
        // fetch is refused up front and every field falls back.
        let harness = harness();
        let (status, body) = get_response(&harness, "/git").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"property="og:url" content="https://example.com/git""#));
        assert!(body.contains("Jo \u{2192} My code"));
        assert!(body.contains(GENERATOR_META));
        assert_eq!(harness.keywords.hits().len(), 1);
    }

    #[tokio::test]
    async fn disabled_redirect_page_issues_an_immediate_302() {
        let harness = harness();
        harness
            .settings
            .set(keys::DISABLE_REDIRECT_PAGE, "1")
            .await
            .unwrap();
        let response = harness
            .router
            .clone()
            .oneshot(Request::builder().uri("/git").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://10.0.0.5/user"
        );
    }

    #[tokio::test]
    async fn unknown_keyword_renders_the_branded_404() {
        let harness = harness();
        let (status, body) = get_response(&harness, "/ghost").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("/ghost"));
        assert!(body.contains("Back to homepage"));
    }

    #[tokio::test]
    async fn disabled_404_page_yields_a_bare_status() {
        let harness = harness();
        harness.settings.set(keys::DISABLE_404_PAGE, "1").await.unwrap();
        let (status, body) = get_response(&harness, "/ghost").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn stats_suffix_path_is_not_found() {
        let harness = harness();
        let (status, _) = get_response(&harness, "/git+").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(harness.keywords.hits().is_empty());
    }

    #[tokio::test]
    async fn unavailable_store_serves_the_setup_page() {
        let harness = harness();
        harness.keywords.set_unavailable(true);
        let (status, body) = get_response(&harness, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("not set up yet"));

        let (status, body) = get_response(&harness, "/git").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("not set up yet"));
    }
}
