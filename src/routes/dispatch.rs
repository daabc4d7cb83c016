//! Front-controller request handlers.
//!
//! This is the request-time half of the takeover: an empty path serves the
//! profile homepage, anything else runs the short-link pipeline. Every
//! public response degrades gracefully — a failed fetch, lookup, or settings
//! read still produces a valid page, never a bare 500 for a visitor who just
//! clicked a short link.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use maud::{html, PreEscaped, DOCTYPE};

use crate::error::ServeError;
use crate::identity::SiteIdentity;
use crate::metadata;
use crate::render;
use crate::render::redirect::RedirectPage;
use crate::resolve::{self, RedirectOutcome};
use crate::state::AppState;
use crate::store::TakeoverFlags;

/// `GET /` — the profile homepage, rendered by the external collaborator.
pub async fn home(State(state): State<AppState>) -> Result<Response, ServeError> {
    if !state.keywords.available().await {
        return Ok(setup_pending());
    }
    let html = state
        .homepage
        .render_home()
        .await
        .map_err(ServeError::Homepage)?;
    Ok(Html(render::stamp(html)).into_response())
}

/// `GET /{path}` — the short-link pipeline: resolve, then render one of the
/// three outcomes.
pub async fn short_link(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !state.keywords.available().await {
        return setup_pending();
    }

    let identity = state.identity();
    let flags = TakeoverFlags::load(state.settings.as_ref()).await;
    let referrer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok());

    match resolve::resolve_path(state.keywords.as_ref(), &identity, &path, referrer).await {
        RedirectOutcome::Home => match state.homepage.render_home().await {
            Ok(html) => Html(render::stamp(html)).into_response(),
            Err(err) => ServeError::Homepage(err).into_response(),
        },
        RedirectOutcome::Redirect {
            keyword,
            destination,
            title,
        } => redirect_response(&state, &identity, &flags, &keyword, &destination, &title).await,
        RedirectOutcome::NotFound { path } => {
            not_found_response(&state, &identity, &flags, &path)
        }
    }
}

async fn redirect_response(
    state: &AppState,
    identity: &SiteIdentity,
    flags: &TakeoverFlags,
    keyword: &str,
    destination: &str,
    title: &str,
) -> Response {
    tracing::debug!(keyword, destination, "redirecting short link");

    if flags.disable_redirect_page {
        // Direct fast path. 302 is a deliberate non-permanent choice: the
        // operator can re-point the keyword without fighting browser caches.
        return (
            StatusCode::FOUND,
            [(header::LOCATION, destination.to_string())],
        )
            .into_response();
    }

    let metadata =
        metadata::fetch_target_metadata(destination, &state.config.fetch_user_agent).await;
    let short_url = identity.short_url(keyword);
    let page = RedirectPage {
        keyword,
        destination,
        link_title: title,
        short_url: &short_url,
        author: &state.config.site_name,
        avatar: &state.config.profile_avatar,
        delay_secs: state.config.redirect_delay_secs,
        metadata: &metadata,
    };
    Html(render::stamp(render::redirect::render(&page).into_string())).into_response()
}

fn not_found_response(
    state: &AppState,
    identity: &SiteIdentity,
    flags: &TakeoverFlags,
    path: &str,
) -> Response {
    if flags.disable_404_page {
        return StatusCode::NOT_FOUND.into_response();
    }
    let markup = render::not_found::render(path, &identity.homepage_url(), &state.config.site_name);
    (
        StatusCode::NOT_FOUND,
        Html(render::stamp(markup.into_string())),
    )
        .into_response()
}

/// Served while the host's tables are not installed yet. A sentinel state,
/// not an error: the operator simply has not finished setup.
fn setup_pending() -> Response {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Setup pending" }
                meta name="robots" content="noindex";
                style { (PreEscaped(render::components::CARD_CSS)) }
            }
            body {
                div class="card" {
                    div class="author" { "linkfront" }
                    div class="message" { "This site is not set up yet. Finish the installation from the host admin." }
                }
            }
        }
    };
    Html(render::stamp(markup.into_string())).into_response()
}
