//! Error types.
//!
//! Two error families live here. [`ArtifactError`] covers the operator-facing
//! install/uninstall path, where failures are collected and surfaced as
//! messages. [`ServeError`] covers the public request path and renders as a
//! small HTML error page, since this is a user-facing HTML service.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use maud::{html, DOCTYPE};

/// Failure of a single artifact install/uninstall step.
///
/// A foreign file is fatal to its own step only; the manager keeps going with
/// the remaining artifacts and reports everything at the end.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The target path is occupied by content we do not own. Never
    /// auto-resolved; the operator has to move the file or stay in manual
    /// mode.
    #[error("{path} exists but was not generated by linkfront; leaving it untouched")]
    Foreign { path: PathBuf },

    /// The rewrite-rules file contains a begin marker without its matching
    /// end marker. Editing it could destroy operator content, so we refuse.
    #[error("{path} contains an unterminated linkfront block; fix the markers manually")]
    MalformedBlock { path: PathBuf },

    /// Write/delete failure (permissions, disk). Reported as a message so the
    /// operator can fix permissions and retry.
    #[error("i/o failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Public request path error type.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The homepage collaborator failed to produce a page.
    #[error("homepage render failed: {0}")]
    Homepage(#[source] anyhow::Error),

    /// Anything else (settings store, rendering).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { "Something went wrong" }
                    meta name="robots" content="noindex";
                    style {
                        (maud::PreEscaped(crate::render::components::CARD_CSS))
                        (maud::PreEscaped(crate::render::components::NOT_FOUND_CSS))
                    }
                }
                body {
                    div class="card" {
                        div class="code" { "500" }
                        div class="message" { "Something went wrong. Please try again later." }
                    }
                }
            }
        };
        (StatusCode::INTERNAL_SERVER_ERROR, markup).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_error_names_the_path() {
        let err = ArtifactError::Foreign {
            path: PathBuf::from("/var/www/html/index.php"),
        };
        assert!(err.to_string().contains("/var/www/html/index.php"));
        assert!(err.to_string().contains("not generated by linkfront"));
    }

    #[test]
    fn serve_error_renders_internal_error_page() {
        let err = ServeError::Internal(anyhow::anyhow!("boom"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
