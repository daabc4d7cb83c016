//! Linkfront - serve a personal link page at the root of a short-URL domain.
//!
//! The domain hosts an unrelated short-URL redirector (the "host app") that
//! this crate does not control. In automatic mode, linkfront takes over the
//! document root: it plants a generated front controller, rewrite rules, and
//! crawler directives — each carrying an ownership marker so operator-authored
//! files are never clobbered — and then answers every request with one of
//! three outcomes:
//!
//! - empty path → the profile homepage
//! - known keyword → a redirect, optionally via a branded interstitial
//!   enriched with preview metadata fetched from the destination
//! - anything else → a branded not-found page
//!
//! # Architecture
//!
//! - **Identity**: derives origin, host-app base path, and document root from
//!   the configured site URL
//! - **Artifacts**: idempotent install/uninstall of the generated files,
//!   atomic writes, foreign-file guard
//! - **Resolve**: request path → [`resolve::RedirectOutcome`]
//! - **Metadata**: best-effort Open Graph fetch under SSRF constraints
//! - **Render**: maud HTML pages (interstitial, 404, setup-pending)
//!
//! # Security
//!
//! - Destination URLs are operator-supplied but publicly triggerable; hosts
//!   resolving to private/reserved address space are refused before connect
//! - All dynamic page content is HTML-escaped by maud
//! - Generated files are only ever replaced or removed while they still carry
//!   the ownership marker

pub mod artifacts;
pub mod config;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod render;
pub mod resolve;
pub mod rewrite;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
