//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::identity::SiteIdentity;
use crate::store::{HomepageRenderer, KeywordStore, SettingsStore};

/// Shared application state available to all request handlers.
///
/// No mutable state lives here: the stores are the host's, the config is
/// immutable, and the identity is derived on demand.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Host-owned settings key-value store.
    pub settings: Arc<dyn SettingsStore>,

    /// Host-owned keyword store.
    pub keywords: Arc<dyn KeywordStore>,

    /// Homepage-rendering collaborator.
    pub homepage: Arc<dyn HomepageRenderer>,
}

impl AppState {
    pub fn new(
        config: Config,
        settings: Arc<dyn SettingsStore>,
        keywords: Arc<dyn KeywordStore>,
        homepage: Arc<dyn HomepageRenderer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            settings,
            keywords,
            homepage,
        }
    }

    /// Derive the site identity from the current configuration.
    pub fn identity(&self) -> SiteIdentity {
        SiteIdentity::resolve(&self.config.site_url, &self.config.install_dir)
    }
}
