//! Application configuration loaded from environment variables.

use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// The host application's configured site URL, subdirectory included
    /// (e.g., "https://example.com/yourls"). Everything identity-related
    /// derives from this value.
    pub site_url: String,

    /// The host application's install directory on disk.
    pub install_dir: PathBuf,

    /// Profile/site name shown on rendered pages and in OG tags.
    pub site_name: String,

    /// Short bio line for the homepage and meta descriptions.
    pub profile_bio: String,

    /// Avatar URL used as the OG image fallback on interstitial pages.
    pub profile_avatar: String,

    /// Seconds the interstitial waits before redirecting.
    pub redirect_delay_secs: u32,

    /// User agent sent on metadata fetches.
    pub fetch_user_agent: String,

    /// Path of the JSON settings file backing the reference settings store.
    pub settings_path: PathBuf,

    /// Optional JSON link catalog loaded into the reference keyword store.
    pub links_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional and default to local-development values:
    /// - `LINKFRONT_BIND_ADDR`: bind address (default: "0.0.0.0:8080")
    /// - `LINKFRONT_SITE_URL`: host app site URL (default: "http://localhost:8080")
    /// - `LINKFRONT_INSTALL_DIR`: host app directory (default: ".")
    /// - `LINKFRONT_SITE_NAME`: profile name (default: "My Links")
    /// - `LINKFRONT_PROFILE_BIO`: bio line (default: empty)
    /// - `LINKFRONT_PROFILE_AVATAR`: avatar URL (default: empty)
    /// - `LINKFRONT_REDIRECT_DELAY`: interstitial delay seconds (default: 1)
    /// - `LINKFRONT_SETTINGS_PATH`: settings file (default: "./linkfront-settings.json")
    /// - `LINKFRONT_LINKS_PATH`: link catalog JSON (default: unset)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("LINKFRONT_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let site_url = std::env::var("LINKFRONT_SITE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let install_dir = PathBuf::from(
            std::env::var("LINKFRONT_INSTALL_DIR").unwrap_or_else(|_| ".".to_string()),
        );

        let site_name =
            std::env::var("LINKFRONT_SITE_NAME").unwrap_or_else(|_| "My Links".to_string());

        let profile_bio = std::env::var("LINKFRONT_PROFILE_BIO").unwrap_or_default();
        let profile_avatar = std::env::var("LINKFRONT_PROFILE_AVATAR").unwrap_or_default();

        let redirect_delay_secs = std::env::var("LINKFRONT_REDIRECT_DELAY")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1);

        let fetch_user_agent = format!(
            "linkfront/{} (+{site_url})",
            env!("CARGO_PKG_VERSION")
        );

        let settings_path = PathBuf::from(
            std::env::var("LINKFRONT_SETTINGS_PATH")
                .unwrap_or_else(|_| "./linkfront-settings.json".to_string()),
        );

        let links_path = std::env::var("LINKFRONT_LINKS_PATH").ok().map(PathBuf::from);

        Ok(Self {
            bind_addr,
            site_url,
            install_dir,
            site_name,
            profile_bio,
            profile_avatar,
            redirect_delay_secs,
            fetch_user_agent,
            settings_path,
            links_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        // Only assert on fields no test environment overrides.
        let config = Config::from_env().unwrap();
        assert!(!config.bind_addr.is_empty());
        assert!(config.fetch_user_agent.starts_with("linkfront/"));
        assert!(config.redirect_delay_secs >= 1);
    }
}
