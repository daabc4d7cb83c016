//! External collaborator interfaces.
//!
//! The host application owns the keyword table, click accounting, and the
//! settings key-value store; the homepage itself is rendered by a separate
//! collaborator. This crate only talks to them through the traits below.
//! Reference implementations (in-memory keywords, JSON-file settings, static
//! homepage) back the binary and the tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use anyhow::Context;
use async_trait::async_trait;

/// Settings keys consumed by this subsystem.
pub mod keys {
    pub const AUTOMATIC_MODE: &str = "automatic_mode";
    pub const DISABLE_REDIRECT_PAGE: &str = "disable_redirect_page";
    pub const DISABLE_404_PAGE: &str = "disable_404_page";
    pub const FORCE_HTTPS: &str = "redirect_https";
    pub const FORCE_WWW: &str = "redirect_www";
    pub const ROBOTS_INDEX_SHORT_LINKS: &str = "robots_shorturl_index";
    pub const RULESET_VERSION: &str = "ruleset_version";
    pub const FRONT_CONTROLLER_PATH: &str = "front_controller_path";
    pub const ADMIN_STUB_PATH: &str = "admin_stub_path";
    pub const REWRITE_RULES_PATH: &str = "rewrite_rules_path";
    pub const CRAWLER_DIRECTIVES_PATH: &str = "robots_txt_path";
}

/// A short-link record as the host application stores it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    pub destination: String,
    #[serde(default)]
    pub title: String,
}

/// Host-owned keyword store: lookup, enumeration, and click accounting.
#[async_trait]
pub trait KeywordStore: Send + Sync {
    /// Whether the host's tables are installed and reachable. Checked before
    /// any resolution runs; `false` is a sentinel state, not an error.
    async fn available(&self) -> bool;

    async fn lookup(&self, keyword: &str) -> anyhow::Result<Option<KeywordEntry>>;

    /// All known keywords, for crawler-directives generation.
    async fn list(&self) -> anyhow::Result<Vec<KeywordEntry>>;

    /// Record one hit: click increment plus redirect-log append.
    async fn record_hit(&self, keyword: &str, referrer: Option<&str>) -> anyhow::Result<()>;
}

/// Host-owned settings key-value store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Collaborator that renders the profile homepage HTML.
#[async_trait]
pub trait HomepageRenderer: Send + Sync {
    async fn render_home(&self) -> anyhow::Result<String>;
}

/// Read a boolean flag; absent keys and store errors read as `false`.
pub async fn flag(settings: &dyn SettingsStore, key: &str) -> bool {
    match settings.get(key).await {
        Ok(Some(value)) => matches!(value.as_str(), "1" | "true" | "yes"),
        Ok(None) => false,
        Err(err) => {
            tracing::warn!(key, error = %err, "settings read failed, treating flag as off");
            false
        }
    }
}

/// The full flag set this subsystem consumes, loaded in one pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct TakeoverFlags {
    pub automatic_mode: bool,
    pub disable_redirect_page: bool,
    pub disable_404_page: bool,
    pub force_https: bool,
    pub force_www: bool,
    pub robots_index_short_links: bool,
}

impl TakeoverFlags {
    pub async fn load(settings: &dyn SettingsStore) -> Self {
        Self {
            automatic_mode: flag(settings, keys::AUTOMATIC_MODE).await,
            disable_redirect_page: flag(settings, keys::DISABLE_REDIRECT_PAGE).await,
            disable_404_page: flag(settings, keys::DISABLE_404_PAGE).await,
            force_https: flag(settings, keys::FORCE_HTTPS).await,
            force_www: flag(settings, keys::FORCE_WWW).await,
            robots_index_short_links: flag(settings, keys::ROBOTS_INDEX_SHORT_LINKS).await,
        }
    }
}

/// One recorded hit, kept by the in-memory store for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitRecord {
    pub keyword: String,
    pub referrer: Option<String>,
}

/// In-memory keyword store.
#[derive(Default)]
pub struct MemoryKeywordStore {
    entries: RwLock<HashMap<String, KeywordEntry>>,
    hits: RwLock<Vec<HitRecord>>,
    unavailable: AtomicBool,
}

impl MemoryKeywordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, entry: KeywordEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(entry.keyword.clone(), entry);
        }
    }

    /// Load entries from a JSON array file (the reference link catalog).
    pub fn load_json(&self, path: &Path) -> anyhow::Result<usize> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading link catalog {}", path.display()))?;
        let entries: Vec<KeywordEntry> =
            serde_json::from_str(&raw).with_context(|| "parsing link catalog")?;
        let count = entries.len();
        for entry in entries {
            self.insert(entry);
        }
        Ok(count)
    }

    /// Flip the store into the not-installed sentinel state.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    pub fn hits(&self) -> Vec<HitRecord> {
        self.hits.read().map(|h| h.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl KeywordStore for MemoryKeywordStore {
    async fn available(&self) -> bool {
        !self.unavailable.load(Ordering::Relaxed)
    }

    async fn lookup(&self, keyword: &str) -> anyhow::Result<Option<KeywordEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("keyword store lock poisoned"))?;
        Ok(entries.get(keyword).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<KeywordEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("keyword store lock poisoned"))?;
        let mut all: Vec<KeywordEntry> = entries.values().cloned().collect();
        all.sort_by(|a, b| a.keyword.cmp(&b.keyword));
        Ok(all)
    }

    async fn record_hit(&self, keyword: &str, referrer: Option<&str>) -> anyhow::Result<()> {
        let mut hits = self
            .hits
            .write()
            .map_err(|_| anyhow::anyhow!("keyword store lock poisoned"))?;
        hits.push(HitRecord {
            keyword: keyword.to_string(),
            referrer: referrer.map(str::to_string),
        });
        Ok(())
    }
}

/// JSON-file settings store. Loads the whole map at open, persists on every
/// write. Small enough that rewriting the file each time is fine.
pub struct JsonSettingsStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl JsonSettingsStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let values = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("parsing settings file {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("reading settings file {}", path.display()))
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            values: RwLock::new(values),
        })
    }

    fn persist(&self, values: &HashMap<String, String>) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("writing settings file {}", self.path.display()))
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        values.remove(key);
        self.persist(&values)
    }
}

/// In-memory settings store for tests.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        values.remove(key);
        Ok(())
    }
}

/// Fixed-content homepage used when no richer collaborator is wired in.
pub struct StaticHomepage {
    html: String,
}

impl StaticHomepage {
    pub fn new(site_name: &str, bio: &str) -> Self {
        let markup = maud::html! {
            (maud::DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (site_name) }
                    meta name="description" content=(bio);
                    meta property="og:title" content=(site_name);
                    meta property="og:type" content="website";
                    style { (maud::PreEscaped(crate::render::components::CARD_CSS)) }
                }
                body {
                    div class="card" {
                        div class="author" { (site_name) }
                        @if !bio.is_empty() {
                            div class="message" { (bio) }
                        }
                    }
                }
            }
        };
        Self {
            html: markup.into_string(),
        }
    }
}

#[async_trait]
impl HomepageRenderer for StaticHomepage {
    async fn render_home(&self) -> anyhow::Result<String> {
        Ok(self.html.clone())
    }
}
