//! Generated artifact management.
//!
//! Automatic mode plants three files at the document root: the front
//! controller (`index.php`), the rewrite rules (`.htaccess`), and the crawler
//! directives (`robots.txt`) — plus an admin-redirect stub inside the host
//! app's own directory when it lives in a subdirectory. Every generated file
//! embeds an ownership marker, and nothing is ever overwritten or deleted
//! unless that marker is found first: a file the operator authored is
//! immutable from this subsystem's point of view.
//!
//! `install` and `uninstall` are both idempotent. A foreign file fails its
//! own step and the manager carries on with the rest; I/O failures are
//! collected as messages for the operator rather than aborting the toggle.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::ArtifactError;
use crate::identity::SiteIdentity;
use crate::rewrite::{self, RewriteOptions, BLOCK_BEGIN, BLOCK_END, RULESET_VERSION};
use crate::store::{keys, KeywordEntry, SettingsStore};

/// Ownership marker embedded in every generated file.
pub const OWNERSHIP_MARKER: &str = "linkfront:auto-generated";

/// The three-plus-one generated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    FrontController,
    AdminStub,
    RewriteRules,
    CrawlerDirectives,
}

impl ArtifactKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::FrontController => "front controller",
            Self::AdminStub => "admin redirect stub",
            Self::RewriteRules => "rewrite rules",
            Self::CrawlerDirectives => "crawler directives",
        }
    }
}

/// What a successful step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Written,
    Unchanged,
    Removed,
    /// Nothing to do: file missing, not ours, or the step does not apply.
    Skipped,
}

/// Outcome of one artifact step.
#[derive(Debug)]
pub struct StepReport {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub result: Result<StepAction, ArtifactError>,
}

/// Collected outcome of an install or uninstall run.
#[derive(Debug, Default)]
pub struct ArtifactReport {
    pub steps: Vec<StepReport>,
}

impl ArtifactReport {
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(|s| s.result.is_ok())
    }

    /// Operator-facing messages: every failure, plus each write/removal.
    pub fn messages(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|step| match &step.result {
                Err(err) => Some(format!("{}: {err}", step.kind.describe())),
                Ok(StepAction::Written) => {
                    Some(format!("{}: wrote {}", step.kind.describe(), step.path.display()))
                }
                Ok(StepAction::Removed) => Some(format!(
                    "{}: removed {}",
                    step.kind.describe(),
                    step.path.display()
                )),
                Ok(_) => None,
            })
            .collect()
    }

    fn push(&mut self, kind: ArtifactKind, path: &Path, result: Result<StepAction, ArtifactError>) {
        if let Err(err) = &result {
            tracing::warn!(kind = kind.describe(), error = %err, "artifact step failed");
        }
        self.steps.push(StepReport {
            kind,
            path: path.to_path_buf(),
            result,
        });
    }
}

/// A generated file path with its ownership resolved once per access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedArtifact {
    pub path: PathBuf,
    pub exists: bool,
    pub owned_by_us: bool,
}

impl OwnedArtifact {
    /// Inspect a path: does a file exist there, and does it carry our marker?
    pub fn inspect(path: &Path) -> Result<Self, ArtifactError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self {
                path: path.to_path_buf(),
                exists: true,
                owned_by_us: content.contains(OWNERSHIP_MARKER),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self {
                path: path.to_path_buf(),
                exists: false,
                owned_by_us: false,
            }),
            Err(source) => Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Crawler-directives settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RobotsOptions {
    /// Emit `Allow` lines for keywords instead of `Disallow`.
    pub index_short_links: bool,
}

/// Manages the generated files for one site.
pub struct ArtifactManager<'a> {
    identity: &'a SiteIdentity,
    install_dir: PathBuf,
    settings: &'a dyn SettingsStore,
}

impl<'a> ArtifactManager<'a> {
    pub fn new(identity: &'a SiteIdentity, install_dir: &Path, settings: &'a dyn SettingsStore) -> Self {
        Self {
            identity,
            install_dir: install_dir.to_path_buf(),
            settings,
        }
    }

    fn front_controller_path(&self) -> PathBuf {
        self.identity.document_root.join("index.php")
    }

    fn admin_stub_path(&self) -> PathBuf {
        self.install_dir.join("index.php")
    }

    fn rewrite_rules_path(&self) -> PathBuf {
        self.identity.document_root.join(".htaccess")
    }

    fn crawler_directives_path(&self) -> PathBuf {
        self.identity.document_root.join("robots.txt")
    }

    /// Create or refresh every artifact. Errors only when the settings store
    /// itself fails; per-artifact problems land in the report.
    pub async fn install(
        &self,
        rewrite_opts: &RewriteOptions,
        robots_opts: &RobotsOptions,
        keywords: &[KeywordEntry],
    ) -> anyhow::Result<ArtifactReport> {
        let mut report = ArtifactReport::default();

        let fc_path = self.front_controller_path();
        let result = write_owned(&fc_path, &front_controller_content(self.identity));
        report.push(ArtifactKind::FrontController, &fc_path, result);

        if !self.identity.base_path.is_empty() {
            // Making the link page the document-root page would otherwise
            // expose the host app's directory listing.
            let stub_path = self.admin_stub_path();
            let result = write_owned(&stub_path, ADMIN_STUB_CONTENT);
            report.push(ArtifactKind::AdminStub, &stub_path, result);
        }

        let rules_path = self.rewrite_rules_path();
        let block = rewrite::build_rules(self.identity, rewrite_opts);
        let result = splice_rules(&rules_path, &block);
        report.push(ArtifactKind::RewriteRules, &rules_path, result);

        let robots_path = self.crawler_directives_path();
        let result = write_owned(
            &robots_path,
            &build_robots(self.identity, robots_opts, keywords),
        );
        report.push(ArtifactKind::CrawlerDirectives, &robots_path, result);

        self.record_paths(&report).await?;
        self.settings
            .set(keys::RULESET_VERSION, &RULESET_VERSION.to_string())
            .await?;

        Ok(report)
    }

    /// Tear down every recorded artifact we still own. Files we do not own,
    /// or that are already gone, are skipped silently.
    pub async fn uninstall(&self) -> anyhow::Result<ArtifactReport> {
        let mut report = ArtifactReport::default();

        for (kind, key) in [
            (ArtifactKind::FrontController, keys::FRONT_CONTROLLER_PATH),
            (ArtifactKind::AdminStub, keys::ADMIN_STUB_PATH),
            (ArtifactKind::CrawlerDirectives, keys::CRAWLER_DIRECTIVES_PATH),
        ] {
            let Some(path) = self.settings.get(key).await? else {
                continue;
            };
            let path = PathBuf::from(path);
            let result = remove_owned(&path);
            // The record outlives a failed step so a retry still finds it.
            if result.is_ok() {
                self.settings.delete(key).await?;
            }
            report.push(kind, &path, result);
        }

        if let Some(path) = self.settings.get(keys::REWRITE_RULES_PATH).await? {
            let path = PathBuf::from(path);
            let result = strip_rules(&path);
            if result.is_ok() {
                self.settings.delete(keys::REWRITE_RULES_PATH).await?;
            }
            report.push(ArtifactKind::RewriteRules, &path, result);
        }

        self.settings.delete(keys::RULESET_VERSION).await?;

        Ok(report)
    }

    /// Has the recorded rule-set version fallen behind the current one?
    pub async fn needs_regeneration(&self) -> anyhow::Result<bool> {
        let recorded = self.settings.get(keys::RULESET_VERSION).await?;
        Ok(recorded.as_deref() != Some(&RULESET_VERSION.to_string()))
    }

    async fn record_paths(&self, report: &ArtifactReport) -> anyhow::Result<()> {
        for step in &report.steps {
            // Record even on failure: uninstall re-checks ownership anyway,
            // and the operator may fix permissions and retry.
            let key = match step.kind {
                ArtifactKind::FrontController => keys::FRONT_CONTROLLER_PATH,
                ArtifactKind::AdminStub => keys::ADMIN_STUB_PATH,
                ArtifactKind::RewriteRules => keys::REWRITE_RULES_PATH,
                ArtifactKind::CrawlerDirectives => keys::CRAWLER_DIRECTIVES_PATH,
            };
            self.settings
                .set(key, &step.path.to_string_lossy())
                .await?;
        }
        Ok(())
    }
}

/// Fixed dispatch stub installed as the front controller. Empty request path
/// goes to the homepage renderer, anything else into the short-link pipeline.
fn front_controller_content(identity: &SiteIdentity) -> String {
    let loader = if identity.base_path.is_empty() {
        "includes/load.php".to_string()
    } else {
        format!(
            "{}/includes/load.php",
            identity.base_path.trim_start_matches('/')
        )
    };
    format!(
        "<?php\n\
         /* {OWNERSHIP_MARKER} */\n\
         /* Generated front controller. Removed when automatic mode is disabled. */\n\
         require_once __DIR__ . '/{loader}';\n\
         linkfront_dispatch();\n"
    )
}

/// Stub that keeps the host app's own directory from serving a listing.
const ADMIN_STUB_CONTENT: &str = "<?php\n\
    /* linkfront:auto-generated */\n\
    /* Sends direct visitors of the host app's directory to its admin. */\n\
    header('Location: ./admin/');\n\
    exit;\n";

/// Build the crawler-directives file: header with the ownership marker, the
/// host-app area disallowed, the homepage allowed, and one comment + rule
/// line pair per keyword, each comment naming the destination.
pub fn build_robots(
    identity: &SiteIdentity,
    opts: &RobotsOptions,
    keywords: &[KeywordEntry],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {OWNERSHIP_MARKER}\n"));
    out.push_str("# Crawler directives managed by linkfront; regenerated on install.\n");
    out.push_str("User-agent: *\n");
    if !identity.base_path.is_empty() {
        out.push_str(&format!("Disallow: {}/\n", identity.base_path));
    }
    out.push_str("Allow: /$\n");

    let verb = if opts.index_short_links {
        "Allow"
    } else {
        "Disallow"
    };
    for entry in keywords {
        out.push('\n');
        out.push_str(&format!("# {} -> {}\n", entry.keyword, entry.destination));
        out.push_str(&format!("{verb}: /{}\n", entry.keyword));
    }
    out
}

/// Write a whole-file artifact under the foreign-file guard.
fn write_owned(path: &Path, content: &str) -> Result<StepAction, ArtifactError> {
    let artifact = OwnedArtifact::inspect(path)?;
    if artifact.exists && !artifact.owned_by_us {
        return Err(ArtifactError::Foreign {
            path: path.to_path_buf(),
        });
    }
    if artifact.exists && read_file(path)? == content {
        return Ok(StepAction::Unchanged);
    }
    write_atomic(path, content)?;
    Ok(StepAction::Written)
}

/// Delete a whole-file artifact if we still own it.
fn remove_owned(path: &Path) -> Result<StepAction, ArtifactError> {
    let artifact = OwnedArtifact::inspect(path)?;
    if !artifact.exists || !artifact.owned_by_us {
        return Ok(StepAction::Skipped);
    }
    std::fs::remove_file(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(StepAction::Removed)
}

/// Replace (or append) the marker-delimited block in the rewrite-rules file.
/// Content outside the block is preserved verbatim.
fn splice_rules(path: &Path, block: &str) -> Result<StepAction, ArtifactError> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let next = match find_block(&existing) {
        BlockState::Absent => {
            if existing.is_empty() {
                block.to_string()
            } else {
                let mut next = existing.clone();
                if !next.ends_with('\n') {
                    next.push('\n');
                }
                next.push('\n');
                next.push_str(block);
                next
            }
        }
        BlockState::Found(range) => {
            let mut next = String::with_capacity(existing.len());
            next.push_str(&existing[..range.start]);
            next.push_str(block);
            next.push_str(&existing[range.end..]);
            next
        }
        BlockState::Malformed => {
            return Err(ArtifactError::MalformedBlock {
                path: path.to_path_buf(),
            })
        }
    };

    if next == existing {
        return Ok(StepAction::Unchanged);
    }
    write_atomic(path, &next)?;
    Ok(StepAction::Written)
}

/// Remove the marker-delimited block; delete the file outright when nothing
/// but whitespace remains.
fn strip_rules(path: &Path) -> Result<StepAction, ArtifactError> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(StepAction::Skipped),
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let range = match find_block(&existing) {
        BlockState::Found(range) => range,
        BlockState::Absent => return Ok(StepAction::Skipped),
        BlockState::Malformed => {
            return Err(ArtifactError::MalformedBlock {
                path: path.to_path_buf(),
            })
        }
    };

    let mut next = String::with_capacity(existing.len());
    next.push_str(&existing[..range.start]);
    next.push_str(&existing[range.end..]);

    if next.trim().is_empty() {
        std::fs::remove_file(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(StepAction::Removed);
    }
    write_atomic(path, &next)?;
    Ok(StepAction::Written)
}

enum BlockState {
    Absent,
    Found(std::ops::Range<usize>),
    Malformed,
}

/// Locate our marker-delimited block as a byte range covering whole lines,
/// trailing newline included.
fn find_block(text: &str) -> BlockState {
    let mut begin: Option<usize> = None;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.trim() == BLOCK_BEGIN && begin.is_none() {
            begin = Some(offset);
        } else if trimmed.trim() == BLOCK_END {
            return match begin {
                Some(start) => BlockState::Found(start..offset + line.len()),
                None => BlockState::Malformed,
            };
        }
        offset += line.len();
    }
    match begin {
        Some(_) => BlockState::Malformed,
        None => BlockState::Absent,
    }
}

fn read_file(path: &Path) -> Result<String, ArtifactError> {
    std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write-new-then-rename so a half-written front controller is never served.
fn write_atomic(path: &Path, content: &str) -> Result<(), ArtifactError> {
    let io_err = |source: std::io::Error| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(content.as_bytes()).map_err(io_err)?;
    tmp.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
