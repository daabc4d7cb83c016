//! Linkfront - site takeover for a short-URL domain.
//!
//! `serve` runs the front-controller HTTP service; `install` and `uninstall`
//! toggle automatic mode by creating or tearing down the generated files at
//! the document root.

use std::sync::Arc;

use axum::http::Request;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use linkfront::artifacts::{ArtifactManager, RobotsOptions};
use linkfront::identity::SiteIdentity;
use linkfront::rewrite::RewriteOptions;
use linkfront::store::{
    keys, JsonSettingsStore, KeywordStore, MemoryKeywordStore, SettingsStore, StaticHomepage,
    TakeoverFlags,
};
use linkfront::{router, AppState, Config};

/// Linkfront - personal link page takeover for a short-URL domain.
#[derive(Parser, Debug)]
#[command(name = "linkfront")]
#[command(about = "Serve a link page at the root of a short-URL domain", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the front-controller HTTP service (default).
    Serve,
    /// Enable automatic mode: generate the document-root artifacts.
    Install,
    /// Disable automatic mode: tear down the generated artifacts.
    Uninstall,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if std::path::Path::new(&cli.dotenv).exists() {
        dotenvy::from_path(&cli.dotenv)?;
        eprintln!("Loaded environment from {}", cli.dotenv);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let settings: Arc<dyn SettingsStore> = Arc::new(JsonSettingsStore::open(&config.settings_path)?);
    let keywords = Arc::new(MemoryKeywordStore::new());
    if let Some(links_path) = &config.links_path {
        let count = keywords.load_json(links_path)?;
        tracing::info!(count, path = %links_path.display(), "loaded link catalog");
    }
    let homepage = Arc::new(StaticHomepage::new(&config.site_name, &config.profile_bio));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            serve(config, settings, keywords, homepage).await
        }
        Command::Install => install(&config, settings.as_ref(), keywords.as_ref()).await,
        Command::Uninstall => uninstall(&config, settings.as_ref()).await,
    }
}

async fn serve(
    config: Config,
    settings: Arc<dyn SettingsStore>,
    keywords: Arc<MemoryKeywordStore>,
    homepage: Arc<StaticHomepage>,
) -> anyhow::Result<()> {
    let flags = TakeoverFlags::load(settings.as_ref()).await;

    // Automatic mode regenerates stale artifacts on startup, the same way a
    // plugin re-activation would.
    if flags.automatic_mode {
        let identity = SiteIdentity::resolve(&config.site_url, &config.install_dir);
        let manager = ArtifactManager::new(&identity, &config.install_dir, settings.as_ref());
        if manager.needs_regeneration().await? {
            tracing::info!("rule-set version changed, regenerating artifacts");
            let report = run_install(&config, settings.as_ref(), keywords.as_ref()).await?;
            for message in report {
                tracing::warn!("{message}");
            }
        }
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, settings, keywords, homepage);

    let app = router(state).layer(TraceLayer::new_for_http().make_span_with(
        |request: &Request<_>| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        },
    ));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting front controller");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn install(
    config: &Config,
    settings: &dyn SettingsStore,
    keywords: &dyn KeywordStore,
) -> anyhow::Result<()> {
    let messages = run_install(config, settings, keywords).await?;

    // Automatic mode is toggled even when a step failed; the operator sees
    // the messages and can fix permissions, then install again.
    settings.set(keys::AUTOMATIC_MODE, "1").await?;

    if messages.is_empty() {
        tracing::info!("automatic mode enabled, all artifacts in place");
    }
    for message in &messages {
        println!("{message}");
    }
    Ok(())
}

async fn run_install(
    config: &Config,
    settings: &dyn SettingsStore,
    keywords: &dyn KeywordStore,
) -> anyhow::Result<Vec<String>> {
    let flags = TakeoverFlags::load(settings).await;
    let identity = SiteIdentity::resolve(&config.site_url, &config.install_dir);
    let manager = ArtifactManager::new(&identity, &config.install_dir, settings);

    let entries = keywords.list().await.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "keyword listing failed, crawler directives will carry no keywords");
        Vec::new()
    });

    let report = manager
        .install(
            &RewriteOptions {
                force_https: flags.force_https,
                force_www: flags.force_www,
            },
            &RobotsOptions {
                index_short_links: flags.robots_index_short_links,
            },
            &entries,
        )
        .await?;
    Ok(report.messages())
}

async fn uninstall(config: &Config, settings: &dyn SettingsStore) -> anyhow::Result<()> {
    let identity = SiteIdentity::resolve(&config.site_url, &config.install_dir);
    let manager = ArtifactManager::new(&identity, &config.install_dir, settings);
    let report = manager.uninstall().await?;

    settings.set(keys::AUTOMATIC_MODE, "0").await?;

    for message in report.messages() {
        println!("{message}");
    }
    tracing::info!("automatic mode disabled");
    Ok(())
}
