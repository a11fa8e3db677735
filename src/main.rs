//! # Hytale Portal
//!
//! A community reader for Hytale news. It lists the latest posts from the
//! official website and the newest video of each followed YouTube channel,
//! and reads articles in the user's language.
//!
//! ## Features
//!
//! - Extracts article bodies into typed content blocks (text, images, videos)
//! - Translates text blocks through an ordered chain of translation services,
//!   falling back to the original text when every service fails
//! - Caches extracted and translated articles in a JSON file so articles that
//!   were read once open without network access
//! - Follows YouTube channels through their Atom feeds
//! - Counts down to the early-access release
//!
//! ## Usage
//!
//! ```sh
//! hytale_portal feeds
//! hytale_portal --lang de read https://hytale.com/news/2025/03/summer-update
//! hytale_portal clear-cache
//! ```
//!
//! ## Architecture
//!
//! 1. **Requests**: each command becomes a [`worker::Request`] on a bounded queue
//! 2. **Dispatch**: the worker answers up to `max_in_flight` requests at once
//! 3. **Articles**: cache, then fetch + [`extract`], then [`translate`], then cache again
//! 4. **Output**: results come back as [`worker::UiEvent`]s and are rendered by this task

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod config;
mod extract;
mod feeds;
mod fetch;
mod models;
mod pipeline;
mod render;
mod translate;
mod utils;
mod worker;

use cache::ArticleCache;
use cli::{Cli, Command};
use config::PortalConfig;
use feeds::FeedService;
use fetch::{HttpFetcher, build_client};
use pipeline::ArticlePipeline;
use render::{Renderer, TerminalRenderer};
use translate::{GoogleGtx, LibreTranslate, Translator};
use utils::countdown;
use worker::{Request, Services, UiEvent};

/// Error type of fallible network and file operations.
pub type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("hytale_portal starting up");

    let args = Cli::parse();
    debug!(?args.command, "Parsed CLI arguments");

    let config = PortalConfig::load(args.config.as_deref())?.with_overrides(&args);
    info!(
        target_language = %config.target_language,
        cache_file = %config.cache_file.display(),
        max_in_flight = config.max_in_flight,
        "Configuration ready"
    );

    // ---- Services ----
    let client = build_client()?;
    let cache = Arc::new(ArticleCache::load(&config.cache_file).await);
    debug!(cached = cache.len().await, "Article cache ready");

    let mut translator = Translator::new(config.target_language.clone());
    if let Some(service) = &config.translate_service {
        translator = translator.with_strategy(LibreTranslate::new(
            client.clone(),
            service.url.clone(),
            service.api_key.clone(),
        ));
    }
    let translator = translator.with_strategy(GoogleGtx::new(client.clone()));

    let services = Arc::new(Services {
        pipeline: ArticlePipeline::new(
            Arc::new(HttpFetcher::new(client.clone())),
            cache,
            Arc::new(translator),
        ),
        feeds: FeedService::new(client, &config),
    });

    let (requests, mut events, dispatcher) = worker::spawn(services, config.max_in_flight);

    // ---- Queue requests ----
    let queued = match &args.command {
        Command::Feeds => vec![Request::Refresh],
        Command::Read { urls, original } => urls
            .iter()
            .map(|url| Request::OpenArticle {
                title: title_from_url(url),
                url: url.clone(),
                translate: !original,
            })
            .collect(),
        Command::ClearCache => vec![Request::ClearCache],
    };
    for request in queued {
        requests.send(request).await?;
    }
    // Closing the queue lets the dispatcher finish once everything is answered.
    drop(requests);

    // ---- Render events ----
    let mut renderer = TerminalRenderer::new(std::io::stdout());
    let mut failures = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            UiEvent::Status(message) => debug!(%message, "Status"),
            UiEvent::FeedsReady(snapshot) => {
                let label = countdown(Local::now().naive_local(), config.release_date);
                renderer.feeds(&label, &snapshot)?;
            }
            UiEvent::ArticleReady { title, url, blocks } => {
                renderer.article(&title, &url, &blocks)?;
            }
            UiEvent::CacheCleared => renderer.status("Cache cleared")?,
            UiEvent::Error(message) => {
                error!(%message, "Request failed");
                eprintln!("Error: {message}");
                failures.push(message);
            }
        }
    }

    if let Err(e) = dispatcher.await {
        warn!(error = %e, "Dispatcher task ended abnormally");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    match failures.len() {
        0 => Ok(()),
        n => Err(format!("{n} request(s) failed").into()),
    }
}

/// Display title for an article opened by URL: its last path segment.
fn title_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(url)
        .to_string()
}
