//! Request dispatcher between the rendering surface and the network services.
//!
//! User actions are queued as [`Request`]s on a bounded channel. A single
//! dispatcher task drains the queue and runs up to `max_in_flight` requests
//! concurrently. Every outcome travels back as a [`UiEvent`]; nothing here
//! touches the renderer directly.
//!
//! ```text
//! main task ──Request──▶ [bounded queue] ──▶ dispatcher ──▶ pipeline / feeds
//!     ▲                                            │
//!     └──────────────────UiEvent───────────────────┘
//! ```

use crate::feeds::{FeedService, FeedSnapshot};
use crate::models::ContentBlock;
use crate::pipeline::ArticlePipeline;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Capacity of the request queue.
pub const QUEUE_CAPACITY: usize = 32;

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Reload the news list and channel videos.
    Refresh,
    /// Open an article, translated unless `translate` is false.
    OpenArticle {
        url: String,
        title: String,
        translate: bool,
    },
    /// Delete every cached article.
    ClearCache,
}

/// A result delivered to the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Status(String),
    FeedsReady(FeedSnapshot),
    ArticleReady {
        title: String,
        url: String,
        blocks: Vec<ContentBlock>,
    },
    CacheCleared,
    /// An explicit user action failed and the user must be told.
    Error(String),
}

/// Shared services used to answer requests.
pub struct Services {
    pub pipeline: ArticlePipeline,
    pub feeds: FeedService,
}

/// Spawn the dispatcher.
///
/// Returns the request sender, the event receiver and the dispatcher handle.
/// The dispatcher stops once every request sender is dropped and all queued
/// requests have been answered; the event channel then closes.
pub fn spawn(
    services: Arc<Services>,
    max_in_flight: usize,
) -> (
    mpsc::Sender<Request>,
    mpsc::UnboundedReceiver<UiEvent>,
    JoinHandle<()>,
) {
    let (request_tx, request_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run(services, request_rx, event_tx, max_in_flight.max(1)));
    (request_tx, event_rx, handle)
}

async fn run(
    services: Arc<Services>,
    requests: mpsc::Receiver<Request>,
    events: mpsc::UnboundedSender<UiEvent>,
    max_in_flight: usize,
) {
    info!(max_in_flight, "Dispatcher started");
    stream::unfold(requests, |mut rx| async move {
        rx.recv().await.map(|request| (request, rx))
    })
    .for_each_concurrent(max_in_flight, |request| {
        let services = Arc::clone(&services);
        let events = events.clone();
        async move { handle(&services, request, &events).await }
    })
    .await;
    info!("Dispatcher finished");
}

#[instrument(level = "info", skip(services, events))]
async fn handle(services: &Services, request: Request, events: &mpsc::UnboundedSender<UiEvent>) {
    let send = |event: UiEvent| {
        if events.send(event).is_err() {
            warn!("Rendering surface is gone; dropping event");
        }
    };

    match request {
        Request::Refresh => {
            send(UiEvent::Status("Refreshing feeds...".to_string()));
            let snapshot = services.feeds.refresh().await;
            send(UiEvent::FeedsReady(snapshot));
        }
        Request::OpenArticle {
            url,
            title,
            translate,
        } => {
            send(UiEvent::Status(format!("Loading {url}...")));
            let blocks = if translate {
                services.pipeline.get_article(&url).await
            } else {
                services.pipeline.get_original(&url).await
            };
            if blocks.iter().any(ContentBlock::is_error) {
                warn!(%url, "Article delivered with an error block");
            } else {
                debug!(count = blocks.len(), "Article ready");
            }
            send(UiEvent::ArticleReady { title, url, blocks });
        }
        Request::ClearCache => {
            let cache = services.pipeline.cache();
            match cache.clear().await {
                Ok(()) => send(UiEvent::CacheCleared),
                Err(e) => send(UiEvent::Error(format!(
                    "Could not delete the cache at {}: {e}",
                    cache.path().display()
                ))),
            }
        }
    }
}
