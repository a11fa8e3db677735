//! Front-page feeds: website news and followed YouTube channels.
//!
//! | Section | Module | Method | Notes |
//! |---------|--------|--------|-------|
//! | Hytale news | [`news`] | JSON API | Newest posts first, limited by config |
//! | YouTube | [`youtube`] | Atom RSS | Newest upload per channel; channel IDs rediscovered from the channel page |
//!
//! Failures are kept per section: an unreachable news API or a broken channel
//! becomes an error line for that section only.

pub mod news;
pub mod youtube;

use crate::config::{ChannelSpec, PortalConfig};
use crate::models::{NewsPost, VideoEntry};
use futures::future::join_all;
use reqwest::Client;
use tracing::{error, info, instrument};
use youtube::YoutubeClient;

/// Outcome of polling one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Latest(VideoEntry),
    NoVideos,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUpdate {
    pub channel: String,
    pub status: ChannelStatus,
}

/// Everything shown on the front page after a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub news: Result<Vec<NewsPost>, String>,
    pub videos: Vec<ChannelUpdate>,
}

/// Polls the news API and every configured channel.
#[derive(Debug)]
pub struct FeedService {
    client: Client,
    news_api_url: String,
    site_url: String,
    news_limit: usize,
    channels: Vec<ChannelSpec>,
    youtube: YoutubeClient,
}

impl FeedService {
    pub fn new(client: Client, config: &PortalConfig) -> Self {
        Self {
            youtube: YoutubeClient::new(client.clone()),
            client,
            news_api_url: config.news_api_url.clone(),
            site_url: config.site_url.clone(),
            news_limit: config.news_limit,
            channels: config.channels.clone(),
        }
    }

    /// Poll all sources. Channels are polled concurrently and reported in
    /// configuration order.
    #[instrument(level = "info", skip_all)]
    pub async fn refresh(&self) -> FeedSnapshot {
        let news = news::index_posts(
            &self.client,
            &self.news_api_url,
            &self.site_url,
            self.news_limit,
        )
        .await
        .map_err(|e| {
            error!(error = %e, "News index failed");
            format!("Failed to reach the Hytale API: {e}")
        });

        let videos = join_all(self.channels.iter().map(|channel| async move {
            let status = match self.youtube.latest_video(channel).await {
                Ok(Some(video)) => ChannelStatus::Latest(video),
                Ok(None) => ChannelStatus::NoVideos,
                Err(e) => {
                    error!(channel = %channel.name, error = %e, "Channel poll failed");
                    ChannelStatus::Failed(e.to_string())
                }
            };
            ChannelUpdate {
                channel: channel.name.clone(),
                status,
            }
        }))
        .await;

        info!(
            news = news.as_ref().map(Vec::len).unwrap_or(0),
            channels = videos.len(),
            "Feeds refreshed"
        );
        FeedSnapshot { news, videos }
    }
}
