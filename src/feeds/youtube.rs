//! Latest uploads of followed YouTube channels.
//!
//! Each channel exposes an Atom feed at
//! `https://www.youtube.com/feeds/videos.xml?channel_id=<id>`. Channel IDs can
//! be missing from the configuration or go stale; in that case the channel
//! page is scraped for its real ID and the result is remembered for the rest
//! of the session.

use crate::BoxError;
use crate::config::ChannelSpec;
use crate::fetch::{CHANNEL_PAGE_TIMEOUT, RSS_TIMEOUT, get_text};
use crate::models::VideoEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";

static CHANNEL_ID_JSON_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""channelId":"(UC[\w-]{22})""#).unwrap());
static CHANNEL_ID_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://www\.youtube\.com/channel/(UC[\w-]{22})").unwrap());
static VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"v=([0-9A-Za-z_-]{11})").unwrap());

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: String,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(default)]
    published: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

/// Feed URL of a channel.
pub fn feed_url(channel_id: &str) -> String {
    format!("{FEED_URL}?channel_id={channel_id}")
}

/// Parse an Atom upload feed, newest entry first (feed order).
pub fn parse_feed(xml: &str) -> Result<Vec<VideoEntry>, quick_xml::DeError> {
    let feed: AtomFeed = quick_xml::de::from_str(xml)?;
    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
                .or_else(|| entry.links.first())?
                .href
                .clone();
            Some(VideoEntry {
                video_id: video_id(&link),
                title: entry.title,
                link,
                published: entry.published,
            })
        })
        .collect())
}

/// The 11-character video ID of a `watch?v=` link.
pub fn video_id(link: &str) -> Option<String> {
    VIDEO_ID_REGEX
        .captures(link)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Find the channel ID embedded in a channel page.
pub fn find_channel_id(html: &str) -> Option<String> {
    CHANNEL_ID_JSON_REGEX
        .captures(html)
        .or_else(|| CHANNEL_ID_LINK_REGEX.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Polls channel feeds, remembering channel IDs discovered along the way.
#[derive(Debug)]
pub struct YoutubeClient {
    client: Client,
    discovered: Mutex<HashMap<String, String>>,
}

impl YoutubeClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            discovered: Mutex::new(HashMap::new()),
        }
    }

    fn known_id(&self, channel: &ChannelSpec) -> Option<String> {
        self.discovered
            .lock()
            .ok()
            .and_then(|discovered| discovered.get(&channel.name).cloned())
            .or_else(|| channel.id.clone())
    }

    fn remember(&self, channel: &ChannelSpec, id: &str) {
        if let Ok(mut discovered) = self.discovered.lock() {
            discovered.insert(channel.name.clone(), id.to_string());
        }
    }

    async fn fetch_feed(&self, channel_id: &str) -> Result<Vec<VideoEntry>, BoxError> {
        let xml = get_text(&self.client, &feed_url(channel_id), RSS_TIMEOUT).await?;
        Ok(parse_feed(&xml)?)
    }

    /// The newest upload of `channel`, or `None` when no videos were found.
    ///
    /// A missing ID or an empty feed triggers channel-ID discovery from the
    /// channel page, followed by one more feed request.
    #[instrument(level = "info", skip_all, fields(channel = %channel.name))]
    pub async fn latest_video(
        &self,
        channel: &ChannelSpec,
    ) -> Result<Option<VideoEntry>, BoxError> {
        if let Some(id) = self.known_id(channel) {
            match self.fetch_feed(&id).await {
                Ok(entries) if !entries.is_empty() => {
                    return Ok(entries.into_iter().next());
                }
                Ok(_) => debug!(%id, "Feed has no entries; rediscovering channel ID"),
                Err(e) => warn!(%id, error = %e, "Feed request failed; rediscovering channel ID"),
            }
        }

        let page = get_text(&self.client, &channel.url, CHANNEL_PAGE_TIMEOUT).await?;
        let Some(id) = find_channel_id(&page) else {
            warn!("No channel ID on channel page");
            return Ok(None);
        };
        info!(%id, "Discovered channel ID");
        self.remember(channel, &id);
        Ok(self.fetch_feed(&id).await?.into_iter().next())
    }
}
