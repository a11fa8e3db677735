//! Data models for article content, cache entries and feed items.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ContentBlock`]: One unit of extracted article content (text, image or video)
//! - [`CacheEntry`]: Per-URL record of extracted and translated block sequences
//! - [`NewsPost`]: A post listed by the website's blog API
//! - [`VideoEntry`]: The latest upload of a followed YouTube channel
//!
//! Blocks serialize to the on-disk cache format, e.g.
//! `{"type": "text", "content": "...", "style": "header"}` or
//! `{"type": "img", "src": "/uploads/cover.png"}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presentation hint attached to a text block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    /// Paragraphs and list text.
    #[default]
    Normal,
    /// `h1`-`h3` headings.
    Header,
    /// Figure captions.
    Caption,
    /// A substitute block describing why content is missing.
    Error,
}

/// One unit of article content, kept in document order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// A paragraph, heading, list, caption or error message.
    Text {
        content: String,
        #[serde(default)]
        style: TextStyle,
    },
    /// An image; `src` may be absolute or site-relative.
    #[serde(rename = "img")]
    Image { src: String },
    /// An embeddable video URL.
    Video { src: String },
}

impl ContentBlock {
    pub fn text(content: impl Into<String>, style: TextStyle) -> Self {
        ContentBlock::Text {
            content: content.into(),
            style,
        }
    }

    /// A text block with [`TextStyle::Error`] standing in for the article body.
    pub fn error(message: impl Into<String>) -> Self {
        Self::text(message, TextStyle::Error)
    }

    /// The cache-format type tag of this block.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::Image { .. } => "img",
            ContentBlock::Video { .. } => "video",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ContentBlock::Text {
                style: TextStyle::Error,
                ..
            }
        )
    }

    /// Whether `other` could be a translation of `self`: same variant, same
    /// style, and identical media sources. Only text content may differ.
    pub fn same_shape(&self, other: &ContentBlock) -> bool {
        match (self, other) {
            (ContentBlock::Text { style: a, .. }, ContentBlock::Text { style: b, .. }) => a == b,
            (ContentBlock::Image { src: a }, ContentBlock::Image { src: b }) => a == b,
            (ContentBlock::Video { src: a }, ContentBlock::Video { src: b }) => a == b,
            _ => false,
        }
    }
}

/// Returns `true` when `translated` is a valid translation of `blocks`.
pub fn shapes_match(blocks: &[ContentBlock], translated: &[ContentBlock]) -> bool {
    blocks.len() == translated.len()
        && blocks
            .iter()
            .zip(translated)
            .all(|(original, candidate)| original.same_shape(candidate))
}

/// Cached state of a single article URL.
///
/// Created on the first successful fetch and upgraded in place once the
/// translation completes. `translated`, when present, always has the same
/// shape as `blocks` (see [`shapes_match`]).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "StoredEntry")]
pub struct CacheEntry {
    pub blocks: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated: Option<Vec<ContentBlock>>,
}

impl CacheEntry {
    pub fn new(blocks: Vec<ContentBlock>) -> Self {
        Self {
            blocks,
            translated: None,
        }
    }
}

/// Accepted on-disk shapes of a cache entry. Older caches stored the
/// extracted block list directly under the URL key.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Full {
        blocks: Vec<ContentBlock>,
        #[serde(default)]
        translated: Option<Vec<ContentBlock>>,
    },
    Legacy(Vec<ContentBlock>),
}

impl From<StoredEntry> for CacheEntry {
    fn from(stored: StoredEntry) -> Self {
        match stored {
            StoredEntry::Full { blocks, translated } => CacheEntry { blocks, translated },
            StoredEntry::Legacy(blocks) => CacheEntry::new(blocks),
        }
    }
}

/// A post from the website's published-posts API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsPost {
    pub title: String,
    pub slug: String,
    pub published_at: DateTime<Utc>,
    /// Public article URL, `{site}/news/{YYYY}/{MM}/{slug}`.
    pub url: String,
}

impl NewsPost {
    /// List label, e.g. `"14.03 | Summer Update"`.
    pub fn label(&self) -> String {
        format!("{} | {}", self.published_at.format("%d.%m"), self.title)
    }
}

/// A video from a channel's upload feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoEntry {
    pub title: String,
    pub link: String,
    pub video_id: Option<String>,
    pub published: Option<String>,
}

impl VideoEntry {
    pub fn thumbnail_url(&self) -> Option<String> {
        self.video_id
            .as_ref()
            .map(|id| format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"))
    }

    /// Autoplaying embed URL for in-app viewing, falling back to the raw link.
    pub fn embed_url(&self) -> String {
        match &self.video_id {
            Some(id) => format!("https://www.youtube.com/embed/{id}?autoplay=1&rel=0"),
            None => self.link.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_text_block_serialization() {
        let block = ContentBlock::text("Hello there", TextStyle::Header);
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(
            json,
            r#"{"type":"text","content":"Hello there","style":"header"}"#
        );
    }

    #[test]
    fn test_media_block_tags() {
        let image = serde_json::to_value(ContentBlock::Image {
            src: "x.png".to_string(),
        })
        .unwrap();
        assert_eq!(image["type"], "img");
        assert_eq!(image["src"], "x.png");

        let video: ContentBlock =
            serde_json::from_str(r#"{"type":"video","src":"https://www.youtube.com/embed/abc12345678"}"#)
                .unwrap();
        assert_eq!(video.kind(), "video");
    }

    #[test]
    fn test_text_style_defaults_to_normal() {
        let block: ContentBlock =
            serde_json::from_str(r#"{"type":"text","content":"no style here"}"#).unwrap();
        assert_eq!(block, ContentBlock::text("no style here", TextStyle::Normal));
    }

    #[test]
    fn test_cache_entry_without_translation() {
        let entry = CacheEntry::new(vec![ContentBlock::error("nope")]);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("translated"));

        let back: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_cache_entry_legacy_list() {
        let json = r#"[{"type":"text","content":"Old cached paragraph","style":"normal"}]"#;
        let entry: CacheEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.blocks.len(), 1);
        assert!(entry.translated.is_none());
    }

    #[test]
    fn test_shapes_match() {
        let blocks = vec![
            ContentBlock::text("Hello world", TextStyle::Header),
            ContentBlock::Image {
                src: "a.png".to_string(),
            },
        ];
        let translated = vec![
            ContentBlock::text("Привет, мир", TextStyle::Header),
            ContentBlock::Image {
                src: "a.png".to_string(),
            },
        ];
        assert!(shapes_match(&blocks, &translated));

        let restyled = vec![
            ContentBlock::text("Привет, мир", TextStyle::Normal),
            translated[1].clone(),
        ];
        assert!(!shapes_match(&blocks, &restyled));
        assert!(!shapes_match(&blocks, &translated[..1]));
    }

    #[test]
    fn test_news_post_label() {
        let post = NewsPost {
            title: "Summer Update".to_string(),
            slug: "summer-update".to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
            url: "https://hytale.com/news/2025/03/summer-update".to_string(),
        };
        assert_eq!(post.label(), "14.03 | Summer Update");
    }

    #[test]
    fn test_video_urls() {
        let video = VideoEntry {
            title: "Trailer".to_string(),
            link: "https://www.youtube.com/watch?v=abc12345678".to_string(),
            video_id: Some("abc12345678".to_string()),
            published: None,
        };
        assert_eq!(
            video.thumbnail_url().as_deref(),
            Some("https://img.youtube.com/vi/abc12345678/hqdefault.jpg")
        );
        assert_eq!(
            video.embed_url(),
            "https://www.youtube.com/embed/abc12345678?autoplay=1&rel=0"
        );

        let bare = VideoEntry {
            video_id: None,
            ..video
        };
        assert_eq!(bare.thumbnail_url(), None);
        assert_eq!(bare.embed_url(), bare.link);
    }
}
