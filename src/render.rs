//! Terminal rendering of articles and feeds.
//!
//! The renderer is the only consumer of [`UiEvent`](crate::worker::UiEvent)
//! payloads and is driven exclusively from the task that owns the event
//! receiver.

use crate::feeds::{ChannelStatus, FeedSnapshot};
use crate::models::{ContentBlock, TextStyle};
use crate::utils::{resolve_src, shorten_url};
use std::io::{self, Write};

/// A surface able to display portal content.
pub trait Renderer {
    fn article(&mut self, title: &str, url: &str, blocks: &[ContentBlock]) -> io::Result<()>;
    fn feeds(&mut self, countdown: &str, snapshot: &FeedSnapshot) -> io::Result<()>;
    fn status(&mut self, message: &str) -> io::Result<()>;
}

/// Plain-text renderer writing to any [`Write`] sink.
#[derive(Debug)]
pub struct TerminalRenderer<W> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn block(&mut self, page_url: &str, block: &ContentBlock) -> io::Result<()> {
        match block {
            ContentBlock::Text { content, style } => match style {
                TextStyle::Header => writeln!(self.out, "\n## {content}\n"),
                TextStyle::Caption => writeln!(self.out, "    {content}"),
                TextStyle::Error => writeln!(self.out, "⚠️ {content}"),
                TextStyle::Normal => writeln!(self.out, "{content}\n"),
            },
            ContentBlock::Image { src } => {
                writeln!(self.out, "[{}] {}", block.kind(), resolve_src(page_url, src))
            }
            ContentBlock::Video { src } => {
                writeln!(self.out, "[{}] {}", block.kind(), shorten_url(src))
            }
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn article(&mut self, title: &str, url: &str, blocks: &[ContentBlock]) -> io::Result<()> {
        writeln!(self.out, "# {title}")?;
        writeln!(self.out, "{url}\n")?;
        for block in blocks {
            self.block(url, block)?;
        }
        self.out.flush()
    }

    fn feeds(&mut self, countdown: &str, snapshot: &FeedSnapshot) -> io::Result<()> {
        writeln!(self.out, "{countdown}\n")?;

        writeln!(self.out, "Hytale.com news")?;
        match &snapshot.news {
            Ok(posts) if posts.is_empty() => writeln!(self.out, "  (no posts)")?,
            Ok(posts) => {
                for post in posts {
                    writeln!(self.out, "  {}", post.label())?;
                    writeln!(self.out, "    {}", post.url)?;
                }
            }
            Err(message) => writeln!(self.out, "  ⚠️ {message}")?,
        }

        writeln!(self.out, "\nLatest videos")?;
        for update in &snapshot.videos {
            match &update.status {
                ChannelStatus::Latest(video) => {
                    writeln!(self.out, "  [{}] {}", update.channel, video.title)?;
                    if let Some(published) = &video.published {
                        writeln!(self.out, "    published: {published}")?;
                    }
                    writeln!(self.out, "    {}", video.link)?;
                    writeln!(self.out, "    embed: {}", shorten_url(&video.embed_url()))?;
                    if let Some(thumbnail) = video.thumbnail_url() {
                        writeln!(self.out, "    thumbnail: {thumbnail}")?;
                    }
                }
                ChannelStatus::NoVideos => {
                    writeln!(self.out, "  ⚠️ {}: no videos found", update.channel)?
                }
                ChannelStatus::Failed(message) => {
                    writeln!(self.out, "  ⚠️ {}: failed to load: {message}", update.channel)?
                }
            }
        }
        self.out.flush()
    }

    fn status(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "-- {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::ChannelUpdate;
    use crate::models::{NewsPost, VideoEntry};
    use chrono::{TimeZone, Utc};

    fn rendered(f: impl FnOnce(&mut TerminalRenderer<Vec<u8>>) -> io::Result<()>) -> String {
        let mut renderer = TerminalRenderer::new(Vec::new());
        f(&mut renderer).unwrap();
        String::from_utf8(renderer.out).unwrap()
    }

    #[test]
    fn test_article_rendering() {
        let blocks = vec![
            ContentBlock::text("Patch notes", TextStyle::Header),
            ContentBlock::Image {
                src: "/media/a.png".to_string(),
            },
            ContentBlock::text("[Caption: Forest]", TextStyle::Caption),
            ContentBlock::Video {
                src: "https://www.youtube.com/embed/abc12345678".to_string(),
            },
        ];
        let out = rendered(|r| {
            r.article("Summer", "https://hytale.com/news/2025/03/summer", &blocks)
        });

        assert!(out.starts_with("# Summer\nhttps://hytale.com/news/2025/03/summer\n"));
        assert!(out.contains("## Patch notes"));
        assert!(out.contains("[img] https://hytale.com/media/a.png"));
        assert!(out.contains("    [Caption: Forest]"));
        assert!(out.contains("[video] https://www.youtube.com/embed/abc12345678"));
    }

    #[test]
    fn test_feed_rendering() {
        let snapshot = FeedSnapshot {
            news: Ok(vec![NewsPost {
                title: "Summer Update".to_string(),
                slug: "summer-update".to_string(),
                published_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
                url: "https://hytale.com/news/2025/03/summer-update".to_string(),
            }]),
            videos: vec![
                ChannelUpdate {
                    channel: "Hytale (Official)".to_string(),
                    status: ChannelStatus::Latest(VideoEntry {
                        title: "Trailer".to_string(),
                        link: "https://www.youtube.com/watch?v=abc12345678".to_string(),
                        video_id: Some("abc12345678".to_string()),
                        published: None,
                    }),
                },
                ChannelUpdate {
                    channel: "Zifirsky".to_string(),
                    status: ChannelStatus::NoVideos,
                },
            ],
        };
        let out = rendered(|r| r.feeds("Released!", &snapshot));

        assert!(out.starts_with("Released!\n"));
        assert!(out.contains("14.03 | Summer Update"));
        assert!(out.contains("[Hytale (Official)] Trailer"));
        assert!(out.contains("embed: https://www.youtube.com/embed/abc12345678?autoplay=1&rel=0"));
        assert!(out.contains("thumbnail: https://img.youtube.com/vi/abc12345678/hqdefault.jpg"));
        assert!(out.contains("Zifirsky: no videos found"));
    }

    #[test]
    fn test_news_error_rendering() {
        let snapshot = FeedSnapshot {
            news: Err("site unavailable (status 503)".to_string()),
            videos: vec![],
        };
        let out = rendered(|r| r.feeds("Released!", &snapshot));
        assert!(out.contains("⚠️ site unavailable (status 503)"));
    }
}
