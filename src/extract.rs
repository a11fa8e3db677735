//! Article body extraction into ordered content blocks.
//!
//! News pages are located by a short list of structural heuristics and the
//! resulting content root is walked in document order:
//!
//! | Element | Block |
//! |---------|-------|
//! | `iframe` pointing at YouTube | [`ContentBlock::Video`] with a canonical embed URL |
//! | `img[src]` | [`ContentBlock::Image`] |
//! | `figure` | image, followed by a `[Caption: ...]` text block when captioned, then any other content of the figure |
//! | `p`, `h1`-`h3`, `ul`, `ol` | [`ContentBlock::Text`] when longer than 6 characters |
//!
//! Page chrome (`script`, `style`, `nav`, `header`, `footer`, `aside`) is never
//! visited and never contributes text.

use crate::models::{ContentBlock, TextStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument, warn};

/// Message used when a page has no recognizable content root.
pub const NO_CONTENT_MESSAGE: &str = "Could not extract the article content.";

/// Text of at most this many characters is stray markup, not content.
const MIN_TEXT_CHARS: usize = 6;

static CONTENT_CLASS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"post-body|content|article-body").unwrap());
static YOUTUBE_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap());

static CLASSED_DIV_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div[class]").unwrap());
static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static MAIN_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("main").unwrap());
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static FIGCAPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("figcaption").unwrap());

fn is_chrome(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "nav" | "header" | "footer" | "aside")
}

/// Extract the ordered content blocks of a news page.
///
/// Returns a single [`TextStyle::Error`] block when no content root is found.
/// A content root without any qualifying element yields an empty sequence.
#[instrument(level = "info", skip(html), fields(html_size = html.len()))]
pub fn extract(html: &str) -> Vec<ContentBlock> {
    let document = Html::parse_document(html);
    let Some(root) = content_root(&document) else {
        warn!("No content root found in document");
        return vec![ContentBlock::error(NO_CONTENT_MESSAGE)];
    };

    let mut walk = Walk::default();
    walk.visit(root, false);
    debug!(count = walk.blocks.len(), root = root.value().name(), "Extracted content blocks");
    walk.blocks
}

/// Pick the content root: a `div` with a content-like class, else the first
/// `article`, else the first `main`.
fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&CLASSED_DIV_SELECTOR)
        .find(|div| div.value().classes().any(|class| CONTENT_CLASS_REGEX.is_match(class)))
        .or_else(|| document.select(&ARTICLE_SELECTOR).next())
        .or_else(|| document.select(&MAIN_SELECTOR).next())
}

/// Depth-first walk over a content root.
#[derive(Default)]
struct Walk<'a> {
    blocks: Vec<ContentBlock>,
    /// Figure images already emitted together with their caption.
    consumed: Vec<ElementRef<'a>>,
}

impl<'a> Walk<'a> {
    /// Visit the children of `parent` in document order.
    ///
    /// `in_text` is set below an element whose text was already considered, so
    /// nested text elements are not emitted twice while media inside them is.
    fn visit(&mut self, parent: ElementRef<'a>, in_text: bool) {
        for child in parent.children().filter_map(ElementRef::wrap) {
            let tag = child.value().name();
            match tag {
                tag if is_chrome(tag) => {}
                // Captions only ever appear next to their figure image.
                "figcaption" => {}
                "iframe" => self.blocks.extend(video_block(child)),
                "img" => {
                    if !self.is_consumed(child) {
                        self.blocks.extend(image_block(child));
                    }
                }
                "figure" => self.figure(child, in_text),
                "p" | "h1" | "h2" | "h3" | "ul" | "ol" => {
                    if !in_text {
                        let content = flatten_text(child);
                        if content.chars().count() > MIN_TEXT_CHARS {
                            let style = if tag.starts_with('h') {
                                TextStyle::Header
                            } else {
                                TextStyle::Normal
                            };
                            self.blocks.push(ContentBlock::text(content, style));
                        }
                    }
                    self.visit(child, true);
                }
                _ => self.visit(child, in_text),
            }
        }
    }

    fn is_consumed(&self, img: ElementRef<'a>) -> bool {
        self.consumed.iter().any(|shown| shown.id() == img.id())
    }

    /// Emit the figure image and its caption, then the rest of the figure.
    fn figure(&mut self, figure: ElementRef<'a>, in_text: bool) {
        let first_img = figure.select(&IMG_SELECTOR).next();
        if let Some(img) = first_img
            && !self.is_consumed(img)
            && let Some(image) = image_block(img)
        {
            self.consumed.push(img);
            self.blocks.push(image);

            let caption = figure
                .select(&FIGCAPTION_SELECTOR)
                .next()
                .map(flatten_text)
                .unwrap_or_default();
            if !caption.is_empty() {
                self.blocks.push(ContentBlock::text(
                    format!("[Caption: {caption}]"),
                    TextStyle::Caption,
                ));
            }
        }
        self.visit(figure, in_text);
    }
}

fn non_empty_attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|value| !value.is_empty())
}

fn image_block(img: ElementRef<'_>) -> Option<ContentBlock> {
    non_empty_attr(img, "src").map(|src| ContentBlock::Image {
        src: src.to_string(),
    })
}

fn video_block(iframe: ElementRef<'_>) -> Option<ContentBlock> {
    let src = non_empty_attr(iframe, "src")?;
    if !src.contains("youtube") {
        return None;
    }
    Some(ContentBlock::Video {
        src: youtube_embed_url(src),
    })
}

/// Canonical embed URL for a YouTube iframe source, or the source unchanged
/// when no 11-character video ID can be found.
pub fn youtube_embed_url(src: &str) -> String {
    match YOUTUBE_ID_REGEX.captures(src).and_then(|c| c.get(1)) {
        Some(id) => format!("https://www.youtube.com/embed/{}", id.as_str()),
        None => src.to_string(),
    }
}

/// Text of an element and its descendants, page chrome excluded, with runs
/// of whitespace collapsed to single spaces.
fn flatten_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child)
                    && !is_chrome(el.value().name())
                {
                    // List items and line breaks separate words even without
                    // surrounding whitespace in the markup.
                    let separated = matches!(el.value().name(), "li" | "br" | "p" | "div");
                    if separated {
                        out.push(' ');
                    }
                    collect_text(el, out);
                    if separated {
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}
