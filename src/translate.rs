//! Best-effort translation of article text blocks.
//!
//! Translation is modelled as an ordered list of [`TranslationStrategy`]
//! implementations combined by [`Translator`], where the first strategy that
//! produces a non-empty result wins:
//!
//! 1. [`LibreTranslate`]: a full translation service with language detection,
//!    used when a service URL is configured
//! 2. [`GoogleGtx`]: the public `translate_a/single` endpoint
//! 3. The original text, when every strategy failed
//!
//! Translation never fails from the caller's point of view and never changes
//! the shape of a block sequence.

use crate::BoxError;
use crate::fetch::TRANSLATE_TIMEOUT;
use crate::models::ContentBlock;
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Public endpoint used by [`GoogleGtx`].
pub const GTX_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// One way of translating a piece of text.
pub trait TranslationStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Detect the language of `text`. `None` means this strategy cannot tell.
    fn detect<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(std::future::ready(None))
    }

    /// Translate `text` into the `target` language.
    fn translate<'a>(&'a self, text: &'a str, target: &'a str)
    -> BoxFuture<'a, Result<String, BoxError>>;
}

/// Ordered chain of strategies translating into one target language.
pub struct Translator {
    target: String,
    strategies: Vec<Box<dyn TranslationStrategy>>,
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("target", &self.target)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Translator {
    /// A translator with no strategies: every text comes back unchanged.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            strategies: Vec::new(),
        }
    }

    /// Append a strategy; earlier strategies are preferred.
    pub fn with_strategy(mut self, strategy: impl TranslationStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Translate every text block, passing images and videos through.
    #[instrument(level = "info", skip_all, fields(blocks = blocks.len(), target = %self.target))]
    pub async fn translate_blocks(&self, blocks: &[ContentBlock]) -> Vec<ContentBlock> {
        let t0 = Instant::now();
        let mut translated = Vec::with_capacity(blocks.len());
        for block in blocks {
            translated.push(match block {
                ContentBlock::Text { content, style } => ContentBlock::Text {
                    content: self.translate_text(content).await,
                    style: *style,
                },
                other => other.clone(),
            });
        }
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Translated content blocks"
        );
        translated
    }

    /// Translate a single text, returning it unchanged when it is blank,
    /// already in the target language, or untranslatable.
    pub async fn translate_text(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        if let Some(lang) = self.detect(text).await
            && lang.eq_ignore_ascii_case(&self.target)
        {
            debug!(%lang, "Text already in target language");
            return text.to_string();
        }
        match self.first_success(text).await {
            Some(translated) => translated,
            None => {
                warn!("All translation strategies failed; keeping original text");
                text.to_string()
            }
        }
    }

    async fn detect(&self, text: &str) -> Option<String> {
        for strategy in &self.strategies {
            if let Some(lang) = strategy.detect(text).await {
                return Some(lang);
            }
        }
        None
    }

    async fn first_success(&self, text: &str) -> Option<String> {
        for strategy in &self.strategies {
            match strategy.translate(text, &self.target).await {
                Ok(translated) if !translated.trim().is_empty() => return Some(translated),
                Ok(_) => warn!(strategy = strategy.name(), "Empty translation; trying next"),
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Translation failed; trying next")
                }
            }
        }
        None
    }
}

/// Client for a LibreTranslate-compatible service.
#[derive(Debug, Clone)]
pub struct LibreTranslate {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LibreTranslation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct LibreDetection {
    language: String,
}

impl LibreTranslate {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<String, BoxError> {
        let mut params: Vec<(&str, &str)> = form.to_vec();
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.as_str()));
        }
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .timeout(TRANSLATE_TIMEOUT)
            .form(&params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    async fn detect_language(&self, text: &str) -> Result<Option<String>, BoxError> {
        let body = self.post("detect", &[("q", text)]).await?;
        let detections: Vec<LibreDetection> = serde_json::from_str(&body)?;
        Ok(detections.into_iter().next().map(|d| d.language))
    }

    async fn translate_into(&self, text: &str, target: &str) -> Result<String, BoxError> {
        let form = [
            ("q", text),
            ("source", "auto"),
            ("target", target),
            ("format", "text"),
        ];
        let body = self.post("translate", &form).await?;
        let parsed: LibreTranslation = serde_json::from_str(&body)?;
        Ok(parsed.translated_text)
    }
}

impl TranslationStrategy for LibreTranslate {
    fn name(&self) -> &'static str {
        "libretranslate"
    }

    fn detect<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            match self.detect_language(text).await {
                Ok(lang) => lang,
                Err(e) => {
                    debug!(error = %e, "Language detection failed");
                    None
                }
            }
        })
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String, BoxError>> {
        Box::pin(self.translate_into(text, target))
    }
}

/// The public Google `gtx` translation endpoint.
#[derive(Debug, Clone)]
pub struct GoogleGtx {
    client: Client,
    endpoint: String,
}

impl GoogleGtx {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: GTX_ENDPOINT.to_string(),
        }
    }

    async fn translate_into(&self, text: &str, target: &str) -> Result<String, BoxError> {
        let body = self
            .client
            .get(self.request_url(text, target))
            .timeout(TRANSLATE_TIMEOUT)
            .send()
            .await?
            .text()
            .await?;
        let data: Value = serde_json::from_str(&body)?;
        parse_gtx_response(&data).ok_or_else(|| "unexpected gtx response shape".into())
    }

    /// Request URL for translating `text` into `target`.
    pub fn request_url(&self, text: &str, target: &str) -> String {
        format!(
            "{}?client=gtx&sl=auto&tl={}&dt=t&q={}",
            self.endpoint,
            urlencoding::encode(target),
            urlencoding::encode(text)
        )
    }
}

impl TranslationStrategy for GoogleGtx {
    fn name(&self) -> &'static str {
        "gtx"
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String, BoxError>> {
        Box::pin(self.translate_into(text, target))
    }
}

/// Concatenate the sentence fragments of a `gtx` response.
///
/// The response is a nested array whose first element lists
/// `[translated, original, ...]` fragments.
pub fn parse_gtx_response(data: &Value) -> Option<String> {
    let sentences = data.as_array()?.first()?.as_array()?;
    let text: String = sentences
        .iter()
        .filter_map(|sentence| sentence.as_array()?.first()?.as_str())
        .collect();
    Some(text)
}
