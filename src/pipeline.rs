//! Article pipeline: fetch, extract, cache, translate, cache.
//!
//! [`ArticlePipeline::get_article`] makes fetching and translating idempotent
//! per URL:
//!
//! 1. A cached translation is returned immediately, without network access
//! 2. Cached blocks without a translation are translated and stored
//! 3. Otherwise the page is fetched, extracted, stored, translated and stored
//!
//! Concurrent requests for the same URL are not deduplicated; the cache
//! serializes their writes and the last one wins.

use crate::BoxError;
use crate::cache::ArticleCache;
use crate::extract::extract;
use crate::fetch::PageFetcher;
use crate::models::ContentBlock;
use crate::translate::Translator;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Wires the fetcher, cache and translator together.
#[derive(Clone)]
pub struct ArticlePipeline {
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<ArticleCache>,
    translator: Arc<Translator>,
}

impl ArticlePipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cache: Arc<ArticleCache>,
        translator: Arc<Translator>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            translator,
        }
    }

    pub fn cache(&self) -> &Arc<ArticleCache> {
        &self.cache
    }

    /// Translated blocks of the article at `url`.
    ///
    /// Never fails: a network failure yields a single error block and leaves
    /// the cache untouched. A cached article without any blocks counts as a
    /// miss and is fetched again.
    #[instrument(level = "info", skip(self))]
    pub async fn get_article(&self, url: &str) -> Vec<ContentBlock> {
        let cached = self.cache.get(url).await.filter(|entry| !entry.blocks.is_empty());
        let blocks = match cached {
            Some(entry) => match entry.translated {
                Some(translated) => {
                    info!("Serving cached translation");
                    return translated;
                }
                None => entry.blocks,
            },
            None => match self.fetch_blocks(url).await {
                Ok(blocks) => blocks,
                Err(e) => return vec![load_error(&e)],
            },
        };

        let translated = self.translator.translate_blocks(&blocks).await;
        self.cache
            .store_translated(url, blocks, translated.clone())
            .await;
        translated
    }

    /// Untranslated blocks of the article at `url`, from the cache when
    /// possible.
    #[instrument(level = "info", skip(self))]
    pub async fn get_original(&self, url: &str) -> Vec<ContentBlock> {
        if let Some(entry) = self.cache.get(url).await
            && !entry.blocks.is_empty()
        {
            return entry.blocks;
        }
        match self.fetch_blocks(url).await {
            Ok(blocks) => blocks,
            Err(e) => vec![load_error(&e)],
        }
    }

    async fn fetch_blocks(&self, url: &str) -> Result<Vec<ContentBlock>, BoxError> {
        let html = self.fetcher.fetch(url).await?;
        let blocks = extract(&html);
        info!(count = blocks.len(), "Extracted article");
        self.cache.store_blocks(url, blocks.clone()).await;
        Ok(blocks)
    }
}

fn load_error(e: &BoxError) -> ContentBlock {
    error!(error = %e, "Article fetch failed");
    ContentBlock::error(format!("Failed to load the article: {e}"))
}
