//! Persistent article cache.
//!
//! A single JSON document maps article URLs to [`CacheEntry`] records:
//!
//! ```text
//! {
//!   "https://hytale.com/news/2025/03/summer-update": {
//!     "blocks": [{"type": "text", "content": "...", "style": "header"}, ...],
//!     "translated": [...]
//!   }
//! }
//! ```
//!
//! The mapping is loaded once and rewritten wholesale on every mutation. The
//! mutex is held across the write so memory and disk only diverge for the
//! duration of one mutating call. Entries never expire.
//!
//! # Failure policy
//!
//! - Missing or corrupt file: treated as an empty cache
//! - Failed save: logged, never returned
//! - Failed clear: returned, since the user asked for a definite outcome

use crate::models::{CacheEntry, ContentBlock, shapes_match};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

type Entries = BTreeMap<String, CacheEntry>;

/// URL-keyed cache of extracted and translated articles.
#[derive(Debug)]
pub struct ArticleCache {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl ArticleCache {
    /// Load the cache document at `path`.
    ///
    /// Never fails: an absent, unreadable or unparsable file yields an empty
    /// cache bound to the same path.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Entries>(&raw) {
                Ok(entries) => {
                    info!(count = entries.len(), "Loaded article cache");
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "Cache file is corrupt; starting empty");
                    Entries::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No cache file yet");
                Entries::new()
            }
            Err(e) => {
                warn!(error = %e, "Cache file unreadable; starting empty");
                Entries::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, url: &str) -> Option<CacheEntry> {
        self.entries.lock().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Record freshly extracted blocks for `url`.
    ///
    /// Replacing the blocks of an existing entry drops its translation, which
    /// no longer describes them.
    #[instrument(level = "debug", skip(self, blocks), fields(count = blocks.len()))]
    pub async fn store_blocks(&self, url: &str, blocks: Vec<ContentBlock>) {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(url) {
            Some(entry) if entry.blocks == blocks => {}
            Some(entry) => *entry = CacheEntry::new(blocks),
            None => {
                entries.insert(url.to_string(), CacheEntry::new(blocks));
            }
        }
        self.save(&entries).await;
    }

    /// Record the translation of `blocks` for `url`, creating or upgrading
    /// the entry. A translation whose shape differs from `blocks` is refused.
    #[instrument(level = "debug", skip(self, blocks, translated), fields(count = blocks.len()))]
    pub async fn store_translated(
        &self,
        url: &str,
        blocks: Vec<ContentBlock>,
        translated: Vec<ContentBlock>,
    ) {
        if !shapes_match(&blocks, &translated) {
            error!(
                blocks = blocks.len(),
                translated = translated.len(),
                "Translated blocks do not match the originals; not caching"
            );
            return;
        }
        let mut entries = self.entries.lock().await;
        entries.insert(
            url.to_string(),
            CacheEntry {
                blocks,
                translated: Some(translated),
            },
        );
        self.save(&entries).await;
    }

    /// Drop every entry and delete the cache document.
    ///
    /// A missing document is not an error.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn clear(&self) -> io::Result<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Cache cleared (no file on disk)");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to delete cache file");
                Err(e)
            }
        }
    }

    /// Rewrite the cache document from `entries`, which the caller holds
    /// locked. Failures are logged only.
    async fn save(&self, entries: &Entries) {
        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize cache");
                return;
            }
        };
        match fs::write(&self.path, json).await {
            Ok(()) => debug!(count = entries.len(), "Saved article cache"),
            Err(e) => error!(path = %self.path.display(), error = %e, "Failed to save cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextStyle;
    use tempfile::tempdir;

    const URL: &str = "https://hytale.com/news/2025/03/summer-update";

    fn blocks() -> Vec<ContentBlock> {
        vec![
            ContentBlock::text("Summer update", TextStyle::Header),
            ContentBlock::Image {
                src: "/media/summer.png".to_string(),
            },
        ]
    }

    fn translated() -> Vec<ContentBlock> {
        vec![
            ContentBlock::text("Летнее обновление", TextStyle::Header),
            ContentBlock::Image {
                src: "/media/summer.png".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let cache = ArticleCache::load(dir.path().join("cache.json")).await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cache = ArticleCache::load(&path).await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_store_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = ArticleCache::load(&path).await;
        cache.store_blocks(URL, blocks()).await;
        assert_eq!(ArticleCache::load(&path).await.get(URL).await, Some(CacheEntry::new(blocks())));

        cache.store_translated(URL, blocks(), translated()).await;
        let entry = ArticleCache::load(&path).await.get(URL).await.unwrap();
        assert_eq!(entry.translated, Some(translated()));
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = ArticleCache::load(&path).await;
        cache.store_translated(URL, blocks(), translated()).await;

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Летнее обновление"), "non-ASCII text is stored verbatim");
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[URL]["blocks"][0]["type"], "text");
        assert_eq!(value[URL]["blocks"][0]["style"], "header");
        assert_eq!(value[URL]["translated"][1]["type"], "img");
        assert_eq!(value[URL]["translated"][1]["src"], "/media/summer.png");
    }

    #[tokio::test]
    async fn test_save_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = ArticleCache::load(&path).await;
        cache.store_translated(URL, blocks(), translated()).await;
        cache.store_blocks("https://hytale.com/news/2025/01/other", vec![]).await;
        let before: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        let reloaded = ArticleCache::load(&path).await;
        let entries = reloaded.entries.lock().await;
        reloaded.save(&entries).await;
        let after: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_legacy_entries_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            format!(r#"{{"{URL}": [{{"type": "text", "content": "Old paragraph"}}]}}"#),
        )
        .unwrap();

        let entry = ArticleCache::load(&path).await.get(URL).await.unwrap();
        assert_eq!(entry.blocks, vec![ContentBlock::text("Old paragraph", TextStyle::Normal)]);
        assert_eq!(entry.translated, None);
    }

    #[tokio::test]
    async fn test_legacy_entries_upgraded_on_next_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            format!(r#"{{"{URL}": [{{"type": "text", "content": "Old paragraph"}}]}}"#),
        )
        .unwrap();
        let untouched = std::fs::read_to_string(&path).unwrap();

        let cache = ArticleCache::load(&path).await;
        assert_eq!(std::fs::read_to_string(&path).unwrap(), untouched);

        cache.store_blocks("https://hytale.com/news/2025/01/other", blocks()).await;
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[URL]["blocks"][0]["content"], "Old paragraph");
        assert_eq!(value[URL]["blocks"][0]["style"], "normal");
    }

    #[tokio::test]
    async fn test_mismatched_translation_refused() {
        let dir = tempdir().unwrap();
        let cache = ArticleCache::load(dir.path().join("cache.json")).await;
        cache.store_blocks(URL, blocks()).await;
        cache.store_translated(URL, blocks(), translated()[..1].to_vec()).await;
        assert_eq!(cache.get(URL).await.unwrap().translated, None);
    }

    #[tokio::test]
    async fn test_new_blocks_drop_stale_translation() {
        let dir = tempdir().unwrap();
        let cache = ArticleCache::load(dir.path().join("cache.json")).await;
        cache.store_translated(URL, blocks(), translated()).await;

        cache.store_blocks(URL, blocks()).await;
        assert!(cache.get(URL).await.unwrap().translated.is_some());

        cache.store_blocks(URL, blocks()[..1].to_vec()).await;
        assert!(cache.get(URL).await.unwrap().translated.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = ArticleCache::load(&path).await;
        cache.store_blocks(URL, blocks()).await;
        assert!(path.exists());

        cache.clear().await.unwrap();
        assert!(!path.exists());
        assert_eq!(cache.get(URL).await, None);
        // Clearing twice is fine.
        cache.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_failure_is_reported() {
        let dir = tempdir().unwrap();
        // A directory where the file should be cannot be removed as a file.
        let path = dir.path().join("cache.json");
        std::fs::create_dir(&path).unwrap();
        let cache = ArticleCache::load(&path).await;
        assert!(cache.clear().await.is_err());
    }

    #[tokio::test]
    async fn test_save_failure_does_not_panic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("cache.json");
        let cache = ArticleCache::load(&path).await;
        cache.store_blocks(URL, blocks()).await;
        assert_eq!(cache.len().await, 1);
        assert!(!path.exists());
    }
}
