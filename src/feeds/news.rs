//! Hytale blog post index.
//!
//! The website publishes its posts through a JSON API at
//! `https://hytale.com/api/blog/post/published`, returning an array of objects
//! such as:
//!
//! ```json
//! {"title": "Summer Update", "slug": "summer-update", "publishedAt": "2025-03-14T09:00:00.000Z"}
//! ```
//!
//! Article pages live under `{site}/news/{YYYY}/{MM}/{slug}`.

use crate::BoxError;
use crate::fetch::NEWS_API_TIMEOUT;
use crate::models::NewsPost;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPost {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

/// Fetch the newest `limit` posts.
///
/// # Errors
///
/// Returns an error when the API is unreachable, answers with a non-200
/// status, or returns something other than a post array.
#[instrument(level = "info", skip(client))]
pub async fn index_posts(
    client: &Client,
    api_url: &str,
    site_url: &str,
    limit: usize,
) -> Result<Vec<NewsPost>, BoxError> {
    let response = client.get(api_url).timeout(NEWS_API_TIMEOUT).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(format!("site unavailable (status {})", status.as_u16()).into());
    }
    let body = response.text().await?;
    let posts = parse_posts(&body, site_url, limit)?;
    info!(count = posts.len(), "Indexed news posts");
    Ok(posts)
}

/// Parse the API response, keeping API order and at most `limit` posts.
///
/// Posts without a slug or with an unreadable publication date are skipped.
pub fn parse_posts(
    json: &str,
    site_url: &str,
    limit: usize,
) -> Result<Vec<NewsPost>, serde_json::Error> {
    let raw: Vec<RawPost> = serde_json::from_str(json)?;
    let site = site_url.trim_end_matches('/');

    let posts = raw
        .into_iter()
        .filter_map(|post| {
            let Some(slug) = post.slug.filter(|slug| !slug.is_empty()) else {
                debug!("Skipping post without slug");
                return None;
            };
            let raw_date = post.published_at.unwrap_or_default();
            let published_at = match DateTime::parse_from_rfc3339(&raw_date) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => {
                    warn!(%slug, error = %e, "Skipping post with bad publishedAt");
                    return None;
                }
            };
            let url = format!(
                "{site}/news/{}/{}",
                published_at.format("%Y/%m"),
                slug
            );
            Some(NewsPost {
                title: post.title.unwrap_or_else(|| "No Title".to_string()),
                slug,
                published_at,
                url,
            })
        })
        .unique_by(|post| post.slug.clone())
        .take(limit)
        .collect();
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "https://hytale.com";

    #[test]
    fn test_parse_posts() {
        let json = r#"[
            {"title": "Summer Update", "slug": "summer-update", "publishedAt": "2025-03-14T09:00:00.000Z", "author": "x"},
            {"slug": "untitled", "publishedAt": "2024-12-01T23:30:00Z"}
        ]"#;
        let posts = parse_posts(json, SITE, 4).unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "https://hytale.com/news/2025/03/summer-update");
        assert_eq!(posts[0].label(), "14.03 | Summer Update");
        assert_eq!(posts[1].title, "No Title");
        assert_eq!(posts[1].url, "https://hytale.com/news/2024/12/untitled");
    }

    #[test]
    fn test_limit_and_bad_entries() {
        let json = r#"[
            {"title": "A", "slug": "a", "publishedAt": "2025-01-01T00:00:00Z"},
            {"title": "Broken date", "slug": "b", "publishedAt": "yesterday"},
            {"title": "No slug", "publishedAt": "2025-01-02T00:00:00Z"},
            {"title": "Draft", "slug": "draft", "publishedAt": null},
            {"title": "A again", "slug": "a", "publishedAt": "2025-01-01T00:00:00Z"},
            {"title": "C", "slug": "c", "publishedAt": "2025-01-03T00:00:00Z"},
            {"title": "D", "slug": "d", "publishedAt": "2025-01-04T00:00:00Z"}
        ]"#;
        let posts = parse_posts(json, "https://hytale.com/", 2).unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["a", "c"]);
    }

    #[test]
    fn test_not_an_array() {
        assert!(parse_posts(r#"{"error": "maintenance"}"#, SITE, 4).is_err());
    }
}
