//! Utility functions for display formatting and the release countdown.
//!
//! This module provides helper functions used throughout the application:
//! - Release countdown text for the front page
//! - URL shortening for compact video links
//! - Resolution of site-relative media URLs

use chrono::NaiveDateTime;
use url::Url;

/// Countdown label from `now` until `release`.
///
/// # Returns
///
/// `"Early access in: {d}d {hh:mm:ss}"` while the release is in the future,
/// `"Released!"` afterwards.
///
/// # Examples
///
/// ```ignore
/// // 1 day, 2 hours, 3 minutes and 4 seconds before release
/// assert_eq!(countdown(now, release), "Early access in: 1d 02:03:04");
/// ```
pub fn countdown(now: NaiveDateTime, release: NaiveDateTime) -> String {
    let remaining = release - now;
    if remaining.num_seconds() <= 0 {
        return "Released!".to_string();
    }
    let total = remaining.num_seconds();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("Early access in: {days}d {hours:02}:{minutes:02}:{seconds:02}")
}

/// Shorten long URLs for display.
///
/// URLs longer than 60 characters keep their first 30 and last 25
/// characters around an ellipsis.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(shorten_url("https://youtu.be/x"), "https://youtu.be/x");
/// ```
pub fn shorten_url(url: &str) -> String {
    let chars: Vec<char> = url.chars().collect();
    if chars.len() <= 60 {
        return url.to_string();
    }
    let head: String = chars[..30].iter().collect();
    let tail: String = chars[chars.len() - 25..].iter().collect();
    format!("{head}...{tail}")
}

/// Resolve a possibly site-relative media `src` against the page it came from.
///
/// Sources that cannot be resolved are returned unchanged.
pub fn resolve_src(page_url: &str, src: &str) -> String {
    match Url::parse(page_url).and_then(|base| base.join(src)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => src.to_string(),
    }
}
