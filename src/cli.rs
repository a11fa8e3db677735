//! Command-line interface definitions for the Hytale portal.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Global options override values from the optional YAML config file and can
//! also be provided via environment variables.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Hytale portal.
///
/// # Examples
///
/// ```sh
/// # Latest news and videos
/// hytale_portal feeds
///
/// # Read an article translated into German
/// hytale_portal --lang de read https://hytale.com/news/2025/03/summer-update
///
/// # Forget every cached article
/// hytale_portal clear-cache
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a portal config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Article cache file
    #[arg(long, env = "PORTAL_CACHE_FILE")]
    pub cache_file: Option<String>,

    /// Target language for article translation (e.g. "ru", "en")
    #[arg(short, long, env = "PORTAL_LANG")]
    pub lang: Option<String>,

    /// Base URL of a LibreTranslate-compatible translation service
    #[arg(long, env = "TRANSLATE_SERVICE_URL")]
    pub translate_service_url: Option<String>,

    /// API key for the translation service
    #[arg(long, env = "TRANSLATE_API_KEY")]
    pub translate_api_key: Option<String>,

    /// Maximum number of requests processed at once
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show the latest website news and the newest video of each channel
    Feeds,
    /// Fetch, translate and display one or more articles
    Read {
        /// Article URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// Show the extracted article without translating it
        #[arg(long)]
        original: bool,
    },
    /// Delete the article cache
    ClearCache,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "hytale_portal",
            "--cache-file",
            "/tmp/cache.json",
            "--lang",
            "de",
            "read",
            "https://hytale.com/news/2025/03/a",
            "https://hytale.com/news/2025/03/b",
        ]);

        assert_eq!(cli.cache_file.as_deref(), Some("/tmp/cache.json"));
        assert_eq!(cli.lang.as_deref(), Some("de"));
        assert_eq!(
            cli.command,
            Command::Read {
                urls: vec![
                    "https://hytale.com/news/2025/03/a".to_string(),
                    "https://hytale.com/news/2025/03/b".to_string(),
                ],
                original: false,
            }
        );
    }

    #[test]
    fn test_cli_subcommands() {
        let cli = Cli::parse_from(["hytale_portal", "-c", "portal.yaml", "clear-cache"]);
        assert_eq!(cli.config.as_deref(), Some("portal.yaml"));
        assert_eq!(cli.command, Command::ClearCache);

        let cli = Cli::parse_from(["hytale_portal", "feeds"]);
        assert_eq!(cli.command, Command::Feeds);
    }

    #[test]
    fn test_read_requires_url() {
        assert!(Cli::try_parse_from(["hytale_portal", "read", "--original"]).is_err());
    }
}
