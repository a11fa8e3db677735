//! Portal configuration.
//!
//! Defaults describe the official Hytale site and the followed channels. An
//! optional YAML file may override any of them, and command-line flags
//! override the file:
//!
//! ```yaml
//! target_language: en
//! cache_file: /var/cache/hytale/news_cache.json
//! translate_service:
//!   url: http://localhost:5000
//! channels:
//!   - name: Hytale (Official)
//!     url: https://www.youtube.com/@Hytale
//!     id: UCgQN2C6x-1AobLFMpewpAZw
//! ```

use crate::cli::Cli;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, instrument};

/// A YouTube channel to follow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelSpec {
    pub name: String,
    /// Channel page, used to discover the channel ID when needed.
    pub url: String,
    /// Channel ID (`UC` followed by 22 characters), when known.
    #[serde(default)]
    pub id: Option<String>,
}

impl ChannelSpec {
    fn new(name: &str, url: &str, id: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            id: id.map(str::to_string),
        }
    }
}

/// Connection settings of a LibreTranslate-compatible service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslateServiceConfig {
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PortalConfig {
    pub target_language: String,
    pub cache_file: PathBuf,
    pub news_api_url: String,
    pub site_url: String,
    pub news_limit: usize,
    pub release_date: NaiveDateTime,
    pub translate_service: Option<TranslateServiceConfig>,
    pub channels: Vec<ChannelSpec>,
    pub max_in_flight: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            target_language: "ru".to_string(),
            cache_file: PathBuf::from("news_cache_v3.json"),
            news_api_url: "https://hytale.com/api/blog/post/published".to_string(),
            site_url: "https://hytale.com".to_string(),
            news_limit: 4,
            release_date: NaiveDateTime::parse_from_str("2026-01-13 00:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap_or_default(),
            translate_service: None,
            channels: vec![
                ChannelSpec::new(
                    "Hytale (Official)",
                    "https://www.youtube.com/@Hytale",
                    Some("UCgQN2C6x-1AobLFMpewpAZw"),
                ),
                ChannelSpec::new(
                    "Jetik Hytale",
                    "https://www.youtube.com/@jetikhytale",
                    Some("UCwPAi_m6sL9zy_R64_XiHww"),
                ),
                ChannelSpec::new("Zifirsky", "https://www.youtube.com/@Zifirsky", None),
            ],
            max_in_flight: 4,
        }
    }
}

impl PortalConfig {
    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load the config file at `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let config = Self::from_yaml(&raw)?;
                info!(path, channels = config.channels.len(), "Loaded configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, args: &Cli) -> Self {
        if let Some(cache_file) = &args.cache_file {
            self.cache_file = PathBuf::from(cache_file);
        }
        if let Some(lang) = &args.lang {
            self.target_language = lang.clone();
        }
        if let Some(url) = &args.translate_service_url {
            self.translate_service = Some(TranslateServiceConfig {
                url: url.clone(),
                api_key: args.translate_api_key.clone(),
            });
        } else if let (Some(service), Some(key)) =
            (self.translate_service.as_mut(), &args.translate_api_key)
        {
            service.api_key = Some(key.clone());
        }
        if let Some(max) = args.max_in_flight {
            self.max_in_flight = max;
        }
        self.max_in_flight = self.max_in_flight.max(1);
        self
    }
}
