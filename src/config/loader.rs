//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub options: OptionsConfig,
}

/// API credentials configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// API provider tokens. One client instance is built per token and
    /// requests are spread across them.
    #[serde(default)]
    pub tokens: Vec<String>,

    /// Browser user agent string used for media downloads.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Archiving options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory for account archives.
    #[serde(default)]
    pub output_directory: Option<PathBuf>,

    /// Whether to persist raw API payloads as snapshots.
    #[serde(default = "default_true")]
    pub save_raw: bool,

    /// Posts requested per page.
    #[serde(default = "default_posts_page_size")]
    pub posts_page_size: usize,

    /// Followers requested per page.
    #[serde(default = "default_followers_page_size")]
    pub followers_page_size: usize,

    /// Followed accounts requested per page.
    #[serde(default = "default_following_page_size")]
    pub following_page_size: usize,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            output_directory: None,
            save_raw: true,
            posts_page_size: default_posts_page_size(),
            followers_page_size: default_followers_page_size(),
            following_page_size: default_following_page_size(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36".to_string()
}

fn default_true() -> bool {
    true
}

fn default_posts_page_size() -> usize {
    50
}

fn default_followers_page_size() -> usize {
    100
}

fn default_following_page_size() -> usize {
    200
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the effective base directory for account archives.
    pub fn output_directory(&self) -> PathBuf {
        self.options
            .output_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.account.tokens.is_empty());
        assert!(config.options.save_raw);
        assert_eq!(config.options.posts_page_size, 50);
        assert_eq!(config.options.followers_page_size, 100);
        assert_eq!(config.options.following_page_size, 200);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str(
            r#"
            [account]
            tokens = ["abc", "def"]

            [options]
            output_directory = "/archives"
            save_raw = false
            "#,
        )
        .unwrap();

        assert_eq!(config.account.tokens.len(), 2);
        assert!(!config.options.save_raw);
        assert_eq!(config.output_directory(), PathBuf::from("/archives"));
        // Unspecified options keep their defaults.
        assert_eq!(config.options.posts_page_size, 50);
    }
}
