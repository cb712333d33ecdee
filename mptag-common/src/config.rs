//! Configuration loading and resolution
//!
//! Values resolve through a priority chain:
//! 1. Command-line argument (highest priority, parsed by the binary)
//! 2. Environment variable (folded into the CLI layer)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default port for the health endpoint
pub const DEFAULT_PORT: u16 = 8080;

/// Optional TOML configuration file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Telegram bot token
    pub bot_token: Option<String>,
    /// URL pinged periodically to keep a hosting instance awake
    pub keep_alive_url: Option<String>,
    /// Port for the health endpoint
    pub port: Option<u16>,
    /// Directory for temporary audio/cover files
    pub work_dir: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub keep_alive_url: Option<String>,
    pub port: u16,
    pub work_dir: PathBuf,
}

/// Load a TOML config file, tolerating a missing file
///
/// A missing file yields defaults; an unreadable or unparsable file is an
/// error (a present-but-broken config should not be silently ignored).
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found: {}", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

impl BotConfig {
    /// Resolve the final configuration from CLI/ENV values and a TOML layer
    ///
    /// The CLI layer already folds in environment variables, so each field
    /// resolves CLI/ENV → TOML → default. The bot token has no default:
    /// a missing token is a fatal configuration error.
    pub fn resolve(
        cli_token: Option<String>,
        cli_keep_alive_url: Option<String>,
        cli_port: Option<u16>,
        cli_work_dir: Option<PathBuf>,
        toml_config: TomlConfig,
    ) -> Result<Self> {
        let bot_token = cli_token
            .or(toml_config.bot_token)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "Bot token not configured. Provide one of:\n\
                     1. CLI: --token <token>\n\
                     2. Environment: MPTAG_BOT_TOKEN=<token>\n\
                     3. TOML config: bot_token = \"<token>\"\n\
                     \n\
                     Obtain a token from @BotFather on Telegram"
                        .to_string(),
                )
            })?;

        Ok(Self {
            bot_token,
            keep_alive_url: cli_keep_alive_url.or(toml_config.keep_alive_url),
            port: cli_port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            work_dir: cli_work_dir
                .or(toml_config.work_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_is_fatal() {
        let result = BotConfig::resolve(None, None, None, None, TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_blank_token_is_fatal() {
        let result =
            BotConfig::resolve(Some("  ".to_string()), None, None, None, TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_beats_toml() {
        let toml = TomlConfig {
            bot_token: Some("toml-token".to_string()),
            port: Some(9000),
            ..Default::default()
        };
        let config = BotConfig::resolve(
            Some("cli-token".to_string()),
            None,
            Some(5000),
            None,
            toml,
        )
        .unwrap();
        assert_eq!(config.bot_token, "cli-token");
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_toml_fills_gaps() {
        let toml = TomlConfig {
            bot_token: Some("toml-token".to_string()),
            keep_alive_url: Some("https://example.com/health".to_string()),
            port: None,
            work_dir: Some(PathBuf::from("/tmp/mptag")),
        };
        let config = BotConfig::resolve(None, None, None, None, toml).unwrap();
        assert_eq!(config.bot_token, "toml-token");
        assert_eq!(
            config.keep_alive_url.as_deref(),
            Some("https://example.com/health")
        );
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.work_dir, PathBuf::from("/tmp/mptag"));
    }
}
