use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::retry::RetryPolicy;

/// Token file looked up in the home directory when none is given.
pub const TOKEN_FILE_NAME: &str = "githubOAuthToken.txt";

/// Resolved run settings. Deliberately not `Debug`: it holds the token.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Config {
    /// Build from command-line flags. A token given directly (flag or
    /// `ACCESS_TOKEN`) wins over the token file.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let token = match &cli.token {
            Some(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => {
                let path = match &cli.token_file {
                    Some(path) => path.clone(),
                    None => default_token_path()
                        .context("Cannot locate home directory for the default token file")?,
                };
                read_token_file(&path)?
            }
        };

        Ok(Self {
            token,
            api_url: cli.api_url.clone(),
            retry: RetryPolicy {
                max_attempts: cli.max_attempts,
                base_delay: Duration::from_millis(cli.retry_delay_ms),
            },
            timeout: Duration::from_secs(cli.timeout_secs),
        })
    }
}

pub fn default_token_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(TOKEN_FILE_NAME))
}

pub fn read_token_file(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read token file {}", path.display()))?;
    let token = contents.trim();
    if token.is_empty() {
        bail!("Token file {} is empty", path.display());
    }
    Ok(token.to_string())
}
