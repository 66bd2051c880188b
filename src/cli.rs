use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::aggregator::StatsAggregator;
use crate::config::Config;
use crate::github::{DEFAULT_API_URL, GithubClient};

#[derive(Parser, Debug)]
#[command(name = "ghdow")]
#[command(about = "Commit habits and repository statistics for your GitHub account")]
#[command(version)]
pub struct Cli {
    /// GitHub access token (takes precedence over --token-file)
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// File holding the access token [default: ~/githubOAuthToken.txt]
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Attempts made when listing repositories
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Initial wait between attempts in milliseconds, doubled each retry
    #[arg(long, default_value_t = 250)]
    pub retry_delay_ms: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Log in, compute every statistic and print the report on stdout.
    pub async fn execute(self) -> Result<()> {
        let config = Config::from_cli(&self)?;
        let client = GithubClient::new(&config.token, &config.api_url, config.timeout)
            .context("Failed to create GitHub client")?;

        let mut aggregator = StatsAggregator::connect(client, config.retry)
            .await
            .context("Failed to log in to GitHub")?;

        let report = aggregator
            .report()
            .await
            .context("Failed to compute statistics")?;

        print!("{report}");
        Ok(())
    }
}
