pub mod aggregator;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod github;
pub mod model;
pub mod retry;
pub mod stats;

pub use aggregator::StatsAggregator;
pub use client::RepositoryClient;
pub use error::{Error, Result};
pub use github::GithubClient;
