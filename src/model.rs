use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository as listed for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub open_issues_count: u32,
}

impl Repository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// `None` when the commit email is not linked to an account.
    pub author: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
    All,
}

impl IssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
            IssueState::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub created_at: Option<DateTime<Utc>>,
    pub state: IssueState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub created_at: Option<DateTime<Utc>>,
    /// `None` while the pull request is still open.
    pub closed_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Open time in fractional days, when both ends are known.
    pub fn duration_days(&self) -> Option<f64> {
        match (self.created_at, self.closed_at) {
            (Some(created), Some(closed)) => Some(crate::stats::days_between(created, closed)),
            _ => None,
        }
    }
}
