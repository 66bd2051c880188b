use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Commit, Issue, IssueState, PullRequest, Repository};

/// Read-only view of a hosted version-control service.
///
/// Any call may fail with [`crate::Error::Transient`]; callers decide whether
/// to retry. Listing commits of a repository without history fails with
/// [`crate::Error::EmptyRepository`].
#[async_trait]
pub trait RepositoryClient {
    /// Login of the account the token belongs to.
    async fn current_login(&self) -> Result<String>;

    async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>>;

    /// Commits in `repo` whose author is linked to `author`.
    async fn list_commits(&self, repo: &Repository, author: &str) -> Result<Vec<Commit>>;

    /// Issues only; pull requests are never returned here.
    async fn list_issues(&self, repo: &Repository, state: IssueState) -> Result<Vec<Issue>>;

    async fn list_pull_requests(&self, repo: &Repository, state: IssueState) -> Result<Vec<PullRequest>>;

    /// Logins of accounts with access to `repo`.
    async fn list_collaborators(&self, repo: &Repository) -> Result<Vec<String>>;
}
