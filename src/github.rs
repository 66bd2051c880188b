use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::client::RepositoryClient;
use crate::error::{Error, Result};
use crate::model::{Commit, Issue, IssueState, PullRequest, Repository};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "ghdow";
const PER_PAGE: usize = 100;
const EMPTY_REPOSITORY_MESSAGE: &str = "Repository is empty";

#[derive(Deserialize)]
struct UserNode {
    login: String,
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    http: Arc<Client>,
    base_url: Arc<String>,
}

impl GithubClient {
    /// REST client for `base_url` authenticating with `token`.
    pub fn new(token: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Config("access token is empty".into()));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            token: Arc::new(token.to_string()),
            http: Arc::new(http),
            base_url: Arc::new(base_url.trim_end_matches('/').to_string()),
        })
    }

    /// Single GET returning the decoded JSON body, with the failure mapped
    /// onto our error kinds. Retrying is left to the caller.
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url} {query:?}");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&*self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Transient(format!("network error requesting {path}: {e}")))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        // GitHub error payloads carry a `message` field; fall back to the raw body.
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or(body);

        Err(classify_failure(status, &headers, path, message))
    }

    /// Follow page-number pagination until a short page comes back.
    async fn get_all<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut page = 1u32;

        loop {
            let mut params = query.to_vec();
            params.push(("per_page", PER_PAGE.to_string()));
            params.push(("page", page.to_string()));

            let json = self.get_json(path, &params).await?;
            let items: Vec<T> = serde_json::from_value(json)?;
            let fetched = items.len();
            out.extend(items);

            if fetched < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(out)
    }

    fn repo_path(repo: &Repository, tail: &str) -> String {
        format!("/repos/{}/{}/{tail}", repo.owner, repo.name)
    }
}

fn classify_failure(status: StatusCode, headers: &HeaderMap, path: &str, message: String) -> Error {
    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    let quota_exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0");

    match status.as_u16() {
        401 => Error::Auth(message),
        429 => Error::RateLimited { retry_after },
        403 if quota_exhausted => Error::RateLimited { retry_after },
        code if status.is_server_error() => {
            Error::Transient(format!("HTTP {code} from {path}: {message}"))
        }
        code => Error::Api {
            status: code,
            message,
        },
    }
}

#[async_trait]
impl RepositoryClient for GithubClient {
    async fn current_login(&self) -> Result<String> {
        let json = self.get_json("/user", &[]).await?;
        let user: UserNode = serde_json::from_value(json)?;
        Ok(user.login)
    }

    /// Repositories owned by `owner` among those visible to the token,
    /// private ones included.
    async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>> {
        #[derive(Deserialize)]
        struct RepoNode {
            name: String,
            owner: UserNode,
            open_issues_count: u32,
        }

        let nodes: Vec<RepoNode> = self
            .get_all("/user/repos", &[("affiliation", "owner".to_string())])
            .await?;

        Ok(nodes
            .into_iter()
            .filter(|n| n.owner.login.eq_ignore_ascii_case(owner))
            .map(|n| Repository {
                owner: n.owner.login,
                name: n.name,
                open_issues_count: n.open_issues_count,
            })
            .collect())
    }

    async fn list_commits(&self, repo: &Repository, author: &str) -> Result<Vec<Commit>> {
        #[derive(Deserialize)]
        struct CommitNode {
            author: Option<UserNode>,
            commit: CommitDetail,
        }
        #[derive(Deserialize)]
        struct CommitDetail {
            author: Option<Signature>,
            committer: Option<Signature>,
        }
        #[derive(Deserialize)]
        struct Signature {
            date: Option<DateTime<Utc>>,
        }

        let path = Self::repo_path(repo, "commits");
        let nodes: Vec<CommitNode> = match self.get_all(&path, &[("author", author.to_string())]).await {
            Ok(nodes) => nodes,
            Err(Error::Api { status: 409, message }) if message.contains(EMPTY_REPOSITORY_MESSAGE) => {
                return Err(Error::EmptyRepository(repo.full_name()));
            }
            Err(e) => return Err(e),
        };

        let mut commits = Vec::with_capacity(nodes.len());
        for node in nodes {
            let date = node
                .commit
                .committer
                .and_then(|s| s.date)
                .or_else(|| node.commit.author.and_then(|s| s.date));
            let Some(timestamp) = date else {
                debug!("skipping commit without a date in {}", repo.full_name());
                continue;
            };
            commits.push(Commit {
                author: node.author.map(|u| u.login),
                timestamp,
            });
        }

        Ok(commits)
    }

    async fn list_issues(&self, repo: &Repository, state: IssueState) -> Result<Vec<Issue>> {
        #[derive(Deserialize)]
        struct IssueNode {
            created_at: Option<DateTime<Utc>>,
            state: IssueState,
            pull_request: Option<Value>,
        }

        let path = Self::repo_path(repo, "issues");
        let nodes: Vec<IssueNode> = self
            .get_all(&path, &[("state", state.as_str().to_string())])
            .await?;

        Ok(nodes
            .into_iter()
            .filter(|n| n.pull_request.is_none())
            .map(|n| Issue {
                created_at: n.created_at,
                state: n.state,
            })
            .collect())
    }

    async fn list_pull_requests(&self, repo: &Repository, state: IssueState) -> Result<Vec<PullRequest>> {
        #[derive(Deserialize)]
        struct PullNode {
            created_at: Option<DateTime<Utc>>,
            closed_at: Option<DateTime<Utc>>,
        }

        let path = Self::repo_path(repo, "pulls");
        let nodes: Vec<PullNode> = self
            .get_all(&path, &[("state", state.as_str().to_string())])
            .await?;

        Ok(nodes
            .into_iter()
            .map(|n| PullRequest {
                created_at: n.created_at,
                closed_at: n.closed_at,
            })
            .collect())
    }

    async fn list_collaborators(&self, repo: &Repository) -> Result<Vec<String>> {
        let path = Self::repo_path(repo, "collaborators");
        let users: Vec<UserNode> = self.get_all(&path, &[]).await?;
        Ok(users.into_iter().map(|u| u.login).collect())
    }
}
