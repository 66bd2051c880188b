//! Session over a [`RepositoryClient`] that fetches lazily and computes the
//! commit and repository statistics.
//!
//! Every remote listing is fetched at most once per aggregator and kept for
//! the rest of the session, so asking for the same statistic twice never
//! goes back to the network. Nothing is ever invalidated.

use chrono::{DateTime, Local, Month, Utc, Weekday};
use tracing::{debug, info, warn};

use crate::client::RepositoryClient;
use crate::error::{Error, Result};
use crate::model::{Commit, IssueState, PullRequest, Repository};
use crate::retry::{RetryPolicy, with_retry};
use crate::stats::{self, Report};

const PROGRESS_EVERY: usize = 100;

pub struct StatsAggregator<C> {
    client: C,
    retry: RetryPolicy,
    login: String,
    repositories: Option<Vec<Repository>>,
    commits: Option<Vec<Commit>>,
    closed_pull_requests: Option<Vec<PullRequest>>,
    collaborator_counts: Option<Vec<usize>>,
}

impl<C: RepositoryClient> StatsAggregator<C> {
    /// Authenticate with `client` and start a session for the token owner.
    ///
    /// Fails with [`Error::Auth`] when the token is rejected.
    pub async fn connect(client: C, retry: RetryPolicy) -> Result<Self> {
        let login = client.current_login().await?;
        info!("authenticated as {login}");

        Ok(Self {
            client,
            retry,
            login,
            repositories: None,
            commits: None,
            closed_pull_requests: None,
            collaborator_counts: None,
        })
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Repositories owned by the session user, fetched with retry.
    ///
    /// Once retries are exhausted the error is returned as
    /// [`Error::RetriesExhausted`] and nothing is cached, so a later call
    /// tries again.
    pub async fn repositories(&mut self) -> Result<&[Repository]> {
        if self.repositories.is_none() {
            let client = &self.client;
            let owner = self.login.as_str();
            let repos = with_retry(&self.retry, "listing repositories", move || {
                client.list_repositories(owner)
            })
            .await?;
            debug!("found {} repositories for {owner}", repos.len());
            self.repositories = Some(repos);
        }
        Ok(self.repositories.as_deref().unwrap_or_default())
    }

    /// Commits authored by the session user across all repositories.
    /// Empty repositories are skipped; any other failure aborts the load.
    pub async fn commits(&mut self) -> Result<&[Commit]> {
        if self.commits.is_none() {
            let repos = self.repositories().await?.to_vec();
            let mut commits = Vec::new();

            for repo in &repos {
                info!("Loading commits: repo {}", repo.name);
                match self.client.list_commits(repo, &self.login).await {
                    Ok(batch) => {
                        for commit in batch {
                            commits.push(commit);
                            if commits.len() % PROGRESS_EVERY == 0 {
                                info!("Loading commits: {}", commits.len());
                            }
                        }
                    }
                    Err(Error::EmptyRepository(name)) => {
                        debug!("skipping empty repository {name}");
                    }
                    Err(e) => return Err(e),
                }
            }

            self.commits = Some(commits);
        }
        Ok(self.commits.as_deref().unwrap_or_default())
    }

    async fn commit_timestamps(&mut self) -> Result<Vec<DateTime<Utc>>> {
        Ok(self.commits().await?.iter().map(|c| c.timestamp).collect())
    }

    /// Weekday with the most commits in local time, `None` without commits.
    pub async fn most_popular_day(&mut self) -> Result<Option<Weekday>> {
        let timestamps = self.commit_timestamps().await?;
        Ok(stats::most_popular_weekday(&timestamps, &Local))
    }

    pub async fn most_popular_month(&mut self) -> Result<Option<Month>> {
        let timestamps = self.commit_timestamps().await?;
        Ok(stats::most_popular_month(&timestamps, &Local))
    }

    /// Mean gap between consecutive commits in days.
    pub async fn average_time_between_commits(&mut self) -> Result<f64> {
        let timestamps = self.commit_timestamps().await?;
        Ok(stats::average_gap_days(&timestamps))
    }

    /// Mean open-issue count per repository.
    ///
    /// Unlike the other statistics this one never fails: if the repositories
    /// cannot be listed it logs a warning and reports `0.0`.
    pub async fn average_open_issues(&mut self) -> f64 {
        match self.repositories().await {
            Ok(repos) => stats::mean(repos.iter().map(|r| f64::from(r.open_issues_count))),
            Err(err) => {
                warn!("could not list repositories, reporting 0 open issues: {err}");
                0.0
            }
        }
    }

    /// Mean lifetime in days of closed pull requests that carry both
    /// timestamps.
    pub async fn average_pull_request_duration(&mut self) -> Result<f64> {
        if self.closed_pull_requests.is_none() {
            let repos = self.repositories().await?.to_vec();
            let mut pulls = Vec::new();
            for repo in &repos {
                pulls.extend(self.client.list_pull_requests(repo, IssueState::Closed).await?);
            }
            self.closed_pull_requests = Some(pulls);
        }

        let pulls = self.closed_pull_requests.as_deref().unwrap_or_default();
        Ok(stats::mean(pulls.iter().filter_map(PullRequest::duration_days)))
    }

    pub async fn average_collaborators(&mut self) -> Result<f64> {
        if self.collaborator_counts.is_none() {
            let repos = self.repositories().await?.to_vec();
            let mut counts = Vec::with_capacity(repos.len());
            for repo in &repos {
                counts.push(self.client.list_collaborators(repo).await?.len());
            }
            self.collaborator_counts = Some(counts);
        }

        let counts = self.collaborator_counts.as_deref().unwrap_or_default();
        Ok(stats::mean(counts.iter().map(|&n| n as f64)))
    }

    /// Creation times of closed issues, repository by repository in listing
    /// order. Issues without a creation time are left out.
    pub async fn issue_create_dates(&mut self) -> Result<Vec<DateTime<Utc>>> {
        let repos = self.repositories().await?.to_vec();
        let mut dates = Vec::new();
        for repo in &repos {
            let issues = self.client.list_issues(repo, IssueState::Closed).await?;
            dates.extend(issues.into_iter().filter_map(|i| i.created_at));
        }
        Ok(dates)
    }

    /// All statistics, computed one after another.
    pub async fn report(&mut self) -> Result<Report> {
        Ok(Report {
            login: self.login.clone(),
            most_popular_day: self.most_popular_day().await?,
            most_popular_month: self.most_popular_month().await?,
            avg_days_between_commits: self.average_time_between_commits().await?,
            avg_open_issues: self.average_open_issues().await,
            avg_pull_request_days: self.average_pull_request_duration().await?,
            avg_collaborators: self.average_collaborators().await?,
        })
    }
}
