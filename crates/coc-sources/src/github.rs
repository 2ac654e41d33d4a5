//! GitHub REST client: repositories, branches, and authored commits.
//!
//! Commit totals are the number of distinct commit SHAs authored by the
//! configured user across every branch of every visible repository since a
//! given instant. Listing the same commit on two branches (or in a fork and
//! its parent) counts it once.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::http::{check_status, join_url, normalise_base_url, read_json, redact_url, HttpSettings};
use crate::pagination::{next_step, PageStep};
use crate::retry::retry_with_backoff;

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const SERVICE: &str = "github";
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

/// Maximum number of pages fetched for one listing before giving up.
pub const MAX_PAGES: usize = 100;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    pub owner: Owner,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Signature {
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub author: Option<Signature>,
    pub committer: Option<Signature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: CommitDetail,
}

impl CommitSummary {
    /// Committer date, falling back to the author date.
    #[must_use]
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.commit
            .committer
            .as_ref()
            .or(self.commit.author.as_ref())
            .map(|s| s.date)
    }
}

/// Result of a commit walk across all repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitTally {
    pub total: u64,
    pub repos_scanned: usize,
    /// `owner/name` of repositories skipped because listing failed.
    pub failed_repos: Vec<String>,
}

/// Per-day commit counts in the configured timezone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyCommits {
    /// One key per local date in the requested range, zero when idle.
    pub counts: BTreeMap<NaiveDate, u64>,
    pub repos_scanned: usize,
    pub failed_repos: Vec<String>,
}

#[derive(Debug, Default)]
struct CommitWalk {
    commits: Vec<CommitSummary>,
    repos_scanned: usize,
    failed_repos: Vec<String>,
}

/// Authenticated GitHub REST client.
///
/// Transient errors (timeouts, 429, 5xx) are retried per page with
/// exponential back-off. Pagination follows the `Link` header and refuses
/// links that leave the API host, so the token is never sent elsewhere.
pub struct GithubClient {
    client: Client,
    base_url: Url,
    token: String,
    username: String,
    organization: Option<String>,
    max_retries: u32,
    backoff_base_secs: u64,
    inter_request_delay: Duration,
}

impl GithubClient {
    /// Creates a client against `https://api.github.com`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(token: &str, username: &str, settings: &HttpSettings) -> Result<Self, SourceError> {
        Self::with_base_url(GITHUB_API_BASE, token, username, settings)
    }

    /// Creates a client against a custom base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] if `base_url` does not parse, or
    /// [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        token: &str,
        username: &str,
        settings: &HttpSettings,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: settings.build_client()?,
            base_url: normalise_base_url(base_url)?,
            token: token.to_owned(),
            username: username.to_owned(),
            organization: None,
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
            inter_request_delay: Duration::from_millis(settings.inter_request_delay_ms),
        })
    }

    /// Also walks the repositories of `organization` when counting.
    #[must_use]
    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Repositories visible to the token (owned, collaborator, member).
    ///
    /// # Errors
    ///
    /// Any page failure after retries, or [`SourceError::PaginationLimit`].
    pub async fn list_user_repos(&self) -> Result<Vec<Repository>, SourceError> {
        let url = self.endpoint("user/repos", &[("type", "all".to_owned())])?;
        self.paginate(url).await
    }

    /// Repositories of an organization.
    ///
    /// # Errors
    ///
    /// Any page failure after retries, or [`SourceError::PaginationLimit`].
    pub async fn list_org_repos(&self, organization: &str) -> Result<Vec<Repository>, SourceError> {
        let url = self.endpoint(
            &format!("orgs/{organization}/repos"),
            &[("type", "all".to_owned())],
        )?;
        self.paginate(url).await
    }

    /// User repositories followed by organization repositories, deduplicated
    /// by `full_name` in first-seen order.
    ///
    /// # Errors
    ///
    /// Fails if either listing fails.
    pub async fn list_all_repos(
        &self,
        organization: Option<&str>,
    ) -> Result<Vec<Repository>, SourceError> {
        let mut repos = self.list_user_repos().await?;
        if let Some(org) = organization {
            let org_repos = self.list_org_repos(org).await?;
            tracing::info!(organization = org, count = org_repos.len(), "listed organization repositories");
            repos.extend(org_repos);
        }

        let mut seen = HashSet::new();
        repos.retain(|repo| seen.insert(repo.full_name.clone()));
        tracing::info!(count = repos.len(), "listed repositories");
        Ok(repos)
    }

    /// # Errors
    ///
    /// Any page failure after retries, or [`SourceError::PaginationLimit`].
    pub async fn list_branches(&self, repo: &Repository) -> Result<Vec<Branch>, SourceError> {
        let url = self.endpoint(&format!("repos/{}/branches", repo.full_name), &[])?;
        self.paginate(url).await
    }

    /// Commits on `branch` authored by the configured user in
    /// `[since, until]`.
    ///
    /// # Errors
    ///
    /// Any page failure after retries. An empty repository surfaces as a 409
    /// [`SourceError::UnexpectedStatus`].
    pub async fn list_commits(
        &self,
        repo: &Repository,
        branch: &str,
        since: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitSummary>, SourceError> {
        let mut query = vec![
            ("sha", branch.to_owned()),
            ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("author", self.username.clone()),
        ];
        if let Some(until) = until {
            query.push(("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        let url = self.endpoint(&format!("repos/{}/commits", repo.full_name), &query)?;
        self.paginate(url).await
    }

    /// Distinct commits authored since `since` across all repositories and
    /// branches.
    ///
    /// # Errors
    ///
    /// Fails only when repositories cannot be listed. Per-repository failures
    /// are recorded in [`CommitTally::failed_repos`].
    pub async fn count_commits_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<CommitTally, SourceError> {
        let walk = self.walk_commits(since, None).await?;
        let tally = CommitTally {
            total: walk.commits.len() as u64,
            repos_scanned: walk.repos_scanned,
            failed_repos: walk.failed_repos,
        };
        tracing::info!(
            total = tally.total,
            repos_scanned = tally.repos_scanned,
            failed_repos = tally.failed_repos.len(),
            "counted commits"
        );
        Ok(tally)
    }

    /// Distinct commits in `[since, until]` bucketed by local committer date.
    ///
    /// # Errors
    ///
    /// Fails only when repositories cannot be listed.
    pub async fn daily_commit_counts(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        tz: Tz,
    ) -> Result<DailyCommits, SourceError> {
        let walk = self.walk_commits(since, Some(until)).await?;

        let first = coc_core::clock::local_date(since, tz);
        let last = coc_core::clock::local_date(until, tz);
        let mut counts: BTreeMap<NaiveDate, u64> =
            first.iter_days().take_while(|d| *d <= last).map(|d| (d, 0)).collect();

        for commit in &walk.commits {
            let Some(at) = commit.committed_at() else {
                continue;
            };
            if let Some(count) = counts.get_mut(&coc_core::clock::local_date(at, tz)) {
                *count += 1;
            }
        }

        Ok(DailyCommits {
            counts,
            repos_scanned: walk.repos_scanned,
            failed_repos: walk.failed_repos,
        })
    }

    async fn walk_commits(
        &self,
        since: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<CommitWalk, SourceError> {
        let repos = self.list_all_repos(self.organization.as_deref()).await?;
        let mut seen = HashSet::new();
        let mut walk = CommitWalk::default();

        for repo in &repos {
            match self.repo_commits(repo, since, until).await {
                Ok(commits) => {
                    let before = walk.commits.len();
                    walk.commits
                        .extend(commits.into_iter().filter(|c| seen.insert(c.sha.clone())));
                    walk.repos_scanned += 1;
                    tracing::debug!(
                        repo = %repo.full_name,
                        commits = walk.commits.len() - before,
                        "scanned repository"
                    );
                }
                Err(e) => {
                    tracing::warn!(repo = %repo.full_name, error = %e, "skipping repository");
                    walk.failed_repos.push(repo.full_name.clone());
                }
            }
        }

        Ok(walk)
    }

    /// All authored commits of one repository, across branches. A repository
    /// contributes nothing unless every branch listing succeeds.
    async fn repo_commits(
        &self,
        repo: &Repository,
        since: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitSummary>, SourceError> {
        let branches = match self.list_branches(repo).await {
            Ok(branches) => branches,
            Err(e) if e.is_empty_repository() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut commits = Vec::new();
        for branch in &branches {
            match self.list_commits(repo, &branch.name, since, until).await {
                Ok(batch) => commits.extend(batch),
                Err(e) if e.is_empty_repository() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(commits)
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, SourceError> {
        let mut url = join_url(&self.base_url, path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("per_page", &PER_PAGE.to_string());
            pairs.append_pair("page", "1");
        }
        Ok(url)
    }

    async fn paginate<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>, SourceError> {
        let mut items = Vec::new();
        let mut url = first.clone();

        for fetched in 0..MAX_PAGES {
            if fetched > 0 && !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }

            let (batch, link) = self.get_page::<T>(&url).await?;
            let step = next_step(batch.len(), PER_PAGE, link.as_deref());
            items.extend(batch);

            url = match step {
                PageStep::Done => return Ok(items),
                PageStep::Follow(next) => self.same_origin(&next)?,
                PageStep::Increment => with_next_page(&url),
            };
        }

        Err(SourceError::PaginationLimit {
            url: redact_url(&first),
            max_pages: MAX_PAGES,
        })
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &Url,
    ) -> Result<(Vec<T>, Option<String>), SourceError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url)
                    .bearer_auth(&self.token)
                    .header(reqwest::header::ACCEPT, ACCEPT)
                    .header("X-GitHub-Api-Version", API_VERSION)
                    .send()
                    .await?;
                let response = check_status(response, SERVICE).await?;

                // Read the Link header before the body consumes the response.
                let link = response
                    .headers()
                    .get(reqwest::header::LINK)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);

                let page: Vec<T> = read_json(response, SERVICE).await?;
                Ok((page, link))
            }
        })
        .await
    }

    fn same_origin(&self, next: &str) -> Result<Url, SourceError> {
        let url = Url::parse(next).map_err(|e| SourceError::InvalidUrl {
            url: next.to_owned(),
            reason: e.to_string(),
        })?;
        if url.origin() != self.base_url.origin() {
            return Err(SourceError::InvalidUrl {
                url: redact_url(&url),
                reason: "next page link points outside the API host".to_owned(),
            });
        }
        Ok(url)
    }
}

/// Same URL with its `page` query parameter incremented.
fn with_next_page(url: &Url) -> Url {
    let current = url
        .query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse::<u64>().ok())
        .unwrap_or(1);
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut next = url.clone();
    next.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &(current + 1).to_string());
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_page_increments_and_keeps_other_params() {
        let url = Url::parse("https://api.github.com/user/repos?type=all&per_page=100&page=3")
            .unwrap();
        let next = with_next_page(&url);
        assert_eq!(
            next.as_str(),
            "https://api.github.com/user/repos?type=all&per_page=100&page=4"
        );
    }

    #[test]
    fn next_page_defaults_to_two_without_page_param() {
        let url = Url::parse("https://api.github.com/user/repos?per_page=100").unwrap();
        assert!(with_next_page(&url).as_str().ends_with("per_page=100&page=2"));
    }

    #[test]
    fn link_to_foreign_host_is_rejected() {
        let client = GithubClient::with_base_url(
            "https://api.github.com",
            "tok",
            "octocat",
            &HttpSettings::for_tests(),
        )
        .unwrap();
        assert!(client
            .same_origin("https://api.github.com/user/repos?page=2")
            .is_ok());
        assert!(matches!(
            client.same_origin("https://evil.example/user/repos?page=2"),
            Err(SourceError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn endpoint_carries_page_size_and_first_page() {
        let client = GithubClient::with_base_url(
            "http://127.0.0.1:9000",
            "tok",
            "octocat",
            &HttpSettings::for_tests(),
        )
        .unwrap();
        let url = client
            .endpoint("repos/octocat/hello/commits", &[("author", "octocat".to_owned())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/repos/octocat/hello/commits?author=octocat&per_page=100&page=1"
        );
    }

    #[test]
    fn committed_at_prefers_committer_date() {
        let commit: CommitSummary = serde_json::from_value(serde_json::json!({
            "sha": "abc",
            "commit": {
                "author": { "date": "2026-03-01T10:00:00Z" },
                "committer": { "date": "2026-03-02T10:00:00Z" }
            }
        }))
        .unwrap();
        assert_eq!(
            commit.committed_at().unwrap().to_rfc3339(),
            "2026-03-02T10:00:00+00:00"
        );
    }
}
