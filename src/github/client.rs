use crate::error::{GitBriefError, Result};
use crate::github::{Commit, OwnerKind, Repository};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("gitbrief/", env!("CARGO_PKG_VERSION"));

/// Repositories are fetched sorted by most-recent push, capped at one page
const REPO_PAGE_SIZE: u32 = 100;

/// GitHub REST API client
///
/// The wire shapes stay private to this module; callers only see the records
/// from [`crate::github`].
pub struct GitHubClient {
    token: String,
    client: Client,
}

impl GitHubClient {
    /// Create a new GitHub API client for a bearer token
    pub fn new(token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { token, client })
    }

    /// Login of the user the token belongs to
    pub async fn authenticated_user(&self) -> Result<String> {
        let url = format!("{}/user", GITHUB_API_URL);
        let user: UserDto = self.get_json(self.request(&url)).await?;
        Ok(user.login)
    }

    /// Repositories accessible to the authenticated user, most recently pushed first
    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let url = format!("{}/user/repos", GITHUB_API_URL);
        let per_page = REPO_PAGE_SIZE.to_string();
        let request = self
            .request(&url)
            .query(&[("sort", "pushed"), ("per_page", per_page.as_str())]);

        let repos: Vec<RepoDto> = self.get_json(request).await?;
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    /// Commits authored by `author` in `full_name` since the window start
    pub async fn list_commits(
        &self,
        full_name: &str,
        author: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Commit>> {
        let url = format!("{}/repos/{}/commits", GITHUB_API_URL, full_name);
        let since = since.to_rfc3339();
        let per_page = REPO_PAGE_SIZE.to_string();
        let request = self.request(&url).query(&[
            ("author", author),
            ("since", since.as_str()),
            ("per_page", per_page.as_str()),
        ]);

        let response = request.send().await?;
        let status = response.status();

        // GitHub answers 409 for a repository with no commits at all
        if status.as_u16() == 409 {
            return Ok(Vec::new());
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GitBriefError::github_api(status.as_u16(), body));
        }

        let commits: Vec<CommitDto> = response.json().await?;
        Ok(commits.into_iter().map(Commit::from).collect())
    }

    /// Build a request with the standard GitHub headers
    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header("User-Agent", USER_AGENT)
    }

    /// Send a request and decode a JSON body, mapping non-success statuses
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GitBriefError::github_api(status.as_u16(), body));
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct UserDto {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoDto {
    id: u64,
    name: String,
    full_name: String,
    owner: OwnerDto,
    pushed_at: Option<DateTime<Utc>>,
    permissions: Option<PermissionsDto>,
}

#[derive(Debug, Deserialize)]
struct OwnerDto {
    login: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct PermissionsDto {
    #[serde(default)]
    push: bool,
}

#[derive(Debug, Deserialize)]
struct CommitDto {
    sha: String,
    commit: CommitDetailDto,
}

#[derive(Debug, Deserialize)]
struct CommitDetailDto {
    message: String,
    author: CommitAuthorDto,
}

#[derive(Debug, Deserialize)]
struct CommitAuthorDto {
    date: DateTime<Utc>,
}

impl From<RepoDto> for Repository {
    fn from(dto: RepoDto) -> Self {
        let owner_kind = if dto.owner.kind == "Organization" {
            OwnerKind::Organization
        } else {
            OwnerKind::User
        };

        Repository {
            id: dto.id,
            name: dto.name,
            full_name: dto.full_name,
            owner_login: dto.owner.login,
            owner_kind,
            pushed_at: dto.pushed_at,
            can_push: dto.permissions.map(|p| p.push).unwrap_or(false),
        }
    }
}

impl From<CommitDto> for Commit {
    fn from(dto: CommitDto) -> Self {
        Commit {
            sha: dto.sha,
            message: dto.commit.message,
            date: dto.commit.author.date,
        }
    }
}
