use crate::brief::gemini::GeminiClient;
use crate::brief::{compose_prompt, Brief, SYSTEM_INSTRUCTION};
use crate::error::{GitBriefError, Result};
use crate::github::classify::{classify, ClassifiedRepos};
use crate::github::client::GitHubClient;
use crate::github::{RecencyWindow, Repository};
use crate::state::{FetchOutcome, RepoToggle, SelectionCache};
use chrono::Utc;
use tracing::{debug, error};

/// What happened in response to a repository toggle
#[derive(Debug)]
pub enum ToggleReport {
    /// Commits were fetched and all of them selected
    Fetched(usize),
    /// The fetch failed; the repository stays unfetched so the user can retry
    FetchFailed,
    /// The fetch finished after a window change and its result was dropped
    Discarded,
    /// Every cached commit was re-selected
    SelectedAll(usize),
    /// The selection was cleared
    Cleared,
}

/// Dashboard session: classified repositories, selection cache and draft
///
/// Owns every piece of per-session state; the frontend only renders what the
/// accessors expose and routes user input into the methods here.
pub struct Dashboard {
    github: GitHubClient,
    gemini: GeminiClient,
    state: SelectionCache,
    show_all: bool,
    user_login: String,
    repos: ClassifiedRepos,
    draft: Option<Brief>,
}

impl Dashboard {
    /// Create a dashboard session; call [`load`](Self::load) before rendering
    pub fn new(github: GitHubClient, gemini: GeminiClient, days: u32, show_all: bool) -> Self {
        Self {
            github,
            gemini,
            state: SelectionCache::new(days),
            show_all,
            user_login: String::new(),
            repos: ClassifiedRepos::default(),
            draft: None,
        }
    }

    /// Fetch the user and repository list and classify against the current window
    ///
    /// Upstream failures propagate: without the repository list there is
    /// nothing to render.
    pub async fn load(&mut self) -> Result<()> {
        let login = self.github.authenticated_user().await?;
        debug!(user = %login, "loading dashboard");

        let repos = self.github.list_repositories().await?;
        let since = RecencyWindow::new(self.state.window_days()).since(Utc::now());
        self.repos = classify(&repos, &login, since);
        self.user_login = login;
        Ok(())
    }

    /// Change the recency window: reset the selection cache and refetch
    pub async fn set_window(&mut self, days: u32) -> Result<()> {
        self.state.set_window(days);
        self.load().await
    }

    /// Toggle the inactive-repository sections: full refetch, no incremental update
    pub async fn set_show_all(&mut self, show_all: bool) -> Result<()> {
        self.show_all = show_all;
        self.state.set_window(self.state.window_days());
        self.load().await
    }

    /// Toggle a repository checkbox, fetching its commits on first expand
    ///
    /// Fetch failures are logged and reported, not returned as errors: the
    /// repository reads as unfetched again and the next toggle retries.
    pub async fn toggle_repo(&mut self, full_name: &str) -> ToggleReport {
        match self.state.toggle_repo(full_name) {
            RepoToggle::StartFetch(token) => {
                let since = RecencyWindow::new(self.state.window_days()).since(Utc::now());
                let fetched = self
                    .github
                    .list_commits(full_name, &self.user_login, since)
                    .await;

                match fetched {
                    Ok(commits) => match self.state.complete_fetch(token, commits) {
                        FetchOutcome::Cached(count) => ToggleReport::Fetched(count),
                        FetchOutcome::Stale => ToggleReport::Discarded,
                    },
                    Err(e) => {
                        error!(repo = %full_name, "failed to fetch commits: {}", e);
                        self.state.fail_fetch(token);
                        ToggleReport::FetchFailed
                    }
                }
            }
            RepoToggle::SelectedAll(count) => ToggleReport::SelectedAll(count),
            RepoToggle::Cleared => ToggleReport::Cleared,
        }
    }

    /// Flip a single commit in the selection
    pub fn toggle_commit(&mut self, full_name: &str, sha: &str) -> bool {
        self.state.toggle_commit(full_name, sha)
    }

    /// Generate a brief from the current selection
    ///
    /// On failure the previous draft, if any, stays in place.
    pub async fn generate_brief(&mut self) -> Result<()> {
        let snapshot = self.state.selection_snapshot();
        if snapshot.is_empty() {
            return Err(GitBriefError::EmptySelection);
        }

        let prompt = compose_prompt(&snapshot);
        debug!(chars = prompt.len(), "sending brief prompt");

        match self.gemini.generate(SYSTEM_INSTRUCTION, &prompt).await {
            Ok(text) => {
                self.draft = Some(Brief::new(text));
                Ok(())
            }
            Err(e) => {
                error!("brief generation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Login of the authenticated user (empty before the first load)
    pub fn user_login(&self) -> &str {
        &self.user_login
    }

    /// Classified repository lists from the last load
    pub fn repos(&self) -> &ClassifiedRepos {
        &self.repos
    }

    /// Selection cache, for rendering checkboxes and counts
    pub fn state(&self) -> &SelectionCache {
        &self.state
    }

    /// Current draft, if a brief has been generated
    pub fn draft(&self) -> Option<&Brief> {
        self.draft.as_ref()
    }

    /// Whether inactive sections are shown
    pub fn show_all(&self) -> bool {
        self.show_all
    }

    /// Repositories in display order: active sections first, inactive when shown
    pub fn visible_repos(&self) -> Vec<&Repository> {
        let mut visible: Vec<&Repository> = Vec::new();
        visible.extend(self.repos.active_workspace.iter());
        visible.extend(self.repos.active_personal.iter());
        if self.show_all {
            visible.extend(self.repos.inactive_workspace());
            visible.extend(self.repos.inactive_personal());
        }
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dashboard() -> Dashboard {
        let github = GitHubClient::new("ghp_test".to_string()).unwrap();
        let gemini = GeminiClient::new("AIzaSyTest".to_string()).unwrap();
        Dashboard::new(github, gemini, 1, false)
    }

    #[test]
    fn test_dashboard_starts_empty() {
        let dashboard = test_dashboard();
        assert_eq!(dashboard.user_login(), "");
        assert!(dashboard.draft().is_none());
        assert_eq!(dashboard.repos().total(), 0);
        assert!(dashboard.visible_repos().is_empty());
        assert_eq!(dashboard.state().window_days(), 1);
    }

    #[test]
    fn test_toggle_commit_before_any_fetch_is_noop() {
        let mut dashboard = test_dashboard();
        assert!(!dashboard.toggle_commit("org1/alpha", "sha1"));
        assert_eq!(dashboard.state().total_selected(), 0);
    }

    #[tokio::test]
    async fn test_generate_brief_requires_selection() {
        let mut dashboard = test_dashboard();
        let err = dashboard.generate_brief().await.unwrap_err();
        assert!(matches!(err, GitBriefError::EmptySelection));
        assert!(dashboard.draft().is_none());
    }
}
