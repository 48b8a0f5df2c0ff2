use crate::github::Commit;
use std::collections::{HashMap, HashSet};

/// Handle for an in-flight commit fetch
///
/// Carries the window epoch it was issued under; results arriving after a
/// window change carry a stale epoch and are discarded.
#[derive(Debug, Clone)]
pub struct FetchToken {
    full_name: String,
    epoch: u64,
}

/// Result of toggling a repository checkbox
#[derive(Debug)]
pub enum RepoToggle {
    /// Not cached yet: the caller must fetch commits and report back with the token
    StartFetch(FetchToken),
    /// Cached with an empty selection: every cached commit was re-selected
    SelectedAll(usize),
    /// Cached with a non-empty selection: the selection was cleared
    Cleared,
}

/// Result of reporting a finished fetch
#[derive(Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Commits were cached and auto-selected
    Cached(usize),
    /// The window changed while the fetch was in flight; the result was dropped
    Stale,
}

/// Per-session selection cache
///
/// Tracks, for every repository the user has expanded, its fetched commit
/// list, the set of selected commit shas and whether a fetch is in flight.
/// Each repository is in exactly one of not-fetched, fetching or fetched.
/// Invariant: a selected sha always exists in that repository's commit cache.
#[derive(Debug)]
pub struct SelectionCache {
    window_days: u32,
    epoch: u64,
    commits: HashMap<String, Vec<Commit>>,
    selected: HashMap<String, HashSet<String>>,
    fetching: HashSet<String>,
}

impl SelectionCache {
    /// Create an empty cache for the given window
    pub fn new(window_days: u32) -> Self {
        Self {
            window_days,
            epoch: 0,
            commits: HashMap::new(),
            selected: HashMap::new(),
            fetching: HashSet::new(),
        }
    }

    /// Current recency window in days
    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Toggle a repository checkbox
    ///
    /// An unfetched repository starts a fetch (a rapid second toggle before
    /// the first resolves starts a redundant one; both land on the same cache
    /// key). A fetched repository flips between select-none and select-all.
    pub fn toggle_repo(&mut self, full_name: &str) -> RepoToggle {
        if !self.commits.contains_key(full_name) {
            self.fetching.insert(full_name.to_string());
            return RepoToggle::StartFetch(FetchToken {
                full_name: full_name.to_string(),
                epoch: self.epoch,
            });
        }

        let has_selection = self
            .selected
            .get(full_name)
            .map(|s| !s.is_empty())
            .unwrap_or(false);

        if has_selection {
            self.selected.insert(full_name.to_string(), HashSet::new());
            RepoToggle::Cleared
        } else {
            let all: HashSet<String> = self.commits[full_name]
                .iter()
                .map(|c| c.sha.clone())
                .collect();
            let count = all.len();
            self.selected.insert(full_name.to_string(), all);
            RepoToggle::SelectedAll(count)
        }
    }

    /// Cache a successful fetch and auto-select every commit
    ///
    /// Tokens issued before the last window change are discarded: the cache
    /// they targeted no longer exists.
    pub fn complete_fetch(&mut self, token: FetchToken, commits: Vec<Commit>) -> FetchOutcome {
        if token.epoch != self.epoch {
            return FetchOutcome::Stale;
        }

        self.fetching.remove(&token.full_name);
        let all: HashSet<String> = commits.iter().map(|c| c.sha.clone()).collect();
        let count = all.len();
        self.selected.insert(token.full_name.clone(), all);
        self.commits.insert(token.full_name, commits);
        FetchOutcome::Cached(count)
    }

    /// Report a failed fetch
    ///
    /// Only the in-flight marker is cleared, so the repository reads as
    /// not-fetched and the next toggle retries.
    pub fn fail_fetch(&mut self, token: FetchToken) {
        if token.epoch == self.epoch {
            self.fetching.remove(&token.full_name);
        }
    }

    /// Flip a single commit in the selection
    ///
    /// Returns false (and changes nothing) when the sha is not in the
    /// repository's commit cache.
    pub fn toggle_commit(&mut self, full_name: &str, sha: &str) -> bool {
        let cached = self
            .commits
            .get(full_name)
            .map(|commits| commits.iter().any(|c| c.sha == sha))
            .unwrap_or(false);
        if !cached {
            return false;
        }

        let selection = self.selected.entry(full_name.to_string()).or_default();
        if !selection.remove(sha) {
            selection.insert(sha.to_string());
        }
        true
    }

    /// Change the recency window: drop all cached commits, selections and
    /// in-flight markers, and invalidate outstanding fetch tokens
    pub fn set_window(&mut self, days: u32) {
        self.window_days = days;
        self.epoch += 1;
        self.commits.clear();
        self.selected.clear();
        self.fetching.clear();
    }

    /// Whether a fetch for this repository is currently in flight
    pub fn is_fetching(&self, full_name: &str) -> bool {
        self.fetching.contains(full_name)
    }

    /// Whether this repository's commits are cached
    pub fn is_fetched(&self, full_name: &str) -> bool {
        self.commits.contains_key(full_name)
    }

    /// Cached commits for a repository
    pub fn commits_for(&self, full_name: &str) -> Option<&[Commit]> {
        self.commits.get(full_name).map(|c| c.as_slice())
    }

    /// Whether a commit is currently selected
    pub fn is_selected(&self, full_name: &str, sha: &str) -> bool {
        self.selected
            .get(full_name)
            .map(|s| s.contains(sha))
            .unwrap_or(false)
    }

    /// Number of selected commits in one repository
    pub fn selected_count(&self, full_name: &str) -> usize {
        self.selected.get(full_name).map(|s| s.len()).unwrap_or(0)
    }

    /// Number of selected commits across all repositories
    pub fn total_selected(&self) -> usize {
        self.selected.values().map(|s| s.len()).sum()
    }

    /// Number of repositories with at least one selected commit
    pub fn selected_repo_count(&self) -> usize {
        self.selected.values().filter(|s| !s.is_empty()).count()
    }

    /// Selected commits grouped per repository
    ///
    /// Repositories sorted by name, commits in cache order; repositories with
    /// an empty selection are omitted.
    pub fn selection_snapshot(&self) -> Vec<(String, Vec<Commit>)> {
        let mut names: Vec<&String> = self
            .selected
            .iter()
            .filter(|(_, shas)| !shas.is_empty())
            .map(|(name, _)| name)
            .collect();
        names.sort();

        names
            .into_iter()
            .map(|name| {
                let shas = &self.selected[name];
                let picked: Vec<Commit> = self.commits[name]
                    .iter()
                    .filter(|c| shas.contains(&c.sha))
                    .cloned()
                    .collect();
                (name.clone(), picked)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn commit(sha: &str, message: &str) -> Commit {
        Commit {
            sha: sha.to_string(),
            message: message.to_string(),
            date: Utc::now(),
        }
    }

    fn three_commits() -> Vec<Commit> {
        vec![
            commit("sha1", "add parser"),
            commit("sha2", "fix bug"),
            commit("sha3", "update docs"),
        ]
    }

    /// The selection invariant: every selected sha exists in the commit cache
    fn assert_invariant(cache: &SelectionCache) {
        for (name, shas) in &cache.selected {
            let cached: Vec<&str> = cache
                .commits
                .get(name)
                .map(|c| c.iter().map(|c| c.sha.as_str()).collect())
                .unwrap_or_default();
            for sha in shas {
                assert!(cached.contains(&sha.as_str()), "{} not cached for {}", sha, name);
            }
        }
    }

    #[test]
    fn test_first_toggle_fetches_and_selects_all() {
        // Scenario: toggle with no prior cache, fetch returns 3 commits
        let mut cache = SelectionCache::new(1);

        let token = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };
        assert!(cache.is_fetching("org1/alpha"));
        assert!(!cache.is_fetched("org1/alpha"));

        let outcome = cache.complete_fetch(token, three_commits());
        assert_eq!(outcome, FetchOutcome::Cached(3));
        assert!(!cache.is_fetching("org1/alpha"));
        assert!(cache.is_fetched("org1/alpha"));
        assert_eq!(cache.total_selected(), 3);
        assert_invariant(&cache);
    }

    #[test]
    fn test_repo_toggle_cycles_selection() {
        // Scenario: deselect one commit, then clear, then re-select all
        let mut cache = SelectionCache::new(1);
        let token = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };
        cache.complete_fetch(token, three_commits());

        assert!(cache.toggle_commit("org1/alpha", "sha2"));
        assert_eq!(cache.selected_count("org1/alpha"), 2);
        assert!(cache.is_selected("org1/alpha", "sha1"));
        assert!(!cache.is_selected("org1/alpha", "sha2"));
        assert!(cache.is_selected("org1/alpha", "sha3"));

        // Non-empty selection: toggle clears it
        assert!(matches!(
            cache.toggle_repo("org1/alpha"),
            RepoToggle::Cleared
        ));
        assert_eq!(cache.selected_count("org1/alpha"), 0);
        assert!(cache.is_fetched("org1/alpha"));

        // Empty selection: toggle restores everything from the cache
        assert!(matches!(
            cache.toggle_repo("org1/alpha"),
            RepoToggle::SelectedAll(3)
        ));
        assert_eq!(cache.selected_count("org1/alpha"), 3);
        assert_invariant(&cache);
    }

    #[test]
    fn test_toggle_commit_reselects_single() {
        let mut cache = SelectionCache::new(1);
        let token = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };
        cache.complete_fetch(token, three_commits());

        cache.toggle_commit("org1/alpha", "sha2");
        cache.toggle_commit("org1/alpha", "sha2");
        assert_eq!(cache.selected_count("org1/alpha"), 3);
    }

    #[test]
    fn test_toggle_commit_rejects_unknown_sha() {
        let mut cache = SelectionCache::new(1);
        let token = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };
        cache.complete_fetch(token, three_commits());

        assert!(!cache.toggle_commit("org1/alpha", "deadbeef"));
        assert!(!cache.toggle_commit("unknown/repo", "sha1"));
        assert_eq!(cache.total_selected(), 3);
        assert_invariant(&cache);
    }

    #[test]
    fn test_failed_fetch_allows_retry() {
        let mut cache = SelectionCache::new(1);
        let token = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };

        cache.fail_fetch(token);
        assert!(!cache.is_fetching("org1/alpha"));
        assert!(!cache.is_fetched("org1/alpha"));

        // Next toggle starts over
        assert!(matches!(
            cache.toggle_repo("org1/alpha"),
            RepoToggle::StartFetch(_)
        ));
    }

    #[test]
    fn test_window_change_resets_everything() {
        // Scenario: window 1 -> 7 while a repository is fetched with a selection
        let mut cache = SelectionCache::new(1);
        let token = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };
        cache.complete_fetch(token, three_commits());
        assert_eq!(cache.total_selected(), 3);

        cache.set_window(7);

        assert_eq!(cache.window_days(), 7);
        assert!(!cache.is_fetched("org1/alpha"));
        assert!(!cache.is_fetching("org1/alpha"));
        assert_eq!(cache.total_selected(), 0);
        assert!(matches!(
            cache.toggle_repo("org1/alpha"),
            RepoToggle::StartFetch(_)
        ));
    }

    #[test]
    fn test_stale_fetch_result_is_discarded() {
        // A fetch issued under window 1 resolves after the switch to 7
        let mut cache = SelectionCache::new(1);
        let token = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };

        cache.set_window(7);

        assert_eq!(
            cache.complete_fetch(token, three_commits()),
            FetchOutcome::Stale
        );
        assert!(!cache.is_fetched("org1/alpha"));
        assert_eq!(cache.total_selected(), 0);
        assert_invariant(&cache);
    }

    #[test]
    fn test_stale_fail_does_not_clear_new_marker() {
        let mut cache = SelectionCache::new(1);
        let stale = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };

        cache.set_window(3);
        let _fresh = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };

        cache.fail_fetch(stale);
        assert!(cache.is_fetching("org1/alpha"));
    }

    #[test]
    fn test_double_toggle_issues_redundant_fetch() {
        // Best-effort behavior: the in-flight marker is not a lock
        let mut cache = SelectionCache::new(1);
        assert!(matches!(
            cache.toggle_repo("org1/alpha"),
            RepoToggle::StartFetch(_)
        ));
        assert!(matches!(
            cache.toggle_repo("org1/alpha"),
            RepoToggle::StartFetch(_)
        ));
    }

    #[test]
    fn test_independent_repos_do_not_interfere() {
        let mut cache = SelectionCache::new(1);
        let token_a = match cache.toggle_repo("org1/alpha") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };
        let _token_b = match cache.toggle_repo("org1/beta") {
            RepoToggle::StartFetch(token) => token,
            other => panic!("expected StartFetch, got {:?}", other),
        };

        cache.complete_fetch(token_a, three_commits());

        assert!(cache.is_fetched("org1/alpha"));
        assert!(cache.is_fetching("org1/beta"));
        assert!(!cache.is_fetched("org1/beta"));
    }

    #[test]
    fn test_selection_snapshot_groups_and_sorts() {
        let mut cache = SelectionCache::new(1);
        for name in ["zeta/repo", "alpha/repo"] {
            let token = match cache.toggle_repo(name) {
                RepoToggle::StartFetch(token) => token,
                other => panic!("expected StartFetch, got {:?}", other),
            };
            cache.complete_fetch(token, three_commits());
        }

        // Clear one repo entirely: it must vanish from the snapshot
        cache.toggle_repo("zeta/repo");
        cache.toggle_commit("alpha/repo", "sha1");

        let snapshot = cache.selection_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, "alpha/repo");
        // Cache order preserved, sha1 deselected
        let shas: Vec<&str> = snapshot[0].1.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["sha2", "sha3"]);
    }
}
