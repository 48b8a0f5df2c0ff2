use crate::github::{OwnerKind, Repository};
use chrono::{DateTime, Utc};

/// Repository lists partitioned for the dashboard
///
/// `active_personal` is a subset of `personal`, `active_workspace` of
/// `workspace`. The partitions are not exhaustive over the input: a repository
/// matching neither predicate (e.g. someone else's user-owned repo without
/// push permission) appears in neither list.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedRepos {
    /// Owned directly by the current user
    pub personal: Vec<Repository>,
    /// Organizational or collaborative
    pub workspace: Vec<Repository>,
    /// Personal repositories pushed within the window
    pub active_personal: Vec<Repository>,
    /// Workspace repositories pushed within the window
    pub active_workspace: Vec<Repository>,
}

impl ClassifiedRepos {
    /// Personal repositories with no push inside the window
    pub fn inactive_personal(&self) -> Vec<&Repository> {
        let active: Vec<&str> = self
            .active_personal
            .iter()
            .map(|r| r.full_name.as_str())
            .collect();
        self.personal
            .iter()
            .filter(|r| !active.contains(&r.full_name.as_str()))
            .collect()
    }

    /// Workspace repositories with no push inside the window
    pub fn inactive_workspace(&self) -> Vec<&Repository> {
        let active: Vec<&str> = self
            .active_workspace
            .iter()
            .map(|r| r.full_name.as_str())
            .collect();
        self.workspace
            .iter()
            .filter(|r| !active.contains(&r.full_name.as_str()))
            .collect()
    }

    /// Total number of classified repositories
    pub fn total(&self) -> usize {
        self.personal.len() + self.workspace.len()
    }
}

/// True when the repository saw a push strictly after `since`
fn is_active(repo: &Repository, since: DateTime<Utc>) -> bool {
    repo.pushed_at.map(|pushed| pushed > since).unwrap_or(false)
}

/// Partition repositories into personal/workspace and active/inactive
///
/// A repository is workspace when its owner is an organization, or when the
/// user can push to it without owning it. It is personal when a user account
/// equal to the current login owns it.
pub fn classify(repos: &[Repository], user_login: &str, since: DateTime<Utc>) -> ClassifiedRepos {
    let mut classified = ClassifiedRepos::default();

    for repo in repos {
        let workspace = repo.owner_kind == OwnerKind::Organization
            || (repo.can_push && repo.owner_login != user_login);
        let personal = repo.owner_kind == OwnerKind::User && repo.owner_login == user_login;

        if workspace {
            if is_active(repo, since) {
                classified.active_workspace.push(repo.clone());
            }
            classified.workspace.push(repo.clone());
        }

        if personal {
            if is_active(repo, since) {
                classified.active_personal.push(repo.clone());
            }
            classified.personal.push(repo.clone());
        }
    }

    classified
}
