pub mod classify;
pub mod client;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of account owning a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerKind {
    User,
    Organization,
}

/// A repository accessible to the authenticated user
///
/// Mapped at the API boundary from the upstream repository shape; the rest of
/// the crate only ever sees this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Upstream repository id
    pub id: u64,
    /// Short name
    pub name: String,
    /// Fully-qualified name (owner/name)
    pub full_name: String,
    /// Login of the owning account
    pub owner_login: String,
    /// Whether the owner is a user or an organization
    pub owner_kind: OwnerKind,
    /// Timestamp of the most recent push, if any
    pub pushed_at: Option<DateTime<Utc>>,
    /// Whether the current user has push permission
    pub can_push: bool,
}

impl Repository {
    /// Repository page URL
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}", self.full_name)
    }
}

/// A commit authored by the current user, reduced to what the dashboard needs
///
/// Immutable once fetched; scoped to a (repository, window) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit sha
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Authored timestamp
    pub date: DateTime<Utc>,
}

impl Commit {
    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Short sha (7 characters)
    pub fn short_sha(&self) -> String {
        format!("{:.7}", self.sha)
    }
}

/// The user-selected lookback period bounding repos and commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    /// Window length in days
    pub days: u32,
}

impl RecencyWindow {
    /// The fixed window choices offered by the dashboard
    pub const CHOICES: [u32; 3] = [1, 3, 7];

    /// Create a window of the given length
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    /// Window start relative to the given instant
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::days(self.days as i64)
    }

    /// Check if a timestamp falls strictly inside the window
    pub fn contains(&self, now: DateTime<Utc>, date: DateTime<Utc>) -> bool {
        date > self.since(now)
    }
}
