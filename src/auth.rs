use crate::config::Config;
use crate::error::{GitBriefError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;

/// Provider name used for GitHub credentials
pub const GITHUB_PROVIDER: &str = "github";

/// Store for linked provider accounts
///
/// Holds the bearer tokens obtained out of band (OAuth app, PAT). The rest of
/// the crate consumes exactly one read: the stored access token for a (user,
/// provider) pair, newest record first.
pub struct AccountStore {
    db: Db,
}

/// A linked account record
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAccount {
    /// Local user profile the credential belongs to
    user: String,
    /// Provider name ("github")
    provider: String,
    /// Bearer token
    access_token: String,
    /// When the credential was linked
    created_at: DateTime<Utc>,
}

impl AccountStore {
    /// Create or open an account store
    pub fn new(data_dir: &Path) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("accounts.sled");
        let db = sled::open(db_path)?;

        Ok(Self { db })
    }

    /// Open the store at the default data directory
    pub fn open_default() -> Result<Self> {
        let data_dir = Config::default_data_dir()?;
        Self::new(&data_dir)
    }

    /// Store a credential for a user profile and provider
    pub fn link(&self, user: &str, provider: &str, access_token: &str) -> Result<()> {
        let account = StoredAccount {
            user: user.to_string(),
            provider: provider.to_string(),
            access_token: access_token.to_string(),
            created_at: Utc::now(),
        };

        let id = self.db.generate_id()?;
        let data = serde_json::to_vec(&account)?;
        self.db.insert(id.to_be_bytes(), data)?;
        self.db.flush()?;

        Ok(())
    }

    /// Find the stored access token for a user profile and provider
    ///
    /// When several credentials exist, the most recently created one wins.
    pub fn find_access_token(&self, user: &str, provider: &str) -> Result<String> {
        let mut newest: Option<StoredAccount> = None;

        for item in self.db.iter() {
            let (_, value) = item?;
            let account: StoredAccount = match serde_json::from_slice(&value) {
                Ok(account) => account,
                Err(_) => continue,
            };

            if account.user != user || account.provider != provider {
                continue;
            }

            // Ids ascend in insertion order, so >= keeps the latest on ties
            let is_newer = newest
                .as_ref()
                .map(|best| account.created_at >= best.created_at)
                .unwrap_or(true);
            if is_newer {
                newest = Some(account);
            }
        }

        newest
            .map(|account| account.access_token)
            .ok_or_else(|| GitBriefError::MissingCredential {
                user: user.to_string(),
            })
    }

    /// Remove all credentials for a user profile and provider
    pub fn unlink(&self, user: &str, provider: &str) -> Result<usize> {
        let mut removed = 0;

        for item in self.db.iter() {
            let (key, value) = item?;

            if let Ok(account) = serde_json::from_slice::<StoredAccount>(&value) {
                if account.user == user && account.provider == provider {
                    self.db.remove(key)?;
                    removed += 1;
                }
            }
        }

        self.db.flush()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_creation() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::new(temp_dir.path()).unwrap();
        assert!(store
            .find_access_token("default", GITHUB_PROVIDER)
            .is_err());
    }

    #[test]
    fn test_link_and_find() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::new(temp_dir.path()).unwrap();

        store.link("default", GITHUB_PROVIDER, "ghp_first").unwrap();

        let token = store.find_access_token("default", GITHUB_PROVIDER).unwrap();
        assert_eq!(token, "ghp_first");
    }

    #[test]
    fn test_most_recent_credential_wins() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::new(temp_dir.path()).unwrap();

        store.link("default", GITHUB_PROVIDER, "ghp_old").unwrap();
        store.link("default", GITHUB_PROVIDER, "ghp_new").unwrap();

        let token = store.find_access_token("default", GITHUB_PROVIDER).unwrap();
        assert_eq!(token, "ghp_new");
    }

    #[test]
    fn test_profiles_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::new(temp_dir.path()).unwrap();

        store.link("work", GITHUB_PROVIDER, "ghp_work").unwrap();

        assert!(store
            .find_access_token("default", GITHUB_PROVIDER)
            .is_err());
        assert!(store.find_access_token("work", "gitlab").is_err());
        assert_eq!(
            store.find_access_token("work", GITHUB_PROVIDER).unwrap(),
            "ghp_work"
        );
    }

    #[test]
    fn test_missing_credential_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::new(temp_dir.path()).unwrap();

        let err = store
            .find_access_token("default", GITHUB_PROVIDER)
            .unwrap_err();
        assert!(matches!(err, GitBriefError::MissingCredential { .. }));
    }

    #[test]
    fn test_unlink_removes_all_matching() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::new(temp_dir.path()).unwrap();

        store.link("default", GITHUB_PROVIDER, "ghp_a").unwrap();
        store.link("default", GITHUB_PROVIDER, "ghp_b").unwrap();
        store.link("work", GITHUB_PROVIDER, "ghp_c").unwrap();

        let removed = store.unlink("default", GITHUB_PROVIDER).unwrap();
        assert_eq!(removed, 2);

        assert!(store
            .find_access_token("default", GITHUB_PROVIDER)
            .is_err());
        assert!(store.find_access_token("work", GITHUB_PROVIDER).is_ok());
    }
}
