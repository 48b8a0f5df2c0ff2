use thiserror::Error;

/// Main error type for gitbrief
#[derive(Error, Debug)]
pub enum GitBriefError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// HTTP/API errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Account store errors
    #[error("Account store error: {0}")]
    Store(#[from] sled::Error),

    /// No stored GitHub credential for the given user profile
    #[error("No linked GitHub account found for user '{user}'")]
    MissingCredential { user: String },

    /// The GitHub token was rejected upstream
    #[error("GitHub rejected the token: {0}")]
    Unauthorized(String),

    /// GitHub API errors other than 401
    #[error("GitHub API error (status {status}): {message}")]
    GitHubApi { status: u16, message: String },

    /// Gemini API errors
    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    /// Brief generation requested with nothing selected
    #[error("No commits selected - toggle a repository or commit first")]
    EmptySelection,

    /// Clipboard errors
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Missing configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

/// Result type alias for gitbrief operations
pub type Result<T> = std::result::Result<T, GitBriefError>;

impl GitBriefError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Gemini API error
    pub fn gemini_api<S: Into<String>>(msg: S) -> Self {
        Self::GeminiApi(msg.into())
    }

    /// Create a GitHub API error from a response status and body
    pub fn github_api(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 401 {
            Self::Unauthorized(message)
        } else {
            Self::GitHubApi { status, message }
        }
    }
}
