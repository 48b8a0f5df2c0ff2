use crate::github::RecencyWindow;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gitbrief")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "AI-powered standup brief generator for your GitHub activity",
    long_about = "gitbrief lists the GitHub repositories you can access, fetches your recent \
                  commits per repository on demand, lets you pick the commits that matter, and \
                  turns the selection into a short AI-generated standup brief."
)]
pub struct Cli {
    /// Recency window in days (1, 3 or 7)
    #[arg(short, long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Include inactive repositories in the dashboard
    #[arg(long)]
    pub show_all: bool,

    /// Local account profile holding the GitHub credential
    #[arg(short, long, default_value = "default")]
    pub user: String,

    /// GitHub token override (skips the account store)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to config file (default: ~/.config/gitbrief/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// Store a GitHub credential for a user profile
    Login {
        /// GitHub token with read:user, user:email and repo scope
        #[arg(long)]
        token: String,
    },

    /// Remove the stored GitHub credentials for a user profile
    Logout,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Some(days) = self.days {
            if !RecencyWindow::CHOICES.contains(&days) {
                return Err(format!(
                    "--days must be one of {:?} (got {})",
                    RecencyWindow::CHOICES,
                    days
                ));
            }
        }

        Ok(())
    }
}
