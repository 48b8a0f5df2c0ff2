mod auth;
mod brief;
mod cli;
mod config;
mod error;
mod github;
mod orchestrator;
mod state;

use auth::{AccountStore, GITHUB_PROVIDER};
use brief::gemini::GeminiClient;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::{GitBriefError, Result};
use github::client::GitHubClient;
use github::{RecencyWindow, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use orchestrator::{Dashboard, ToggleReport};
use state::SelectionCache;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle subcommands
    if let Some(command) = &cli.command {
        return handle_command(command, &cli);
    }

    // Load or create config
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load_or_create_default()?
    };

    // Apply CLI overrides to config
    let config = apply_cli_overrides(config, &cli);

    // Verify API key is available (from env or config)
    if let Err(e) = config.get_api_key() {
        eprintln!("Error: {}", e);
        eprintln!("\nPlease either:");
        eprintln!("  1. Set the GEMINI_API_KEY environment variable");
        eprintln!(
            "  2. Add gemini_api_key to your config file at: {}",
            Config::default_config_path()?.display()
        );
        std::process::exit(1);
    }

    // Run the dashboard
    run_dashboard(config, &cli).await
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gitbrief={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run_dashboard(config: Config, cli: &Cli) -> Result<()> {
    println!("gitbrief v{}", env!("CARGO_PKG_VERSION"));
    println!("Your standup brief, drafted from your GitHub activity\n");

    let token = resolve_github_token(cli, &config)?;
    let github = GitHubClient::new(token)?;
    let gemini = GeminiClient::new(config.get_api_key()?)?.with_model(config.model.clone());

    let mut dashboard = Dashboard::new(github, gemini, config.default_days, config.show_all);

    let spinner = make_spinner("Loading repositories...");
    match dashboard.load().await {
        Ok(()) => {
            spinner.finish_with_message(format!(
                "Loaded {} repositories for {}",
                dashboard.repos().total(),
                dashboard.user_login()
            ));
        }
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    }

    render(&dashboard);
    print_help();

    // Read-eval loop over the dashboard
    loop {
        let line = prompt_line("gitbrief> ")?;
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        let args: Vec<&str> = parts.collect();

        match command {
            "" => continue,
            "l" | "list" => render(&dashboard),
            "t" | "toggle" => {
                let Some(full_name) = repo_by_index(&dashboard, args.first()) else {
                    eprintln!("Usage: toggle <repo number>");
                    continue;
                };
                toggle_repo(&mut dashboard, &full_name).await;
            }
            "c" | "commits" => {
                let Some(full_name) = repo_by_index(&dashboard, args.first()) else {
                    eprintln!("Usage: commits <repo number>");
                    continue;
                };
                show_commits(&dashboard, &full_name);
            }
            "p" | "pick" => {
                let Some(full_name) = repo_by_index(&dashboard, args.first()) else {
                    eprintln!("Usage: pick <repo number> <commit number>");
                    continue;
                };
                pick_commit(&mut dashboard, &full_name, args.get(1));
            }
            "w" | "window" => {
                let days = args.first().and_then(|a| a.parse::<u32>().ok());
                match days {
                    Some(days) if RecencyWindow::CHOICES.contains(&days) => {
                        let spinner = make_spinner("Reloading repositories...");
                        let result = dashboard.set_window(days).await;
                        spinner.finish_and_clear();
                        match result {
                            Ok(()) => render(&dashboard),
                            Err(e) => eprintln!("Reload failed: {}", e),
                        }
                    }
                    _ => eprintln!("Usage: window <{:?}>", RecencyWindow::CHOICES),
                }
            }
            "a" | "all" => {
                let show_all = !dashboard.show_all();
                let spinner = make_spinner("Reloading repositories...");
                let result = dashboard.set_show_all(show_all).await;
                spinner.finish_and_clear();
                match result {
                    Ok(()) => render(&dashboard),
                    Err(e) => eprintln!("Reload failed: {}", e),
                }
            }
            "g" | "generate" => generate_brief(&mut dashboard).await,
            "s" | "show" => show_draft(&dashboard),
            "y" | "copy" => copy_draft(&dashboard),
            "h" | "help" => print_help(),
            "q" | "quit" | "exit" => break,
            other => eprintln!("Unknown command: {} (try 'help')", other),
        }
    }

    Ok(())
}

/// Resolve the GitHub token: CLI/env override, then config, then the account store
fn resolve_github_token(cli: &Cli, config: &Config) -> Result<String> {
    if let Some(ref token) = cli.token {
        return Ok(token.clone());
    }

    if let Some(ref token) = config.github_token {
        if !token.is_empty() {
            return Ok(token.clone());
        }
    }

    let store = AccountStore::open_default()?;
    match store.find_access_token(&cli.user, GITHUB_PROVIDER) {
        Ok(token) => Ok(token),
        Err(e @ GitBriefError::MissingCredential { .. }) => {
            eprintln!("No GitHub credential for user '{}'.", cli.user);
            eprintln!("Run: gitbrief login --token <token>");
            Err(e)
        }
        Err(e) => Err(e),
    }
}

async fn toggle_repo(dashboard: &mut Dashboard, full_name: &str) {
    let fetching = !dashboard.state().is_fetched(full_name);
    let spinner = if fetching {
        Some(make_spinner(&format!("Fetching commits for {}...", full_name)))
    } else {
        None
    };

    let report = dashboard.toggle_repo(full_name).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match report {
        ToggleReport::Fetched(0) => {
            println!("No commits by you in {} for this window.", full_name)
        }
        ToggleReport::Fetched(count) => {
            println!("Fetched {} commits from {}, all selected.", count, full_name)
        }
        ToggleReport::FetchFailed => {
            eprintln!("Could not fetch commits for {} - toggle again to retry.", full_name)
        }
        ToggleReport::Discarded => {
            println!("Window changed while fetching {}, result dropped.", full_name)
        }
        ToggleReport::SelectedAll(count) => {
            println!("Selected all {} commits in {}.", count, full_name)
        }
        ToggleReport::Cleared => println!("Cleared selection in {}.", full_name),
    }
}

fn pick_commit(dashboard: &mut Dashboard, full_name: &str, index: Option<&&str>) {
    let index = index.and_then(|a| a.parse::<usize>().ok());
    let sha = index.and_then(|i| {
        dashboard
            .state()
            .commits_for(full_name)
            .and_then(|commits| commits.get(i.checked_sub(1)?))
            .map(|c| c.sha.clone())
    });

    match sha {
        Some(sha) => {
            dashboard.toggle_commit(full_name, &sha);
            show_commits(dashboard, full_name);
        }
        None => eprintln!("Usage: pick <repo number> <commit number> (fetch the repo first)"),
    }
}

async fn generate_brief(dashboard: &mut Dashboard) {
    let spinner = make_spinner("Generating brief...");
    let result = dashboard.generate_brief().await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => show_draft(dashboard),
        Err(GitBriefError::EmptySelection) => {
            eprintln!("Nothing selected - toggle a repository or commit first.")
        }
        Err(e) => {
            eprintln!("Brief generation failed: {}", e);
            if dashboard.draft().is_some() {
                eprintln!("The previous draft is unchanged.");
            }
        }
    }
}

fn show_draft(dashboard: &Dashboard) {
    match dashboard.draft() {
        Some(draft) => {
            println!("\n{}", "=".repeat(60));
            println!("{}", draft.text.trim_end());
            println!("{}", "=".repeat(60));
            println!(
                "Generated at: {} (type 'copy' to copy)\n",
                draft.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => println!("No draft yet - select commits and type 'generate'."),
    }
}

fn copy_draft(dashboard: &Dashboard) {
    let Some(draft) = dashboard.draft() else {
        println!("No draft yet - select commits and type 'generate'.");
        return;
    };

    match copy_to_clipboard(&draft.text) {
        Ok(()) => println!("Copied brief to clipboard."),
        Err(e) => eprintln!("Copy failed: {}", e),
    }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| GitBriefError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| GitBriefError::Clipboard(e.to_string()))?;
    Ok(())
}

fn render(dashboard: &Dashboard) {
    let state = dashboard.state();
    println!(
        "\nSigned in as {} - window: last {} day(s)",
        dashboard.user_login(),
        state.window_days()
    );

    let repos = dashboard.repos();
    let active_workspace: Vec<&Repository> = repos.active_workspace.iter().collect();
    let active_personal: Vec<&Repository> = repos.active_personal.iter().collect();

    let mut index = 1;
    index = render_section("Active Workspaces", &active_workspace, state, index);
    index = render_section("Active Personal", &active_personal, state, index);

    if dashboard.show_all() {
        index = render_section("Other Workspaces", &repos.inactive_workspace(), state, index);
        render_section("Other Personal", &repos.inactive_personal(), state, index);
    } else {
        println!(
            "\n(type 'all' to show all {} repositories)",
            repos.total()
        );
    }

    println!(
        "\n{} commits selected from {} repos.",
        state.total_selected(),
        state.selected_repo_count()
    );
}

fn render_section(
    title: &str,
    repos: &[&Repository],
    state: &SelectionCache,
    mut index: usize,
) -> usize {
    println!("\n{}", title);
    if repos.is_empty() {
        println!("  (none)");
        return index;
    }

    for repo in repos {
        let marker = if state.is_fetching(&repo.full_name) {
            "...".to_string()
        } else if state.is_fetched(&repo.full_name) {
            let total = state
                .commits_for(&repo.full_name)
                .map(|c| c.len())
                .unwrap_or(0);
            format!("{}/{}", state.selected_count(&repo.full_name), total)
        } else {
            "-".to_string()
        };

        let pushed = repo
            .pushed_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:>2}. [{}] {} ({}, pushed {})",
            index, marker, repo.full_name, repo.owner_login, pushed
        );
        index += 1;
    }

    index
}

fn show_commits(dashboard: &Dashboard, full_name: &str) {
    let state = dashboard.state();
    match state.commits_for(full_name) {
        Some(commits) if !commits.is_empty() => {
            println!("\nCommits in {}:", full_name);
            for (i, commit) in commits.iter().enumerate() {
                let mark = if state.is_selected(full_name, &commit.sha) {
                    "x"
                } else {
                    " "
                };
                println!(
                    "  {:>2}. [{}] {} {} {}",
                    i + 1,
                    mark,
                    commit.short_sha(),
                    commit.date.format("%Y-%m-%d"),
                    commit.summary()
                );
            }
        }
        Some(_) => println!("No commits by you in {} for this window.", full_name),
        None => println!("{} is not fetched yet - use 'toggle' first.", full_name),
    }
}

/// Resolve a 1-based repository index from the rendered lists
fn repo_by_index(dashboard: &Dashboard, arg: Option<&&str>) -> Option<String> {
    let index = arg.and_then(|a| a.parse::<usize>().ok())?;
    dashboard
        .visible_repos()
        .get(index.checked_sub(1)?)
        .map(|r| r.full_name.clone())
}

fn print_help() {
    println!("\nCommands:");
    println!("  list                 redraw the dashboard");
    println!("  toggle <n>           toggle repository <n> (first toggle fetches your commits)");
    println!("  commits <n>          list the fetched commits of repository <n>");
    println!("  pick <n> <m>         toggle commit <m> of repository <n>");
    println!("  window <1|3|7>       change the recency window (resets the selection)");
    println!("  all                  show or hide inactive repositories");
    println!("  generate             generate the brief from the current selection");
    println!("  show                 print the current draft");
    println!("  copy                 copy the draft to the clipboard");
    println!("  quit                 exit");
}

fn handle_command(command: &Commands, cli: &Cli) -> Result<()> {
    match command {
        Commands::Init { force } => {
            let config_path = Config::default_config_path()?;

            if config_path.exists() && !force {
                eprintln!("Config file already exists at: {}", config_path.display());
                eprintln!("Use --force to overwrite");
                std::process::exit(1);
            }

            Config::create_default()?;
            println!("Created config file at: {}", config_path.display());
            println!("\nNext steps:");
            println!("  1. Set GEMINI_API_KEY (or add gemini_api_key to the config file)");
            println!("  2. Store a GitHub token: gitbrief login --token <token>");
        }
        Commands::Config => {
            let config = Config::load_or_create_default()?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("Current configuration:\n");
            println!("{}", toml_str);
        }
        Commands::Login { token } => {
            let store = AccountStore::open_default()?;
            store.link(&cli.user, GITHUB_PROVIDER, token)?;
            println!("Stored GitHub credential for user '{}'.", cli.user);
        }
        Commands::Logout => {
            let store = AccountStore::open_default()?;
            let removed = store.unlink(&cli.user, GITHUB_PROVIDER)?;
            if removed == 0 {
                println!("No stored GitHub credentials for user '{}'.", cli.user);
            } else {
                println!(
                    "Removed {} GitHub credential(s) for user '{}'.",
                    removed, cli.user
                );
            }
        }
    }
    Ok(())
}

/// Prompt for a line of input
fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn make_spinner(msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    // Override window if provided
    if let Some(days) = cli.days {
        config.default_days = days;
    }

    // Override show-all
    if cli.show_all {
        config.show_all = true;
    }

    config
}
