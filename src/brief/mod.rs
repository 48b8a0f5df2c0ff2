pub mod gemini;

use crate::github::Commit;
use chrono::{DateTime, Utc};
use regex::Regex;

/// Fixed instruction describing the tone and shape of the generated brief
pub const SYSTEM_INSTRUCTION: &str = "You write professional standup status reports for \
software developers. Summarize the commits you are given as a short status update: group \
the work by repository, use concise bullet points, merge related commits into a single \
bullet, and keep a professional, matter-of-fact tone. Output plain markdown.";

/// A generated standup brief, kept verbatim as returned by the model
#[derive(Debug, Clone)]
pub struct Brief {
    /// Draft text, editable by the user
    pub text: String,
    /// When this draft was generated
    pub generated_at: DateTime<Utc>,
}

impl Brief {
    /// Wrap a model response as the current draft
    pub fn new(text: String) -> Self {
        Self {
            text,
            generated_at: Utc::now(),
        }
    }
}

/// Serialize the selected commits into a flat text prompt
///
/// One block per repository: a `Repository:` header, one line per selected
/// commit message, and a trailing `Refs:` line when the messages mention
/// issues or pull requests. Blocks are joined by a blank line.
pub fn compose_prompt(selection: &[(String, Vec<Commit>)]) -> String {
    let mut blocks = Vec::new();

    for (repo_name, commits) in selection {
        if commits.is_empty() {
            continue;
        }

        let mut block = String::new();
        block.push_str(&format!("Repository: {}\n", repo_name));
        for commit in commits {
            block.push_str(&format!("- {}\n", commit.summary()));
        }

        let mut refs = Vec::new();
        for commit in commits {
            for n in extract_refs(&commit.message) {
                if !refs.contains(&n) {
                    refs.push(n);
                }
            }
        }
        if !refs.is_empty() {
            refs.sort();
            let formatted: Vec<String> = refs.iter().map(|n| format!("#{}", n)).collect();
            block.push_str(&format!("Refs: {}\n", formatted.join(", ")));
        }

        blocks.push(block.trim_end().to_string());
    }

    blocks.join("\n\n")
}

/// Extract issue/PR numbers referenced in a commit message
fn extract_refs(message: &str) -> Vec<u32> {
    let mut numbers = Vec::new();

    // Patterns to match:
    // - #123
    // - GH-123
    // - PR#123
    // - Merge pull request #123
    let patterns = ["#(\\d+)", "GH-(\\d+)", "PR#(\\d+)", "pull request #(\\d+)"];

    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            for cap in re.captures_iter(message) {
                if let Some(num_match) = cap.get(1) {
                    if let Ok(num) = num_match.as_str().parse::<u32>() {
                        if !numbers.contains(&num) {
                            numbers.push(num);
                        }
                    }
                }
            }
        }
    }

    numbers.sort();
    numbers
}
