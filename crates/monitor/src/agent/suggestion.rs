//! Command Suggestion Extraction
//!
//! Pulls an actionable command out of a free-text diagnosis. A fenced json
//! action block (which the diagnosis preamble asks the model to emit) is
//! preferred; scanning the prose for a known tool name is the fallback.
//! Extraction never executes anything - every suggestion still has to pass
//! the safety validator before it reaches the executor.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Tools a diagnosis may legitimately suggest. Matching is case-sensitive
/// and the list order decides which tool wins when several appear.
pub const KNOWN_TOOLS: [&str; 3] = ["kubectl", "kubeadm", "calicoctl"];

/// Words that end a command when it trails off into prose
/// ("... deployment/foo to fix this").
const STOP_WORDS: [&str; 12] = [
    "to", "and", "or", "then", "which", "so", "if", "that", "this", "in", "on", "for",
];

/// An extracted (tool, argument vector) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub tool: String,
    pub args: Vec<String>,
}

impl Suggestion {
    pub fn command_line(&self) -> String {
        format!("{} {}", self.tool, self.args.join(" "))
    }
}

#[derive(Debug, Deserialize)]
struct ActionBlock {
    tool: String,
    #[serde(default)]
    args: Vec<String>,
}

/// Extract a command suggestion from a diagnosis, if there is one.
///
/// Returning `None` is the normal "no actionable fix" outcome, not an error.
pub fn extract(diagnosis: &str) -> Option<Suggestion> {
    extract_action_block(diagnosis).or_else(|| extract_free_text(diagnosis))
}

/// Parse the first well-formed fenced json action block naming a known tool.
fn extract_action_block(text: &str) -> Option<Suggestion> {
    let fence = Regex::new(r"(?s)```json\s*(.*?)```").unwrap();
    for cap in fence.captures_iter(text) {
        let Ok(block) = serde_json::from_str::<ActionBlock>(cap[1].trim()) else {
            continue;
        };
        if !KNOWN_TOOLS.contains(&block.tool.as_str()) || block.args.is_empty() {
            continue;
        }
        return Some(Suggestion {
            tool: block.tool,
            args: block.args,
        });
    }
    None
}

/// Scan the prose for `<tool> <rest-of-line>`, first match per tool in
/// KNOWN_TOOLS order, case-sensitive. The rest of the line is tokenized and
/// cut where it stops looking like a command.
fn extract_free_text(text: &str) -> Option<Suggestion> {
    for tool in KNOWN_TOOLS {
        let pattern = Regex::new(&format!(r"{} (.+)", tool)).unwrap();
        if let Some(cap) = pattern.captures(text) {
            let args = trim_to_command(&cap[1]);
            if !args.is_empty() {
                return Some(Suggestion {
                    tool: tool.to_string(),
                    args,
                });
            }
        }
    }
    None
}

fn trim_to_command(rest: &str) -> Vec<String> {
    let mut args = Vec::new();
    for token in rest.split_whitespace() {
        let cleaned = token
            .trim_matches('`')
            .trim_end_matches(&['.', ',', '!', '?', ':'][..]);
        if cleaned.is_empty() || STOP_WORDS.contains(&cleaned) {
            break;
        }
        args.push(cleaned.to_string());
    }
    args
}
