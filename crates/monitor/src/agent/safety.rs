//! Safety Validation for Suggested Commands
//!
//! Every suggestion the extractor produces came from free-form LLM output,
//! so nothing runs until it passes this allow-list. Tools and verbs are
//! enumerated, shell metacharacters are rejected outright (execution is
//! argv-based, there is no shell to escape for), and mutating verbs are
//! classified so the runner can gate them behind enforce mode.

use regex::Regex;
use std::collections::HashSet;

use super::suggestion::{Suggestion, KNOWN_TOOLS};
use crate::{Error, Result};

/// Safety configuration for command execution
#[derive(Debug, Clone)]
pub struct SafetyConfig {
    /// Tools a suggestion may name
    pub allowed_tools: HashSet<String>,

    /// Read-only verbs, runnable in read-only and enforce modes
    pub read_verbs: HashSet<String>,

    /// Mutating verbs, runnable in enforce mode only
    pub mutating_verbs: HashSet<String>,

    /// Regex patterns that are never allowed, whatever the mode
    pub dangerous_patterns: Vec<Regex>,

    /// Maximum rendered command length
    pub max_command_length: usize,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        let allowed_tools = KNOWN_TOOLS.iter().map(|t| t.to_string()).collect();

        let read_verbs: HashSet<String> = [
            "get", "describe", "logs", "top", "events", "explain", "version",
        ]
        .iter()
        .map(|v| v.to_string())
        .collect();

        let mutating_verbs: HashSet<String> = [
            "rollout", "restart", "delete", "scale", "patch", "apply", "replace", "drain",
            "cordon", "uncordon", "taint", "label", "annotate", "upgrade", "certs",
        ]
        .iter()
        .map(|v| v.to_string())
        .collect();

        let dangerous_patterns = vec![
            Regex::new(r"delete\s+namespace").unwrap(),
            Regex::new(r"delete\s+.*--all\b").unwrap(),
            Regex::new(r"--force\b").unwrap(),
            Regex::new(r"\breset\b").unwrap(),
            Regex::new(r"-f\s+/").unwrap(),
        ];

        Self {
            allowed_tools,
            read_verbs,
            mutating_verbs,
            dangerous_patterns,
            max_command_length: 1000,
        }
    }
}

/// Validator applied between extraction and execution
#[derive(Debug, Clone)]
pub struct SafetyValidator {
    config: SafetyConfig,
}

// Tokens containing any of these cannot reach the executor. Execution never
// goes through a shell, so a legitimate command has no use for them.
const SHELL_METACHARACTERS: [char; 14] = [
    ';', '&', '|', '$', '`', '>', '<', '(', ')', '{', '}', '\\', '"', '\'',
];

impl SafetyValidator {
    pub fn new(config: SafetyConfig) -> Self {
        Self { config }
    }

    /// Check whether a suggestion mutates cluster state and therefore needs
    /// enforce mode.
    pub fn requires_enforce(&self, suggestion: &Suggestion) -> bool {
        suggestion
            .args
            .first()
            .map(|verb| self.config.mutating_verbs.contains(verb))
            .unwrap_or(false)
    }

    /// Validate a suggestion against the allow-list.
    pub fn validate(&self, suggestion: &Suggestion) -> Result<()> {
        if !self.config.allowed_tools.contains(&suggestion.tool) {
            return Err(Error::Validation(format!(
                "Tool '{}' is not allowed",
                suggestion.tool
            )));
        }

        let Some(verb) = suggestion.args.first() else {
            return Err(Error::Validation("Command has no verb".to_string()));
        };

        if !self.config.read_verbs.contains(verb) && !self.config.mutating_verbs.contains(verb) {
            return Err(Error::Validation(format!("Verb '{}' is not allowed", verb)));
        }

        for arg in &suggestion.args {
            if arg.contains(&SHELL_METACHARACTERS[..]) {
                return Err(Error::Validation(format!(
                    "Argument '{}' contains shell metacharacters",
                    arg
                )));
            }
        }

        let command = suggestion.command_line();
        if command.len() > self.config.max_command_length {
            return Err(Error::Validation(format!(
                "Command exceeds maximum length of {} characters",
                self.config.max_command_length
            )));
        }

        for pattern in &self.config.dangerous_patterns {
            if pattern.is_match(&command) {
                return Err(Error::Validation(format!(
                    "Command matches dangerous pattern: {}",
                    pattern.as_str()
                )));
            }
        }

        Ok(())
    }
}

impl Default for SafetyValidator {
    fn default() -> Self {
        Self::new(SafetyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(tool: &str, args: &[&str]) -> Suggestion {
        Suggestion {
            tool: tool.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn read_only_command_passes() {
        let validator = SafetyValidator::default();
        let s = suggestion("kubectl", &["get", "pods", "-n", "x"]);
        assert!(validator.validate(&s).is_ok());
        assert!(!validator.requires_enforce(&s));
    }

    #[test]
    fn mutating_command_passes_but_requires_enforce() {
        let validator = SafetyValidator::default();
        let s = suggestion("kubectl", &["rollout", "restart", "deployment/pod-a"]);
        assert!(validator.validate(&s).is_ok());
        assert!(validator.requires_enforce(&s));
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let validator = SafetyValidator::default();
        let s = suggestion("rm", &["-rf", "/"]);
        assert!(validator.validate(&s).is_err());
    }

    #[test]
    fn unknown_verb_is_rejected() {
        let validator = SafetyValidator::default();
        let s = suggestion("kubectl", &["exec", "pod-a", "--", "sh"]);
        assert!(validator.validate(&s).is_err());
    }

    #[test]
    fn shell_metacharacters_are_rejected() {
        let validator = SafetyValidator::default();
        for bad in ["pods;rm", "pods|tee", "$(whoami)", "`id`", "a&&b"] {
            let s = suggestion("kubectl", &["get", bad]);
            assert!(validator.validate(&s).is_err(), "accepted {}", bad);
        }
    }

    #[test]
    fn dangerous_patterns_are_rejected() {
        let validator = SafetyValidator::default();
        let cases = [
            suggestion("kubectl", &["delete", "namespace", "prod"]),
            suggestion("kubectl", &["delete", "pods", "--all"]),
            suggestion("kubectl", &["delete", "pod", "x", "--force"]),
            suggestion("kubeadm", &["reset"]),
        ];
        for s in cases {
            assert!(validator.validate(&s).is_err(), "accepted {:?}", s);
        }
    }

    #[test]
    fn overlong_command_is_rejected() {
        let validator = SafetyValidator::default();
        let long_arg = "a".repeat(2000);
        let s = suggestion("kubectl", &["get", &long_arg]);
        assert!(validator.validate(&s).is_err());
    }

    #[test]
    fn empty_args_are_rejected() {
        let validator = SafetyValidator::default();
        let s = suggestion("kubectl", &[]);
        assert!(validator.validate(&s).is_err());
        assert!(!validator.requires_enforce(&s));
    }
}
