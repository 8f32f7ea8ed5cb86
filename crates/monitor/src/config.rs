use serde::{Deserialize, Serialize};

use crate::agent::provider::LlmConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ExecutionMode {
    /// Log the vetted command but never run it.
    #[serde(rename = "dry-run")]
    DryRun,
    /// Run read-only commands; block anything mutating.
    #[serde(rename = "read-only")]
    ReadOnly,
    /// Run vetted commands including mutating ones.
    #[serde(rename = "enforce")]
    Enforce,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::DryRun
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub monitor: MonitorConfig,
    pub llm: LlmConfig,
    pub notify: NotifyConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub namespace: String,
    pub filter_keywords: Vec<String>,
    pub tail_lines: i64,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub mode: ExecutionMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub slack_webhook_url: Option<String>,
    pub grafana_webhook_url: Option<String>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Config {
            server: ServerConfig {
                addr: std::env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            },
            monitor: MonitorConfig {
                namespace: std::env::var("KUBE_NAMESPACE")
                    .unwrap_or_else(|_| "default".to_string()),
                filter_keywords: parse_keywords(
                    &std::env::var("LOG_FILTER_KEYWORDS")
                        .unwrap_or_else(|_| "ERROR,WARN".to_string()),
                ),
                tail_lines: std::env::var("LOG_TAIL_LINES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(100),
                interval_secs: std::env::var("POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            },
            llm: LlmConfig {
                provider: std::env::var("LLM_PROVIDER")
                    .unwrap_or_else(|_| "anthropic".to_string()),
                model: std::env::var("LLM_MODEL")
                    .unwrap_or_else(|_| "claude-3-5-sonnet".to_string()),
                api_key: std::env::var("LLM_API_KEY").ok(),
            },
            notify: NotifyConfig {
                slack_webhook_url: std::env::var("SLACK_WEBHOOK_URL").ok(),
                grafana_webhook_url: std::env::var("GRAFANA_WEBHOOK_URL").ok(),
                smtp: smtp_from_env(),
            },
            execution: ExecutionConfig {
                mode: match std::env::var("EXECUTION_MODE")
                    .unwrap_or_else(|_| "dry-run".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "enforce" => ExecutionMode::Enforce,
                    "read-only" => ExecutionMode::ReadOnly,
                    _ => ExecutionMode::DryRun,
                },
            },
        };

        if config.llm.api_key.is_none() {
            tracing::warn!("LLM_API_KEY is not set. Diagnosis calls may not work properly.");
        }

        if config.monitor.interval_secs == 0 {
            return Err(crate::Error::Config(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if config.monitor.tail_lines <= 0 {
            return Err(crate::Error::Config(
                "LOG_TAIL_LINES must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
            },
            monitor: MonitorConfig {
                namespace: "default".to_string(),
                filter_keywords: vec!["ERROR".to_string(), "WARN".to_string()],
                tail_lines: 100,
                interval_secs: 120,
            },
            llm: LlmConfig::default(),
            notify: NotifyConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

/// SMTP is enabled only when the host and both addresses are present.
fn smtp_from_env() -> Option<SmtpConfig> {
    let host = std::env::var("SMTP_HOST").ok()?;
    let from = std::env::var("EMAIL_FROM").ok()?;
    let to = std::env::var("EMAIL_TO").ok()?;
    Some(SmtpConfig {
        host,
        port: std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587),
        username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
        password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
        from,
        to,
    })
}

fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keywords_splits_and_trims() {
        assert_eq!(
            parse_keywords("ERROR, WARN ,CRITICAL"),
            vec!["ERROR", "WARN", "CRITICAL"]
        );
    }

    #[test]
    fn parse_keywords_drops_empty_entries() {
        assert_eq!(parse_keywords("ERROR,,"), vec!["ERROR"]);
        assert!(parse_keywords("").is_empty());
    }

    #[test]
    fn default_mode_is_dry_run() {
        assert_eq!(ExecutionConfig::default().mode, ExecutionMode::DryRun);
    }
}
