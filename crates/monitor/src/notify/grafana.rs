//! Grafana alert-webhook channel.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::NotifyChannel;

const ALERT_TITLE: &str = "Kubernetes Issue Resolved";
const ALERT_SEVERITY: &str = "critical";

pub struct GrafanaChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl GrafanaChannel {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    fn payload(message: &str) -> Value {
        json!({
            "title": ALERT_TITLE,
            "message": message,
            "severity": ALERT_SEVERITY,
        })
    }
}

#[async_trait]
impl NotifyChannel for GrafanaChannel {
    fn name(&self) -> &'static str {
        "grafana"
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::payload(message))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow::anyhow!("Grafana returned {}: {}", status, body))
        }
    }
}
