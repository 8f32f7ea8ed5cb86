//! Slack incoming-webhook channel.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::NotifyChannel;

pub struct SlackChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    fn payload(message: &str) -> Value {
        json!({ "text": message })
    }
}

#[async_trait]
impl NotifyChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
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
            Err(anyhow::anyhow!("Slack returned {}: {}", status, body))
        }
    }
}
