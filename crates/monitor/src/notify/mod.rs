//! Notification Fan-out
//!
//! Sends the cycle outcome to every configured channel. Channels fail
//! independently: a dead Slack webhook must never stop the email or Grafana
//! delivery, so each attempt is recorded per channel and errors are logged,
//! not propagated.

pub mod email;
pub mod grafana;
pub mod slack;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::NotifyConfig;
use crate::metrics;

pub use email::EmailChannel;
pub use grafana::GrafanaChannel;
pub use slack::SlackChannel;

/// A single delivery target for cycle outcomes.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    fn name(&self) -> &'static str;

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: &str) -> anyhow::Result<()>;
}

/// Delivery outcome for one channel in one cycle.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChannelDelivery {
    pub channel: String,
    pub sent: bool,
}

/// The message and its per-channel delivery outcomes for one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub message: String,
    pub sent_at: chrono::DateTime<chrono::Utc>,
    pub deliveries: Vec<ChannelDelivery>,
}

impl NotificationRecord {
    pub fn all_sent(&self) -> bool {
        self.deliveries.iter().all(|d| d.sent)
    }
}

/// Dispatches one message to all configured channels.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
}

impl Notifier {
    /// Build channels from configuration; unconfigured channels are skipped.
    pub fn from_config(config: &NotifyConfig) -> Self {
        let mut channels: Vec<Arc<dyn NotifyChannel>> = vec![];

        if let Some(url) = &config.slack_webhook_url {
            channels.push(Arc::new(SlackChannel::new(url.clone())));
        }
        if let Some(smtp) = &config.smtp {
            channels.push(Arc::new(EmailChannel::new(smtp.clone())));
        }
        if let Some(url) = &config.grafana_webhook_url {
            channels.push(Arc::new(GrafanaChannel::new(url.clone())));
        }

        if channels.is_empty() {
            warn!("No notification channels configured");
        } else {
            info!(channel_count = channels.len(), "Notification channels ready");
        }

        Self { channels }
    }

    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Send the message to every enabled channel concurrently and wait for
    /// all attempts. Failures are logged and recorded, never returned.
    pub async fn notify_all(&self, message: &str) -> NotificationRecord {
        let attempts = self.channels.iter().filter(|c| c.enabled()).map(|channel| {
            let channel = Arc::clone(channel);
            async move {
                let name = channel.name();
                match channel.send(message).await {
                    Ok(()) => {
                        debug!(channel = name, "Notification sent");
                        ChannelDelivery {
                            channel: name.to_string(),
                            sent: true,
                        }
                    }
                    Err(e) => {
                        error!(channel = name, error = %e, "Failed to send notification");
                        metrics::NOTIFY_FAILURES_TOTAL.inc();
                        ChannelDelivery {
                            channel: name.to_string(),
                            sent: false,
                        }
                    }
                }
            }
        });

        NotificationRecord {
            message: message.to_string(),
            sent_at: chrono::Utc::now(),
            deliveries: futures::future::join_all(attempts).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingChannel {
        name: &'static str,
        fail: bool,
        messages: Mutex<Vec<String>>,
    }

    impl RecordingChannel {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail,
                messages: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl NotifyChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn send(&self, message: &str) -> anyhow::Result<()> {
            self.messages.lock().unwrap().push(message.to_string());
            if self.fail {
                anyhow::bail!("simulated channel outage");
            }
            Ok(())
        }
    }

    struct DisabledChannel(AtomicUsize);

    #[async_trait]
    impl NotifyChannel for DisabledChannel {
        fn name(&self) -> &'static str {
            "disabled"
        }

        fn enabled(&self) -> bool {
            false
        }

        async fn send(&self, _message: &str) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn delivers_to_every_channel() {
        let a = RecordingChannel::new("slack", false);
        let b = RecordingChannel::new("email", false);
        let notifier = Notifier::with_channels(vec![a.clone(), b.clone()]);

        let record = notifier.notify_all("issue fixed").await;
        assert!(record.all_sent());
        assert_eq!(a.messages.lock().unwrap().as_slice(), ["issue fixed"]);
        assert_eq!(b.messages.lock().unwrap().as_slice(), ["issue fixed"]);
    }

    #[tokio::test]
    async fn one_failing_channel_does_not_block_the_others() {
        let slack = RecordingChannel::new("slack", true);
        let email = RecordingChannel::new("email", false);
        let grafana = RecordingChannel::new("grafana", false);
        let notifier =
            Notifier::with_channels(vec![slack.clone(), email.clone(), grafana.clone()]);

        let record = notifier.notify_all("partial delivery expected").await;

        assert!(!record.all_sent());
        assert_eq!(record.deliveries.len(), 3);
        let sent: Vec<_> = record
            .deliveries
            .iter()
            .map(|d| (d.channel.as_str(), d.sent))
            .collect();
        assert!(sent.contains(&("slack", false)));
        assert!(sent.contains(&("email", true)));
        assert!(sent.contains(&("grafana", true)));

        // Every channel was attempted despite the Slack failure.
        assert_eq!(email.messages.lock().unwrap().len(), 1);
        assert_eq!(grafana.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disabled_channels_are_skipped() {
        let disabled = Arc::new(DisabledChannel(AtomicUsize::new(0)));
        let notifier = Notifier::with_channels(vec![disabled.clone()]);

        let record = notifier.notify_all("nobody home").await;
        assert!(record.deliveries.is_empty());
        assert_eq!(disabled.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn from_config_skips_unconfigured_channels() {
        let notifier = Notifier::from_config(&NotifyConfig::default());
        assert_eq!(notifier.channel_count(), 0);
    }
}
