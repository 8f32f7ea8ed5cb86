//! Email channel using SMTP with STARTTLS.

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::NotifyChannel;
use crate::config::SmtpConfig;

const SUBJECT: &str = "Kubernetes Issue Resolved";

pub struct EmailChannel {
    config: SmtpConfig,
}

impl EmailChannel {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NotifyChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .context("Invalid from email address")?;
        let to: Mailbox = self.config.to.parse().context("Invalid to email address")?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())
            .context("Failed to build email message")?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .context("Failed to create SMTP transport")?
                .port(self.config.port)
                .credentials(creds)
                .build();

        mailer
            .send(email)
            .await
            .context("Failed to send email via SMTP")?;

        Ok(())
    }
}
