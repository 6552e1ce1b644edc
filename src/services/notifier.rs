use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay rejected message with status {0}")]
    Rejected(u16),
}

/// Outbound email
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), NotifyError> {
        // Body may contain a credential; never log it.
        tracing::info!(to, subject, "notification (log only)");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts `{from, to, subject, body}` JSON to a mail relay
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    sender: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = WebhookMessage {
            from: &self.sender,
            to,
            subject,
            body,
        };

        let response = self.client.post(&self.url).json(&message).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        tracing::debug!(to, subject, "notification delivered");
        Ok(())
    }
}

pub fn build_notifier(mail: &MailConfig) -> Arc<dyn Notifier> {
    match &mail.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone(), mail.sender.clone())),
        None => Arc::new(LogNotifier),
    }
}

/// Password-reset email sent when an admin sets a new credential
pub fn password_reset_message(name: &str, new_password: &str) -> (String, String) {
    let subject = "New Password".to_string();
    let body = format!(
        "Dear {}, your password has been reset. Your new password is: {}. \
         Please login and change it after accessing your account.",
        name, new_password
    );
    (subject, body)
}
