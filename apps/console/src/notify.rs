//! # Chat Notifications
//!
//! A message is posted to the team chat after every successful save.
//! Delivery is best effort: the save service logs a failure and moves on.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use docket_core::DocumentRecord;

use crate::session::SessionContext;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook rejected the message with status {0}")]
    Rejected(u16),
}

/// Whether the save created the document or changed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    Created,
    Updated,
}

impl DocumentEvent {
    fn verb(&self) -> &'static str {
        match self {
            DocumentEvent::Created => "created",
            DocumentEvent::Updated => "updated",
        }
    }
}

/// `"Quotation ORG/2026/10/QN/004 created for Acme by Priya (priya@example.com)"`
pub fn document_message(event: DocumentEvent, record: &DocumentRecord, session: &SessionContext) -> String {
    format!(
        "{} {} {} for {} by {}",
        record.document_type.label(),
        record.document_number.as_deref().unwrap_or("(unnumbered)"),
        event.verb(),
        if record.client_name.is_empty() { "(no client)" } else { record.client_name.as_str() },
        session.actor(),
    )
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

// =============================================================================
// Webhook
// =============================================================================

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

/// Posts `{"text": ...}` to an incoming-webhook URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(WebhookNotifier {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookMessage { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        debug!(status = status.as_u16(), "Chat notification delivered");
        Ok(())
    }
}

// =============================================================================
// No-op / Recording
// =============================================================================

/// Used when no webhook is configured.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        debug!(%text, "Notifications disabled");
        Ok(())
    }
}

/// Keeps every message in memory. Handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(text.to_string()),
            Err(poisoned) => poisoned.into_inner().push(text.to_string()),
        }
        Ok(())
    }
}
