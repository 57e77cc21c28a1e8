//! Push notification delivery.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::secrets::{ExposeSecret, SecretString};
use crate::error::{Error, Result};

/// Pushover caps.
pub const MAX_MESSAGE_CHARS: usize = 1024;
pub const MAX_TITLE_CHARS: usize = 250;

/// One outgoing notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub message: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub priority: Option<i32>,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Form fields as Pushover expects them, truncated to its limits.
    /// Empty optional fields are left out.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("message", truncate_chars(&self.message, MAX_MESSAGE_CHARS))];
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            fields.push(("title", truncate_chars(title, MAX_TITLE_CHARS)));
        }
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            fields.push(("url", url.to_string()));
        }
        if let Some(priority) = self.priority.filter(|p| *p != 0) {
            fields.push(("priority", priority.to_string()));
        }
        fields
    }
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message. Fails if the endpoint rejects it.
    async fn send(&self, message: &Message) -> Result<()>;
}

/// Pushover REST API client.
pub struct PushoverNotifier {
    http: reqwest::Client,
    api_url: String,
    token: SecretString,
    user: SecretString,
}

impl PushoverNotifier {
    pub fn new(api_url: impl Into<String>, token: SecretString, user: SecretString) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            token,
            user,
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn send(&self, message: &Message) -> Result<()> {
        let mut form = vec![
            ("token", self.token.expose_secret().to_string()),
            ("user", self.user.expose_secret().to_string()),
        ];
        form.extend(message.form_fields());

        let resp = self.http.post(&self.api_url).form(&form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Delivery(format!("Pushover answered {status}: {body}")));
        }
        debug!(message = %message.message, "pushover accepted");
        Ok(())
    }
}
