// Announcement delivery
//
// Best-effort email through the Resend HTTP API. Delivery problems are an
// operations concern, not a ledger concern: every failure path here logs and
// returns, nothing propagates.

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AnnouncementConfig {
    /// Sending is disabled entirely when no key is configured
    pub api_key: Option<String>,
    pub from_email: String,
}

impl AnnouncementConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("RESEND_API_KEY").ok(),
            from_email: std::env::var("ANNOUNCE_FROM_EMAIL")
                .unwrap_or_else(|_| "no-reply@ledger-mirror.dev".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmailRequest {
    to: String,
    from: String,
    subject: String,
    html: String,
}

pub struct EmailAnnouncer {
    config: AnnouncementConfig,
    client: reqwest::Client,
}

impl EmailAnnouncer {
    pub fn new(config: AnnouncementConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub async fn send_announcement(&self, to: &str, title: &str, body: &str) {
        let api_key = match &self.config.api_key {
            Some(key) => key,
            None => {
                info!("announcement suppressed (no api key): {}", title);
                return;
            }
        };

        let request = EmailRequest {
            to: to.to_string(),
            from: self.config.from_email.clone(),
            subject: title.to_string(),
            html: body.to_string(),
        };

        match self
            .client
            .post("https://api.resend.com/emails")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!("announcement sent to {}: {}", to, title);
            }
            Ok(response) => {
                warn!("announcement rejected ({}): {}", response.status(), title);
            }
            Err(error) => {
                warn!("announcement failed: {}", error);
            }
        }
    }
}
