use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{MessageHandle, Notifier};
use crate::alerts::AlertNotice;
use crate::error::NotifierError;
use crate::presenter::Snapshot;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const COLOR_HEALTHY: u32 = 0x2ecc71;
const COLOR_DOWN: u32 = 0xe74c3c;
const FOOTER: &str = "Pulse • Status Monitor";

#[derive(Deserialize)]
struct CreatedMessage {
    id: String,
}

/// Posts embeds to one channel through the Discord REST API
pub struct DiscordNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    channel_id: String,
}

impl DiscordNotifier {
    pub fn new(token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, token, channel_id)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        token: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            channel_id: channel_id.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/channels/{}/messages", self.api_base, self.channel_id)
    }

    async fn send(&self, request: reqwest::RequestBuilder, body: &Value) -> Result<reqwest::Response, NotifierError> {
        let response = request
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Rejected { status: status.as_u16(), body });
        }
        Ok(response)
    }
}

/// Embed for the live summary message.
pub fn summary_embed(snapshot: &Snapshot) -> Value {
    let mut description = format!("Auto-refresh every {}s", snapshot.refresh_every.as_secs_f64());
    if snapshot.maintenance {
        description.push_str(" • 🛠️ maintenance");
    }
    let color = if snapshot.healthy { COLOR_HEALTHY } else { COLOR_DOWN };

    json!({
        "title": "✨ Pulse • Status Monitor",
        "description": description,
        "fields": [{ "name": "\u{200b}", "value": format!("```\n{}\n```", snapshot.panel()) }],
        "color": color,
        "footer": { "text": FOOTER },
        "timestamp": snapshot.generated_at.to_rfc3339(),
    })
}

/// Embed for a down alert.
pub fn alert_embed(alert: &AlertNotice) -> Value {
    json!({
        "title": format!("🔴 ALERT • {} is DOWN", alert.target.name),
        "description": alert.target.url,
        "fields": [{
            "name": "Consecutive fails",
            "value": alert.consecutive_fails.to_string(),
            "inline": true,
        }],
        "color": COLOR_DOWN,
        "timestamp": alert.down_since.to_rfc3339(),
    })
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_summary(&self, snapshot: &Snapshot) -> Result<MessageHandle, NotifierError> {
        let body = json!({ "embeds": [summary_embed(snapshot)] });
        let response = self.send(self.client.post(self.messages_url()), &body).await?;

        let created: CreatedMessage = response
            .json()
            .await
            .map_err(|e| NotifierError::MalformedResponse(e.to_string()))?;
        Ok(created.id)
    }

    async fn edit_summary(&self, handle: &str, snapshot: &Snapshot) -> Result<(), NotifierError> {
        let url = format!("{}/{handle}", self.messages_url());
        let body = json!({ "embeds": [summary_embed(snapshot)] });
        self.send(self.client.patch(url), &body).await.map(drop)
    }

    async fn post_alert(&self, alert: &AlertNotice) -> Result<(), NotifierError> {
        let body = json!({ "embeds": [alert_embed(alert)] });
        self.send(self.client.post(self.messages_url()), &body).await.map(drop)
    }
}
