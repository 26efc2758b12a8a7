use async_trait::async_trait;
use std::time::Duration;

use crate::{Alert, NotificationChannel, NotificationError, TwilioConfig};

const TWILIO_API_URL: &str = "https://api.twilio.com/2010-04-01";

/// Account SID shipped in the sample config; treated as "not configured"
pub const PLACEHOLDER_ACCOUNT_SID: &str = "your_twilio_sid";

/// WhatsApp messages through the Twilio Messages API.
pub struct TwilioWhatsAppNotifier {
    config: TwilioConfig,
    client: reqwest::Client,
    base_url: String,
}

impl TwilioWhatsAppNotifier {
    pub fn new(config: TwilioConfig) -> Result<Self, NotificationError> {
        Self::with_base_url(config, TWILIO_API_URL)
    }

    pub fn with_base_url(config: TwilioConfig, base_url: impl Into<String>) -> Result<Self, NotificationError> {
        if config.is_placeholder() {
            return Err(NotificationError::Config("Twilio account_sid is not configured".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| NotificationError::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            config,
            client,
            base_url: base_url.into(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.base_url, self.config.account_sid)
    }
}

/// Twilio routes to WhatsApp only for `whatsapp:`-prefixed addresses
pub(crate) fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

#[async_trait]
impl NotificationChannel for TwilioWhatsAppNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
        let form = [
            ("From", whatsapp_address(&self.config.from_number)),
            ("To", whatsapp_address(&self.config.to_number)),
            ("Body", alert.message.clone()),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| NotificationError::WhatsApp(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            return Err(NotificationError::WhatsApp(format!("HTTP {}: {}", status, detail)));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "whatsapp"
    }
}
