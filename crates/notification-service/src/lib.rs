mod smtp;
mod templates;
mod whatsapp;

pub use smtp::SmtpNotifier;
pub use templates::EmailTemplate;
pub use whatsapp::{TwilioWhatsAppNotifier, PLACEHOLDER_ACCOUNT_SID};

use analysis_core::Recommendation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DIGEST_SUBJECT: &str = "Daily stock alerts";

/// A strong indicator signal for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalAlert {
    pub symbol: String,
    pub recommendation: Recommendation,
    pub rsi: f64,
    pub macd: f64,
}

impl SignalAlert {
    /// Plain-text block as it appears in the digest
    pub fn to_block(&self) -> String {
        format!(
            "--- {} ---\n{}\nRSI: {:.2}\nMACD: {:.2}\n",
            self.symbol,
            self.recommendation.to_alert_label(),
            self.rsi,
            self.macd
        )
    }
}

/// A notification alert to be dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub message: String,
    pub signals: Vec<SignalAlert>,
}

impl Alert {
    /// One digest carrying every signal, blocks separated by a blank line.
    pub fn digest(signals: Vec<SignalAlert>) -> Self {
        let message = signals
            .iter()
            .map(SignalAlert::to_block)
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            timestamp: chrono::Utc::now(),
            title: DIGEST_SUBJECT.to_string(),
            message,
            signals,
        }
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("WhatsApp error: {0}")]
    WhatsApp(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for the notification service.
#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_to: Vec<String>,
    pub smtp_tls: SmtpTls,
    pub twilio: Option<TwilioConfig>,
}

#[derive(Debug, Clone, Default)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, with or without the `whatsapp:` prefix
    pub from_number: String,
    pub to_number: String,
}

impl TwilioConfig {
    pub fn is_placeholder(&self) -> bool {
        self.account_sid.trim().is_empty() || self.account_sid == PLACEHOLDER_ACCOUNT_SID
    }
}

/// Delivery outcome per channel
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub channel: String,
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Dispatches alerts to all configured channels.
pub struct NotificationService {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.smtp_host.is_some() && config.smtp_from.is_some() && !config.smtp_to.is_empty() {
            match SmtpNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!(
                        "Email notifications enabled (SMTP -> {} recipients)",
                        config.smtp_to.len()
                    );
                    channels.push(Box::new(notifier));
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP notifier: {}", e);
                }
            }
        }

        match &config.twilio {
            Some(twilio) if twilio.is_placeholder() => {
                tracing::info!("Twilio account SID is a placeholder, WhatsApp disabled");
            }
            Some(twilio) => match TwilioWhatsAppNotifier::new(twilio.clone()) {
                Ok(notifier) => {
                    tracing::info!("WhatsApp notifications enabled");
                    channels.push(Box::new(notifier));
                }
                Err(e) => tracing::warn!("Failed to initialize WhatsApp notifier: {}", e),
            },
            None => {}
        }

        if channels.is_empty() {
            tracing::info!("No notification channels configured (fill the [Email] or [Twilio] sections)");
        }

        Self { channels }
    }

    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Send the alert through every channel. A failing channel is logged and
    /// reported without stopping the others.
    pub async fn send_alert(&self, alert: &Alert) -> Vec<DeliveryReport> {
        let mut reports = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let error = match channel.send(alert).await {
                Ok(()) => {
                    tracing::info!("Sent notification via {}", channel.name());
                    None
                }
                Err(e) => {
                    tracing::warn!("Failed to send notification via {}: {}", channel.name(), e);
                    Some(e.to_string())
                }
            };

            reports.push(DeliveryReport {
                channel: channel.name().to_string(),
                error,
            });
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn signal(symbol: &str, recommendation: Recommendation, rsi: f64, macd: f64) -> SignalAlert {
        SignalAlert {
            symbol: symbol.to_string(),
            recommendation,
            rsi,
            macd,
        }
    }

    #[test]
    fn test_signal_block_format() {
        let block = signal("2222.SR", Recommendation::Bullish, 30.123, 0.4567).to_block();
        assert_eq!(block, "--- 2222.SR ---\n🟢 Strong potential buy signal\nRSI: 30.12\nMACD: 0.46\n");
    }

    #[test]
    fn test_digest_joins_blocks() {
        let alert = Alert::digest(vec![
            signal("2222.SR", Recommendation::Bullish, 30.0, 0.5),
            signal("1120.SR", Recommendation::Bearish, 70.0, -1.25),
        ]);

        assert_eq!(alert.title, DIGEST_SUBJECT);
        assert_eq!(
            alert.message,
            "--- 2222.SR ---\n🟢 Strong potential buy signal\nRSI: 30.00\nMACD: 0.50\n\n\
             --- 1120.SR ---\n🔴 Strong potential sell signal\nRSI: 70.00\nMACD: -1.25\n"
        );
        assert_eq!(alert.signals.len(), 2);
    }

    struct CountingChannel {
        name: &'static str,
        fail: bool,
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl NotificationChannel for CountingChannel {
        async fn send(&self, _alert: &Alert) -> Result<(), NotificationError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotificationError::Smtp("connection refused".to_string()))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_failing_channel_does_not_stop_others() {
        let sent = Arc::new(AtomicUsize::new(0));
        let service = NotificationService::with_channels(vec![
            Box::new(CountingChannel { name: "smtp", fail: true, sent: sent.clone() }),
            Box::new(CountingChannel { name: "whatsapp", fail: false, sent: sent.clone() }),
        ]);

        let alert = Alert::digest(vec![signal("2222.SR", Recommendation::Bullish, 30.0, 0.5)]);
        let reports = service.send_alert(&alert).await;

        assert_eq!(sent.load(Ordering::SeqCst), 2);
        assert_eq!(reports.len(), 2);
        assert!(!reports[0].succeeded());
        assert!(reports[0].error.as_deref().unwrap_or_default().contains("connection refused"));
        assert!(reports[1].succeeded());
    }

    #[test]
    fn test_placeholder_twilio_is_not_registered() {
        let config = NotificationConfig {
            twilio: Some(TwilioConfig {
                account_sid: PLACEHOLDER_ACCOUNT_SID.to_string(),
                auth_token: "your_auth_token".to_string(),
                from_number: "whatsapp:+14155238886".to_string(),
                to_number: "whatsapp:+966500000000".to_string(),
            }),
            ..Default::default()
        };

        let service = NotificationService::new(&config);
        assert!(service.channel_names().is_empty());
    }

    #[test]
    fn test_configured_twilio_is_registered() {
        let config = NotificationConfig {
            twilio: Some(TwilioConfig {
                account_sid: "AC0123456789".to_string(),
                auth_token: "token".to_string(),
                from_number: "+14155238886".to_string(),
                to_number: "+966500000000".to_string(),
            }),
            ..Default::default()
        };

        let service = NotificationService::new(&config);
        assert_eq!(service.channel_names(), vec!["whatsapp"]);
    }
}
