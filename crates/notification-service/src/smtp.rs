use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::templates::EmailTemplate;
use crate::{Alert, NotificationChannel, NotificationConfig, NotificationError, SmtpTls};

/// Sender and recipients of the digest email
#[derive(Debug)]
struct Addresses {
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn addresses(config: &NotificationConfig) -> Result<Addresses, NotificationError> {
    let from = config
        .smtp_from
        .as_deref()
        .ok_or_else(|| NotificationError::Config("email_from not set".into()))?
        .parse()
        .map_err(|e| NotificationError::Config(format!("Invalid email_from: {}", e)))?;

    let mut to = Vec::with_capacity(config.smtp_to.len());
    for addr in &config.smtp_to {
        match addr.parse::<Mailbox>() {
            Ok(mailbox) => to.push(mailbox),
            Err(e) => tracing::warn!("Skipping email_to address '{}': {}", addr, e),
        }
    }

    if to.is_empty() {
        return Err(NotificationError::Config("No valid email_to addresses".into()));
    }

    Ok(Addresses { from, to })
}

fn transport(config: &NotificationConfig, host: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
    let builder = match config.smtp_tls {
        SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
        SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
        SmtpTls::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
    }
    .map_err(|e| NotificationError::Smtp(format!("SMTP transport error for {}: {}", host, e)))?
    .port(config.smtp_port);

    let builder = match (&config.smtp_username, &config.smtp_password) {
        (Some(user), Some(pass)) => builder.credentials(Credentials::new(user.clone(), pass.clone())),
        _ => builder,
    };

    Ok(builder.build())
}

/// One message to every recipient, plain text with an HTML alternative
fn digest_email(addresses: &Addresses, alert: &Alert) -> Result<Message, NotificationError> {
    let builder = addresses
        .to
        .iter()
        .cloned()
        .fold(Message::builder().from(addresses.from.clone()), |b, to| b.to(to));

    builder
        .subject(&alert.title)
        .multipart(MultiPart::alternative_plain_html(
            EmailTemplate::render_text(alert),
            EmailTemplate::render_html(alert),
        ))
        .map_err(|e| NotificationError::Smtp(format!("Failed to build email: {}", e)))
}

/// Email channel for the `[Email]` settings
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    addresses: Addresses,
}

impl SmtpNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotificationError::Config("smtp_server not set".into()))?;
        let addresses = addresses(config)?;

        Ok(Self {
            transport: transport(config, host)?,
            addresses,
        })
    }
}

#[async_trait]
impl NotificationChannel for SmtpNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
        let email = digest_email(&self.addresses, alert)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotificationError::Smtp(format!("Failed to send email: {}", e)))?;

        tracing::info!("Digest emailed to {} recipient(s)", self.addresses.to.len());
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SignalAlert;
    use analysis_core::Recommendation;

    fn config(to: &[&str]) -> NotificationConfig {
        NotificationConfig {
            smtp_from: Some("alerts@example.com".to_string()),
            smtp_to: to.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_recipients_are_skipped() {
        let addresses = addresses(&config(&["me@example.com", "not an address"])).unwrap();
        assert_eq!(addresses.to.len(), 1);
    }

    #[test]
    fn test_no_valid_recipient_is_a_config_error() {
        let err = addresses(&config(&["nope"])).unwrap_err();
        assert!(matches!(err, NotificationError::Config(_)));

        let mut missing_from = config(&["me@example.com"]);
        missing_from.smtp_from = None;
        assert!(matches!(addresses(&missing_from), Err(NotificationError::Config(_))));
    }

    #[test]
    fn test_digest_is_one_message_to_all_recipients() {
        let addresses = addresses(&config(&["me@example.com", "partner@example.com"])).unwrap();
        let alert = Alert::digest(vec![SignalAlert {
            symbol: "2222.SR".to_string(),
            recommendation: Recommendation::Bullish,
            rsi: 28.4,
            macd: 0.31,
        }]);

        let email = digest_email(&addresses, &alert).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("Subject: Daily stock alerts"));
        assert!(raw.contains("me@example.com"));
        assert!(raw.contains("partner@example.com"));
        assert!(raw.contains("multipart/alternative"));
    }
}
