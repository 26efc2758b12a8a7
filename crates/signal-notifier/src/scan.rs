use analysis_core::PriceSeries;
use app_config::AppConfig;
use market_data::MarketDataFetcher;
use notification_service::{NotificationConfig, SignalAlert, SmtpTls, TwilioConfig};
use technical_analysis::recommend_latest;

/// A strong signal for the latest bar of `series`, if any
pub fn strong_signal(series: &PriceSeries) -> Option<SignalAlert> {
    let recommendation = recommend_latest(series);
    if !recommendation.is_strong() {
        return None;
    }

    let latest = series.latest()?;
    Some(SignalAlert {
        symbol: series.symbol.clone(),
        recommendation,
        rsi: latest.rsi?,
        macd: latest.macd?,
    })
}

/// Evaluate every symbol in order. Fetch failures are logged and skipped.
pub async fn scan(fetcher: &MarketDataFetcher, symbols: &[String]) -> Vec<SignalAlert> {
    let mut signals = Vec::new();

    for symbol in symbols {
        match fetcher.get_stock_data(symbol).await {
            Ok(series) => {
                if let Some(signal) = strong_signal(&series) {
                    tracing::info!("{}: {}", symbol, signal.recommendation.to_alert_label());
                    signals.push(signal);
                } else {
                    tracing::debug!("{}: no signal", symbol);
                }
            }
            Err(e) => tracing::warn!("Error while analyzing {}: {}", symbol, e),
        }
    }

    signals
}

pub fn notification_config(config: &AppConfig) -> NotificationConfig {
    let mut notification = NotificationConfig::default();

    if let Some(email) = &config.email {
        notification.smtp_host = Some(email.smtp_server.clone());
        notification.smtp_port = email.smtp_port;
        notification.smtp_username = Some(email.email_from.clone());
        notification.smtp_password = email.email_password.clone();
        notification.smtp_from = Some(email.email_from.clone());
        notification.smtp_to = email.email_to.clone();
        // Port 465 is implicit TLS; anything else upgrades with STARTTLS
        notification.smtp_tls = if email.smtp_port == 465 { SmtpTls::Tls } else { SmtpTls::StartTls };
    }

    notification.twilio = config.twilio.as_ref().map(|twilio| TwilioConfig {
        account_sid: twilio.account_sid.clone(),
        auth_token: twilio.auth_token.clone(),
        from_number: twilio.twilio_number.clone(),
        to_number: twilio.your_whatsapp.clone(),
    });

    notification
}
