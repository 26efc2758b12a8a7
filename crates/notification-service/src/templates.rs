use analysis_core::Recommendation;

use crate::Alert;

pub struct EmailTemplate;

impl EmailTemplate {
    /// The digest exactly as printed to the console
    pub fn render_text(alert: &Alert) -> String {
        alert.message.clone()
    }

    pub fn render_html(alert: &Alert) -> String {
        let rows: String = alert
            .signals
            .iter()
            .map(|signal| {
                let color = match signal.recommendation {
                    Recommendation::Bullish => "#22c55e",
                    Recommendation::Bearish => "#ef4444",
                    Recommendation::Neutral => "#64748b",
                };
                format!(
                    r#"<tr><td style="padding:8px 12px;font-weight:600;">{symbol}</td><td style="padding:8px 12px;color:{color};font-weight:600;">{label}</td><td style="padding:8px 12px;">{rsi:.2}</td><td style="padding:8px 12px;">{macd:.2}</td></tr>"#,
                    symbol = escape(&signal.symbol),
                    label = signal.recommendation.to_alert_label(),
                    rsi = signal.rsi,
                    macd = signal.macd,
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1"></head>
<body style="margin:0;padding:0;background:#f1f5f9;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;">
<table width="100%" cellpadding="0" cellspacing="0" style="background:#f1f5f9;padding:32px 0;">
  <tr><td align="center">
    <table width="600" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:8px;overflow:hidden;">
      <tr><td style="background:#1e293b;color:#fff;padding:12px 20px;font-size:18px;font-weight:700;">{title}</td></tr>
      <tr><td>
        <table style="width:100%;border-collapse:collapse;">
          <tr style="background:#f8fafc;color:#94a3b8;"><td style="padding:8px 12px;">Symbol</td><td style="padding:8px 12px;">Signal</td><td style="padding:8px 12px;">RSI</td><td style="padding:8px 12px;">MACD</td></tr>
          {rows}
        </table>
      </td></tr>
      <tr><td style="padding:16px 20px;border-top:1px solid #e2e8f0;">
        <p style="margin:0;color:#94a3b8;font-size:12px;">Sent at {ts} UTC</p>
      </td></tr>
    </table>
  </td></tr>
</table>
</body>
</html>"#,
            title = escape(&alert.title),
            ts = alert.timestamp.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SignalAlert;

    #[test]
    fn test_html_lists_every_signal() {
        let alert = Alert::digest(vec![
            SignalAlert {
                symbol: "2222.SR".to_string(),
                recommendation: Recommendation::Bullish,
                rsi: 31.5,
                macd: 0.25,
            },
            SignalAlert {
                symbol: "1120.SR".to_string(),
                recommendation: Recommendation::Bearish,
                rsi: 71.0,
                macd: -0.4,
            },
        ]);

        let html = EmailTemplate::render_html(&alert);
        assert!(html.contains("Daily stock alerts"));
        assert!(html.contains("2222.SR"));
        assert!(html.contains("31.50"));
        assert!(html.contains("Strong potential sell signal"));
        assert_eq!(EmailTemplate::render_text(&alert), alert.message);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>A&B</b>"), "&lt;b&gt;A&amp;B&lt;/b&gt;");
    }
}
