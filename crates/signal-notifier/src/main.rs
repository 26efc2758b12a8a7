mod scan;

use std::io::BufRead;
use std::sync::Arc;

use app_config::AppConfig;
use market_data::{AlphaVantageSource, HistoryRange, MarketDataFetcher, PriceSource, YahooChartSource};
use notification_service::{Alert, NotificationService};

use crate::scan::{notification_config, scan};

fn main() -> anyhow::Result<()> {
    app_config::init_tracing();

    let pause = std::env::args().any(|arg| arg == "--pause")
        || std::env::var("NOTIFIER_PAUSE_ON_EXIT").is_ok_and(|v| v == "1");

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run());

    if pause {
        println!("Press Enter to exit...");
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
    }

    result
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let symbols = config.symbols();

    let secondary: Arc<dyn PriceSource> = Arc::new(AlphaVantageSource::new(
        config.market.alpha_vantage_key.clone(),
        config.market.secondary_market.clone(),
    ));
    let fetcher = MarketDataFetcher::new(Arc::new(YahooChartSource::new()), Some(secondary))
        .with_range(HistoryRange::SixMonths);

    println!("Analyzing {} symbols...", symbols.len());
    let signals = scan(&fetcher, &symbols).await;

    if signals.is_empty() {
        println!("No strong signals today.");
        return Ok(());
    }

    let alert = Alert::digest(signals);
    println!("{}", alert.message);

    let service = NotificationService::new(&notification_config(&config));
    if service.channel_names().is_empty() {
        tracing::warn!("No notification channels configured; alert printed only");
        return Ok(());
    }

    for report in service.send_alert(&alert).await {
        match &report.error {
            None => println!("Sent via {}", report.channel),
            Some(e) => println!("Failed to send via {}: {}", report.channel, e),
        }
    }

    Ok(())
}
