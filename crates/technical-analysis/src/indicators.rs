use analysis_core::{AnalysisError, Bar, IndicatorPoint, PriceSeries};
use chrono::Utc;
use ta::indicators::{ExponentialMovingAverage, MovingAverageConvergenceDivergence};
use ta::Next;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST_PERIOD: usize = 12;
pub const MACD_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;

/// MACD line and signal line, aligned with the input closes
pub struct MacdResult {
    pub macd_line: Vec<Option<f64>>,
    pub signal_line: Vec<Option<f64>>,
}

/// Relative Strength Index over a flat close sequence, with Wilder smoothing.
///
/// Average gains and losses are exponential averages with alpha `1/period`,
/// seeded from the first (zero) change. A window with no losses reads 100.
///
/// The output has one slot per input close; the first `period` slots are
/// `None` because the first close has no prior change to measure.
pub fn rsi(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, AnalysisError> {
    if period == 0 {
        return Err(AnalysisError::CalculationError("RSI(0): invalid period".to_string()));
    }

    // An EMA over 2n - 1 periods has k = 2 / 2n = 1 / n
    let smoothing = 2 * period - 1;
    let ema = || {
        ExponentialMovingAverage::new(smoothing)
            .map_err(|e| AnalysisError::CalculationError(format!("RSI({}): {:?}", period, e)))
    };
    let mut avg_gain = ema()?;
    let mut avg_loss = ema()?;

    let mut prev: Option<f64> = None;
    Ok(closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let change = prev.map_or(0.0, |p| close - p);
            prev = Some(close);

            let gain = avg_gain.next(change.max(0.0));
            let loss = avg_loss.next((-change).max(0.0));
            let value = if loss == 0.0 { 100.0 } else { 100.0 - 100.0 / (1.0 + gain / loss) };

            (i >= period && value.is_finite()).then_some(value)
        })
        .collect())
}

/// MACD (Moving Average Convergence Divergence) with its signal line.
pub fn macd(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Result<MacdResult, AnalysisError> {
    if fast_period == 0 || slow_period < fast_period || signal_period == 0 {
        return Err(AnalysisError::CalculationError(format!(
            "MACD({}, {}, {}): invalid periods",
            fast_period, slow_period, signal_period
        )));
    }

    let mut indicator = MovingAverageConvergenceDivergence::new(fast_period, slow_period, signal_period)
        .map_err(|e| {
            AnalysisError::CalculationError(format!(
                "MACD({}, {}, {}): {:?}",
                fast_period, slow_period, signal_period, e
            ))
        })?;

    // The slow EMA needs `slow_period` closes and the signal EMA needs
    // `signal_period` MACD values on top of that.
    let macd_warmup = slow_period - 1;
    let signal_warmup = macd_warmup + signal_period - 1;

    let mut macd_line = Vec::with_capacity(closes.len());
    let mut signal_line = Vec::with_capacity(closes.len());

    for (i, &close) in closes.iter().enumerate() {
        let out = indicator.next(close);
        macd_line.push((i >= macd_warmup && out.macd.is_finite()).then_some(out.macd));
        signal_line.push((i >= signal_warmup && out.signal.is_finite()).then_some(out.signal));
    }

    Ok(MacdResult {
        macd_line,
        signal_line,
    })
}

/// Append RSI, MACD and MACD signal columns to a bar series.
pub fn augment(symbol: &str, source: &str, bars: Vec<Bar>) -> Result<PriceSeries, AnalysisError> {
    if bars.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "No bars to analyze for {}",
            symbol
        )));
    }

    // One-dimensional close sequence; the indicators never see the bar shape
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let rsi_values = rsi(&closes, RSI_PERIOD)?;
    let macd_result = macd(&closes, MACD_FAST_PERIOD, MACD_SLOW_PERIOD, MACD_SIGNAL_PERIOD)?;

    let points = bars
        .into_iter()
        .zip(rsi_values)
        .zip(macd_result.macd_line.into_iter().zip(macd_result.signal_line))
        .map(|((bar, rsi), (macd, macd_signal))| IndicatorPoint {
            bar,
            rsi,
            macd,
            macd_signal,
        })
        .collect();

    Ok(PriceSeries {
        symbol: symbol.to_string(),
        source: source.to_string(),
        points,
        fetched_at: Utc::now(),
    })
}
