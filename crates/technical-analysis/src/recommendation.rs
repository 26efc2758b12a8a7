use analysis_core::{IndicatorPoint, PriceSeries, Recommendation};

/// RSI at or above this is never oversold
pub const OVERSOLD_RSI: f64 = 35.0;
/// RSI at or below this is never overbought
pub const OVERBOUGHT_RSI: f64 = 65.0;

/// Fixed threshold rule over the latest RSI/MACD readings.
///
/// Oversold with MACD above its signal is bullish, overbought with MACD below
/// its signal is bearish; everything else, including a missing reading, is
/// neutral.
pub fn recommend(rsi: Option<f64>, macd: Option<f64>, macd_signal: Option<f64>) -> Recommendation {
    let (Some(rsi), Some(macd), Some(signal)) = (rsi, macd, macd_signal) else {
        return Recommendation::Neutral;
    };

    if rsi < OVERSOLD_RSI && macd > signal {
        Recommendation::Bullish
    } else if rsi > OVERBOUGHT_RSI && macd < signal {
        Recommendation::Bearish
    } else {
        Recommendation::Neutral
    }
}

pub fn recommend_point(point: &IndicatorPoint) -> Recommendation {
    recommend(point.rsi, point.macd, point.macd_signal)
}

/// Recommendation for the most recent bar of a series
pub fn recommend_latest(series: &PriceSeries) -> Recommendation {
    series
        .latest()
        .map(recommend_point)
        .unwrap_or(Recommendation::Neutral)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversold_with_bullish_crossover_is_bullish() {
        assert_eq!(recommend(Some(30.0), Some(1.2), Some(0.8)), Recommendation::Bullish);
    }

    #[test]
    fn test_overbought_with_bearish_crossover_is_bearish() {
        assert_eq!(recommend(Some(70.0), Some(-0.5), Some(0.1)), Recommendation::Bearish);
    }

    #[test]
    fn test_mid_range_rsi_is_neutral() {
        assert_eq!(recommend(Some(50.0), Some(1.0), Some(0.0)), Recommendation::Neutral);
        assert_eq!(recommend(Some(50.0), Some(-1.0), Some(0.0)), Recommendation::Neutral);
    }

    #[test]
    fn test_rsi_alone_is_not_enough() {
        // Oversold but MACD below signal
        assert_eq!(recommend(Some(20.0), Some(-1.0), Some(0.0)), Recommendation::Neutral);
        // Overbought but MACD above signal
        assert_eq!(recommend(Some(80.0), Some(1.0), Some(0.0)), Recommendation::Neutral);
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(recommend(Some(35.0), Some(1.0), Some(0.0)), Recommendation::Neutral);
        assert_eq!(recommend(Some(65.0), Some(-1.0), Some(0.0)), Recommendation::Neutral);
        assert_eq!(recommend(Some(30.0), Some(0.5), Some(0.5)), Recommendation::Neutral);
    }

    #[test]
    fn test_missing_reading_is_neutral() {
        assert_eq!(recommend(None, Some(1.0), Some(0.0)), Recommendation::Neutral);
        assert_eq!(recommend(Some(20.0), None, Some(0.0)), Recommendation::Neutral);
        assert_eq!(recommend(Some(20.0), Some(1.0), None), Recommendation::Neutral);
    }
}
