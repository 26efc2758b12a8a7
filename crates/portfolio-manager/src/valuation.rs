use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::models::*;

pub(crate) const OUT_OF_RANGE: &str = "amount out of range for valuation";

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}

fn percent_of(amount: Decimal, base: Decimal) -> f64 {
    if base.is_zero() {
        return 0.0;
    }
    amount
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(Decimal::from(100)))
        .and_then(|percent| percent.to_f64())
        .unwrap_or(0.0)
}

/// `quantity * price + commission`, or `None` if it does not fit a `Decimal`
pub(crate) fn cost_basis(quantity: f64, buy_price: f64, commission: f64) -> Option<Decimal> {
    to_decimal(quantity)?
        .checked_mul(to_decimal(buy_price)?)?
        .checked_add(to_decimal(commission)?)
}

/// Market value and P&L at `price`, or `None` if either overflows
fn price_at(quantity: f64, price: f64, cost: Decimal) -> Option<(Decimal, Decimal)> {
    let market_value = to_decimal(quantity)?.checked_mul(to_decimal(price)?)?;
    let profit_loss = market_value.checked_sub(cost)?;
    Some((market_value, profit_loss))
}

/// Value a holding against its manual override or the live price.
///
/// `live_price` is `None` when no fetch was attempted. With neither a manual
/// override nor a live price, every price-dependent field stays `None`. The
/// same holds when an amount is too large to value exactly.
pub fn value_holding(holding: Holding, live_price: Option<Result<f64, String>>) -> HoldingValuation {
    let cost = cost_basis(holding.quantity, holding.buy_price, holding.commission);

    let (price_origin, price, mut error) = match (holding.manual_price, live_price) {
        (Some(manual), _) => (PriceOrigin::Manual, Some(manual), None),
        (None, Some(Ok(live))) => (PriceOrigin::Live, Some(live), None),
        (None, Some(Err(e))) => (PriceOrigin::Unavailable, None, Some(e)),
        (None, None) => (
            PriceOrigin::Unavailable,
            None,
            Some("no price available".to_string()),
        ),
    };

    let valued = match (price, cost) {
        (Some(price), Some(cost)) => price_at(holding.quantity, price, cost).map(|v| (cost, v)),
        _ => None,
    };
    if valued.is_none() && error.is_none() {
        error = Some(OUT_OF_RANGE.to_string());
    }

    let (market_value, profit_loss, profit_loss_percent) = match valued {
        Some((cost, (market_value, profit_loss))) => (
            market_value.to_f64(),
            profit_loss.to_f64(),
            Some(percent_of(profit_loss, cost)),
        ),
        None => (None, None, None),
    };

    HoldingValuation {
        holding,
        price_origin,
        current_price: price,
        cost_basis: cost.and_then(|c| c.to_f64()),
        market_value,
        profit_loss,
        profit_loss_percent,
        error,
    }
}

fn add_to_totals(totals: (Decimal, Decimal), valuation: &HoldingValuation) -> Option<(Decimal, Decimal)> {
    let cost = to_decimal(valuation.cost_basis?)?;
    let value = to_decimal(valuation.market_value?)?;
    Some((totals.0.checked_add(cost)?, totals.1.checked_add(value)?))
}

/// Portfolio totals over the holdings that have a resolved price.
pub fn summarize(holdings: Vec<HoldingValuation>) -> PortfolioSummary {
    let mut totals = (Decimal::ZERO, Decimal::ZERO);
    let mut priced_holdings = 0;
    let mut warnings = Vec::new();

    for valuation in &holdings {
        match add_to_totals(totals, valuation) {
            Some(next) => {
                totals = next;
                priced_holdings += 1;
            }
            None => warnings.push(format!(
                "Failed to update price for {}: {}",
                valuation.holding.symbol,
                valuation.error.as_deref().unwrap_or(OUT_OF_RANGE)
            )),
        }
    }

    let (total_cost, total_value) = totals;
    // Both totals are non-negative and fit, so their difference fits too
    let total_profit_loss = total_value - total_cost;

    PortfolioSummary {
        total_holdings: holdings.len(),
        priced_holdings,
        total_cost: total_cost.to_f64().unwrap_or(0.0),
        total_value: total_value.to_f64().unwrap_or(0.0),
        total_profit_loss: total_profit_loss.to_f64().unwrap_or(0.0),
        total_profit_loss_percent: percent_of(total_profit_loss, total_cost),
        holdings,
        warnings,
    }
}
