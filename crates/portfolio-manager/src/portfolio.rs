use crate::db::PortfolioDb;
use crate::error::PortfolioError;
use crate::models::*;
use chrono::{Local, NaiveDate};

const SELECT_HOLDING: &str =
    "SELECT id, symbol, quantity, buy_price, commission, buy_date, manual_price FROM portfolio";

pub struct PortfolioManager {
    db: PortfolioDb,
}

impl PortfolioManager {
    pub fn new(db: PortfolioDb) -> Self {
        Self { db }
    }

    /// Record a buy transaction
    pub async fn add_transaction(&self, transaction: NewTransaction) -> Result<i64, PortfolioError> {
        let validated = validate(transaction)?;

        let result = sqlx::query(
            r#"
            INSERT INTO portfolio (symbol, quantity, buy_price, commission, buy_date)
            VALUES (?, ?, ?, ?, ?)
            "#
        )
        .bind(&validated.symbol)
        .bind(validated.quantity)
        .bind(validated.buy_price)
        .bind(validated.commission)
        .bind(&validated.buy_date)
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(
            "Added {} x {} @ {:.2} (commission {:.2}) as holding {}",
            validated.quantity, validated.symbol, validated.buy_price, validated.commission, id
        );

        Ok(id)
    }

    /// Get all holdings in insertion order
    pub async fn get_portfolio(&self) -> Result<Vec<Holding>, PortfolioError> {
        let holdings = sqlx::query_as::<_, Holding>(&format!("{} ORDER BY id", SELECT_HOLDING))
            .fetch_all(self.db.pool())
            .await?;

        Ok(holdings)
    }

    /// Get a holding by ID
    pub async fn get_holding(&self, id: i64) -> Result<Option<Holding>, PortfolioError> {
        let holding = sqlx::query_as::<_, Holding>(&format!("{} WHERE id = ?", SELECT_HOLDING))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(holding)
    }

    /// Set or clear the manual price override of a holding
    pub async fn set_manual_price(&self, id: i64, manual_price: Option<f64>) -> Result<(), PortfolioError> {
        if let Some(price) = manual_price {
            if !price.is_finite() || price <= 0.0 {
                return Err(PortfolioError::Validation(format!(
                    "manual price must be positive, got {}",
                    price
                )));
            }
        }

        let result = sqlx::query("UPDATE portfolio SET manual_price = ? WHERE id = ?")
            .bind(manual_price)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortfolioError::NotFound(id));
        }

        Ok(())
    }
}

struct ValidTransaction {
    symbol: String,
    quantity: f64,
    buy_price: f64,
    commission: f64,
    buy_date: String,
}

fn validate(transaction: NewTransaction) -> Result<ValidTransaction, PortfolioError> {
    let symbol = transaction.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(PortfolioError::Validation("symbol is required".to_string()));
    }

    if !transaction.quantity.is_finite() || transaction.quantity <= 0.0 {
        return Err(PortfolioError::Validation(format!(
            "quantity must be positive, got {}",
            transaction.quantity
        )));
    }

    if !transaction.buy_price.is_finite() || transaction.buy_price <= 0.0 {
        return Err(PortfolioError::Validation(format!(
            "buy price must be positive, got {}",
            transaction.buy_price
        )));
    }

    let commission = transaction.commission.unwrap_or(0.0);
    if !commission.is_finite() || commission < 0.0 {
        return Err(PortfolioError::Validation(format!(
            "commission cannot be negative, got {}",
            commission
        )));
    }

    if crate::valuation::cost_basis(transaction.quantity, transaction.buy_price, commission).is_none() {
        return Err(PortfolioError::Validation(format!(
            "{} x {} is too large to value",
            transaction.quantity, transaction.buy_price
        )));
    }

    let buy_date = match transaction.buy_date {
        Some(date) => NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| PortfolioError::Validation(format!("buy date must be YYYY-MM-DD, got {}", date)))?,
        None => Local::now().date_naive(),
    };

    Ok(ValidTransaction {
        symbol,
        quantity: transaction.quantity,
        buy_price: transaction.buy_price,
        commission,
        buy_date: buy_date.format("%Y-%m-%d").to_string(),
    })
}
