use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::error::PortfolioError;

/// Columns added to `portfolio` after its first revision, with the DDL that
/// adds each one to an older table.
const UPGRADE_COLUMNS: &[(&str, &str)] = &[
    ("commission", "ALTER TABLE portfolio ADD COLUMN commission REAL NOT NULL DEFAULT 0"),
    ("manual_price", "ALTER TABLE portfolio ADD COLUMN manual_price REAL"),
];

#[derive(Clone)]
pub struct PortfolioDb {
    pool: SqlitePool,
}

impl PortfolioDb {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self, PortfolioError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true);

        // Every connection to an in-memory URL is its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating or upgrading the schema
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, PortfolioError> {
        let db = Self { pool };
        db.init_schema().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<(), PortfolioError> {
        let schema = include_str!("../../../schema.sql");

        // Execute schema (split by statement since sqlx doesn't support multiple statements)
        for statement in schema.split(';') {
            let stmt = strip_comments(statement);
            if !stmt.is_empty() {
                sqlx::query(&stmt).execute(&self.pool).await?;
            }
        }

        self.upgrade_columns().await
    }

    /// Bring a table created by an older revision up to the current columns
    async fn upgrade_columns(&self) -> Result<(), PortfolioError> {
        let existing: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM pragma_table_info('portfolio')")
                .fetch_all(&self.pool)
                .await?;

        for (column, ddl) in UPGRADE_COLUMNS {
            if !existing.iter().any(|(name,)| name.eq_ignore_ascii_case(column)) {
                tracing::info!("Upgrading portfolio table: adding column {}", column);
                sqlx::query(ddl).execute(&self.pool).await?;
            }
        }

        Ok(())
    }

    /// Get the database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn strip_comments(statement: &str) -> String {
    statement
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
