// In crates/database/src/lib.rs

use app_config::DatabaseSettings;
use chrono::{DateTime, Utc};
use core_types::AlertEvent;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub mod error;

// Re-export the most important types for easy access.
pub use error::{Error, Result};

/// A wrapper around the `sqlx` connection pool.
#[derive(Debug, Clone)]
pub struct Db(PgPool);

/// Establishes a connection pool to the PostgreSQL database and runs migrations.
///
/// # Arguments
///
/// * `settings`: The database configuration settings.
///
/// # Returns
///
/// A `Result` containing the `Db` wrapper on success, or an `Error` on failure.
pub async fn connect(settings: &DatabaseSettings) -> Result<Db> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.url)
        .await?;

    // Run database migrations. This ensures the database schema is up-to-date.
    sqlx::migrate!("../../migrations").run(&pool).await.map_err(Error::from)?;

    Ok(Db(pool))
}

/// The column values of one `alerts` row.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRow {
    pub ticker: String,
    pub ts: DateTime<Utc>,
    pub price: Decimal,
    pub sma: Decimal,
    pub kind: &'static str,
    pub window_size: i32,
}

impl TryFrom<&AlertEvent> for AlertRow {
    type Error = Error;

    fn try_from(alert: &AlertEvent) -> Result<Self> {
        let window_size = i32::try_from(alert.window).map_err(|_| Error::OutOfRange {
            column: "window_size",
            value: alert.window.to_string(),
        })?;

        Ok(AlertRow {
            ticker: alert.ticker.to_string(),
            ts: alert.timestamp,
            price: alert.price,
            sma: alert.sma,
            kind: alert.kind.as_str(),
            window_size,
        })
    }
}

impl Db {
    /// Inserts a batch of alerts in one transaction.
    ///
    /// Alerts already stored for the same `(ticker, ts)` are skipped, so a
    /// retried run never duplicates rows. Returns the number of rows written.
    pub async fn insert_alerts(&self, alerts: &[AlertEvent], strategy: &str) -> Result<u64> {
        let rows = alerts
            .iter()
            .map(AlertRow::try_from)
            .collect::<Result<Vec<_>>>()?;

        let mut tx = self.0.begin().await.map_err(Error::OperationFailed)?;
        let mut inserted = 0;

        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO alerts (ticker, ts, price, sma, kind, window_size, strategy)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (ticker, ts) DO NOTHING
                "#,
            )
            .bind(&row.ticker)
            .bind(row.ts)
            .bind(row.price)
            .bind(row.sma)
            .bind(row.kind)
            .bind(row.window_size)
            .bind(strategy)
            .execute(&mut *tx)
            .await
            .map_err(Error::OperationFailed)?;

            if result.rows_affected() == 0 {
                tracing::debug!(ticker = %row.ticker, ts = %row.ts, "Alert already stored. Skipping.");
            }
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(Error::OperationFailed)?;

        Ok(inserted)
    }

    /// Closes the underlying pool.
    pub async fn close(&self) {
        self.0.close().await;
    }
}
