// In crates/alert-sink/src/postgres.rs

use crate::{AlertSink, Result};
use async_trait::async_trait;
use core_types::AlertEvent;
use database::Db;

/// Inserts alerts into the `alerts` table.
#[derive(Debug, Clone)]
pub struct PostgresSink {
    db: Db,
    strategy: String,
}

impl PostgresSink {
    pub fn new(db: Db, strategy: impl Into<String>) -> Self {
        Self {
            db,
            strategy: strategy.into(),
        }
    }
}

#[async_trait]
impl AlertSink for PostgresSink {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn record(&self, alerts: &[AlertEvent]) -> Result<usize> {
        if alerts.is_empty() {
            return Ok(0);
        }
        let inserted = self.db.insert_alerts(alerts, &self.strategy).await?;
        Ok(inserted as usize)
    }
}
