// In crates/alert-sink/src/log.rs

use crate::{AlertSink, Result};
use async_trait::async_trait;
use core_types::AlertEvent;

/// Writes alerts to the log only. Nothing is persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn record(&self, alerts: &[AlertEvent]) -> Result<usize> {
        for alert in alerts {
            tracing::info!(
                ticker = %alert.ticker,
                kind = %alert.kind,
                price = %alert.price,
                sma = %alert.sma,
                window = alert.window,
                sample_time = %alert.timestamp,
                "Alert (not persisted)."
            );
        }
        Ok(alerts.len())
    }
}
