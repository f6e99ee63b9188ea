// In crates/alert-sink/src/csv.rs

use crate::{AlertSink, Result};
use async_trait::async_trait;
use chrono::Utc;
use core_types::AlertEvent;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Writes each run's alerts as one CSV object in a directory.
///
/// Files are named `alerts_<UTC run time>.csv` and never overwritten.
#[derive(Debug, Clone)]
pub struct CsvSink {
    directory: PathBuf,
}

impl CsvSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    async fn write_batch(&self, alerts: &[AlertEvent]) -> Result<PathBuf> {
        let contents = render(alerts)?;
        fs::create_dir_all(&self.directory).await?;

        let name = format!("alerts_{}.csv", Utc::now().format("%Y%m%dT%H%M%S%.6fZ"));
        let path = self.directory.join(name);

        let mut file = OpenOptions::new().write(true).create_new(true).open(&path).await?;
        file.write_all(&contents).await?;
        file.flush().await?;

        Ok(path)
    }
}

#[async_trait]
impl AlertSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn record(&self, alerts: &[AlertEvent]) -> Result<usize> {
        if alerts.is_empty() {
            return Ok(0);
        }
        let path = self.write_batch(alerts).await?;
        tracing::info!(path = %path.display(), count = alerts.len(), "Alert batch written.");
        Ok(alerts.len())
    }
}

/// One CSV row. Column order is the header order.
#[derive(Debug, Serialize)]
struct AlertRecord<'a> {
    ticker: &'a str,
    timestamp: String,
    kind: &'static str,
    price: &'a Decimal,
    sma: &'a Decimal,
    window: usize,
}

impl<'a> From<&'a AlertEvent> for AlertRecord<'a> {
    fn from(alert: &'a AlertEvent) -> Self {
        Self {
            ticker: alert.ticker.as_str(),
            timestamp: alert.timestamp.to_rfc3339(),
            kind: alert.kind.as_str(),
            price: &alert.price,
            sma: &alert.sma,
            window: alert.window,
        }
    }
}

/// Renders alerts as CSV, header first. An empty batch renders nothing.
pub fn render(alerts: &[AlertEvent]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for alert in alerts {
        writer.serialize(AlertRecord::from(alert))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(bytes)
}
