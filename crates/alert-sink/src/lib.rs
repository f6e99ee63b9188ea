// In crates/alert-sink/src/lib.rs

use app_config::SinkSettings;
use async_trait::async_trait;
use core_types::AlertEvent;

pub mod csv;
pub mod error;
pub mod log;
pub mod postgres;

// Re-export public types
pub use self::csv::CsvSink;
pub use error::{Error, Result};
pub use log::LogSink;
pub use postgres::PostgresSink;

/// The universal interface for an alert destination.
///
/// A sink durably records the alerts of one run. Nothing it returns feeds
/// back into signal detection; callers only log the outcome.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// The name of the sink (e.g., "postgres", "csv").
    fn name(&self) -> &'static str;

    /// Records a batch of alerts and returns how many were newly stored.
    async fn record(&self, alerts: &[AlertEvent]) -> Result<usize>;
}

/// Builds the sink selected in the settings.
///
/// `strategy` names the detector that produced the alerts and is stored
/// alongside them where the sink supports it.
pub async fn create_sink(settings: &SinkSettings, strategy: &str) -> Result<Box<dyn AlertSink>> {
    let sink: Box<dyn AlertSink> = match settings {
        SinkSettings::Postgres(db_settings) => {
            let db = database::connect(db_settings).await?;
            tracing::info!("Database connection established and migrations are up-to-date.");
            Box::new(PostgresSink::new(db, strategy))
        }
        SinkSettings::Csv { directory } => Box::new(CsvSink::new(directory.clone())),
        SinkSettings::Log => {
            tracing::warn!("No alert sink configured. Alerts will only be logged.");
            Box::new(LogSink)
        }
    };

    Ok(sink)
}
