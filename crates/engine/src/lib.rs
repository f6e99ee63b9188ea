// In crates/engine/src/lib.rs

pub mod task;

use crate::task::TickerReport;
pub use crate::task::analyze_ticker;
use alert_sink::AlertSink;
use anyhow::Result;
use api_client::{ApiClient, QuoteSource};
use app_config::{SchedulerSettings, Settings};
use core_types::{AlertEvent, Evaluation, Ticker};
use futures::{stream, StreamExt};
use std::future::Future;
use std::time::Duration;
use strategies::SignalDetector;
use tokio::time::{self, Instant, MissedTickBehavior};

/// How late a tick may fire before it is reported as past due.
const PAST_DUE_TOLERANCE: Duration = Duration::from_secs(1);

/// When and how wide the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub period: Duration,
    pub run_on_startup: bool,
    pub max_concurrency: usize,
}

impl From<&SchedulerSettings> for Schedule {
    fn from(settings: &SchedulerSettings) -> Self {
        Self {
            period: Duration::from_secs(settings.every_minutes.saturating_mul(60)),
            run_on_startup: settings.run_on_startup,
            max_concurrency: settings.max_concurrency.max(1),
        }
    }
}

/// Totals of one pass over the ticker list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tickers: usize,
    pub evaluated: usize,
    pub insufficient: usize,
    pub failed_fetches: usize,
    /// Tickers whose prepared series the detector rejected.
    pub failed_evaluations: usize,
    pub alerts: Vec<AlertEvent>,
    /// Alerts newly stored by the sink.
    pub persisted: usize,
    pub sink_failed: bool,
    pub duration: Duration,
}

/// Runs the detector over every configured ticker and hands alerts to the sink.
pub struct Engine {
    tickers: Vec<Ticker>,
    source: Box<dyn QuoteSource>,
    detector: Box<dyn SignalDetector + Send + Sync>,
    sink: Box<dyn AlertSink>,
    schedule: Schedule,
}

impl Engine {
    pub fn new(
        tickers: Vec<Ticker>,
        source: Box<dyn QuoteSource>,
        detector: Box<dyn SignalDetector + Send + Sync>,
        sink: Box<dyn AlertSink>,
        schedule: Schedule,
    ) -> Self {
        Self {
            tickers,
            source,
            detector,
            sink,
            schedule,
        }
    }

    /// Wires the quote client, detector and sink named in `settings`.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let tickers = settings.tickers()?;
        let source = ApiClient::new(&settings.quotes)?;
        let detector = strategies::factory::create_detector(&settings.signal)?;
        let sink = alert_sink::create_sink(&settings.sink, detector.name()).await?;

        Ok(Self::new(
            tickers,
            Box::new(source),
            detector,
            sink,
            Schedule::from(&settings.scheduler),
        ))
    }

    /// Evaluates a single ticker without recording anything.
    pub async fn analyze(&self, ticker: &Ticker) -> Result<TickerReport> {
        analyze_ticker(self.source.as_ref(), self.detector.as_ref(), ticker).await
    }

    /// One full pass: fetch and evaluate every ticker, then record the alerts.
    ///
    /// A ticker that fails to fetch or evaluate is logged and skipped. A sink
    /// failure is logged and reflected in the summary. Neither aborts the run.
    pub async fn run_once(&self) -> RunSummary {
        let started = Instant::now();
        tracing::info!(
            tickers = self.tickers.len(),
            detector = self.detector.name(),
            "Starting analysis run."
        );

        let outcomes: Vec<(&Ticker, Result<TickerReport>)> = stream::iter(&self.tickers)
            .map(|ticker| async move { (ticker, self.analyze(ticker).await) })
            .buffered(self.schedule.max_concurrency)
            .collect()
            .await;

        let mut summary = RunSummary {
            tickers: self.tickers.len(),
            ..RunSummary::default()
        };

        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(report) => {
                    report.log();
                    match report.evaluation {
                        Evaluation::InsufficientData { .. } => summary.insufficient += 1,
                        Evaluation::NoCrossover { .. } => summary.evaluated += 1,
                        Evaluation::Crossover(alert) => {
                            summary.evaluated += 1;
                            summary.alerts.push(alert);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(%ticker, error = ?e, "Failed to analyze ticker. Skipping.");
                    if e.downcast_ref::<core_types::Error>().is_some() {
                        summary.failed_evaluations += 1;
                    } else {
                        summary.failed_fetches += 1;
                    }
                }
            }
        }

        if !summary.alerts.is_empty() {
            match self.sink.record(&summary.alerts).await {
                Ok(persisted) => summary.persisted = persisted,
                Err(e) => {
                    tracing::error!(sink = self.sink.name(), error = %e, "Failed to record alerts.");
                    summary.sink_failed = true;
                }
            }
        }

        summary.duration = started.elapsed();
        tracing::info!(
            tickers = summary.tickers,
            evaluated = summary.evaluated,
            insufficient = summary.insufficient,
            failed_fetches = summary.failed_fetches,
            failed_evaluations = summary.failed_evaluations,
            alerts = summary.alerts.len(),
            persisted = summary.persisted,
            duration_ms = summary.duration.as_millis() as u64,
            "Analysis run finished."
        );

        summary
    }

    /// Runs on the configured cadence until Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs on the configured cadence until `shutdown` completes.
    ///
    /// A run in progress is always finished before the loop exits.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let period = self.schedule.period;
        if period.is_zero() {
            anyhow::bail!("The run period must be positive.");
        }

        let start = if self.schedule.run_on_startup {
            Instant::now()
        } else {
            Instant::now() + period
        };
        let mut ticker = time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            period_secs = period.as_secs(),
            run_on_startup = self.schedule.run_on_startup,
            "Scheduler started."
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                scheduled = ticker.tick() => {
                    let late = Instant::now().saturating_duration_since(scheduled);
                    if late > PAST_DUE_TOLERANCE {
                        tracing::warn!(late_ms = late.as_millis() as u64, "The timer is past due.");
                    }
                    self.run_once().await;
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received. Stopping scheduler.");
                    break;
                }
            }
        }

        Ok(())
    }
}
