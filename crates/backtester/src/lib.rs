//! # Adviser Backtester
//!
//! Replays an adviser over historical candles and measures how its advisories
//! would have resolved.
//!
//! ## Architectural Principles
//!
//! - **One Worker per Instrument:** Each instrument is replayed by its own tokio
//!   task. Workers only read the shared candle repository and report through a
//!   bounded channel, so the report is built by a single owner.
//! - **Counted Termination:** Every worker ends with exactly one terminal
//!   message. The coordinator stops after receiving one per instrument.
//! - **Fail the Batch:** A data or parameter error in any worker aborts the
//!   remaining workers and fails the whole run.
//!
//! ## Public API
//!
//! - `Backtester`: The coordinator.
//! - `BacktestSettings`: Outcome horizon, channel capacity, advisory collection.
//! - `BacktestReport` / `Evaluation`: The aggregated statistics.

use crate::worker::{ReplayContext, WorkerMessage};
use analytics::CandleCalculator;
use chrono::{DateTime, Utc};
use core_types::{CandleRepository, Instrument};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::sync::Arc;
use strategies::{Adviser, Selector};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

pub mod error;
pub mod report;
mod worker;

pub use error::BacktestError;
pub use report::{BacktestReport, Evaluation};

/// Knobs of a backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktestSettings {
    /// How far past a decision the outcome of an advisory is looked up.
    pub max_expiration_hours: u32,
    pub channel_capacity: usize,
    /// Keep the evaluated profit and loss advisories in the report.
    pub collect_advices: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self { max_expiration_hours: 30 * 24, channel_capacity: 256, collect_advices: false }
    }
}

impl From<&configuration::Backtest> for BacktestSettings {
    fn from(backtest: &configuration::Backtest) -> Self {
        Self {
            max_expiration_hours: backtest.max_expiration_hours,
            channel_capacity: backtest.channel_capacity,
            collect_advices: false,
        }
    }
}

/// The main backtesting engine.
pub struct Backtester {
    repository: Arc<dyn CandleRepository>,
    adviser: Arc<dyn Adviser>,
    settings: BacktestSettings,
}

impl Backtester {
    pub fn new(
        repository: Arc<dyn CandleRepository>,
        adviser: Arc<dyn Adviser>,
        settings: BacktestSettings,
    ) -> Self {
        Self { repository, adviser, settings }
    }

    pub fn settings(&self) -> BacktestSettings {
        self.settings
    }

    /// Number of decision instants a run over `[from, to)` will evaluate.
    pub async fn total_steps(
        &self,
        instruments: &[Instrument],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, BacktestError> {
        let mut total = 0;
        for instrument in instruments {
            let instants =
                worker::decision_instants(self.repository.as_ref(), &instrument.symbol, from, to).await?;
            total += instants.len() as u64;
        }
        Ok(total)
    }

    /// Runs the backtest with its own progress bar over decision instants.
    pub async fn run(
        &self,
        instruments: &[Instrument],
        params: &[Decimal],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<BacktestReport, BacktestError> {
        let total = self.total_steps(instruments, from, to).await?;
        let progress_bar = ProgressBar::new(total);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );

        let report = self.run_with_progress(instruments, params, from, to, &progress_bar).await;
        progress_bar.finish_and_clear();
        report
    }

    /// Runs the backtest, advancing `progress` once per evaluated instant.
    ///
    /// Decision instants are the hourly candles in `[from, to)`. Advisories are
    /// resolved against the candles after the decision, up to the configured
    /// expiration horizon.
    ///
    /// # Returns
    ///
    /// * `Ok(BacktestReport)` - if every instrument was replayed completely.
    /// * `Err(BacktestError::BatchAborted)` - if any worker failed; the others are cancelled.
    pub async fn run_with_progress(
        &self,
        instruments: &[Instrument],
        params: &[Decimal],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        progress: &ProgressBar,
    ) -> Result<BacktestReport, BacktestError> {
        let strategy = self.adviser.strategy();
        tracing::info!(%strategy, instruments = instruments.len(), %from, %to, "Starting backtest");

        let context = Arc::new(ReplayContext {
            repository: self.repository.clone(),
            adviser: self.adviser.clone(),
            calculator: CandleCalculator::new(),
            selector: Selector,
            max_expiration_hours: self.settings.max_expiration_hours,
            params: params.to_vec(),
            from,
            to,
        });

        let (tx, mut rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        let mut workers = JoinSet::new();
        for instrument in instruments {
            workers.spawn(worker::replay_instrument(context.clone(), instrument.symbol.clone(), tx.clone()));
        }
        drop(tx);

        let mut report = BacktestReport::new(strategy, params.to_vec());
        let mut remaining = instruments.len();
        while remaining > 0 {
            let Some(message) = rx.recv().await else {
                break;
            };
            match message {
                WorkerMessage::Decision(evaluation) => {
                    report.record(evaluation, self.settings.collect_advices);
                    progress.inc(1);
                }
                WorkerMessage::Finished { symbol } => {
                    tracing::debug!(%symbol, "Instrument replayed");
                    remaining -= 1;
                }
                WorkerMessage::Failed { symbol, error } => {
                    tracing::warn!(%symbol, %error, "Instrument failed, aborting backtest");
                    workers.abort_all();
                    return Err(BacktestError::BatchAborted { symbol, source: Box::new(error) });
                }
            }
        }

        // A worker that panicked never sent its terminal message.
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                return Err(BacktestError::WorkerPanicked(e.to_string()));
            }
        }

        report.finish();
        tracing::info!(
            total = report.total,
            fired = report.fired,
            accurate = report.accurate,
            "Backtest complete"
        );
        Ok(report)
    }
}
