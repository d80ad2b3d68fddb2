//! # Adviser Parameter Optimizer
//!
//! Searches an adviser's parameter space by brute force: every grid point the
//! `BruteForceModifier` produces is backtested, and the best one is stored.
//!
//! ## Public API
//!
//! - `Optimizer`: The sequential search driver.
//! - `SearchSpace`: The hyper-rectangle and step rate to search.
//! - `BruteForceModifier`: The grid traversal.
//! - `BestPointTracker` / `SearchPoint`: Best-point selection.

use backtester::Backtester;
use chrono::{DateTime, Utc};
use configuration::OptimizerConfig;
use core_types::{Instrument, ParamsRepository, StrategyId};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::sync::Arc;

pub mod error;
pub mod modifier;
pub mod tracker;

pub use error::OptimizerError;
pub use modifier::BruteForceModifier;
pub use tracker::{BestPointTracker, SearchPoint};

/// The part of the parameter space a search walks.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    pub min: Vec<Decimal>,
    pub max: Vec<Decimal>,
    pub rate: Decimal,
    pub min_frequency: Decimal,
}

impl SearchSpace {
    /// Takes the bounds from the configuration, falling back to the
    /// strategy's default bounds for whichever side is missing.
    pub fn resolve(config: &OptimizerConfig) -> Result<Self, OptimizerError> {
        let defaults = strategies::default_bounds(config.strategy);
        let (min, max) = match (&config.min_params, &config.max_params, defaults) {
            (Some(min), Some(max), _) => (min.clone(), max.clone()),
            (min, max, Some((default_min, default_max))) => (
                min.clone().unwrap_or(default_min),
                max.clone().unwrap_or(default_max),
            ),
            (_, _, None) => {
                return Err(OptimizerError::SearchSpace(format!(
                    "strategy {} has no default bounds, set optimizer.min_params and optimizer.max_params",
                    config.strategy
                )));
            }
        };

        let arity = strategies::param_names(config.strategy).len();
        if min.len() != arity || max.len() != arity {
            return Err(OptimizerError::SearchSpace(format!(
                "strategy {} takes {} parameters, bounds have {} and {}",
                config.strategy,
                arity,
                min.len(),
                max.len()
            )));
        }

        Ok(Self { min, max, rate: config.rate, min_frequency: config.min_frequency })
    }
}

/// What a finished search found.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationSummary {
    pub strategy: StrategyId,
    /// Grid points backtested.
    pub evaluated: u64,
    pub best: Option<SearchPoint>,
    /// Every point that reached the minimal frequency, in traversal order.
    pub qualifying: Vec<SearchPoint>,
    /// Name the best point was stored under, if one was stored.
    pub saved_as: Option<String>,
}

pub struct Optimizer {
    backtester: Backtester,
    params_repository: Arc<dyn ParamsRepository>,
    strategy: StrategyId,
    space: SearchSpace,
}

impl Optimizer {
    pub fn new(
        backtester: Backtester,
        params_repository: Arc<dyn ParamsRepository>,
        strategy: StrategyId,
        space: SearchSpace,
    ) -> Self {
        Self { backtester, params_repository, strategy, space }
    }

    /// Backtests every grid point in turn and stores the best one as
    /// `<name>_<frequency>_<accuracy>`, both rounded to two decimals.
    ///
    /// A point is only stored when it fired at all. Any backtest failure aborts
    /// the search.
    pub async fn run(
        &self,
        name: &str,
        instruments: &[Instrument],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<OptimizationSummary, OptimizerError> {
        let mut modifier =
            BruteForceModifier::new(self.space.min.clone(), self.space.max.clone(), self.space.rate)?;
        let steps_per_point = self.backtester.total_steps(instruments, from, to).await?;

        tracing::info!(
            strategy = %self.strategy,
            grid_points = modifier.total_steps(),
            steps_per_point,
            "Starting parameter search"
        );

        let progress_bar = ProgressBar::new(modifier.total_steps().saturating_mul(steps_per_point));
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );

        let mut tracker = BestPointTracker::new(self.space.min_frequency);
        let mut current = self.space.min.clone();
        let mut evaluated = 0;
        while modifier.advance(&mut current) {
            let report = self
                .backtester
                .run_with_progress(instruments, &current, from, to, &progress_bar)
                .await
                .inspect_err(|_| progress_bar.abandon())?;
            evaluated += 1;

            let point = SearchPoint {
                params: current.clone(),
                frequency: report.frequency(),
                accuracy: report.accuracy(),
            };
            tracing::info!(step = modifier.current_step(), %point, "Grid point evaluated");
            tracker.observe(point);
        }
        progress_bar.finish_with_message("Parameter search complete.");

        let (best, qualifying) = tracker.into_parts();
        let saved_as = match &best {
            Some(point) if point.frequency > Decimal::ZERO => {
                let saved_name = format!(
                    "{}_{:.2}_{:.2}",
                    name,
                    point.frequency.round_dp(2),
                    point.accuracy.round_dp(2)
                );
                self.params_repository.save_params(&saved_name, &point.params).await?;
                tracing::info!(name = %saved_name, "Best parameters saved");
                Some(saved_name)
            }
            _ => None,
        };

        Ok(OptimizationSummary { strategy: self.strategy, evaluated, best, qualifying, saved_as })
    }
}
