use anyhow::{Context, bail};
use backtester::{BacktestReport, BacktestSettings, Backtester};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::settings::Config;
use core_types::{
    AdviceRepository, CandleRepository, Instrument, InstrumentRepository, Interval, ParamsRepository, StrategyId,
};
use indicatif::ProgressBar;
use optimizer::{Optimizer, SearchSpace};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use storage::{
    CandleCache, CsvAdviceRepository, CsvCandleRepository, CsvParamsRepository, StaticInstrumentRepository,
    TradingHoursFilter,
};
use strategies::{create_adviser, default_bounds, param_names};

/// The main entry point for the adviser toolkit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = configuration::init_tracing(&config.logging);

    // Execute the appropriate command
    match cli.command {
        Commands::TestParams(args) => handle_test_params(args, &config).await,
        Commands::OptimizeParams(args) => handle_optimize_params(args, &config).await,
        Commands::ShowAdvices(args) => handle_show_advices(args, &config).await,
        Commands::ShowBounds(args) => handle_show_bounds(args, &config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Evaluates rule-based trading advisers against candle history and searches their parameters.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file. Defaults to `config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a saved parameter set and store its profit and loss advisories.
    TestParams(TestParamsArgs),
    /// Brute-force the parameter space of an adviser and save the best point.
    OptimizeParams(OptimizeParamsArgs),
    /// Print a saved advisory file as a table.
    ShowAdvices(ShowAdvicesArgs),
    /// Print the search bounds the optimizer would use.
    ShowBounds(ShowBoundsArgs),
}

/// The backtest period. Falls back to `[backtest]` in the configuration.
#[derive(Parser)]
struct PeriodArgs {
    /// First decision instant, RFC 3339 (e.g. "2021-01-01T00:00:00Z").
    #[arg(long)]
    from: Option<DateTime<Utc>>,

    /// End of the period (exclusive), RFC 3339.
    #[arg(long)]
    to: Option<DateTime<Utc>>,
}

#[derive(Parser)]
struct TestParamsArgs {
    /// Name of the saved parameter set.
    #[arg(long)]
    name: String,

    /// The adviser to test ("cbs", "cbs_scaled", "ft"). Inferred from the vector length when omitted.
    #[arg(long)]
    strategy: Option<StrategyId>,

    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Parser)]
struct OptimizeParamsArgs {
    /// Prefix of the saved result name.
    #[arg(long)]
    name: String,

    /// Overrides `optimizer.strategy`.
    #[arg(long)]
    strategy: Option<StrategyId>,

    /// Overrides `optimizer.rate`.
    #[arg(long)]
    rate: Option<Decimal>,

    /// Overrides `optimizer.min_frequency` (percent).
    #[arg(long)]
    min_frequency: Option<Decimal>,

    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Parser)]
struct ShowAdvicesArgs {
    /// Name of the saved advisory file (e.g. "cbs_test_profit").
    #[arg(long)]
    name: String,

    #[arg(long, default_value_t = 0)]
    offset: usize,

    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Parser)]
struct ShowBoundsArgs {
    /// Overrides `optimizer.strategy`.
    #[arg(long)]
    strategy: Option<StrategyId>,
}

// ==============================================================================
// Shared Setup
// ==============================================================================

fn resolve_period(period: &PeriodArgs, config: &Config) -> anyhow::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let from = period.from.unwrap_or(config.backtest.from);
    let to = period.to.unwrap_or(config.backtest.to);
    if from >= to {
        bail!("Backtest period is empty: {} is not before {}", from, to);
    }
    Ok((from, to))
}

async fn load_instruments(config: &Config) -> anyhow::Result<Vec<Instrument>> {
    let instruments = StaticInstrumentRepository::new(config.instruments.clone()).get_instruments().await?;
    if instruments.is_empty() {
        bail!("No instruments configured, add at least one [[instruments]] entry");
    }
    Ok(instruments)
}

/// Loads every candle a run over `[from, to)` can touch into memory: the
/// warm-up history before `from` and the outcome horizon after `to`.
async fn load_candle_cache(
    config: &Config,
    instruments: &[Instrument],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<Arc<CandleCache>> {
    let mut source: Arc<dyn CandleRepository> =
        Arc::new(CsvCandleRepository::new(&config.storage.candles_path, instruments));
    if config.filter.enabled {
        source = Arc::new(TradingHoursFilter::new(
            source,
            config.filter.trading_start_hour,
            config.filter.trading_end_hour,
        ));
    }

    let load_from = from - Duration::hours(i64::from(config.backtest.warmup_hours));
    let load_to = to + Duration::hours(i64::from(config.backtest.max_expiration_hours));

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Loading candle history...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    let cache = CandleCache::populate(source.as_ref(), instruments, &[Interval::Hour], load_from, load_to)
        .await
        .with_context(|| format!("Failed to load candles from {}", config.storage.candles_path.display()));
    spinner.finish_and_clear();

    let cache = cache?;
    tracing::info!(candles = cache.len(), %load_from, %load_to, "Candle history loaded");
    Ok(Arc::new(cache))
}

/// Picks the strategy whose parameter vector has `arity` entries.
fn strategy_for_arity(arity: usize) -> Option<StrategyId> {
    [StrategyId::Cbs, StrategyId::CbsScaled, StrategyId::Ft]
        .into_iter()
        .find(|id| param_names(*id).len() == arity)
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_test_params(args: TestParamsArgs, config: &Config) -> anyhow::Result<()> {
    let (from, to) = resolve_period(&args.period, config)?;
    let params_repository = CsvParamsRepository::new(&config.storage.params_path);
    let params = params_repository
        .load_params(&args.name)
        .await
        .with_context(|| format!("Failed to load parameter set '{}'", args.name))?;

    let strategy = match args.strategy {
        Some(strategy) => strategy,
        None => strategy_for_arity(params.len())
            .with_context(|| format!("No strategy takes {} parameters, pass --strategy", params.len()))?,
    };

    let instruments = load_instruments(config).await?;
    let cache = load_candle_cache(config, &instruments, from, to).await?;
    let adviser = create_adviser(strategy, &config.strategies, cache.clone());
    let settings = BacktestSettings { collect_advices: true, ..BacktestSettings::from(&config.backtest) };

    println!("Testing '{}' ({}) from {} to {}", args.name, strategy, from, to);
    let report = Backtester::new(cache, adviser, settings).run(&instruments, &params, from, to).await?;
    print_report(&report);

    let advice_repository = CsvAdviceRepository::new(&config.storage.advices_path);
    advice_repository.save_advices(&format!("{}_profit", args.name), &report.profit_advices).await?;
    advice_repository.save_advices(&format!("{}_loss", args.name), &report.loss_advices).await?;
    Ok(())
}

fn print_report(report: &BacktestReport) {
    // Sorted by reason name.
    let reasons: BTreeMap<String, u64> = report.reasons.iter().map(|(r, n)| (r.to_string(), *n)).collect();
    for (reason, count) in &reasons {
        println!("{} {}", reason, count);
    }

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Total".to_string(), report.total.to_string()]);
    table.add_row(vec!["Profit buy".to_string(), report.profit_buy.to_string()]);
    table.add_row(vec!["Profit sell".to_string(), report.profit_sell.to_string()]);
    table.add_row(vec!["Loss buy".to_string(), report.loss_buy.to_string()]);
    table.add_row(vec!["Loss sell".to_string(), report.loss_sell.to_string()]);
    table.add_row(vec!["Expired".to_string(), report.expired.to_string()]);
    table.add_row(vec!["Frequency %".to_string(), format!("{:.2}", report.frequency().round_dp(2))]);
    table.add_row(vec!["Accuracy %".to_string(), format!("{:.2}", report.accuracy().round_dp(2))]);
    println!("{table}");
}

async fn handle_optimize_params(args: OptimizeParamsArgs, config: &Config) -> anyhow::Result<()> {
    let (from, to) = resolve_period(&args.period, config)?;

    let mut optimizer_config = config.optimizer.clone();
    if let Some(strategy) = args.strategy {
        optimizer_config.strategy = strategy;
    }
    if let Some(rate) = args.rate {
        optimizer_config.rate = rate;
    }
    if let Some(min_frequency) = args.min_frequency {
        optimizer_config.min_frequency = min_frequency;
    }
    let space = SearchSpace::resolve(&optimizer_config)?;
    let strategy = optimizer_config.strategy;

    let instruments = load_instruments(config).await?;
    let cache = load_candle_cache(config, &instruments, from, to).await?;
    let adviser = create_adviser(strategy, &config.strategies, cache.clone());
    let backtester = Backtester::new(cache, adviser, BacktestSettings::from(&config.backtest));
    let params_repository = Arc::new(CsvParamsRepository::new(&config.storage.params_path));

    println!("Optimizing {} from {} to {}", strategy, from, to);
    let summary = Optimizer::new(backtester, params_repository, strategy, space)
        .run(&args.name, &instruments, from, to)
        .await?;

    println!("FREQUENT ENOUGH:");
    if summary.qualifying.is_empty() {
        println!("none");
    }
    for point in &summary.qualifying {
        println!("{}", point);
    }

    println!("SAVED:");
    match (&summary.saved_as, &summary.best) {
        (Some(name), Some(best)) => println!("{} as '{}'", best, name),
        _ => println!("none"),
    }
    Ok(())
}

async fn handle_show_advices(args: ShowAdvicesArgs, config: &Config) -> anyhow::Result<()> {
    let advices = CsvAdviceRepository::new(&config.storage.advices_path)
        .load_advices(&args.name)
        .await
        .with_context(|| format!("Failed to load advisories '{}'", args.name))?;

    let mut table = Table::new();
    table.set_header(vec![
        "Symbol", "Time", "Price", "Take profit", "Stop loss", "Result", "Closed", "Before h", "After h",
    ]);
    let limit = args.limit.unwrap_or(advices.len());
    for advice in advices.iter().skip(args.offset).take(limit) {
        table.add_row(vec![
            advice.symbol.clone(),
            advice.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            advice.current_price.to_string(),
            advice.take_profit.to_string(),
            advice.stop_loss.to_string(),
            advice.result.to_string(),
            advice.closed_at.format("%Y-%m-%d %H:%M").to_string(),
            advice.hours_before.to_string(),
            advice.hours_after.to_string(),
        ]);
    }

    println!("{table}");
    println!("{} advisories in '{}'", advices.len(), args.name);
    Ok(())
}

fn handle_show_bounds(args: ShowBoundsArgs, config: &Config) -> anyhow::Result<()> {
    let mut optimizer_config = config.optimizer.clone();
    if let Some(strategy) = args.strategy {
        optimizer_config.strategy = strategy;
    }
    let space = SearchSpace::resolve(&optimizer_config)?;
    let strategy = optimizer_config.strategy;
    let from_defaults = default_bounds(strategy)
        .is_some_and(|(min, max)| min == space.min && max == space.max);

    let mut table = Table::new();
    table.set_header(vec!["Parameter", "Min", "Max"]);
    for ((name, min), max) in param_names(strategy).iter().zip(&space.min).zip(&space.max) {
        table.add_row(vec![name.to_string(), min.to_string(), max.to_string()]);
    }

    println!("{} ({} bounds, rate {})", strategy, if from_defaults { "default" } else { "configured" }, space.rate);
    println!("{table}");
    Ok(())
}
