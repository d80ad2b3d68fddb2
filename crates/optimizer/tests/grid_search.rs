use backtester::{BacktestSettings, Backtester};
use chrono::{DateTime, Duration, TimeZone, Utc};
use configuration::OptimizerConfig;
use core_types::{Candlestick, Instrument, Interval, ParamsRepository, StrategyId};
use optimizer::{Optimizer, OptimizerError, SearchSpace};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use storage::{CandleCache, CsvParamsRepository};
use strategies::{CbsAdviser, CbsParams, ParamVector};

fn at(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 4, 0, 0, 0).unwrap() + Duration::hours(hour)
}

fn candle(hour: i64, open: Decimal, close: Decimal) -> Candlestick {
    Candlestick {
        open,
        low: open.min(close),
        high: open.max(close),
        close,
        adj_close: close,
        volume: 1,
        timestamp: at(hour),
        interval: Interval::Hour,
        instrument_id: 1,
    }
}

/// Thirty flat hours, a five hour storm of +2 per hour, then a slow +0.5 drift.
fn storm_after_calm() -> Vec<Candlestick> {
    let mut candles: Vec<Candlestick> = (0..30).map(|h| candle(h, dec!(100), dec!(100))).collect();
    for k in 0..5 {
        let open = dec!(100) + Decimal::from(2 * k);
        candles.push(candle(30 + k, open, open + dec!(2)));
    }
    for j in 0..13 {
        let open = dec!(110) + dec!(0.5) * Decimal::from(j);
        candles.push(candle(35 + j, open, open + dec!(0.5)));
    }
    candles
}

fn params(storm_min_power: Decimal) -> Vec<Decimal> {
    CbsParams {
        calm_duration_hours: 10,
        calm_max_volatility: dec!(0.3),
        calm_max_curvature: dec!(1),
        storm_duration_hours: 5,
        storm_min_power,
        storm_max_power: dec!(12),
        storm_min_volume: dec!(0),
        take_profit_diff: dec!(3),
        stop_loss_diff: dec!(3),
        check_direction_hours: 24,
        check_direction_diff: dec!(1000),
    }
    .to_vector()
}

fn backtester() -> Backtester {
    let cache = Arc::new(CandleCache::from_candles("AAPL", Interval::Hour, storm_after_calm()));
    let adviser = Arc::new(CbsAdviser::new(cache.clone()));
    Backtester::new(cache, adviser, BacktestSettings::default())
}

#[tokio::test]
async fn search_keeps_the_most_frequent_of_equally_accurate_points() {
    let directory = std::env::temp_dir().join(format!("adviser-search-{}", std::process::id()));
    let params_repository = Arc::new(CsvParamsRepository::new(&directory));

    // Only the storm's minimal power varies: 7, 8, 9.
    let space = SearchSpace { min: params(dec!(7)), max: params(dec!(9)), rate: dec!(0.5), min_frequency: dec!(1) };
    let optimizer = Optimizer::new(backtester(), params_repository.clone(), StrategyId::Cbs, space);
    let instruments = vec![Instrument { id: 1, symbol: "AAPL".to_string(), name: "Apple".to_string() }];

    let summary = optimizer.run("cbs", &instruments, at(0), at(48)).await.unwrap();

    assert_eq!(summary.evaluated, 3);
    assert_eq!(summary.qualifying.len(), 3);
    // 7 and 8 both catch the storm at h33 and h34; 9 only at h34. All hit take-profit.
    let best = summary.best.unwrap();
    assert_eq!(best.params, params(dec!(7)));
    assert_eq!(best.accuracy, dec!(100));
    assert_eq!(summary.saved_as.as_deref(), Some("cbs_4.17_100.00"));

    let stored = params_repository.load_params("cbs_4.17_100.00").await.unwrap();
    assert_eq!(stored, params(dec!(7)));

    let _ = std::fs::remove_dir_all(directory);
}

#[tokio::test]
async fn nothing_is_saved_when_no_point_is_frequent_enough() {
    let directory = std::env::temp_dir().join(format!("adviser-search-none-{}", std::process::id()));
    let space = SearchSpace { min: params(dec!(9)), max: params(dec!(9)), rate: dec!(1), min_frequency: dec!(50) };
    let optimizer =
        Optimizer::new(backtester(), Arc::new(CsvParamsRepository::new(&directory)), StrategyId::Cbs, space);
    let instruments = vec![Instrument { id: 1, symbol: "AAPL".to_string(), name: "Apple".to_string() }];

    let summary = optimizer.run("cbs", &instruments, at(0), at(48)).await.unwrap();
    assert_eq!(summary.evaluated, 1);
    assert!(summary.best.is_none());
    assert!(summary.saved_as.is_none());
    assert!(!directory.exists());
}

#[test]
fn search_space_falls_back_to_default_bounds() {
    let config = OptimizerConfig { strategy: StrategyId::Ft, ..OptimizerConfig::default() };
    let space = SearchSpace::resolve(&config).unwrap();
    assert_eq!(space.min.len(), 8);
    assert_eq!(space.max.len(), 8);
    assert_eq!(space.rate, Decimal::ONE);
}

#[test]
fn base_strategy_needs_explicit_bounds() {
    let config = OptimizerConfig { strategy: StrategyId::Cbs, ..OptimizerConfig::default() };
    assert!(matches!(SearchSpace::resolve(&config), Err(OptimizerError::SearchSpace(_))));

    let config = OptimizerConfig {
        strategy: StrategyId::Cbs,
        min_params: Some(params(dec!(7))),
        max_params: Some(params(dec!(9))),
        ..OptimizerConfig::default()
    };
    assert!(SearchSpace::resolve(&config).is_ok());
}
