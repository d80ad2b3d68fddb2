use core_types::{AdviceRecord, OrderResult, StrategyId};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use strategies::Rejection;

/// What one decision instant of one instrument evaluated to.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Advice(AdviceRecord),
    Rejected(Rejection),
}

/// Aggregated statistics of a backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub strategy: StrategyId,
    pub params: Vec<Decimal>,
    /// Decision instants evaluated.
    pub total: u64,
    /// Advisories given.
    pub fired: u64,
    /// Advisories that reached take-profit.
    pub accurate: u64,
    /// Advisories that hit stop-loss.
    pub loss: u64,
    pub expired: u64,
    pub profit_buy: u64,
    pub profit_sell: u64,
    pub loss_buy: u64,
    pub loss_sell: u64,
    /// How often each rejection occurred.
    pub reasons: BTreeMap<Rejection, u64>,
    /// Take-profit advisories, when collection is enabled.
    pub profit_advices: Vec<AdviceRecord>,
    /// Stop-loss advisories, when collection is enabled.
    pub loss_advices: Vec<AdviceRecord>,
}

impl BacktestReport {
    pub fn new(strategy: StrategyId, params: Vec<Decimal>) -> Self {
        Self {
            strategy,
            params,
            total: 0,
            fired: 0,
            accurate: 0,
            loss: 0,
            expired: 0,
            profit_buy: 0,
            profit_sell: 0,
            loss_buy: 0,
            loss_sell: 0,
            reasons: BTreeMap::new(),
            profit_advices: Vec::new(),
            loss_advices: Vec::new(),
        }
    }

    /// Folds one evaluation into the statistics.
    pub fn record(&mut self, evaluation: Evaluation, collect_advices: bool) {
        self.total += 1;
        let advice = match evaluation {
            Evaluation::Rejected(rejection) => {
                *self.reasons.entry(rejection).or_default() += 1;
                return;
            }
            Evaluation::Advice(advice) => advice,
        };

        self.fired += 1;
        match advice.result {
            OrderResult::TakeProfit => {
                self.accurate += 1;
                if advice.is_buy() {
                    self.profit_buy += 1;
                } else {
                    self.profit_sell += 1;
                }
                if collect_advices {
                    self.profit_advices.push(advice);
                }
            }
            OrderResult::StopLoss => {
                self.loss += 1;
                if advice.is_buy() {
                    self.loss_buy += 1;
                } else {
                    self.loss_sell += 1;
                }
                if collect_advices {
                    self.loss_advices.push(advice);
                }
            }
            OrderResult::Expired => self.expired += 1,
        }
    }

    /// Puts collected advisories in chronological order. Workers report in
    /// no particular order across instruments.
    pub(crate) fn finish(&mut self) {
        let key = |a: &AdviceRecord| (a.timestamp, a.symbol.clone());
        self.profit_advices.sort_by_key(key);
        self.loss_advices.sort_by_key(key);
    }

    /// Percentage of evaluated instants that produced an advisory. Zero when nothing was evaluated.
    pub fn frequency(&self) -> Decimal {
        percentage(self.fired, self.total)
    }

    /// Percentage of advisories that reached take-profit. Zero when nothing fired.
    pub fn accuracy(&self) -> Decimal {
        percentage(self.accurate, self.fired)
    }
}

fn percentage(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use strategies::{CbsReason, FtReason};

    fn advice(take_profit: Decimal, result: OrderResult) -> AdviceRecord {
        AdviceRecord {
            symbol: "AAPL".to_string(),
            hours_before: 15,
            hours_after: 3,
            timestamp: Utc.with_ymd_and_hms(2021, 1, 5, 10, 0, 0).unwrap(),
            current_price: dec!(100),
            take_profit,
            stop_loss: dec!(100) * dec!(2) - take_profit,
            result,
            closed_at: Utc.with_ymd_and_hms(2021, 1, 5, 13, 0, 0).unwrap(),
            strategy: StrategyId::Cbs,
            params: Vec::new(),
        }
    }

    #[test]
    fn empty_run_reports_zero_rates() {
        let report = BacktestReport::new(StrategyId::Cbs, Vec::new());
        assert_eq!(report.frequency(), Decimal::ZERO);
        assert_eq!(report.accuracy(), Decimal::ZERO);
    }

    #[test]
    fn rejections_only_fire_nothing() {
        let mut report = BacktestReport::new(StrategyId::Ft, Vec::new());
        report.record(Evaluation::Rejected(Rejection::Ft(FtReason::TrendTooWeak)), true);
        report.record(Evaluation::Rejected(Rejection::Ft(FtReason::TrendTooWeak)), true);
        assert_eq!(report.total, 2);
        assert_eq!(report.frequency(), Decimal::ZERO);
        assert_eq!(report.accuracy(), Decimal::ZERO);
        assert_eq!(report.reasons[&Rejection::Ft(FtReason::TrendTooWeak)], 2);
    }

    #[test]
    fn outcomes_are_split_by_side() {
        let mut report = BacktestReport::new(StrategyId::Cbs, Vec::new());
        report.record(Evaluation::Advice(advice(dec!(103), OrderResult::TakeProfit)), true);
        report.record(Evaluation::Advice(advice(dec!(97), OrderResult::TakeProfit)), true);
        report.record(Evaluation::Advice(advice(dec!(103), OrderResult::StopLoss)), false);
        report.record(Evaluation::Advice(advice(dec!(97), OrderResult::Expired)), true);
        report.record(Evaluation::Rejected(Rejection::Cbs(CbsReason::StormTooWeak)), true);

        assert_eq!((report.total, report.fired, report.accurate, report.loss, report.expired), (5, 4, 2, 1, 1));
        assert_eq!((report.profit_buy, report.profit_sell, report.loss_buy, report.loss_sell), (1, 1, 1, 0));
        assert_eq!(report.profit_advices.len(), 2);
        assert!(report.loss_advices.is_empty());
        assert_eq!(report.frequency(), dec!(80));
        assert_eq!(report.accuracy(), dec!(50));
    }
}
