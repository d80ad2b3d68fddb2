use crate::error::BacktestError;
use crate::report::Evaluation;
use analytics::CandleCalculator;
use chrono::{DateTime, Duration, Utc};
use core_types::{AdviceRecord, CandleRepository, Candlestick, Interval};
use rust_decimal::Decimal;
use std::sync::Arc;
use strategies::{Adviser, Decision, Rejection, Selector};
use tokio::sync::mpsc;

/// What a worker reports back to the coordinator.
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    Decision(Evaluation),
    /// Terminal: the instrument was replayed completely.
    Finished { symbol: String },
    /// Terminal: the instrument could not be replayed.
    Failed { symbol: String, error: BacktestError },
}

/// Everything a worker shares with its siblings.
pub(crate) struct ReplayContext {
    pub repository: Arc<dyn CandleRepository>,
    pub adviser: Arc<dyn Adviser>,
    pub calculator: CandleCalculator,
    pub selector: Selector,
    pub max_expiration_hours: u32,
    pub params: Vec<Decimal>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Replays one instrument and always ends with exactly one terminal message.
pub(crate) async fn replay_instrument(
    context: Arc<ReplayContext>,
    symbol: String,
    tx: mpsc::Sender<WorkerMessage>,
) {
    let terminal = match replay(&context, &symbol, &tx).await {
        Ok(()) => WorkerMessage::Finished { symbol },
        Err(error) => WorkerMessage::Failed { symbol, error },
    };
    // The coordinator has gone away when this fails; nothing is left to report to.
    let _ = tx.send(terminal).await;
}

async fn replay(
    context: &ReplayContext,
    symbol: &str,
    tx: &mpsc::Sender<WorkerMessage>,
) -> Result<(), BacktestError> {
    let instants = decision_instants(context.repository.as_ref(), symbol, context.from, context.to).await?;
    tracing::debug!(symbol, instants = instants.len(), "Replaying instrument");

    for candle in &instants {
        let evaluation = evaluate(context, symbol, candle).await?;
        if tx.send(WorkerMessage::Decision(evaluation)).await.is_err() {
            break;
        }
    }
    Ok(())
}

/// Hourly candles with `from <= timestamp < to`.
pub(crate) async fn decision_instants(
    repository: &dyn CandleRepository,
    symbol: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Candlestick>, BacktestError> {
    let mut candles = repository.get_candles(symbol, Interval::Hour, from, to).await?;
    candles.retain(|candle| candle.timestamp < to);
    Ok(candles)
}

async fn evaluate(
    context: &ReplayContext,
    symbol: &str,
    current: &Candlestick,
) -> Result<Evaluation, BacktestError> {
    let candidates = context.adviser.get_advices(&context.params, current, symbol).await?;

    let Some(selected) = context.selector.select(&candidates) else {
        let rejection = match Rejection::dominant(candidates.iter().filter_map(|c| match &c.decision {
            Decision::Rejected(rejection) => Some(*rejection),
            Decision::Advice(_) => None,
        })) {
            Some(rejection) => rejection,
            // No candidates at all; the single-advice path names the cause.
            None => match context.adviser.get_advice(&context.params, current, symbol).await? {
                Decision::Rejected(rejection) => rejection,
                Decision::Advice(_) => Rejection::NoCandidates,
            },
        };
        return Ok(Evaluation::Rejected(rejection));
    };

    let future = context
        .repository
        .get_candles(
            symbol,
            Interval::Hour,
            current.timestamp + Duration::hours(1),
            current.timestamp + Duration::hours(i64::from(context.max_expiration_hours)),
        )
        .await?;
    let outcome = context.calculator.simulate_outcome(
        current.close,
        selected.advisory.take_profit,
        selected.advisory.stop_loss,
        &future,
    );

    let closed_at = outcome.closed_at.unwrap_or(current.timestamp);
    let hours_after = u32::try_from((closed_at - current.timestamp).num_hours()).unwrap_or(0);

    Ok(Evaluation::Advice(AdviceRecord {
        symbol: symbol.to_string(),
        hours_before: selected.hours_before,
        hours_after,
        timestamp: current.timestamp,
        current_price: current.close,
        take_profit: selected.advisory.take_profit,
        stop_loss: selected.advisory.stop_loss,
        result: outcome.result,
        closed_at,
        strategy: context.adviser.strategy(),
        params: context.params.clone(),
    }))
}
