//! Backtest engine: a single-position Flat/Long state machine stepped once
//! per bar, with risk-based sizing and a deterministic buy-and-hold
//! fallback for degenerate simulations.

use std::fmt;

use chrono::NaiveDate;

use super::config::SimulationConfig;
use super::metrics::PerformanceMetrics;
use super::price::PricePoint;
use super::signal::{Signal, SignalRow};

/// The simulation holds at most one lot of one asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Flat,
    Long { shares: i64, entry_price: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitReason::StopLoss => "stop-loss",
            ExitReason::TakeProfit => "take-profit",
            ExitReason::Signal => "signal",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub kind: TradeKind,
    pub price: f64,
    pub shares: i64,
    pub cash_after: f64,
    pub entry_price: f64,
    /// Exit proceeds minus entry cost, with the cost rate applied on both
    /// legs. `None` on entries.
    pub pnl: Option<f64>,
    pub exit_reason: Option<ExitReason>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub total_value: f64,
    /// Fractional change from the previous bar's equity; `None` at bar 0.
    pub daily_return: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
    /// True when the realistic pass was degenerate and the buy-and-hold
    /// substitute below is what the caller is looking at.
    pub fallback: bool,
}

type ExitPredicate = fn(f64, f64, Signal, &SimulationConfig) -> bool;

/// Exit rules in priority order. Evaluated top to bottom; the first match
/// wins and stamps the trade's exit reason.
const EXIT_RULES: [(ExitReason, ExitPredicate); 3] = [
    (ExitReason::StopLoss, stop_loss_hit),
    (ExitReason::TakeProfit, take_profit_hit),
    (ExitReason::Signal, opposing_signal),
];

fn stop_loss_hit(close: f64, entry: f64, _signal: Signal, config: &SimulationConfig) -> bool {
    close <= entry * (1.0 - config.stop_loss_pct)
}

fn take_profit_hit(close: f64, entry: f64, _signal: Signal, config: &SimulationConfig) -> bool {
    close >= entry * (1.0 + config.take_profit_pct)
}

fn opposing_signal(_close: f64, _entry: f64, signal: Signal, _config: &SimulationConfig) -> bool {
    signal == Signal::Sell
}

/// Replay the signal series against the prices.
///
/// If the realistic pass produces an unusable equity curve the buy-and-hold
/// substitute runs instead and `fallback` is set on the result.
pub fn run_backtest(
    prices: &[PricePoint],
    signals: &[SignalRow],
    config: &SimulationConfig,
) -> BacktestResult {
    let (equity_curve, trades) = simulate(prices, signals, config);

    if is_degenerate(&equity_curve) {
        let (equity_curve, trades) = buy_and_hold(prices, config);
        let metrics = PerformanceMetrics::compute(&equity_curve, &trades);
        return BacktestResult {
            equity_curve,
            trades,
            metrics,
            fallback: true,
        };
    }

    let metrics = PerformanceMetrics::compute(&equity_curve, &trades);
    BacktestResult {
        equity_curve,
        trades,
        metrics,
        fallback: false,
    }
}

fn simulate(
    prices: &[PricePoint],
    signals: &[SignalRow],
    config: &SimulationConfig,
) -> (Vec<EquityPoint>, Vec<Trade>) {
    let cost_rate = config.trade_cost_rate_pct;
    let mut cash = config.initial_capital;
    let mut position = PositionState::Flat;
    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(prices.len());
    let mut trades = Vec::new();

    for (i, point) in prices.iter().enumerate() {
        let close = point.close;
        let signal = signals.get(i).map(|row| row.signal).unwrap_or(Signal::Hold);

        if let PositionState::Long {
            shares,
            entry_price,
        } = position
        {
            let triggered = EXIT_RULES
                .iter()
                .find(|(_, predicate)| predicate(close, entry_price, signal, config))
                .map(|(reason, _)| *reason);

            if let Some(reason) = triggered {
                let proceeds = shares as f64 * close * (1.0 - cost_rate);
                let entry_cost = shares as f64 * entry_price * (1.0 + cost_rate);
                cash += proceeds;
                trades.push(Trade {
                    date: point.date,
                    kind: TradeKind::Sell,
                    price: close,
                    shares,
                    cash_after: cash,
                    entry_price,
                    pnl: Some(proceeds - entry_cost),
                    exit_reason: Some(reason),
                });
                position = PositionState::Flat;
            }
        }

        if position == PositionState::Flat && signal == Signal::Buy {
            let risk_per_share = close - close * (1.0 - config.stop_loss_pct);
            if risk_per_share > 0.0 {
                let capital_at_risk = cash * config.risk_per_trade_pct;
                let shares = (capital_at_risk / risk_per_share).floor() as i64;
                let cost = shares as f64 * close * (1.0 + cost_rate);
                if shares > 0 && cash >= cost {
                    cash -= cost;
                    position = PositionState::Long {
                        shares,
                        entry_price: close,
                    };
                    trades.push(Trade {
                        date: point.date,
                        kind: TradeKind::Buy,
                        price: close,
                        shares,
                        cash_after: cash,
                        entry_price: close,
                        pnl: None,
                        exit_reason: None,
                    });
                }
            }
        }

        let held = match position {
            PositionState::Long { shares, .. } => shares,
            PositionState::Flat => 0,
        };
        let total_value = cash + held as f64 * close;
        let daily_return = match equity_curve.last() {
            None => None,
            Some(prev) if prev.total_value > 0.0 => {
                Some(total_value / prev.total_value - 1.0)
            }
            Some(_) => Some(0.0),
        };

        equity_curve.push(EquityPoint {
            date: point.date,
            total_value,
            daily_return,
        });
    }

    (equity_curve, trades)
}

fn is_degenerate(equity_curve: &[EquityPoint]) -> bool {
    equity_curve.is_empty()
        || equity_curve.iter().any(|point| {
            !point.total_value.is_finite()
                || point.daily_return.is_some_and(|r| !r.is_finite())
        })
}

/// Deterministic substitute: buy everything affordable at the first close,
/// sell it all at the last close, same capital and cost rate.
fn buy_and_hold(
    prices: &[PricePoint],
    config: &SimulationConfig,
) -> (Vec<EquityPoint>, Vec<Trade>) {
    let Some(first) = prices.first() else {
        return (Vec::new(), Vec::new());
    };

    let cost_rate = config.trade_cost_rate_pct;
    let mut cash = config.initial_capital;
    let mut trades = Vec::new();

    let unit_cost = first.close * (1.0 + cost_rate);
    let shares = if unit_cost > 0.0 {
        (cash / unit_cost).floor() as i64
    } else {
        0
    };

    if shares > 0 {
        cash -= shares as f64 * unit_cost;
        trades.push(Trade {
            date: first.date,
            kind: TradeKind::Buy,
            price: first.close,
            shares,
            cash_after: cash,
            entry_price: first.close,
            pnl: None,
            exit_reason: None,
        });
    }

    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(prices.len());
    for (i, point) in prices.iter().enumerate() {
        let mut held = shares;
        if shares > 0 && i == prices.len() - 1 {
            let proceeds = shares as f64 * point.close * (1.0 - cost_rate);
            let entry_cost = shares as f64 * first.close * (1.0 + cost_rate);
            cash += proceeds;
            trades.push(Trade {
                date: point.date,
                kind: TradeKind::Sell,
                price: point.close,
                shares,
                cash_after: cash,
                entry_price: first.close,
                pnl: Some(proceeds - entry_cost),
                exit_reason: None,
            });
            held = 0;
        }

        let total_value = cash + held as f64 * point.close;
        let daily_return = match equity_curve.last() {
            None => None,
            Some(prev) if prev.total_value > 0.0 => {
                Some(total_value / prev.total_value - 1.0)
            }
            Some(_) => Some(0.0),
        };
        equity_curve.push(EquityPoint {
            date: point.date,
            total_value,
            daily_return,
        });
    }

    (equity_curve, trades)
}
