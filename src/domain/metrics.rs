//! Performance metrics: pure functions of the equity curve and trade log.

use super::backtest::{EquityPoint, Trade, TradeKind};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    pub total_return_pct: f64,
    pub annualized_volatility_pct: f64,
    pub sharpe_ratio: f64,
    /// Minimum of equity/peak - 1 over the run, in percent (0 or negative).
    pub max_drawdown_pct: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// |sum of winning P&L / sum of losing P&L|; +inf when wins exist and
    /// losses sum to exactly zero.
    pub profit_factor: f64,
}

impl PerformanceMetrics {
    pub fn compute(equity_curve: &[EquityPoint], trades: &[Trade]) -> Self {
        let total_return_pct = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) if first.total_value > 0.0 => {
                (last.total_value / first.total_value - 1.0) * 100.0
            }
            _ => 0.0,
        };

        let returns: Vec<f64> = equity_curve
            .iter()
            .filter_map(|point| point.daily_return)
            .collect();
        let (mean, std) = mean_and_std(&returns);

        let annualized_volatility_pct = std * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
        let sharpe_ratio = if std > 0.0 {
            mean / std * TRADING_DAYS_PER_YEAR.sqrt()
        } else {
            0.0
        };

        let max_drawdown_pct = max_drawdown(equity_curve) * 100.0;

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut closed = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;

        for trade in trades {
            if trade.kind != TradeKind::Sell {
                continue;
            }
            let Some(pnl) = trade.pnl else { continue };
            closed += 1;
            if pnl > 0.0 {
                wins += 1;
                total_wins += pnl;
            } else if pnl < 0.0 {
                losses += 1;
                total_losses += pnl.abs();
            }
        }

        let win_rate = if closed > 0 {
            wins as f64 / closed as f64
        } else {
            0.0
        };
        let avg_win = if wins > 0 { total_wins / wins as f64 } else { 0.0 };
        let avg_loss = if losses > 0 {
            total_losses / losses as f64
        } else {
            0.0
        };
        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        PerformanceMetrics {
            total_return_pct,
            annualized_volatility_pct,
            sharpe_ratio,
            max_drawdown_pct,
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
        }
    }
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;

    for point in equity_curve {
        if point.total_value > peak {
            peak = point.total_value;
        }
        if peak > 0.0 {
            let drawdown = point.total_value / peak - 1.0;
            if drawdown < worst {
                worst = drawdown;
            }
        }
    }

    worst
}
