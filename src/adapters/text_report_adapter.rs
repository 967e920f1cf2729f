//! Plain-text report adapter.

use std::path::Path;

use crate::domain::backtest::TradeKind;
use crate::domain::error::AdaptraderError;
use crate::domain::pipeline::PipelineReport;
use crate::ports::report_port::ReportPort;

pub struct TextReportAdapter;

impl ReportPort for TextReportAdapter {
    fn write(
        &self,
        report: &PipelineReport,
        symbol: &str,
        output_path: &Path,
    ) -> Result<(), AdaptraderError> {
        std::fs::write(output_path, render(report, symbol))?;
        Ok(())
    }
}

/// Render a run as a text summary.
pub fn render(report: &PipelineReport, symbol: &str) -> String {
    let mut out = String::new();
    let backtest = &report.backtest;
    let metrics = &backtest.metrics;

    out.push_str(&format!("=== {symbol} signal backtest ===\n"));
    out.push_str(&format!(
        "bars: {}, trades: {}\n",
        backtest.equity_curve.len(),
        backtest.trades.len()
    ));
    if backtest.fallback {
        out.push_str("NOTE: realistic simulation was degenerate; buy-and-hold substitute shown\n");
    }

    if let Some(regime) = &report.regime {
        out.push_str("\n-- regime --\n");
        out.push_str(&format!(
            "pattern: {} (confidence {:.2}){}\n",
            regime.pattern,
            regime.confidence,
            if regime.adopted {
                ""
            } else {
                " — below floor, default weights in effect"
            }
        ));
        out.push_str(&format!(
            "{}; hint: {}; risk: {}\n",
            regime.pattern.description(),
            regime.pattern.strategy_hint(),
            regime.pattern.risk_label()
        ));
        if let Some(scores) = &regime.scores {
            out.push_str(&format!(
                "scores: uptrend {:.2}, downtrend {:.2}, range {:.2}, transition {:.2}, acceleration {:.2}\n",
                scores.uptrend, scores.downtrend, scores.range, scores.transition, scores.acceleration
            ));
        }
    }

    out.push_str("\n-- weights --\n");
    out.push_str(&format!("{}\n", report.explanation.weights.vector));

    out.push_str("\n-- metrics --\n");
    out.push_str(&format!("total return: {:.2}%\n", metrics.total_return_pct));
    out.push_str(&format!(
        "annualized volatility: {:.2}%\n",
        metrics.annualized_volatility_pct
    ));
    out.push_str(&format!("sharpe ratio: {:.2}\n", metrics.sharpe_ratio));
    out.push_str(&format!("max drawdown: {:.2}%\n", metrics.max_drawdown_pct));
    out.push_str(&format!("win rate: {:.1}%\n", metrics.win_rate * 100.0));
    out.push_str(&format!(
        "avg win: {:.2}, avg loss: {:.2}\n",
        metrics.avg_win, metrics.avg_loss
    ));
    out.push_str(&format!("profit factor: {:.2}\n", metrics.profit_factor));

    if !backtest.trades.is_empty() {
        out.push_str("\n-- trades --\n");
        for trade in &backtest.trades {
            match trade.kind {
                TradeKind::Buy => {
                    out.push_str(&format!(
                        "{} BUY  {} @ {:.2}\n",
                        trade.date, trade.shares, trade.price
                    ));
                }
                TradeKind::Sell => {
                    let reason = trade
                        .exit_reason
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "end of run".to_string());
                    out.push_str(&format!(
                        "{} SELL {} @ {:.2} ({reason}) pnl {:+.2}\n",
                        trade.date,
                        trade.shares,
                        trade.price,
                        trade.pnl.unwrap_or(0.0)
                    ));
                }
            }
        }
    }

    if let Some(last) = report.explanation.rows.len().checked_sub(1) {
        if let Some(line) = report.explanation.describe_bar(last) {
            out.push_str("\n-- last bar --\n");
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}
