//! End-to-end analysis pipeline: validation, indicators, weight
//! resolution, scoring, and simulation in one call.
//!
//! The pipeline is a pure function; repeated runs over the same input are
//! bit-identical and no state survives between invocations.

use super::backtest::{run_backtest, BacktestResult};
use super::config::SimulationConfig;
use super::error::AdaptraderError;
use super::indicator::compute_frame;
use super::price::{validate_series, PricePoint};
use super::regime::{RegimePattern, RegimeScores};
use super::signal::{score_signals, SignalExplanation, SignalRow};
use super::weights::{resolve_weights, WeightSource, WeightVector};

/// Detection outcome for adaptive runs: what was detected, what was
/// adopted, and all candidate scores.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeReport {
    pub pattern: RegimePattern,
    pub confidence: f64,
    /// The weights actually in effect (the default profile when the
    /// detection was not confident enough to be adopted).
    pub weights: WeightVector,
    pub scores: Option<RegimeScores>,
    pub adopted: bool,
}

/// Everything a caller gets back from one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub signals: Vec<SignalRow>,
    pub explanation: SignalExplanation,
    /// Present only in adaptive mode.
    pub regime: Option<RegimeReport>,
    pub backtest: BacktestResult,
}

pub fn run_pipeline(
    prices: &[PricePoint],
    config: &SimulationConfig,
) -> Result<PipelineReport, AdaptraderError> {
    config.validate()?;
    validate_series(prices)?;

    let frame = compute_frame(prices, config)?;
    let (resolved, decision) = resolve_weights(&config.weight_mode, &frame, prices)?;

    let regime = decision.map(|decision| RegimeReport {
        pattern: decision.pattern(),
        confidence: decision.confidence(),
        weights: resolved.vector,
        scores: decision.scores(),
        adopted: matches!(
            resolved.source,
            WeightSource::Adaptive { adopted: true, .. }
        ),
    });

    let (signals, rows) = score_signals(&frame, prices, &resolved.vector, config);
    let backtest = run_backtest(prices, &signals, config);

    Ok(PipelineReport {
        signals,
        explanation: SignalExplanation {
            weights: resolved,
            rows,
        },
        regime,
        backtest,
    })
}
