//! Market regime detection.
//!
//! `detect_regime` is a total function: every input yields a pattern from
//! the fixed catalog and a confidence in [0, 1]. Too little history or a
//! degenerate statistic degrades to the balanced fallback; uncertainty is
//! signalled through confidence, never through an error.

use std::fmt;

use super::indicator::IndicatorFrame;
use super::price::PricePoint;
use super::weights::WeightVector;

/// Bars of history below which detection is not attempted.
pub const MIN_REGIME_BARS: usize = 20;

/// A winning regime score below this yields the balanced fallback.
pub const MIN_REGIME_SCORE: f64 = 0.3;

/// Confidence reported by the balanced fallback.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Bars treated as "recent" by the volatility and volume analyses.
const RECENT_WINDOW: usize = 10;

/// Bars between the two moving-average samples used for slope estimates.
const SLOPE_WINDOW: usize = 5;

/// MACD gap below this share of price (in percent) counts as neutral.
const NEUTRAL_GAP_PCT: f64 = 0.05;

/// The fixed, immutable regime catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegimePattern {
    Uptrend,
    Downtrend,
    Range,
    Transition,
    Acceleration,
    Balanced,
}

impl RegimePattern {
    pub const CATALOG: [RegimePattern; 6] = [
        RegimePattern::Uptrend,
        RegimePattern::Downtrend,
        RegimePattern::Range,
        RegimePattern::Transition,
        RegimePattern::Acceleration,
        RegimePattern::Balanced,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RegimePattern::Uptrend => "uptrend",
            RegimePattern::Downtrend => "downtrend",
            RegimePattern::Range => "range",
            RegimePattern::Transition => "transition",
            RegimePattern::Acceleration => "acceleration",
            RegimePattern::Balanced => "balanced",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RegimePattern::Uptrend => "sustained advance with trend and momentum aligned",
            RegimePattern::Downtrend => "sustained decline with bearish momentum",
            RegimePattern::Range => "sideways drift inside a contracting band",
            RegimePattern::Transition => "direction shifting under expanding volatility",
            RegimePattern::Acceleration => "volatility and volume expanding together",
            RegimePattern::Balanced => "no dominant behavior detected",
        }
    }

    pub fn strategy_hint(&self) -> &'static str {
        match self {
            RegimePattern::Uptrend => "follow the trend; favor crossover and momentum entries",
            RegimePattern::Downtrend => "stand aside or exit quickly on opposing signals",
            RegimePattern::Range => "fade the band edges; lean on the oscillator",
            RegimePattern::Transition => "wait for confirmation; momentum leads",
            RegimePattern::Acceleration => "ride breakouts but keep stops tight",
            RegimePattern::Balanced => "no edge from regime; use the balanced profile",
        }
    }

    pub fn risk_label(&self) -> &'static str {
        match self {
            RegimePattern::Uptrend => "elevated",
            RegimePattern::Downtrend => "high",
            RegimePattern::Range => "moderate",
            RegimePattern::Transition => "high",
            RegimePattern::Acceleration => "very high",
            RegimePattern::Balanced => "moderate",
        }
    }

    /// Canonical weight profile for the pattern; each sums to 1.
    pub fn weights(&self) -> WeightVector {
        match self {
            RegimePattern::Uptrend => WeightVector::new(0.40, 0.10, 0.10, 0.30, 0.10),
            RegimePattern::Downtrend => WeightVector::new(0.35, 0.20, 0.15, 0.20, 0.10),
            RegimePattern::Range => WeightVector::new(0.10, 0.35, 0.35, 0.10, 0.10),
            RegimePattern::Transition => WeightVector::new(0.15, 0.20, 0.15, 0.35, 0.15),
            RegimePattern::Acceleration => WeightVector::new(0.25, 0.10, 0.10, 0.30, 0.25),
            RegimePattern::Balanced => WeightVector::uniform(),
        }
    }
}

impl fmt::Display for RegimePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityState {
    Expanding,
    Contracting,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentumDirection {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    pub strength: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityAnalysis {
    pub state: VolatilityState,
    pub level: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumAnalysis {
    pub direction: MomentumDirection,
    pub strength: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeAnalysis {
    pub trend: VolumeTrend,
    pub strength: f64,
    pub confidence: f64,
    /// Volume rising alongside price: reinforces an advance.
    pub confirming: bool,
}

/// All five candidate scores, clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeScores {
    pub uptrend: f64,
    pub downtrend: f64,
    pub range: f64,
    pub transition: f64,
    pub acceleration: f64,
}

impl RegimeScores {
    /// Highest-scoring pattern; catalog order breaks exact ties.
    pub fn best(&self) -> (RegimePattern, f64) {
        let candidates = [
            (RegimePattern::Uptrend, self.uptrend),
            (RegimePattern::Downtrend, self.downtrend),
            (RegimePattern::Range, self.range),
            (RegimePattern::Transition, self.transition),
            (RegimePattern::Acceleration, self.acceleration),
        ];
        let mut winner = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 > winner.1 {
                winner = *candidate;
            }
        }
        winner
    }
}

/// Outcome of regime detection. "No confident regime" is a normal, typed
/// result, not a caught exception.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegimeDecision {
    Detected {
        pattern: RegimePattern,
        confidence: f64,
        scores: RegimeScores,
    },
    Fallback,
}

impl RegimeDecision {
    pub fn pattern(&self) -> RegimePattern {
        match self {
            RegimeDecision::Detected { pattern, .. } => *pattern,
            RegimeDecision::Fallback => RegimePattern::Balanced,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            RegimeDecision::Detected { confidence, .. } => *confidence,
            RegimeDecision::Fallback => FALLBACK_CONFIDENCE,
        }
    }

    pub fn weights(&self) -> WeightVector {
        self.pattern().weights()
    }

    pub fn scores(&self) -> Option<RegimeScores> {
        match self {
            RegimeDecision::Detected { scores, .. } => Some(*scores),
            RegimeDecision::Fallback => None,
        }
    }
}

/// Classify the trailing window of the frame into a regime.
pub fn detect_regime(frame: &IndicatorFrame, prices: &[PricePoint]) -> RegimeDecision {
    if prices.len() < MIN_REGIME_BARS || frame.len() != prices.len() {
        return RegimeDecision::Fallback;
    }

    let Some(trend) = analyze_trend(frame) else {
        return RegimeDecision::Fallback;
    };
    let Some(volatility) = analyze_volatility(prices) else {
        return RegimeDecision::Fallback;
    };
    let Some(momentum) = analyze_momentum(frame, prices) else {
        return RegimeDecision::Fallback;
    };
    let Some(volume) = analyze_volume(prices) else {
        return RegimeDecision::Fallback;
    };

    let scores = score_regimes(&trend, &volatility, &momentum, &volume);
    let (pattern, best) = scores.best();
    if best < MIN_REGIME_SCORE {
        return RegimeDecision::Fallback;
    }

    RegimeDecision::Detected {
        pattern,
        confidence: best.clamp(0.0, 1.0),
        scores,
    }
}

fn score_regimes(
    trend: &TrendAnalysis,
    volatility: &VolatilityAnalysis,
    momentum: &MomentumAnalysis,
    volume: &VolumeAnalysis,
) -> RegimeScores {
    let up = trend.direction == TrendDirection::Up;
    let down = trend.direction == TrendDirection::Down;
    let neutral_trend = trend.direction == TrendDirection::Neutral;
    let bullish = momentum.direction == MomentumDirection::Bullish;
    let bearish = momentum.direction == MomentumDirection::Bearish;
    let neutral_mom = momentum.direction == MomentumDirection::Neutral;
    let expanding = volatility.state == VolatilityState::Expanding;
    let contracting = volatility.state == VolatilityState::Contracting;
    let vol_up = volume.trend == VolumeTrend::Increasing;

    let uptrend = 0.4 * trend.confidence * indicator(up)
        + 0.3 * momentum.confidence * indicator(bullish)
        + 0.3 * volume.confidence * indicator(vol_up && volume.confirming);

    let downtrend = 0.4 * trend.confidence * indicator(down)
        + 0.3 * momentum.confidence * indicator(bearish)
        + 0.3 * volume.confidence * indicator(vol_up);

    let range = 0.4 * indicator(neutral_trend)
        + 0.3 * volatility.confidence * indicator(contracting)
        + 0.3 * indicator(neutral_mom);

    let transition = 0.5 * momentum.confidence * indicator(momentum.confidence > 0.5)
        + 0.5 * volatility.confidence * indicator(expanding);

    let acceleration = 0.4 * volatility.confidence * indicator(expanding)
        + 0.4 * volume.confidence * indicator(vol_up)
        + 0.2 * indicator(momentum.strength > 0.7);

    RegimeScores {
        uptrend: uptrend.clamp(0.0, 1.0),
        downtrend: downtrend.clamp(0.0, 1.0),
        range: range.clamp(0.0, 1.0),
        transition: transition.clamp(0.0, 1.0),
        acceleration: acceleration.clamp(0.0, 1.0),
    }
}

fn indicator(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}

/// Short vs. long moving-average levels plus their recent slopes.
fn analyze_trend(frame: &IndicatorFrame) -> Option<TrendAnalysis> {
    let last = frame.len().checked_sub(1)?;
    let prev = last.checked_sub(SLOPE_WINDOW)?;

    let short = frame.short_ma(last)?;
    let long = frame.long_ma(last)?;
    let short_slope = frame.short_ma(prev).map(|p| short - p)?;
    let long_slope = frame.long_ma(prev).map(|p| long - p)?;
    if long <= 0.0 {
        return None;
    }

    let gap_ratio = (short - long) / long;
    let strength = finite01(gap_ratio.abs() * 10.0)?;

    let direction = if short > long && short_slope > 0.0 {
        TrendDirection::Up
    } else if short < long && short_slope < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };

    let confidence = match direction {
        TrendDirection::Up => 0.4 + 0.3 * strength + 0.3 * indicator(long_slope > 0.0),
        TrendDirection::Down => 0.4 + 0.3 * strength + 0.3 * indicator(long_slope < 0.0),
        TrendDirection::Neutral => 0.8 - 0.6 * strength,
    };

    Some(TrendAnalysis {
        direction,
        strength,
        confidence: finite01(confidence)?,
    })
}

/// Ratio of recent to historical return standard deviation.
fn analyze_volatility(prices: &[PricePoint]) -> Option<VolatilityAnalysis> {
    let returns = daily_returns(prices);
    if returns.len() < RECENT_WINDOW + 2 {
        return None;
    }

    let hist_std = population_std(&returns);
    let recent_std = population_std(&returns[returns.len() - RECENT_WINDOW..]);
    if hist_std <= 1e-12 {
        return None;
    }

    let ratio = recent_std / hist_std;
    let state = if ratio > 1.3 {
        VolatilityState::Expanding
    } else if ratio < 0.7 {
        VolatilityState::Contracting
    } else {
        VolatilityState::Normal
    };

    let confidence = match state {
        VolatilityState::Expanding => ratio - 1.0,
        VolatilityState::Contracting => 1.0 - ratio,
        VolatilityState::Normal => 1.0 - (ratio - 1.0).abs() * 2.0,
    };

    Some(VolatilityAnalysis {
        state,
        level: finite01(ratio / 2.0)?,
        confidence: finite01(confidence)?,
    })
}

/// MACD gap sign/magnitude plus oscillator extremity.
fn analyze_momentum(frame: &IndicatorFrame, prices: &[PricePoint]) -> Option<MomentumAnalysis> {
    let last = frame.len().checked_sub(1)?;
    let line = frame.macd_line(last)?;
    let signal = frame.macd_signal(last)?;
    let rsi = frame.oscillator(last)?;
    let close = prices.get(last)?.close;
    if close <= 0.0 {
        return None;
    }

    let gap_pct = (line - signal) / close * 100.0;
    let extremity = finite01((rsi - 50.0).abs() / 50.0)?;
    let strength = finite01(0.6 * (gap_pct.abs() * 4.0).min(1.0) + 0.4 * extremity)?;

    let direction = if gap_pct > NEUTRAL_GAP_PCT {
        MomentumDirection::Bullish
    } else if gap_pct < -NEUTRAL_GAP_PCT {
        MomentumDirection::Bearish
    } else {
        MomentumDirection::Neutral
    };

    let aligned = matches!(direction, MomentumDirection::Bullish) && rsi > 50.0
        || matches!(direction, MomentumDirection::Bearish) && rsi < 50.0;
    let confidence = match direction {
        MomentumDirection::Neutral => 0.2 + 0.5 * (1.0 - strength),
        _ if aligned => 0.5 + 0.5 * strength,
        _ => 0.3 + 0.3 * strength,
    };

    Some(MomentumAnalysis {
        direction,
        strength,
        confidence: finite01(confidence)?,
    })
}

/// Recent average volume vs. the historical average.
fn analyze_volume(prices: &[PricePoint]) -> Option<VolumeAnalysis> {
    if prices.len() < RECENT_WINDOW + 2 {
        return None;
    }

    let volumes: Vec<f64> = prices.iter().map(|p| p.volume as f64).collect();
    let hist_avg = volumes.iter().sum::<f64>() / volumes.len() as f64;
    let recent = &volumes[volumes.len() - RECENT_WINDOW..];
    let recent_avg = recent.iter().sum::<f64>() / recent.len() as f64;
    if hist_avg <= 0.0 {
        return None;
    }

    let ratio = recent_avg / hist_avg;
    let trend = if ratio > 1.2 {
        VolumeTrend::Increasing
    } else if ratio < 0.8 {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Normal
    };

    let confidence = match trend {
        VolumeTrend::Increasing => (ratio - 1.0) * 2.0,
        VolumeTrend::Decreasing => (1.0 - ratio) * 2.0,
        VolumeTrend::Normal => 1.0 - (ratio - 1.0).abs() * 2.0,
    };

    let reference = prices[prices.len() - 1 - RECENT_WINDOW].close;
    let confirming = ratio > 1.0 && prices[prices.len() - 1].close > reference;

    Some(VolumeAnalysis {
        trend,
        strength: finite01((ratio - 1.0).abs())?,
        confidence: finite01(confidence)?,
        confirming,
    })
}

fn daily_returns(prices: &[PricePoint]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| {
            if w[0].close > 0.0 {
                w[1].close / w[0].close - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

fn finite01(value: f64) -> Option<f64> {
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::SimulationConfig;
    use crate::domain::indicator::compute_frame;
    use crate::domain::price::PricePoint;
    use chrono::NaiveDate;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            short_ma: 5,
            long_ma: 10,
            oscillator_period: 5,
            band_period: 5,
            ..Default::default()
        }
    }

    fn make_series(closes: &[f64], volumes: &[i64]) -> Vec<PricePoint> {
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume,
            })
            .collect()
    }

    fn detect(closes: &[f64], volumes: &[i64]) -> RegimeDecision {
        let prices = make_series(closes, volumes);
        let frame = compute_frame(&prices, &small_config()).unwrap();
        detect_regime(&frame, &prices)
    }

    #[test]
    fn catalog_weights_are_normalized() {
        for pattern in RegimePattern::CATALOG {
            let sum = pattern.weights().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{pattern} weights sum to {sum}");
        }
    }

    #[test]
    fn short_series_falls_back_to_balanced() {
        let prices = make_series(&[100.0; 10], &[1000; 10]);
        let config = small_config();
        // Frame computation would refuse this series; the detector must
        // still be total when handed a mismatched or tiny frame.
        let long = make_series(&(0..60).map(|i| 100.0 + i as f64).collect::<Vec<_>>(), &[1000; 60]);
        let frame = compute_frame(&long, &config).unwrap();
        let decision = detect_regime(&frame, &prices);

        assert_eq!(decision, RegimeDecision::Fallback);
        assert_eq!(decision.pattern(), RegimePattern::Balanced);
        assert!((decision.confidence() - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_series_falls_back() {
        // Zero return variance is a degenerate statistic, not an error.
        let decision = detect(&[100.0; 60], &[1000; 60]);
        assert_eq!(decision, RegimeDecision::Fallback);
    }

    #[test]
    fn rally_with_rising_volume_is_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let volumes: Vec<i64> = (0..60).map(|i| 1000 + 100 * i as i64).collect();
        let decision = detect(&closes, &volumes);

        match decision {
            RegimeDecision::Detected {
                pattern,
                confidence,
                scores,
            } => {
                assert_eq!(pattern, RegimePattern::Uptrend);
                assert!(confidence >= MIN_REGIME_SCORE);
                assert!(scores.uptrend >= scores.downtrend);
            }
            RegimeDecision::Fallback => panic!("expected a detected uptrend"),
        }
    }

    #[test]
    fn accelerating_decline_is_downtrend() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 300.0 - 0.05 * (i * i) as f64)
            .collect();
        let volumes: Vec<i64> = (0..60).map(|i| 1000 + 100 * i as i64).collect();
        let decision = detect(&closes, &volumes);

        assert_eq!(decision.pattern(), RegimePattern::Downtrend);
    }

    #[test]
    fn quiet_tail_after_oscillation_is_range() {
        // Choppy first half, then a dead-calm tail: the trailing window sees
        // a neutral trend and contracting volatility.
        let closes: Vec<f64> = (0..60)
            .map(|i| {
                if i < 35 {
                    100.0 + (i as f64 * 1.1).sin() * 2.0
                } else {
                    100.0
                }
            })
            .collect();
        let volumes = vec![1000; 60];
        let decision = detect(&closes, &volumes);

        assert_eq!(decision.pattern(), RegimePattern::Range);
    }

    #[test]
    fn confidence_always_in_unit_interval() {
        let series: [(Vec<f64>, Vec<i64>); 4] = [
            ((0..60).map(|i| 100.0 + 5.0 * i as f64).collect(), (0..60).map(|i| 500 + 200 * i as i64).collect()),
            ((0..60).map(|i| 400.0 - 5.0 * i as f64).collect(), vec![1000; 60]),
            ((0..60).map(|i| 100.0 + ((i * i) % 17) as f64).collect(), (0..60).map(|i| 1000 + (i % 7) as i64 * 300).collect()),
            (vec![50.0; 60], vec![0; 60]),
        ];

        for (closes, volumes) in series {
            let decision = detect(&closes, &volumes);
            let confidence = decision.confidence();
            assert!((0.0..=1.0).contains(&confidence));
            assert!(RegimePattern::CATALOG.contains(&decision.pattern()));
        }
    }

    #[test]
    fn scores_are_clamped() {
        let trend = TrendAnalysis {
            direction: TrendDirection::Up,
            strength: 1.0,
            confidence: 1.0,
        };
        let volatility = VolatilityAnalysis {
            state: VolatilityState::Expanding,
            level: 1.0,
            confidence: 1.0,
        };
        let momentum = MomentumAnalysis {
            direction: MomentumDirection::Bullish,
            strength: 1.0,
            confidence: 1.0,
        };
        let volume = VolumeAnalysis {
            trend: VolumeTrend::Increasing,
            strength: 1.0,
            confidence: 1.0,
            confirming: true,
        };

        let scores = score_regimes(&trend, &volatility, &momentum, &volume);
        for score in [
            scores.uptrend,
            scores.downtrend,
            scores.range,
            scores.transition,
            scores.acceleration,
        ] {
            assert!((0.0..=1.0).contains(&score));
        }
        assert!((scores.uptrend - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn best_breaks_ties_in_catalog_order() {
        let scores = RegimeScores {
            uptrend: 0.5,
            downtrend: 0.5,
            range: 0.5,
            transition: 0.5,
            acceleration: 0.5,
        };
        assert_eq!(scores.best().0, RegimePattern::Uptrend);
    }

    #[test]
    fn fallback_has_no_scores() {
        assert!(RegimeDecision::Fallback.scores().is_none());
        assert_eq!(RegimeDecision::Fallback.weights(), WeightVector::uniform());
    }
}
