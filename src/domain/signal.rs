//! Per-bar signal scoring.
//!
//! The active weight vector is resolved once per run (see
//! [`crate::domain::weights::resolve_weights`]); scoring itself is a pure
//! sweep over the frame. Conditions that touch a warm-up entry do not vote,
//! and NaN indicator values compare false everywhere, so the scorer is
//! total over numeric input.

use super::config::SimulationConfig;
use super::indicator::IndicatorFrame;
use super::price::PricePoint;
use super::weights::{IndicatorFamily, ResolvedWeights, WeightSource, WeightVector};

/// Discrete per-bar trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Sell,
    Hold,
    Buy,
}

impl Signal {
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRow {
    pub buy_score: f64,
    pub sell_score: f64,
    pub signal: Signal,
}

/// How one indicator family voted on one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Buy,
    Sell,
    /// Confirmation: the weight lands on both accumulators.
    Both,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionCheck {
    pub family: IndicatorFamily,
    pub vote: Vote,
    pub weight: f64,
}

/// Which condition legs fired on one bar, with the weights applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRationale {
    pub checks: [ConditionCheck; 5],
}

impl BarRationale {
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .checks
            .iter()
            .map(|check| match check.vote {
                Vote::Buy => format!("{}: buy (+{:.2})", check.family, check.weight),
                Vote::Sell => format!("{}: sell (+{:.2})", check.family, check.weight),
                Vote::Both => format!("{}: confirms both sides (+{:.2})", check.family, check.weight),
                Vote::None => format!("{}: no vote", check.family),
            })
            .collect();
        parts.join("; ")
    }
}

/// Per-bar rationale plus the resolved weight breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalExplanation {
    pub weights: ResolvedWeights,
    pub rows: Vec<BarRationale>,
}

impl SignalExplanation {
    pub fn describe_bar(&self, index: usize) -> Option<String> {
        let row = self.rows.get(index)?;
        let mut line = row.describe();
        line.push_str(&format!(" | weights: {}", self.weights.vector));
        if let WeightSource::Adaptive {
            pattern,
            confidence,
            adopted,
        } = &self.weights.source
        {
            line.push_str(&format!(" | regime: {pattern} ({confidence:.2})"));
            if !adopted {
                line.push_str(" below confidence floor, default weights in effect");
            }
        }
        Some(line)
    }
}

/// Score every bar against the resolved weights.
///
/// Returns one row and one rationale per price point.
pub fn score_signals(
    frame: &IndicatorFrame,
    prices: &[PricePoint],
    weights: &WeightVector,
    config: &SimulationConfig,
) -> (Vec<SignalRow>, Vec<BarRationale>) {
    let mut rows = Vec::with_capacity(prices.len());
    let mut rationale = Vec::with_capacity(prices.len());

    for index in 0..prices.len() {
        let votes = evaluate_bar(frame, prices, config, index);

        let mut buy_score = 0.0;
        let mut sell_score = 0.0;
        let mut checks = [ConditionCheck {
            family: IndicatorFamily::Trend,
            vote: Vote::None,
            weight: 0.0,
        }; 5];

        for (slot, (family, vote)) in IndicatorFamily::ALL.iter().zip(votes).enumerate() {
            let weight = weights.get(*family);
            match vote {
                Vote::Buy => buy_score += weight,
                Vote::Sell => sell_score += weight,
                Vote::Both => {
                    buy_score += weight;
                    sell_score += weight;
                }
                Vote::None => {}
            }
            checks[slot] = ConditionCheck {
                family: *family,
                vote,
                weight,
            };
        }

        // Sell is checked after buy: a bar clearing both thresholds ends up
        // flagged sell. The order is observable and must not change.
        let mut signal = Signal::Hold;
        if buy_score >= config.buy_threshold {
            signal = Signal::Buy;
        }
        if sell_score >= config.sell_threshold {
            signal = Signal::Sell;
        }

        rows.push(SignalRow {
            buy_score,
            sell_score,
            signal,
        });
        rationale.push(BarRationale { checks });
    }

    (rows, rationale)
}

/// One vote per indicator family, in `IndicatorFamily::ALL` order.
fn evaluate_bar(
    frame: &IndicatorFrame,
    prices: &[PricePoint],
    config: &SimulationConfig,
    index: usize,
) -> [Vote; 5] {
    let close = prices[index].close;

    let trend = match (frame.short_ma(index), frame.long_ma(index)) {
        (Some(short), Some(long)) if short > long => Vote::Buy,
        (Some(short), Some(long)) if short < long => Vote::Sell,
        _ => Vote::None,
    };

    let oscillator = match frame.oscillator(index) {
        Some(rsi) if rsi < config.oversold_level => Vote::Buy,
        Some(rsi) if rsi > config.overbought_level => Vote::Sell,
        _ => Vote::None,
    };

    let band = match (frame.band_lower(index), frame.band_upper(index)) {
        (Some(lower), _) if close < lower => Vote::Buy,
        (_, Some(upper)) if close > upper => Vote::Sell,
        _ => Vote::None,
    };

    let momentum = if index == 0 {
        Vote::None
    } else {
        match (
            frame.macd_line(index),
            frame.macd_signal(index),
            frame.macd_line(index - 1),
            frame.macd_signal(index - 1),
        ) {
            (Some(line), Some(signal), Some(prev_line), Some(prev_signal))
                if line > signal && prev_line <= prev_signal =>
            {
                Vote::Buy
            }
            (Some(line), Some(signal), Some(prev_line), Some(prev_signal))
                if line < signal && prev_line >= prev_signal =>
            {
                Vote::Sell
            }
            _ => Vote::None,
        }
    };

    let volume = match frame.volume_ma(index) {
        Some(avg) if (prices[index].volume as f64) > avg => Vote::Both,
        _ => Vote::None,
    };

    [trend, oscillator, band, momentum, volume]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{compute_frame, make_points};
    use crate::domain::weights::WeightVector;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            short_ma: 5,
            long_ma: 10,
            oscillator_period: 5,
            band_period: 5,
            ..Default::default()
        }
    }

    #[test]
    fn flat_series_never_signals() {
        let config = small_config();
        let prices = make_points(&[100.0; 60]);
        let frame = compute_frame(&prices, &config).unwrap();
        let (rows, _) = score_signals(&frame, &prices, &WeightVector::default_fixed(), &config);

        assert_eq!(rows.len(), 60);
        for row in &rows {
            assert_eq!(row.signal, Signal::Hold);
            assert!(row.buy_score.abs() < f64::EPSILON);
            assert!(row.sell_score.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn warmup_bars_cast_no_votes() {
        let config = small_config();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let prices = make_points(&closes);
        let frame = compute_frame(&prices, &config).unwrap();
        let (_, rationale) = score_signals(&frame, &prices, &WeightVector::default_fixed(), &config);

        for check in &rationale[0].checks {
            assert_eq!(check.vote, Vote::None);
        }
    }

    #[test]
    fn trend_only_weights_follow_crossover() {
        let config = small_config();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let prices = make_points(&closes);
        let frame = compute_frame(&prices, &config).unwrap();

        let trend_only = WeightVector::new(1.0, 0.0, 0.0, 0.0, 0.0);
        let (rows, _) = score_signals(&frame, &prices, &trend_only, &config);

        for (i, row) in rows.iter().enumerate() {
            match (frame.short_ma(i), frame.long_ma(i)) {
                (Some(short), Some(long)) if short > long => {
                    assert!((row.buy_score - 1.0).abs() < f64::EPSILON);
                    assert_eq!(row.signal, Signal::Buy);
                }
                _ => {
                    assert!(row.buy_score.abs() < f64::EPSILON);
                    assert_eq!(row.signal, Signal::Hold);
                }
            }
            assert!(row.sell_score.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn sell_threshold_overrides_buy() {
        // All weight on volume, which votes both ways: every firing bar
        // clears both thresholds and must come out as a sell.
        let config = small_config();
        let closes = vec![100.0; 60];
        let mut prices = make_points(&closes);
        prices[59].volume = 1_000_000;
        let frame = compute_frame(&prices, &config).unwrap();

        let volume_only = WeightVector::new(0.0, 0.0, 0.0, 0.0, 1.0);
        let (rows, _) = score_signals(&frame, &prices, &volume_only, &config);

        let last = &rows[59];
        assert!((last.buy_score - 1.0).abs() < f64::EPSILON);
        assert!((last.sell_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(last.signal, Signal::Sell);
    }

    #[test]
    fn volume_adds_to_both_sides() {
        let config = small_config();
        let closes = vec![100.0; 60];
        let mut prices = make_points(&closes);
        prices[59].volume = 1_000_000;
        let frame = compute_frame(&prices, &config).unwrap();

        let (rows, rationale) =
            score_signals(&frame, &prices, &WeightVector::default_fixed(), &config);

        let last = &rows[59];
        let volume_weight = WeightVector::default_fixed().volume;
        assert!((last.buy_score - volume_weight).abs() < f64::EPSILON);
        assert!((last.sell_score - volume_weight).abs() < f64::EPSILON);
        assert_eq!(rationale[59].checks[4].vote, Vote::Both);
    }

    #[test]
    fn oscillator_votes_at_extremes() {
        let config = small_config();
        // Long slide keeps RSI pinned low.
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - 2.0 * i as f64).collect();
        let prices = make_points(&closes);
        let frame = compute_frame(&prices, &config).unwrap();

        let votes = evaluate_bar(&frame, &prices, &config, 59);
        assert_eq!(votes[1], Vote::Buy);
    }

    #[test]
    fn band_breach_votes() {
        // A lone spike against a flat window lands exactly on a 2-sigma
        // band; 1.5 sigma leaves it strictly outside.
        let config = SimulationConfig {
            band_std_dev: 1.5,
            ..small_config()
        };
        let mut closes = vec![100.0; 59];
        closes.push(130.0);
        let prices = make_points(&closes);
        let frame = compute_frame(&prices, &config).unwrap();

        let votes = evaluate_bar(&frame, &prices, &config, 59);
        assert_eq!(votes[2], Vote::Sell);
    }

    #[test]
    fn band_dip_votes_buy() {
        let config = SimulationConfig {
            band_std_dev: 1.5,
            ..small_config()
        };
        let mut closes = vec![100.0; 59];
        closes.push(70.0);
        let prices = make_points(&closes);
        let frame = compute_frame(&prices, &config).unwrap();

        let votes = evaluate_bar(&frame, &prices, &config, 59);
        assert_eq!(votes[2], Vote::Buy);
    }

    #[test]
    fn momentum_cross_fires_once() {
        let config = small_config();
        // V-shape: decline then recovery forces a MACD cross above.
        let closes: Vec<f64> = (0..90)
            .map(|i| {
                if i < 45 {
                    200.0 - i as f64
                } else {
                    155.0 + 2.0 * (i - 45) as f64
                }
            })
            .collect();
        let prices = make_points(&closes);
        let frame = compute_frame(&prices, &config).unwrap();

        let buy_crosses: Vec<usize> = (0..prices.len())
            .filter(|&i| evaluate_bar(&frame, &prices, &config, i)[3] == Vote::Buy)
            .collect();
        assert!(!buy_crosses.is_empty(), "expected a bullish MACD cross");
        // A monotonic recovery produces exactly one cross above.
        assert_eq!(buy_crosses.len(), 1);
    }

    #[test]
    fn explanation_describes_votes_and_weights() {
        let config = small_config();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let prices = make_points(&closes);
        let frame = compute_frame(&prices, &config).unwrap();
        let (_, rationale) = score_signals(&frame, &prices, &WeightVector::default_fixed(), &config);

        let explanation = SignalExplanation {
            weights: ResolvedWeights {
                vector: WeightVector::default_fixed(),
                source: WeightSource::Fixed,
            },
            rows: rationale,
        };

        let line = explanation.describe_bar(59).unwrap();
        assert!(line.contains("trend: buy (+0.30)"));
        assert!(line.contains("weights:"));
        assert!(explanation.describe_bar(999).is_none());
    }

    #[test]
    fn signal_as_i8_mapping() {
        assert_eq!(Signal::Buy.as_i8(), 1);
        assert_eq!(Signal::Hold.as_i8(), 0);
        assert_eq!(Signal::Sell.as_i8(), -1);
    }
}
