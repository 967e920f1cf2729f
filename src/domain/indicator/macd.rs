//! Moving average convergence/divergence.
//!
//! Line = EMA(fast) - EMA(slow); signal = EMA(signal_period) of the line;
//! histogram = line - signal. Warm-up: slow - 1 + signal_period - 1 bars.

use crate::domain::indicator::{
    calculate_ema, IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue,
};
use crate::domain::price::PricePoint;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    prices: &[PricePoint],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let kind = IndicatorKind::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if prices.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        let values = prices
            .iter()
            .map(|p| IndicatorPoint {
                date: p.date,
                valid: false,
                value: IndicatorValue::Macd {
                    line: 0.0,
                    signal: 0.0,
                    histogram: 0.0,
                },
            })
            .collect();
        return IndicatorSeries { kind, values };
    }

    let ema_fast = raw_ema(prices, fast);
    let ema_slow = raw_ema(prices, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();

    // Signal line: EMA of the MACD line, seeded with a simple mean over the
    // first signal_period values after the MACD warm-up.
    let k = 2.0 / (signal_period as f64 + 1.0);
    let macd_warmup = slow.saturating_sub(1);
    let mut signal_line = vec![0.0; prices.len()];

    if macd_warmup + signal_period <= prices.len() {
        let seed_end = macd_warmup + signal_period;
        let mut signal_ema =
            macd_line[macd_warmup..seed_end].iter().sum::<f64>() / signal_period as f64;
        signal_line[seed_end - 1] = signal_ema;

        for i in seed_end..prices.len() {
            signal_ema = macd_line[i] * k + signal_ema * (1.0 - k);
            signal_line[i] = signal_ema;
        }
    }

    let warmup = macd_warmup + signal_period.saturating_sub(1);
    let values = prices
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let line = macd_line[i];
            let signal = signal_line[i];
            IndicatorPoint {
                date: point.date,
                valid: i >= warmup,
                value: IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: line - signal,
                },
            }
        })
        .collect();

    IndicatorSeries { kind, values }
}

/// EMA values as plain numbers, 0.0 inside the warm-up.
fn raw_ema(prices: &[PricePoint], period: usize) -> Vec<f64> {
    calculate_ema(prices, period)
        .values
        .iter()
        .map(|p| p.value.simple().unwrap_or(0.0))
        .collect()
}
