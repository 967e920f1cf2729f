//! Volatility channel: SMA(close) ± k·σ over a window.
//!
//! σ is the population standard deviation (divides by N, not N-1).

use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PricePoint;

pub fn calculate_bands(prices: &[PricePoint], period: usize, std_dev: f64) -> IndicatorSeries {
    let kind = IndicatorKind::Bands { period, std_dev };
    let mut values = Vec::with_capacity(prices.len());

    for (i, point) in prices.iter().enumerate() {
        let valid = period > 0 && i + 1 >= period;

        let (upper, middle, lower) = if valid {
            let window = &prices[i + 1 - period..=i];
            let middle = window.iter().map(|p| p.close).sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|p| {
                    let diff = p.close - middle;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            let sigma = variance.sqrt();
            (middle + std_dev * sigma, middle, middle - std_dev * sigma)
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            date: point.date,
            valid,
            value: IndicatorValue::Band {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries { kind, values }
}
