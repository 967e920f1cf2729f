//! Exponential moving average.
//!
//! k = 2/(n+1), seeded with the first n-bar SMA, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k).

use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PricePoint;

pub fn calculate_ema(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Ema(period);
    if period == 0 {
        let values = prices
            .iter()
            .map(|p| IndicatorPoint {
                date: p.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            })
            .collect();
        return IndicatorSeries { kind, values };
    }

    let mut values = Vec::with_capacity(prices.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut seed_sum = 0.0;

    for (i, point) in prices.iter().enumerate() {
        if i < period - 1 {
            seed_sum += point.close;
            values.push(IndicatorPoint {
                date: point.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else {
            if i == period - 1 {
                seed_sum += point.close;
                ema = seed_sum / period as f64;
            } else {
                ema = point.close * k + ema * (1.0 - k);
            }
            values.push(IndicatorPoint {
                date: point.date,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        }
    }

    IndicatorSeries { kind, values }
}
