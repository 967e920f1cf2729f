//! Average true range, Wilder-smoothed.
//!
//! Seed = mean of the first n true ranges; afterwards
//! ATR = (prev * (n-1) + TR) / n. The first bar's TR is high - low.

use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PricePoint;

pub fn calculate_atr(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Atr(period);
    let mut values = Vec::with_capacity(prices.len());

    if period == 0 {
        for point in prices {
            values.push(IndicatorPoint {
                date: point.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        }
        return IndicatorSeries { kind, values };
    }

    let mut atr = 0.0;
    let mut seed_sum = 0.0;

    for (i, point) in prices.iter().enumerate() {
        let tr = if i == 0 {
            point.high - point.low
        } else {
            point.true_range(prices[i - 1].close)
        };

        let valid = i + 1 >= period;
        if i < period {
            seed_sum += tr;
            if i + 1 == period {
                atr = seed_sum / period as f64;
            }
        } else {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
        }

        values.push(IndicatorPoint {
            date: point.date,
            valid,
            value: IndicatorValue::Simple(if valid { atr } else { 0.0 }),
        });
    }

    IndicatorSeries { kind, values }
}
