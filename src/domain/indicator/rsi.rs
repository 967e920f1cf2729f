//! Relative Strength Index with Wilder smoothing.
//!
//! First average gain/loss is a simple mean over the first n changes;
//! afterwards avg = (prev_avg * (n-1) + current) / n.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss); 100 when only gains,
//! 50 when the window saw no movement at all.
//! The first n bars are invalid (n price changes are needed).

use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PricePoint;

pub fn calculate_rsi(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Rsi(period);
    let mut values = Vec::with_capacity(prices.len());

    if period == 0 || prices.len() < 2 {
        for point in prices {
            values.push(invalid_point(point));
        }
        return IndicatorSeries { kind, values };
    }

    values.push(invalid_point(&prices[0]));

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, point) in prices.iter().enumerate().skip(1) {
        let change = point.close - prices[i - 1].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < period {
            // Still accumulating the seed mean.
            avg_gain += gain;
            avg_loss += loss;
            values.push(invalid_point(point));
            continue;
        }

        if i == period {
            avg_gain = (avg_gain + gain) / period as f64;
            avg_loss = (avg_loss + loss) / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }

        let rsi = if avg_loss == 0.0 {
            if avg_gain == 0.0 { 50.0 } else { 100.0 }
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };

        values.push(IndicatorPoint {
            date: point.date,
            valid: true,
            value: IndicatorValue::Simple(rsi),
        });
    }

    IndicatorSeries { kind, values }
}

fn invalid_point(point: &PricePoint) -> IndicatorPoint {
    IndicatorPoint {
        date: point.date,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    }
}
