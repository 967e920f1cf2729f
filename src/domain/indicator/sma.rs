//! Simple moving averages over close and volume.

use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PricePoint;

pub fn calculate_sma(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    windowed_mean(prices, period, IndicatorKind::Sma(period), |p| p.close)
}

pub fn calculate_volume_sma(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    windowed_mean(prices, period, IndicatorKind::VolumeSma(period), |p| {
        p.volume as f64
    })
}

fn windowed_mean(
    prices: &[PricePoint],
    period: usize,
    kind: IndicatorKind,
    field: fn(&PricePoint) -> f64,
) -> IndicatorSeries {
    let mut values = Vec::with_capacity(prices.len());
    let mut sum = 0.0;

    for (i, point) in prices.iter().enumerate() {
        sum += field(point);
        if i >= period {
            sum -= field(&prices[i - period]);
        }

        let valid = period > 0 && i + 1 >= period;
        let mean = if valid { sum / period as f64 } else { 0.0 };

        values.push(IndicatorPoint {
            date: point.date,
            valid,
            value: IndicatorValue::Simple(mean),
        });
    }

    IndicatorSeries { kind, values }
}
