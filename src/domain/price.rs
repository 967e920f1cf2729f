//! Daily price bar representation.

use chrono::NaiveDate;

use super::error::AdaptraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PricePoint {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Check the series contract: strictly increasing dates, no duplicates,
/// finite positive closes. Non-trading-day gaps are fine.
pub fn validate_series(prices: &[PricePoint]) -> Result<(), AdaptraderError> {
    for (i, point) in prices.iter().enumerate() {
        if !point.close.is_finite() || point.close <= 0.0 {
            return Err(AdaptraderError::InvalidParameter {
                name: "prices".into(),
                reason: format!("non-positive or non-finite close at bar {i}"),
            });
        }
        if i > 0 && point.date <= prices[i - 1].date {
            return Err(AdaptraderError::InvalidParameter {
                name: "prices".into(),
                reason: format!(
                    "dates must be strictly increasing: {} follows {}",
                    point.date,
                    prices[i - 1].date
                ),
            });
        }
    }
    Ok(())
}
