#![allow(dead_code)]

use std::collections::HashMap;

use adaptrader::domain::config::SimulationConfig;
use adaptrader::domain::error::AdaptraderError;
pub use adaptrader::domain::price::PricePoint;
use adaptrader::ports::data_port::PriceDataPort;
use chrono::NaiveDate;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    let volumes = vec![1000; closes.len()];
    make_points_with_volume(closes, &volumes)
}

pub fn make_points_with_volume(closes: &[f64], volumes: &[i64]) -> Vec<PricePoint> {
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| PricePoint {
            date: date(2024, 1, 1) + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume,
        })
        .collect()
}

/// Small windows so short fixtures clear the warm-up.
pub fn small_config() -> SimulationConfig {
    SimulationConfig {
        short_ma: 5,
        long_ma: 10,
        oscillator_period: 5,
        band_period: 5,
        ..Default::default()
    }
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), prices);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AdaptraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(AdaptraderError::PriceData {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|prices| {
                prices
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
