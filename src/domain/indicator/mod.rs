//! Technical indicator set.
//!
//! Every calculator is a pure function of the price series and its window
//! parameters. Output length always equals input length; bars inside a
//! window's warm-up prefix are marked invalid rather than zeroed. The
//! [`IndicatorFrame`] bundles the columns the scorer and regime detector
//! read, with `Option<f64>` accessors that hide the validity bookkeeping.

pub mod atr;
pub mod bands;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::calculate_atr;
pub use bands::calculate_bands;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::{calculate_sma, calculate_volume_sma};

use chrono::NaiveDate;
use std::fmt;

use super::config::SimulationConfig;
use super::error::AdaptraderError;
use super::price::PricePoint;

/// Extra bars demanded beyond the largest warm-up so trailing-window
/// statistics have something to chew on.
pub const SAFETY_MARGIN: usize = 10;

/// ATR window; fixed, not part of the parameter bag.
pub const ATR_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Band {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

impl IndicatorValue {
    pub fn simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }

    pub fn macd(&self) -> Option<(f64, f64, f64)> {
        match self {
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => Some((*line, *signal, *histogram)),
            _ => None,
        }
    }

    pub fn band(&self) -> Option<(f64, f64, f64)> {
        match self {
            IndicatorValue::Band {
                upper,
                middle,
                lower,
            } => Some((*upper, *middle, *lower)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorKind {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Bands { period: usize, std_dev: f64 },
    Macd { fast: usize, slow: usize, signal: usize },
    VolumeSma(usize),
    Atr(usize),
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(period) => write!(f, "SMA({period})"),
            IndicatorKind::Ema(period) => write!(f, "EMA({period})"),
            IndicatorKind::Rsi(period) => write!(f, "RSI({period})"),
            IndicatorKind::Bands { period, std_dev } => write!(f, "BANDS({period},{std_dev})"),
            IndicatorKind::Macd { fast, slow, signal } => {
                write!(f, "MACD({fast},{slow},{signal})")
            }
            IndicatorKind::VolumeSma(period) => write!(f, "VOL_SMA({period})"),
            IndicatorKind::Atr(period) => write!(f, "ATR({period})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at `index` if the bar is past the warm-up, as a plain number.
    /// Multi-value indicators expose their components via the frame.
    fn simple_at(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .and_then(|p| p.value.simple())
    }
}

/// All indicator columns for one run, aligned 1:1 with the price series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    len: usize,
    pub short_ma: IndicatorSeries,
    pub long_ma: IndicatorSeries,
    pub oscillator: IndicatorSeries,
    pub bands: IndicatorSeries,
    pub macd: IndicatorSeries,
    pub volume_ma: IndicatorSeries,
    pub atr: IndicatorSeries,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn short_ma(&self, index: usize) -> Option<f64> {
        self.short_ma.simple_at(index)
    }

    pub fn long_ma(&self, index: usize) -> Option<f64> {
        self.long_ma.simple_at(index)
    }

    pub fn oscillator(&self, index: usize) -> Option<f64> {
        self.oscillator.simple_at(index)
    }

    pub fn volume_ma(&self, index: usize) -> Option<f64> {
        self.volume_ma.simple_at(index)
    }

    pub fn atr(&self, index: usize) -> Option<f64> {
        self.atr.simple_at(index)
    }

    fn band_at(&self, index: usize) -> Option<(f64, f64, f64)> {
        self.bands
            .values
            .get(index)
            .filter(|p| p.valid)
            .and_then(|p| p.value.band())
    }

    pub fn band_upper(&self, index: usize) -> Option<f64> {
        self.band_at(index).map(|(upper, _, _)| upper)
    }

    pub fn band_middle(&self, index: usize) -> Option<f64> {
        self.band_at(index).map(|(_, middle, _)| middle)
    }

    pub fn band_lower(&self, index: usize) -> Option<f64> {
        self.band_at(index).map(|(_, _, lower)| lower)
    }

    fn macd_at(&self, index: usize) -> Option<(f64, f64, f64)> {
        self.macd
            .values
            .get(index)
            .filter(|p| p.valid)
            .and_then(|p| p.value.macd())
    }

    pub fn macd_line(&self, index: usize) -> Option<f64> {
        self.macd_at(index).map(|(line, _, _)| line)
    }

    pub fn macd_signal(&self, index: usize) -> Option<f64> {
        self.macd_at(index).map(|(_, signal, _)| signal)
    }
}

/// Minimum bars the full frame needs before every column has at least one
/// valid entry, plus the safety margin.
pub fn required_bars(config: &SimulationConfig) -> usize {
    let macd_warmup = macd::DEFAULT_SLOW + macd::DEFAULT_SIGNAL - 1;
    config
        .long_ma
        .max(config.band_period)
        .max(config.oscillator_period + 1)
        .max(macd_warmup)
        .max(ATR_PERIOD)
        + SAFETY_MARGIN
}

/// Compute every column for the run. Refuses short series outright: a
/// truncated frame would silently corrupt downstream scoring.
pub fn compute_frame(
    prices: &[PricePoint],
    config: &SimulationConfig,
) -> Result<IndicatorFrame, AdaptraderError> {
    let minimum = required_bars(config);
    if prices.len() < minimum {
        return Err(AdaptraderError::DataInsufficient {
            bars: prices.len(),
            minimum,
        });
    }

    Ok(IndicatorFrame {
        len: prices.len(),
        short_ma: calculate_sma(prices, config.short_ma),
        long_ma: calculate_sma(prices, config.long_ma),
        oscillator: calculate_rsi(prices, config.oscillator_period),
        bands: calculate_bands(prices, config.band_period, config.band_std_dev),
        macd: calculate_macd(prices, macd::DEFAULT_FAST, macd::DEFAULT_SLOW, macd::DEFAULT_SIGNAL),
        volume_ma: calculate_volume_sma(prices, config.long_ma),
        atr: calculate_atr(prices, ATR_PERIOD),
    })
}

#[cfg(test)]
pub(crate) fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        })
        .collect()
}
