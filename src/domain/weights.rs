//! Indicator-family weighting: the weight vector, the weighting mode, and
//! the once-per-run resolution of the active weights.

use std::fmt;

use super::error::AdaptraderError;
use super::indicator::IndicatorFrame;
use super::price::PricePoint;
use super::regime::{detect_regime, RegimeDecision, RegimePattern};

/// Adaptive mode only adopts a detected regime's weights above this
/// confidence; otherwise the fixed default applies.
pub const ADAPTIVE_CONFIDENCE_FLOOR: f64 = 0.6;

/// The five indicator families that contribute to the buy/sell scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorFamily {
    Trend,
    Oscillator,
    Band,
    Momentum,
    Volume,
}

impl IndicatorFamily {
    pub const ALL: [IndicatorFamily; 5] = [
        IndicatorFamily::Trend,
        IndicatorFamily::Oscillator,
        IndicatorFamily::Band,
        IndicatorFamily::Momentum,
        IndicatorFamily::Volume,
    ];
}

impl fmt::Display for IndicatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorFamily::Trend => "trend",
            IndicatorFamily::Oscillator => "oscillator",
            IndicatorFamily::Band => "band",
            IndicatorFamily::Momentum => "momentum",
            IndicatorFamily::Volume => "volume",
        };
        write!(f, "{name}")
    }
}

/// Relative importance of each indicator family. Non-negative; callers that
/// score signals expect a normalized vector (sums to 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightVector {
    pub trend: f64,
    pub oscillator: f64,
    pub band: f64,
    pub momentum: f64,
    pub volume: f64,
}

impl WeightVector {
    pub const fn new(trend: f64, oscillator: f64, band: f64, momentum: f64, volume: f64) -> Self {
        WeightVector {
            trend,
            oscillator,
            band,
            momentum,
            volume,
        }
    }

    /// Built-in default profile used by fixed mode and as the adaptive
    /// fallback.
    pub const fn default_fixed() -> Self {
        WeightVector::new(0.30, 0.20, 0.20, 0.20, 0.10)
    }

    /// Near-uniform profile carried by the balanced regime.
    pub const fn uniform() -> Self {
        WeightVector::new(0.20, 0.20, 0.20, 0.20, 0.20)
    }

    pub fn get(&self, family: IndicatorFamily) -> f64 {
        match family {
            IndicatorFamily::Trend => self.trend,
            IndicatorFamily::Oscillator => self.oscillator,
            IndicatorFamily::Band => self.band,
            IndicatorFamily::Momentum => self.momentum,
            IndicatorFamily::Volume => self.volume,
        }
    }

    pub fn sum(&self) -> f64 {
        self.trend + self.oscillator + self.band + self.momentum + self.volume
    }

    /// Rescale so the weights sum to 1. Fails if any weight is negative or
    /// non-finite, or if all weights are zero.
    pub fn normalized(&self) -> Result<WeightVector, AdaptraderError> {
        for family in IndicatorFamily::ALL {
            let w = self.get(family);
            if !w.is_finite() || w < 0.0 {
                return Err(AdaptraderError::InvalidParameter {
                    name: format!("weights.{family}"),
                    reason: "weights must be finite and non-negative".into(),
                });
            }
        }
        let total = self.sum();
        if total <= 0.0 {
            return Err(AdaptraderError::InvalidParameter {
                name: "weights".into(),
                reason: "at least one weight must be positive".into(),
            });
        }
        Ok(WeightVector::new(
            self.trend / total,
            self.oscillator / total,
            self.band / total,
            self.momentum / total,
            self.volume / total,
        ))
    }
}

impl fmt::Display for WeightVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trend {:.2}, oscillator {:.2}, band {:.2}, momentum {:.2}, volume {:.2}",
            self.trend, self.oscillator, self.band, self.momentum, self.volume
        )
    }
}

/// How the active weight vector is chosen for a run.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightMode {
    /// Built-in default profile.
    Fixed,
    /// Regime detection picks the profile when confident enough.
    Adaptive,
    /// Caller-supplied profile, renormalized before use.
    Manual(WeightVector),
}

/// Where the active weights came from. `Adaptive` records the detection
/// outcome whether or not its weights were adopted.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightSource {
    Fixed,
    Manual,
    Adaptive {
        pattern: RegimePattern,
        confidence: f64,
        adopted: bool,
    },
}

/// The outcome of weight resolution: one concrete vector plus its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWeights {
    pub vector: WeightVector,
    pub source: WeightSource,
}

/// Resolve the active weights exactly once, before any bar-wise scoring.
///
/// Adaptive mode runs the regime detector over the frame; the decision is
/// returned alongside so callers can report it.
pub fn resolve_weights(
    mode: &WeightMode,
    frame: &IndicatorFrame,
    prices: &[PricePoint],
) -> Result<(ResolvedWeights, Option<RegimeDecision>), AdaptraderError> {
    match mode {
        WeightMode::Fixed => Ok((
            ResolvedWeights {
                vector: WeightVector::default_fixed(),
                source: WeightSource::Fixed,
            },
            None,
        )),
        WeightMode::Manual(vector) => Ok((
            ResolvedWeights {
                vector: vector.normalized()?,
                source: WeightSource::Manual,
            },
            None,
        )),
        WeightMode::Adaptive => {
            let decision = detect_regime(frame, prices);
            let confidence = decision.confidence();
            let adopted = confidence > ADAPTIVE_CONFIDENCE_FLOOR;
            let vector = if adopted {
                decision.weights()
            } else {
                WeightVector::default_fixed()
            };
            let resolved = ResolvedWeights {
                vector,
                source: WeightSource::Adaptive {
                    pattern: decision.pattern(),
                    confidence,
                    adopted,
                },
            };
            Ok((resolved, Some(decision)))
        }
    }
}
