// Copyright @yucwang 2026

use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::constants::{Float, Vector2f};
use crate::math::spectrum::RGBSpectrum;

use std::fmt;

/// Invalid integrator configuration. Raised at construction time; path
/// sampling itself never fails, degenerate paths are worth zero instead.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    ZeroMaxDepth,
    RouletteDepthOutOfRange { rr_depth: u32, max_depth: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroMaxDepth => {
                write!(f, "max_depth must be at least 1")
            }
            ConfigError::RouletteDepthOutOfRange { rr_depth, max_depth } => {
                write!(f, "rr_depth ({}) must not exceed max_depth ({})",
                       rr_depth, max_depth)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// One stochastic radiance estimate for a sensor sample. Averaging over
/// many estimates is the film's job, not the integrator's.
pub struct RadianceSample {
    pub radiance: RGBSpectrum,
    pub valid: bool,
    pub aovs: Vec<Float>,
}

impl RadianceSample {
    pub fn invalid() -> Self {
        Self {
            radiance: RGBSpectrum::default(),
            valid: false,
            aovs: Vec::new(),
        }
    }
}

pub trait Integrator: Sync {
    fn trace_ray_forward(&self, scene: &Scene, sensor: &dyn Sensor, pixel: Vector2f, rng: &mut LcgRng) -> RGBSpectrum;
    fn samples_per_pixel(&self) -> u32;
}

/// Balance heuristic for combining two sampling strategies. By convention
/// a zero `pdf_a` yields zero regardless of `pdf_b`, so callers never have
/// to special-case unreachable strategies.
pub fn mis_weight(pdf_a: Float, pdf_b: Float) -> Float {
    if pdf_a == 0.0 {
        0.0
    } else {
        pdf_a / (pdf_a + pdf_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mis_weight_balance() {
        assert_eq!(mis_weight(0.5, 0.5), 0.5);
        assert!((mis_weight(1.0, 3.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_mis_weight_zero_pdf_convention() {
        // a strategy that could not have produced the sample gets nothing
        assert_eq!(mis_weight(0.0, 2.0), 0.0);
        assert_eq!(mis_weight(0.0, 0.0), 0.0);
        // the only viable strategy gets full weight
        assert_eq!(mis_weight(0.7, 0.0), 1.0);
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::RouletteDepthOutOfRange { rr_depth: 8, max_depth: 4 };
        let text = format!("{}", err);
        assert!(text.contains("rr_depth"));
        assert!(text.contains("8"));
        assert!(format!("{}", ConfigError::ZeroMaxDepth).contains("max_depth"));
    }
}
