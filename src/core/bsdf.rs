// Copyright @yucwang 2023

use crate::core::computation_node::ComputationNode;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;

// Definitions of types used in BSDF sampling and eval
// processes
pub type BSDFValue = RGBSpectrum;

/// Classification of a scattering event or lobe set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BSDFFlags(u32);

impl BSDFFlags {
    pub const NONE: Self = Self(0);
    pub const DIFFUSE: Self = Self(1 << 0);
    pub const GLOSSY: Self = Self(1 << 1);
    pub const DELTA: Self = Self(1 << 2);
    pub const REFLECTION: Self = Self(1 << 3);
    pub const TRANSMISSION: Self = Self(1 << 4);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// A smooth lobe admits direction evaluation with a finite pdf,
    /// which is what next-event estimation requires.
    pub fn is_smooth(self) -> bool {
        !self.contains(Self::DELTA)
    }
}

impl std::ops::BitOr for BSDFFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for BSDFFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Result of importance-sampling a scattering direction. Directions are
/// expressed in the local shading frame (+z along the shading normal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSDFSample {
    pub wo: Vector3f,
    pub pdf: Float,
    pub eta: Float,
    pub flags: BSDFFlags,
}

impl Default for BSDFSample {
    fn default() -> Self {
        Self {
            wo: Vector3f::new(0.0, 0.0, 1.0),
            pdf: 0.0,
            eta: 1.0,
            flags: BSDFFlags::NONE,
        }
    }
}

pub trait BSDF: ComputationNode + Send + Sync {
    fn flags(&self) -> BSDFFlags;

    /// Sample a scattering direction for incident direction `wi`
    /// (local frame, pointing away from the surface). Returns the sample
    /// record together with the sampling weight f * |cos| / pdf. A zero
    /// weight with pdf 0 is a valid "no scattering" outcome, not an error.
    fn sample(&self, u1: Float, u2: &Vector2f, wi: &Vector3f) -> (BSDFSample, BSDFValue);

    /// Evaluate f * |cos theta_o| for a given direction pair. Delta lobes
    /// evaluate to zero.
    fn eval(&self, wi: &Vector3f, wo: &Vector3f) -> BSDFValue;

    /// Solid-angle density `sample` would have produced `wo` with.
    fn pdf(&self, wi: &Vector3f, wo: &Vector3f) -> Float;

    fn eval_pdf(&self, wi: &Vector3f, wo: &Vector3f) -> (BSDFValue, Float) {
        (self.eval(wi, wo), self.pdf(wi, wo))
    }
}
