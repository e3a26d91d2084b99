// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::interaction::SurfaceIntersection;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterFlag(u8);

impl EmitterFlag {
    pub const NONE: Self = Self(0);
    /// Samples a direction at the reference point (environment or distant
    /// sources); never produced by a scene intersection.
    pub const DIRECTION: Self = Self(1 << 0);
    /// Emits from scene geometry; reachable by forward sampling.
    pub const SURFACE: Self = Self(1 << 1);
    /// Degenerate direction distribution (no MIS counterpart).
    pub const DELTA: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }
}

impl std::ops::BitOr for EmitterFlag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// A solid-angle emitter sample taken at a reference point: the direction
/// toward the light, the distance to it (for the shadow ray), the radiance
/// arriving along the direction, and the solid-angle density. `pdf == 0`
/// marks an invalid sample, which contributes nothing.
#[derive(Debug, Clone)]
pub struct DirectionSample {
    pub direction: Vector3f,
    pub distance: Float,
    pub radiance: RGBSpectrum,
    pub pdf: Float,
    pub delta: bool,
    pub infinite: bool,
}

pub trait Emitter: ComputationNode + Send + Sync {
    fn get_flag(&self) -> EmitterFlag;

    fn set_scene_bounds(&mut self, _bounds: &AABB) {}

    /// Radiance arriving from `direction` when the emitter covers the
    /// directional domain (environment sources). Zero for everything else.
    fn eval_direction(&self, _direction: &Vector3f) -> RGBSpectrum {
        RGBSpectrum::default()
    }

    /// Density of `sample_direction` producing `direction`. Zero for delta
    /// and surface emitters; surface densities are evaluated geometrically
    /// by the scene from the hit record instead.
    fn pdf_direction(&self, _direction: &Vector3f) -> Float {
        0.0
    }

    /// Importance-sample a direction toward the emitter as seen from the
    /// reference intersection. `None` is a valid zero-contribution outcome
    /// (e.g. the back side of a one-sided area light).
    fn sample_direction(&self, reference: &SurfaceIntersection, u: &Vector2f)
        -> Option<DirectionSample>;
}
